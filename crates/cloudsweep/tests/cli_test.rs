#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const PUBLIC_METADATA: &str = r#"{
    "clusterName": "mycluster",
    "clusterID": "5c1b7a3e-0000-4000-8000-0123456789ab",
    "infraID": "mycluster-x7k2p",
    "powervs": {
        "BaseDomain": "example.com",
        "cisInstanceCRN": "crn:v1:bluemix:public:internet-svcs:global:a/1234abcd:cis-1::",
        "vpcRegion": "us-south"
    }
}"#;

fn cloudsweep() -> Command {
    let mut cmd = Command::cargo_bin("cloudsweep").unwrap();
    cmd.env_remove("IBMCLOUD_IAM_TOKEN")
        .env_remove("CLOUDFLARE_API_TOKEN")
        .env_remove("CLOUDSWEEP_METADATA_PATH")
        .env_remove("RUST_LOG");
    cmd
}

/// Top-level help lists every command
#[test]
fn test_cli_help() {
    cloudsweep()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_cli_version() {
    cloudsweep()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cloudsweep"));
}

#[test]
fn test_destroy_help() {
    cloudsweep()
        .args(["destroy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--poll-interval"))
        .stdout(predicate::str::contains("--metadata"));
}

#[test]
fn test_missing_metadata_file() {
    let dir = tempfile::tempdir().unwrap();

    cloudsweep()
        .args(["list", "--metadata"])
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}

/// A CIS cluster cannot be listed without an IAM token
#[test]
fn test_list_requires_iam_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata.json");
    fs::write(&path, PUBLIC_METADATA).unwrap();

    cloudsweep()
        .arg("list")
        .arg("--metadata")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("IBMCLOUD_IAM_TOKEN"));
}

#[test]
fn test_destroy_rejects_metadata_without_dns_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata.json");
    fs::write(
        &path,
        PUBLIC_METADATA.replace(
            "crn:v1:bluemix:public:internet-svcs:global:a/1234abcd:cis-1::",
            "",
        ),
    )
    .unwrap();

    cloudsweep()
        .current_dir(dir.path())
        .args(["destroy", "--iam-token", "tok"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid metadata"));
}

#[test]
fn test_destroy_rejects_zero_poll_interval() {
    cloudsweep()
        .args(["destroy", "--iam-token", "tok", "--poll-interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--poll-interval"))
        .stderr(predicate::str::contains("0 is not in 1.."));
}

#[test]
fn test_destroy_rejects_zero_timeout() {
    cloudsweep()
        .args(["destroy", "--iam-token", "tok", "--timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--timeout"));
}
