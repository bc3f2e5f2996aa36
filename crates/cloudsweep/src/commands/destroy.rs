use crate::Target;
use crate::families;
use cloudsweep_cloud::{CloudError, ReconcileConfig, Teardown, TeardownContext};
use colored::Colorize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn handle(target: &Target, timeout: u64, poll_interval: u64, json: bool) -> anyhow::Result<()> {
    let metadata = cloudsweep_config::load_metadata(target.metadata.clone())?;
    let families = families::build(&metadata, &target.credentials())?;

    println!(
        "{}",
        format!("Tearing down {} ({})", metadata.cluster_name, metadata.infra_id)
            .yellow()
            .bold()
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current call");
            on_signal.cancel();
        }
    });

    let config = ReconcileConfig::default()
        .with_timeout(Duration::from_secs(timeout))
        .with_poll_interval(Duration::from_secs(poll_interval));

    let mut teardown = Teardown::new(TeardownContext::new(cancel));
    for family in families {
        teardown = teardown.family(family.name, config.clone(), family.registry);
    }
    println!("Families: {}", teardown.family_names().join(", ").cyan());

    match teardown.run().await {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!();
            for (kind, count) in report.summary() {
                println!("  ✓ {} {}", count, kind);
            }
            println!(
                "{}",
                format!(
                    "Teardown complete: {} deleted in {} polls ({:.1}s)",
                    report.deleted.len(),
                    report.polls,
                    report.duration_ms as f64 / 1000.0
                )
                .green()
                .bold()
            );
            Ok(())
        }
        Err(CloudError::Cancelled) => {
            println!("{}", "Teardown cancelled; some resources may remain".yellow());
            Err(CloudError::Cancelled.into())
        }
        Err(e @ CloudError::Incomplete { .. }) => {
            if let CloudError::Incomplete { pending, unseeded } = &e {
                for (kind, count) in pending {
                    println!("  ✗ {} {} still pending", count, kind);
                }
                for kind in unseeded {
                    println!("  ✗ {} could not be listed", kind);
                }
            }
            println!("{}", "Teardown incomplete".red().bold());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
