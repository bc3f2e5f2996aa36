//! Cloud Resource Names
//!
//! `crn:version:cname:ctype:service-name:location:scope:service-instance:resource-type:resource`

use crate::error::{IbmError, Result};
use std::fmt;
use std::str::FromStr;

const SEGMENTS: usize = 10;

/// A parsed IBM Cloud CRN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crn {
    pub version: String,
    pub cname: String,
    pub ctype: String,
    pub service_name: String,
    /// Region or zone, e.g. `us-south`
    pub region: String,
    pub scope: String,
    pub service_instance: String,
    pub resource_type: String,
    pub resource: String,
}

impl Crn {
    pub fn parse(s: &str) -> Result<Self> {
        let segments: Vec<&str> = s.split(':').collect();
        if segments.len() != SEGMENTS {
            return Err(IbmError::invalid_crn(
                s,
                format!("expected {} segments, found {}", SEGMENTS, segments.len()),
            ));
        }
        if segments[0] != "crn" {
            return Err(IbmError::invalid_crn(s, "must start with \"crn\""));
        }

        Ok(Self {
            version: segments[1].to_string(),
            cname: segments[2].to_string(),
            ctype: segments[3].to_string(),
            service_name: segments[4].to_string(),
            region: segments[5].to_string(),
            scope: segments[6].to_string(),
            service_instance: segments[7].to_string(),
            resource_type: segments[8].to_string(),
            resource: segments[9].to_string(),
        })
    }
}

impl FromStr for Crn {
    type Err = IbmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Crn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "crn:{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.version,
            self.cname,
            self.ctype,
            self.service_name,
            self.region,
            self.scope,
            self.service_instance,
            self.resource_type,
            self.resource
        )
    }
}
