//! Control messages from the host application.
//!
//! Wire format is a JSON object tagged by `type`. The legacy `SKIP_WAITING` and
//! `GET_VERSION` tokens are accepted as aliases.

use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Force the waiting instance to become active.
    #[serde(rename = "PROMOTE", alias = "SKIP_WAITING")]
    Promote,
    /// Reply with the active version label over the provided channel.
    #[serde(rename = "REPORT_VERSION", alias = "GET_VERSION")]
    ReportVersion,
}

impl ControlMessage {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReport {
    pub version: String,
}
