//! # Checkpoints
//!
//! The on-disk file for one stack: its name, its configuration, and the latest
//! deployment, if any update has completed.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::deployment::Deployment;
use crate::deployment::Snapshot;
use crate::deployment::deserialize_deployment;
use crate::deployment::serialize_deployment;
use crate::error::Error;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub stack: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<Deployment>,
}

impl Checkpoint {
    pub fn new(stack: impl Into<String>, config: BTreeMap<String, String>, snap: Option<&Snapshot>) -> Result<Self> {
        Ok(Self {
            stack: stack.into(),
            config,
            latest: snap.map(serialize_deployment).transpose()?,
        })
    }

    /// The latest deployment in its in-memory form.
    pub fn snapshot(&self) -> Result<Option<Snapshot>> {
        self.latest.as_ref().map(deserialize_deployment).transpose()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

pub fn write_checkpoint(path: &Path, checkpoint: &Checkpoint) -> Result<()> {
    let text = checkpoint.to_json()?;
    fs::write(path, text).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    info!(stack = %checkpoint.stack, path = %path.display(), "wrote checkpoint");
    Ok(())
}

pub fn read_checkpoint(path: &Path) -> Result<Checkpoint> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    Checkpoint::from_json(&text)
}
