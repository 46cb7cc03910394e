use anyhow::{Result, bail};
use std::collections::BTreeMap;

use crate::client::RemoteFile;
use crate::util::urljoin;

#[derive(Debug, serde::Deserialize)]
pub(crate) struct WorkspaceReply {
    pub(crate) workspace: WorkspaceInfo,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct WorkspaceInfo {
    #[serde(default)]
    pub name: String,
    /// URL slug of the workspace.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProjectSummary {
    /// `<workspace>/<project>`.
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ProjectReply {
    pub(crate) project: ProjectInfo,
    #[serde(default)]
    pub(crate) versions: Vec<VersionInfo>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProjectInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub classes: BTreeMap<String, u64>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct VersionReply {
    pub(crate) version: VersionInfo,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct VersionInfo {
    /// `<workspace>/<project>/<version>`.
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Formats already generated server side.
    #[serde(default)]
    pub exports: Vec<String>,
    #[serde(default)]
    pub images: Option<u64>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ExportReply {
    #[serde(default)]
    pub(crate) export: Option<ExportLink>,
    #[serde(default)]
    pub(crate) ready: Option<bool>,
    #[serde(default)]
    pub(crate) progress: Option<f64>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ExportLink {
    pub(crate) link: String,
}

#[derive(Debug, PartialEq)]
pub(crate) enum ExportState {
    Ready(RemoteFile),
    Pending { progress: Option<f64> },
}

impl ExportReply {
    pub(crate) fn state(&self, base_url: &str) -> Result<ExportState> {
        if let Some(export) = &self.export {
            let link = export.link.trim();
            if link.is_empty() {
                bail!("missing export link in API reply");
            }
            return Ok(ExportState::Ready(RemoteFile {
                location: urljoin(base_url, link),
                content_length: None,
            }));
        }

        if self.ready == Some(false) || self.progress.is_some() {
            return Ok(ExportState::Pending {
                progress: self.progress,
            });
        }

        bail!("missing export info in API reply")
    }
}
