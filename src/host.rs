use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{Client, Project, Version, Workspace};
use crate::dataset::Dataset;
use crate::format::AnnotationFormat;

/// The remote side of a fetch: each call turns one handle into the next.
pub trait DatasetHost {
    type Session;
    type Workspace;
    type Project;
    type Version;

    fn connect(&self, api_key: &str) -> Result<Self::Session>;

    fn workspace(&self, session: &Self::Session, id: &str) -> Result<Self::Workspace>;

    fn project(&self, workspace: &Self::Workspace, id: &str) -> Result<Self::Project>;

    fn version(&self, project: &Self::Project, number: u32) -> Result<Self::Version>;

    fn download(&self, version: &Self::Version, format: AnnotationFormat) -> Result<Dataset>;
}

/// [`DatasetHost`] backed by the Roboflow REST API.
#[derive(Debug, Clone)]
pub struct RoboflowHost {
    url: Option<String>,
    location: Option<PathBuf>,
    overwrite: bool,
    progress: bool,
    sleep_max: Option<Duration>,
    export_polls: Option<usize>,
}

impl Default for RoboflowHost {
    fn default() -> Self {
        Self {
            url: None,
            location: None,
            overwrite: false,
            progress: true,
            sleep_max: None,
            export_polls: None,
        }
    }
}

impl RoboflowHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API base URL (otherwise taken from the environment).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Longest pause between retries and export polls.
    pub fn with_sleep_max(mut self, sleep_max: Duration) -> Self {
        self.sleep_max = Some(sleep_max);
        self
    }

    pub fn with_export_polls(mut self, polls: usize) -> Self {
        self.export_polls = Some(polls);
        self
    }
}

impl DatasetHost for RoboflowHost {
    type Session = Client;
    type Workspace = Workspace;
    type Project = Project;
    type Version = Version;

    fn connect(&self, api_key: &str) -> Result<Client> {
        let mut client = Client::with_url(api_key, self.url.clone())?.with_progress(self.progress);
        if let Some(sleep_max) = self.sleep_max {
            client = client.with_sleep_max(sleep_max);
        }
        if let Some(polls) = self.export_polls {
            client = client.with_export_polls(polls);
        }
        Ok(client)
    }

    fn workspace(&self, session: &Client, id: &str) -> Result<Workspace> {
        session.workspace(id)
    }

    fn project(&self, workspace: &Workspace, id: &str) -> Result<Project> {
        workspace.project(id)
    }

    fn version(&self, project: &Project, number: u32) -> Result<Version> {
        project.version(number)
    }

    fn download(&self, version: &Version, format: AnnotationFormat) -> Result<Dataset> {
        version.download(format, self.location.as_deref(), self.overwrite)
    }
}
