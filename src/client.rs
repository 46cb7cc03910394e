use anyhow::{Context, Result, bail};
use indicatif::ProgressBar;
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, RANGE, USER_AGENT};
use serde::de::DeserializeOwned;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::load_config;
use crate::dataset::Dataset;
use crate::download::{extract_zip, has_existing_download, progress_bar};
use crate::error::{ApiErrorResponse, format_api_error};
use crate::format::AnnotationFormat;
use crate::models::{
    ExportReply, ExportState, ProjectInfo, ProjectReply, VersionInfo, VersionReply,
    WorkspaceInfo, WorkspaceReply,
};
use crate::util::{append_query, backoff, endpoint, retriable_status, slug};

const ARCHIVE_NAME: &str = "roboflow.zip";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base API URL, typically `https://api.roboflow.com`.
    pub url: String,
    /// Private API key of the workspace.
    pub key: String,
}

/// An authenticated session with the dataset API.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    key: String,

    timeout: Duration,
    retry_max: usize,
    sleep_max: Duration,
    export_polls: usize,
    progress: bool,

    http: HttpClient,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    /// Download URL.
    pub location: String,
    /// Expected content length (bytes), when the API reports one.
    pub content_length: Option<u64>,
}

impl Client {
    /// Creates a session for `api_key`, with the base URL taken from
    /// `ROBOFLOW_API_URL` / `API_URL` or the public default.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_url(api_key, None)
    }

    pub fn with_url(api_key: impl Into<String>, url: Option<String>) -> Result<Self> {
        Self::from_config(load_config(api_key.into(), url)?)
    }

    pub fn from_config(cfg: ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("roboflow-fetch/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("roboflow-fetch")),
        );

        let http = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            url: cfg.url,
            key: cfg.key,
            timeout: Duration::from_secs(60),
            retry_max: 5,
            sleep_max: Duration::from_secs(30),
            export_polls: 60,
            progress: true,
            http,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_max(mut self, retry_max: usize) -> Self {
        self.retry_max = retry_max.max(1);
        self
    }

    pub fn with_sleep_max(mut self, sleep_max: Duration) -> Self {
        self.sleep_max = sleep_max;
        self
    }

    /// How many times to ask for an export that is still being generated.
    pub fn with_export_polls(mut self, polls: usize) -> Self {
        self.export_polls = polls.max(1);
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Looks up a workspace by its URL slug.
    pub fn workspace(&self, id: &str) -> Result<Workspace> {
        let slug = slug(id);
        let url = endpoint(&self.url, &[slug.as_str()])?;
        let reply: WorkspaceReply = self.api_json(&url, &format!("workspace {}", slug))?;
        debug!(workspace = %slug, projects = reply.workspace.projects.len(), "resolved workspace");
        Ok(Workspace {
            client: self.clone(),
            slug,
            info: reply.workspace,
        })
    }

    /// Streams `file` into `target`, resuming with a `Range` request after an
    /// interrupted read.
    pub fn download(&self, file: &RemoteFile, target: &Path) -> Result<PathBuf> {
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
        }

        let mut downloaded: u64 = 0;
        let mut range_from: Option<u64> = None;
        let mut total = file.content_length;
        let mut pb: Option<ProgressBar> = None;

        let mut tries = 0usize;
        'download_attempt: while tries < self.retry_max {
            let mut headers = HeaderMap::new();
            if let Some(from) = range_from {
                headers.insert(RANGE, HeaderValue::from_str(&format!("bytes={}-", from))?);
            }

            let resp = self.robust_request(|| {
                self.http
                    .get(&file.location)
                    .headers(headers.clone())
                    .timeout(self.timeout)
                    .send()
            })?;
            let mut resp = resp
                .error_for_status()
                .map_err(reqwest::Error::without_url)
                .context("download request failed")?;

            // A server that ignores Range sends the whole body again.
            let resumed = range_from.is_some() && resp.status() == StatusCode::PARTIAL_CONTENT;
            if !resumed {
                downloaded = 0;
                if let Some(len) = resp.content_length() {
                    total = Some(len);
                }
            }

            if self.progress && pb.is_none() {
                pb = Some(progress_bar(total));
            }
            if let Some(pb) = &pb {
                pb.set_position(downloaded);
            }

            let mut out = OpenOptions::new()
                .create(true)
                .write(true)
                .append(resumed)
                .truncate(!resumed)
                .open(target)
                .with_context(|| format!("failed to open {}", target.display()))?;

            let mut buf = [0u8; 64 * 1024];
            loop {
                let n = match resp.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        tries += 1;
                        if tries >= self.retry_max {
                            return Err(e).context("download interrupted");
                        }
                        warn!(error = %e, downloaded, "download interrupted, resuming");

                        out.flush().ok();
                        downloaded = std::fs::metadata(target)?.len();
                        range_from = Some(downloaded);
                        thread::sleep(self.sleep_max);
                        continue 'download_attempt;
                    }
                };

                out.write_all(&buf[..n])?;
                downloaded += n as u64;
                if let Some(pb) = &pb {
                    pb.inc(n as u64);
                }
            }

            out.flush()?;

            if total.is_none_or(|len| downloaded >= len) {
                if let Some(pb) = &pb {
                    pb.finish_and_clear();
                }
                debug!(bytes = downloaded, target = %target.display(), "download complete");
                return Ok(target.to_path_buf());
            }

            tries += 1;
            downloaded = std::fs::metadata(target)?.len();
            range_from = Some(downloaded);
            warn!(downloaded, expected = ?total, "download ended early, resuming");
            thread::sleep(self.sleep_max);
        }

        bail!(
            "download failed: downloaded {} byte(s) out of {}",
            downloaded,
            total.map(|t| t.to_string()).unwrap_or_else(|| "?".into())
        )
    }

    fn apply_auth(&self, req: RequestBuilder) -> RequestBuilder {
        req.query(&[("api_key", self.key.as_str())])
    }

    /// Issues an authenticated GET and returns the status with the raw body.
    fn api_get(&self, url: &str, resource: &str) -> Result<(StatusCode, String)> {
        debug!(url, "GET");
        let resp = self.robust_request(|| {
            self.apply_auth(self.http.get(url))
                .timeout(self.timeout)
                .send()
        })?;

        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        if !status.is_success() {
            if let Ok(err_json) = serde_json::from_str::<ApiErrorResponse>(&text) {
                return Err(format_api_error(status, resource, &err_json));
            }

            bail!(
                "API request failed: HTTP {} for {} ({})\n{}",
                status.as_u16(),
                resource,
                url,
                text
            );
        }

        Ok((status, text))
    }

    fn api_json<TResp: DeserializeOwned>(&self, url: &str, resource: &str) -> Result<TResp> {
        let (status, text) = self.api_get(url, resource)?;
        serde_json::from_str::<TResp>(&text)
            .with_context(|| format!("failed to parse API JSON (url={}, status={})", url, status))
    }

    fn robust_request<F>(&self, mut f: F) -> Result<Response>
    where
        F: FnMut() -> std::result::Result<Response, reqwest::Error>,
    {
        let mut tries = 0usize;
        loop {
            match f() {
                Ok(resp) => {
                    if retriable_status(resp.status().as_u16()) {
                        tries += 1;
                        if tries >= self.retry_max {
                            return Ok(resp);
                        }
                        warn!(status = resp.status().as_u16(), tries, "retrying request");
                        thread::sleep(self.sleep_max);
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    // The URL carries the api_key query parameter.
                    let err = err.without_url();
                    tries += 1;
                    if tries >= self.retry_max {
                        return Err(err).context("could not connect");
                    }
                    warn!(error = %err, tries, "request failed, retrying");
                    thread::sleep(self.sleep_max);
                }
            }
        }
    }
}

/// A namespace of projects.
#[derive(Debug, Clone)]
pub struct Workspace {
    client: Client,
    slug: String,
    info: WorkspaceInfo,
}

impl Workspace {
    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn info(&self) -> &WorkspaceInfo {
        &self.info
    }

    /// Looks up a project by slug. A full `<workspace>/<project>` id is accepted too.
    pub fn project(&self, id: &str) -> Result<Project> {
        let id = slug(id);
        let slug = slug(id.rsplit('/').next().unwrap_or(id.as_str()));
        let url = endpoint(&self.client.url, &[self.slug.as_str(), slug.as_str()])?;
        let resource = format!("project {}/{}", self.slug, slug);
        let reply: ProjectReply = self.client.api_json(&url, &resource)?;
        debug!(project = %reply.project.id, versions = reply.versions.len(), "resolved project");
        Ok(Project {
            client: self.client.clone(),
            workspace: self.slug.clone(),
            slug,
            info: reply.project,
            versions: reply.versions,
        })
    }
}

/// A versioned collection of annotated images.
#[derive(Debug, Clone)]
pub struct Project {
    client: Client,
    workspace: String,
    slug: String,
    info: ProjectInfo,
    versions: Vec<VersionInfo>,
}

impl Project {
    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn info(&self) -> &ProjectInfo {
        &self.info
    }

    /// Versions listed alongside the project, newest last as the API returns them.
    pub fn versions(&self) -> &[VersionInfo] {
        &self.versions
    }

    pub fn version(&self, number: u32) -> Result<Version> {
        let url = endpoint(
            &self.client.url,
            &[
                self.workspace.as_str(),
                self.slug.as_str(),
                number.to_string().as_str(),
            ],
        )?;
        let resource = format!("version {}/{}/{}", self.workspace, self.slug, number);
        let reply: VersionReply = self.client.api_json(&url, &resource)?;
        debug!(version = %reply.version.id, exports = ?reply.version.exports, "resolved version");
        Ok(Version {
            client: self.client.clone(),
            workspace: self.workspace.clone(),
            project: self.slug.clone(),
            number,
            info: reply.version,
        })
    }
}

/// An immutable snapshot of a project's dataset.
#[derive(Debug, Clone)]
pub struct Version {
    client: Client,
    workspace: String,
    project: String,
    number: u32,
    info: VersionInfo,
}

impl Version {
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn info(&self) -> &VersionInfo {
        &self.info
    }

    /// Asks the API for an archive of this version in `format`, waiting while
    /// the export is generated.
    pub fn export(&self, format: AnnotationFormat) -> Result<RemoteFile> {
        let url = endpoint(
            &self.client.url,
            &[
                self.workspace.as_str(),
                self.project.as_str(),
                self.number.to_string().as_str(),
                format.wire_id(),
            ],
        )?;
        let url = append_query(&url, &[("nocache", "true")]);
        let resource = format!(
            "export {}/{}/{} ({})",
            self.workspace, self.project, self.number, format
        );

        if !self.info.exports.iter().any(|e| e == format.wire_id()) {
            info!(format = %format, "export not generated yet, requesting it");
        }

        let mut sleep = Duration::from_secs(1).min(self.client.sleep_max);
        let mut last_progress: Option<f64> = None;
        for _ in 0..self.client.export_polls {
            let (status, text) = self.client.api_get(&url, &resource)?;
            let state = if status == StatusCode::ACCEPTED {
                let progress = serde_json::from_str::<ExportReply>(&text)
                    .ok()
                    .and_then(|r| r.progress);
                ExportState::Pending { progress }
            } else {
                serde_json::from_str::<ExportReply>(&text)
                    .with_context(|| format!("failed to parse export reply (url={})", url))?
                    .state(&self.client.url)?
            };

            match state {
                ExportState::Ready(file) => return Ok(file),
                ExportState::Pending { progress } => {
                    if progress != last_progress {
                        last_progress = progress;
                        let pct = progress
                            .map(|p| format!("{:.0}%", p * 100.0))
                            .unwrap_or_else(|| "?".to_string());
                        info!(progress = %pct, "export in progress");
                    }
                    thread::sleep(sleep);
                    sleep = backoff(sleep, self.client.sleep_max);
                }
            }
        }

        bail!("export of {} did not finish in time", resource)
    }

    /// Downloads and unpacks this version into `location`
    /// (default `<cwd>/<project>-<version>`).
    ///
    /// A location that already holds a subset directory is reused as-is
    /// unless `overwrite` is set.
    pub fn download(
        &self,
        format: AnnotationFormat,
        location: Option<&Path>,
        overwrite: bool,
    ) -> Result<Dataset> {
        let location = match location {
            Some(p) => p.to_path_buf(),
            None => std::env::current_dir()
                .context("failed to read current directory")?
                .join(format!("{}-{}", self.project, self.number)),
        };
        let location = std::path::absolute(&location)
            .with_context(|| format!("invalid location {}", location.display()))?;

        let dataset = Dataset {
            name: self.project.clone(),
            version: self.number,
            format,
            location,
        };

        if !overwrite && has_existing_download(&dataset.location) {
            info!(location = %dataset.location.display(), "dataset already present, skipping download");
            return Ok(dataset);
        }

        let file = self.export(format)?;
        std::fs::create_dir_all(&dataset.location).with_context(|| {
            format!("failed to create directory {}", dataset.location.display())
        })?;

        // The archive is removed on success and failure alike.
        let archive = dataset.location.join(ARCHIVE_NAME);
        let unpacked = self
            .client
            .download(&file, &archive)
            .and_then(|_| extract_zip(&archive, &dataset.location));
        let removed = match std::fs::remove_file(&archive) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        };
        let entries = unpacked?;
        removed.with_context(|| format!("failed to remove {}", archive.display()))?;
        info!(entries, location = %dataset.location.display(), "dataset extracted");

        Ok(dataset)
    }
}
