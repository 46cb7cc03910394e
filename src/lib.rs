//! A small Rust client for downloading dataset versions from the Roboflow API.
//!
//! This crate implements a `roboflow`-style flow:
//! open a session with an API key, resolve workspace, project and version,
//! then download the version in an annotation format and unpack it locally.
//!
//! ## Quick start
//! - Set `ROBOFLOW_API_KEY` (the [`Terminal`] credential source prompts for it otherwise).
//! - Call [`fetch`] with a [`RoboflowHost`] and a [`FetchPlan`], or drive the
//!   [`Client`] handles yourself.
//!
//! ```no_run
//! use anyhow::Result;
//! use roboflow_fetch::{AnnotationFormat, Client};
//!
//! fn main() -> Result<()> {
//!     let client = Client::new(std::env::var("ROBOFLOW_API_KEY")?)?;
//!     let dataset = client
//!         .workspace("maya-glyphs")?
//!         .project("yax-w4l6k")?
//!         .version(1)?
//!         .download(AnnotationFormat::Coco, None, false)?;
//!     println!("{}", dataset.location.display());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod client;
mod config;
mod credentials;
mod dataset;
mod download;
mod error;
mod fetcher;
mod format;
mod host;
mod models;
mod util;

pub use client::{Client, ClientConfig, Project, RemoteFile, Version, Workspace};
pub use config::{API_KEY_ENV, DEFAULT_API_URL};
pub use credentials::{CredentialSource, PROMPT, Terminal, resolve_api_key};
pub use dataset::{Dataset, Subset};
pub use fetcher::{FetchPlan, fetch};
pub use format::AnnotationFormat;
pub use host::{DatasetHost, RoboflowHost};
pub use models::{ProjectInfo, ProjectSummary, VersionInfo, WorkspaceInfo};
