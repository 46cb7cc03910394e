use anyhow::{Context, Result};
use std::io::Write;
use tracing::info;

use crate::credentials::{CredentialSource, resolve_api_key};
use crate::dataset::Dataset;
use crate::format::AnnotationFormat;
use crate::host::DatasetHost;

/// Which dataset to fetch and in what format.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub workspace: String,
    pub project: String,
    pub version: u32,
    pub format: AnnotationFormat,
}

impl Default for FetchPlan {
    fn default() -> Self {
        Self {
            workspace: "maya-glyphs".to_string(),
            project: "yax-w4l6k".to_string(),
            version: 1,
            format: AnnotationFormat::Coco,
        }
    }
}

/// Obtains the key, walks workspace, project and version, downloads once
/// and reports the location on `out`.
///
/// The first failing step ends the run; nothing after it is called.
pub fn fetch<H, C, W>(
    host: &H,
    credentials: &mut C,
    plan: &FetchPlan,
    out: &mut W,
) -> Result<Dataset>
where
    H: DatasetHost + ?Sized,
    C: CredentialSource + ?Sized,
    W: Write + ?Sized,
{
    let api_key = resolve_api_key(credentials)?;
    let session = host
        .connect(&api_key)
        .context("failed to open a session with the dataset API")?;

    writeln!(
        out,
        "Downloading {}/{} version {} ({})...",
        plan.workspace, plan.project, plan.version, plan.format
    )?;

    let workspace = host
        .workspace(&session, &plan.workspace)
        .with_context(|| format!("failed to resolve workspace {}", plan.workspace))?;
    let project = host
        .project(&workspace, &plan.project)
        .with_context(|| format!("failed to resolve project {}", plan.project))?;
    let version = host
        .version(&project, plan.version)
        .with_context(|| format!("failed to resolve version {}", plan.version))?;
    let dataset = host
        .download(&version, plan.format)
        .with_context(|| format!("failed to download dataset in {} format", plan.format))?;

    info!(subsets = ?dataset.subsets(), "download finished");
    writeln!(out, "Dataset downloaded to: {}", dataset.location.display())?;
    writeln!(out)?;
    writeln!(out, "Next: Parse annotations and add to database as sign_instances")?;

    Ok(dataset)
}
