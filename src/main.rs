use anyhow::Result;
use clap::Parser;
use roboflow_fetch::{AnnotationFormat, FetchPlan, RoboflowHost, Terminal, fetch};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Download a dataset version from Roboflow and unpack it locally.
#[derive(Debug, Parser)]
#[command(about)]
struct Cli {
    /// Workspace URL slug
    #[arg(long, default_value = "maya-glyphs")]
    workspace: String,

    /// Project URL slug
    #[arg(long, default_value = "yax-w4l6k")]
    project: String,

    /// Dataset version number
    #[arg(long = "version", default_value_t = 1)]
    dataset_version: u32,

    /// Annotation format (coco, voc, yolov8, ...)
    #[arg(long, default_value = "coco")]
    format: AnnotationFormat,

    /// Target directory [default: ./<project>-<version>]
    #[arg(long)]
    location: Option<PathBuf>,

    /// Download even if the target directory already has content
    #[arg(long)]
    overwrite: bool,

    /// Hide the download progress bar
    #[arg(long)]
    no_progress: bool,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "roboflow_fetch=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut host = RoboflowHost::new()
        .with_overwrite(cli.overwrite)
        .with_progress(!cli.no_progress);
    if let Some(location) = cli.location {
        host = host.with_location(location);
    }

    let plan = FetchPlan {
        workspace: cli.workspace,
        project: cli.project,
        version: cli.dataset_version,
        format: cli.format,
    };

    fetch(&host, &mut Terminal, &plan, &mut std::io::stdout().lock())?;
    Ok(())
}
