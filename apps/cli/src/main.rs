//! Launchpad command-line entry point.

mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use launchpad_actions::{BuildContext, PipelineFile, Services, UploadContext};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "launchpad", version, about = "Run release pipelines")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the build pipeline, then the upload pipeline.
    Run(RunArgs),
    /// List the available actions.
    Actions,
}

#[derive(Args)]
struct RunArgs {
    /// Pipeline file (JSON).
    #[arg(long)]
    pipeline: PathBuf,

    /// Directory holding the built game.
    #[arg(long)]
    build_dir: PathBuf,

    /// Release version.
    #[arg(long)]
    version: String,

    /// Where build output is written.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Settings file (TOML).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Start as if an earlier step already failed.
    #[arg(long)]
    prior_failed: bool,

    /// Print the reports as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Actions => {
            print!("{}", output::actions_text());
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            let success = rt.block_on(run(args))?;
            Ok(if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<bool> {
    tracing::info!(
        version = %args.version,
        launchpad = env!("CARGO_PKG_VERSION"),
        "starting release"
    );

    let settings_path = args.settings.clone().unwrap_or_else(config::default_path);
    let settings = config::load_or_create(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;

    let text = std::fs::read_to_string(&args.pipeline)
        .with_context(|| format!("reading {}", args.pipeline.display()))?;
    let file = PipelineFile::from_json(&text)?;

    let services = Arc::new(Services::new(settings)?);
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("launchpad"));

    let mut build_ctx = BuildContext::new(
        Arc::clone(&services),
        &args.build_dir,
        output_dir,
        &args.version,
    );
    let upload_probe = UploadContext::new(Arc::clone(&services), &args.version);

    let mut build = file.build_pipeline(&build_ctx)?;
    let mut upload = file.upload_pipeline(&upload_probe)?;
    build.check_ready(&build_ctx)?;
    upload.check_ready(&upload_probe)?;

    let cancel = build_ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current step");
            cancel.cancel();
        }
    });

    let build_report = build
        .run(
            &mut build_ctx,
            !args.prior_failed,
            &format!("Build {}", args.version),
        )
        .await;

    let mut upload_ctx = build_ctx.into_upload();
    let upload_report = upload
        .run(
            &mut upload_ctx,
            build_report.overall_success(),
            &format!("Upload {}", args.version),
        )
        .await;

    services.butler.shutdown().await;

    if args.json {
        println!("{}", output::reports_json(&build_report, &upload_report)?);
    } else {
        print!("{}", output::report_text(&build_report));
        print!("{}", output::report_text(&upload_report));
    }

    let success = build_report.overall_success() && upload_report.overall_success();
    tracing::info!(success, "release finished");
    Ok(success)
}
