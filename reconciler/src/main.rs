//! Global table reconciler binary.
//!
//! Reads one lifecycle event, reconciles the global table it describes and prints the response
//! for the orchestrator on stdout.

use std::path::PathBuf;

use clap::Parser;
use ::config::Environment;
use ::config::shared::AppConfig;
use telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_app_config;
use crate::core::run_event;
use crate::error::{ReconcilerError, ReconcilerResult};

mod config;
mod core;
mod error;

#[derive(Parser)]
#[command(name = "reconciler", about = "Reconciles a global table from a lifecycle event")]
struct Args {
    /// Path of the lifecycle event JSON. Read from stdin when omitted.
    #[arg(long)]
    event: Option<PathBuf>,
}

fn main() -> std::process::ExitCode {
    match try_main() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            std::process::ExitCode::FAILURE
        }
    }
}

fn try_main() -> ReconcilerResult<()> {
    let args = Args::parse();

    let app_config = load_app_config()?;
    let environment = Environment::load()?;

    let _log_flusher =
        init_tracing(env!("CARGO_BIN_NAME"), environment).map_err(ReconcilerError::config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(args, app_config))
}

async fn async_main(args: Args, app_config: AppConfig) -> ReconcilerResult<()> {
    let response = match run_event(app_config, args.event.as_deref()).await {
        Ok(response) => response,
        Err(err) => {
            error!("{err}");
            return Err(err);
        }
    };

    let rendered = serde_json::to_string(&response)?;
    println!("{rendered}");

    if !response.is_success() {
        return Err(ReconcilerError::EventFailed(
            response.reason.unwrap_or_default(),
        ));
    }

    Ok(())
}
