//! 🚀 kvb-cli: the front door of kvb.
//!
//! 🎬 *[narrator voice]* "The worker had finished. The bridge had not yet begun..."
//! 📦 Thin CLI wrapper: parse args, set up logging, load config, run the bridge,
//! print a summary. The real work happens in the `kvb` crate. Like a manager. 🦆

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// 🌉 Bridge key/value worker output into schema-typed records.
#[derive(Debug, Parser)]
#[command(name = "kvb", version)]
struct Cli {
    /// 📋 TOML config file. If it doesn't exist, configuration comes from KVB_* env vars only.
    #[arg(default_value = "kvb.toml")]
    config: PathBuf,

    /// 🤫 Skip the summary table at the end.
    #[arg(long)]
    quiet: bool,
}

/// 🚀 main(): the "I pressed enter and held my breath" moment.
///
/// 🔧 Steps:
/// 1. Init tracing to stderr
/// 2. Parse args
/// 3. Arm Ctrl-C: it asks the task to stop, it does not pull the plug
/// 4. Load config, file plus env, and run the bridge
/// 5. Report errors with a hint where we have one
#[tokio::main]
async fn main() -> ExitCode {
    // 📡 Logs go to stderr so stdout stays clean for whoever pipes us somewhere.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏸️ Ctrl-C: finishing the tuple in flight, then closing the sink");
            // -- 📴 nobody listening means the task already ended; nothing to stop
            let _ = shutdown_tx.send(true);
        }
    });

    match run(&cli, shutdown_rx.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) if *shutdown_rx.borrow() => {
            warn!("⏸️ interrupted by Ctrl-C; the sink was closed, output holds what was written");
            // -- 🪓 a stdin read parked on a blocking thread would stall runtime shutdown.
            // the sink is already closed, so leave right away.
            std::process::exit(130)
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, shutdown: watch::Receiver<bool>) -> Result<()> {
    // 🔒 a missing config file is fine, env vars can carry the whole config
    let config_file = cli
        .config
        .try_exists()
        .context(format!(
            "💀 Couldn't check whether the configuration file exists. If it's a relative path, \
             try an absolute one, to be absolutely certain. Was checking here: '{}'",
            cli.config.display()
        ))?
        .then_some(cli.config.as_path());

    let app_config = kvb::app_config::load_config(config_file)
        .context("💀 In kvb-cli we couldn't load the config. Take a look at the file and the KVB_* env vars.")?;

    let summary = kvb::run(app_config, shutdown).await?;
    if !cli.quiet {
        eprintln!("{}", summary.render());
    }
    Ok(())
}

/// 💀 Peel the onion of sadness, one layer at a time, and add a hint when we recognize one.
fn report(err: &anyhow::Error) {
    error!("💀 error: {}", err);
    for cause in err.chain().skip(1) {
        error!("⚠️  cause: {}", cause);
    }

    match err.downcast_ref::<kvb::BridgeError>() {
        Some(kvb::BridgeError::SchemaMismatch { .. }) => error!(
            "🔧 hint: bridge.mode and the record schema disagree on how many fields a record has. \
             K and V need exactly one field, KV needs exactly two."
        ),
        Some(bridge_err) if bridge_err.is_transient() => error!(
            "🔧 hint: the sink hit an I/O problem. Nothing was retried; rerunning the task may help."
        ),
        _ => {}
    }
}
