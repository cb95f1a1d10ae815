use clap::Parser;
use tracing::{error, info};

use edgex_grid::auth::AuthorizationGate;
use edgex_grid::bootstrap::{run_bootstrap, LiveRuntime};
use edgex_grid::cli::Cli;
use edgex_grid::config::{FileConfig, RawSettingSources};
use edgex_grid::logging::init_logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_dir);

    // An operator interrupt during the auth call or the engine loop is a
    // clean stop, not an error.
    let outcome = tokio::select! {
        outcome = bootstrap_and_run(&cli) => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("stopped by user");
            Ok(())
        }
    };

    if let Err(e) = outcome {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn bootstrap_and_run(cli: &Cli) -> edgex_grid::Result<()> {
    let file = FileConfig::load(&cli.config)?;
    let sources = RawSettingSources::from_live_env(file);
    run_bootstrap(&sources, &AuthorizationGate, &LiveRuntime).await
}
