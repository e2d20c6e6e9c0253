use anyhow::Result;
use clap::Parser;

use notify_infrastructure::CONFIG_PATH_ENV;

#[derive(Parser, Debug)]
#[command(name = "hr-notify")]
#[command(about = "HR Portal notification service", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = notify_bootstrap::telemetry::init()?;

    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var(CONFIG_PATH_ENV, config);
    }

    notify_bootstrap::run_standalone().await
}
