mod platform;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use console_core::View;
use console_gateway::{GatewaySettings, DEFAULT_BASE_URL};
use log::LevelFilter;

use platform::logging::LogDestination;

/// Operator console for the scraping service.
#[derive(Parser, Debug)]
#[command(
    name = "scrape-console",
    version,
    about = "Live task, result and log views for the scraping service"
)]
struct Cli {
    /// Base URL of the service API.
    #[arg(long = "base-url", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// File holding selections remembered across runs.
    #[arg(long = "state-file", default_value = ".console_state.ron")]
    state_file: PathBuf,

    /// Log file; pass an empty value to log to the terminal only.
    #[arg(short = 'l', long = "log-file", default_value = "console.log")]
    log_file: PathBuf,

    #[arg(long = "log-level", default_value = "info")]
    log_level: LevelFilter,

    /// View shown at start: tasks, results, logs or settings.
    #[arg(long = "view", default_value = "tasks", value_parser = parse_view)]
    view: View,

    #[arg(long = "request-timeout-secs", default_value_t = 30)]
    request_timeout_secs: u64,
}

fn parse_view(raw: &str) -> Result<View, String> {
    View::parse(raw).ok_or_else(|| format!("unknown view '{raw}'"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let destination = if cli.log_file.as_os_str().is_empty() {
        LogDestination::Terminal
    } else {
        LogDestination::File(cli.log_file.clone())
    };
    platform::logging::initialize(destination, cli.log_level);

    let settings = GatewaySettings {
        base_url: cli.base_url,
        request_timeout: Duration::from_secs(cli.request_timeout_secs.max(1)),
        ..GatewaySettings::default()
    };

    platform::app::run(platform::app::AppConfig {
        settings,
        state_file: cli.state_file,
        initial_view: cli.view,
    })
    .await
}
