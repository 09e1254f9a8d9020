use clap::Parser;
use mimalloc::MiMalloc;
use tracing::info;

use bootkit::bootstrap::{AppConfig, init_logging};
use voicemenu_host::cli::Args;
use voicemenu_host::{runtime, signal};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut cfg = AppConfig::load_or_default(&args.config)?;
    cfg.apply_cli_overrides(args.verbose);
    cfg.validate()?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    init_logging(&cfg.logging, &cfg.server.home_dir);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        home_dir = %cfg.server.home_dir.display(),
        "Starting VoiceMenu host"
    );

    let mut handle = runtime::start_runtime(&cfg).await?;

    signal::shutdown_requested().await;

    _ = runtime::stop_runtime(&mut handle, &cfg, None).await;
    Ok(())
}
