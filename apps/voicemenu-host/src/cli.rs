use std::path::PathBuf;

use clap::Parser;

/// VoiceMenu host launcher
#[derive(Debug, Parser)]
#[command(name = "voicemenu-host", version, about)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// Increase console log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
