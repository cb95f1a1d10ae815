use clap::Parser;

/// EdgeX grid trading bot
#[derive(Parser, Debug)]
#[command(name = "edgex-grid", version, about)]
pub struct Cli {
    /// Config file path (absence of the file is not an error)
    #[arg(short, long, default_value = "configs/edgex.toml")]
    pub config: String,

    /// Directory for the rolling log file
    #[arg(long, default_value = "logs")]
    pub log_dir: String,
}
