use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Kokoro speech server
#[derive(Debug, Parser)]
#[command(name = "kokoro", about = "HTTP text-to-speech server returning MP3")]
pub struct Args {
    /// Path to configuration file; built-in defaults are used when absent
    #[arg(short, long, env = "KOKORO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, env = "KOKORO_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directives, e.g. `info` or `tts=debug,info`
    #[arg(long, default_value = "info", env = "KOKORO_LOG")]
    pub log_filter: String,
}
