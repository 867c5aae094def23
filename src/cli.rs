use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "oggshift")]
#[command(version, about = "Convert OGG files to MP3, falling back to WAV", long_about = None)]
pub struct Args {
    /// OGG file or folder to convert (folders are scanned recursively)
    #[arg(required_unless_present = "print_config")]
    pub input: Option<PathBuf>,

    /// Folder that receives one subfolder per converted file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Start converting immediately, even when MP3 output is unavailable
    #[arg(short, long, default_value_t = false)]
    pub yes: bool,

    /// Print progress lines instead of drawing the terminal UI
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long, default_value_t = false)]
    pub print_config: bool,
}
