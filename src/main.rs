use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

const USAGE: &str = "\
USAGE: retag <path>
EXAMPLES:
    retag 'path/to/Track File.mp3'
    retag 'path/to/Album Dir/'";

#[derive(Parser)]
#[command(name = "retag")]
#[command(about = "Tag a song or album and re-encode it in place with ffmpeg")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Song file or album directory
    path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(path) = cli.path else {
        eprintln!("{USAGE}");
        eprintln!("ERROR: Expected path to a song file or album directory");
        return ExitCode::FAILURE;
    };

    match cli::run(&path, cli.config.as_deref()) {
        Ok(()) => {
            println!("DONE!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
