use std::path::Path;

use anyhow::{Context, Result};

use retag::config::Config;
use retag::discover::{discover, Discovery};
use retag::prompt::Session;
use retag::transcode::{progress_bar, Ffmpeg};

pub fn run(path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path).context("Unable to load config")?;

    let Discovery { album, skipped } = discover(path, &config.discover.cover_names)?;
    for dir in &skipped {
        eprintln!("WARN: '{}' is a directory, skip", dir.display());
    }

    let tools = Ffmpeg::new(&config.tools);
    let progress = progress_bar(album.tracks.len());
    let mut session = Session::stdio();

    retag::process(album, &mut session, &tools, &config, &progress)
        .with_context(|| format!("Failed to process {}", path.display()))
}
