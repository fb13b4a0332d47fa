//! Convert tracks into the staging directory with ffmpeg

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::config::{Config, ConvertConfig, ToolsConfig};
use crate::infer::with_extension;
use crate::{Album, AudioFormat, Error, Result, Track};

/// How the audio stream gets into the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Re-mux without re-encoding.
    Copy,
    /// Re-encode with the target's encoder at the configured bitrate.
    Encode,
}

/// One ffmpeg invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source: PathBuf,
    pub output: PathBuf,
    pub args: Vec<OsString>,
}

/// The external probe and transcode processes.
pub trait Toolchain {
    /// Describe the container and first audio stream of `path` in ffprobe's
    /// `flat` format.
    fn probe(&self, path: &Path) -> Result<String>;

    /// Run a job to completion, failing on a non-zero exit.
    fn transcode(&self, job: &Job) -> Result<()>;
}

/// ffprobe and ffmpeg found on `PATH` (or where the config says).
pub struct Ffmpeg {
    ffmpeg: String,
    ffprobe: String,
}

impl Ffmpeg {
    #[must_use]
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            ffprobe: tools.ffprobe.clone(),
        }
    }
}

impl Toolchain for Ffmpeg {
    fn probe(&self, path: &Path) -> Result<String> {
        debug!("{} -show_format -show_streams {}", self.ffprobe, path.display());
        let output = Command::new(&self.ffprobe)
            .args(["-loglevel", "quiet", "-print_format", "flat"])
            .args(["-show_format", "-show_streams", "-select_streams", "a:0"])
            .arg(path)
            .output()
            .map_err(|e| spawn_error(&self.ffprobe, e))?;

        if !output.status.success() {
            return Err(Error::Probe {
                path: path.to_path_buf(),
                reason: output.status.to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn transcode(&self, job: &Job) -> Result<()> {
        debug!("{} {}", self.ffmpeg, join_args(&job.args));
        let status = Command::new(&self.ffmpeg)
            .args(&job.args)
            .status()
            .map_err(|e| spawn_error(&self.ffmpeg, e))?;

        if !status.success() {
            return Err(Error::Transcode {
                path: job.source.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

fn spawn_error(tool: &str, e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::NotFound {
        Error::ToolMissing(tool.to_string())
    } else {
        Error::Io(e)
    }
}

fn join_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Container names listed on the `format.format_name` line of ffprobe output.
#[must_use]
pub fn format_names(probe_output: &str) -> Vec<&str> {
    probe_output
        .lines()
        .find_map(|line| line.strip_prefix("format.format_name="))
        .map(|value| value.trim().trim_matches('"').split(',').collect())
        .unwrap_or_default()
}

/// Codec of the first stream listed in ffprobe output.
#[must_use]
pub fn audio_codec(probe_output: &str) -> Option<&str> {
    probe_output.lines().find_map(|line| {
        let (_, value) = line
            .strip_prefix("streams.stream.")?
            .split_once(".codec_name=")?;
        Some(value.trim().trim_matches('"'))
    })
}

/// Stream-copy only when both container and codec already match the target.
#[must_use]
pub fn choose_codec(probe_output: &str, target: AudioFormat) -> Codec {
    let same_container = format_names(probe_output).contains(&target.probe_name());
    if same_container && audio_codec(probe_output) == Some(target.codec_name()) {
        Codec::Copy
    } else {
        Codec::Encode
    }
}

struct Args(Vec<OsString>);

impl Args {
    fn push(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.0.push(arg.as_ref().to_os_string());
        self
    }

    fn tag(&mut self, key: &str, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.push("-metadata").push(format!("{key}={value}"));
        }
        self
    }

    fn number_tag(&mut self, key: &str, value: Option<u32>) -> &mut Self {
        if let Some(n) = value.filter(|n| *n > 0) {
            self.push("-metadata").push(format!("{key}={n}"));
        }
        self
    }
}

/// Build the ffmpeg invocation converting `track` into `staging`.
#[must_use]
pub fn build_job(
    album: &Album,
    track: &Track,
    codec: Codec,
    staging: &Path,
    config: &Config,
) -> Job {
    let ConvertConfig {
        target,
        bitrate,
        tag_version,
        ..
    } = &config.convert;
    let output = staged_output(track, staging, *target);

    let mut args = Args(Vec::new());
    args.push("-nostdin")
        .push("-loglevel")
        .push(&config.tools.loglevel)
        .push("-i")
        .push(&track.source_path);

    match &album.cover {
        Some(cover) => {
            args.push("-i")
                .push(cover)
                .push("-map")
                .push("0:0")
                .push("-map")
                .push("1:0");
        }
        // Drops any cover or tags already embedded in the source.
        None => {
            args.push("-map").push("0:a").push("-map_metadata").push("-1");
        }
    }

    args.push("-id3v2_version").push(tag_version.to_string());
    args.number_tag("track", track.number)
        .tag("title", &track.title)
        .tag("artist", &album.artist)
        .tag("album", &album.album)
        .tag("genre", &album.genre)
        .number_tag("year", album.year)
        .number_tag("disk", album.disk);

    match codec {
        Codec::Copy => {
            args.push("-codec").push("copy");
        }
        Codec::Encode => {
            args.push("-c:a")
                .push(target.encoder())
                .push("-b:a")
                .push(bitrate);
        }
    }
    args.push(&output);

    Job {
        source: track.source_path.clone(),
        output,
        args: args.0,
    }
}

fn staged_output(track: &Track, staging: &Path, target: AudioFormat) -> PathBuf {
    staging.join(with_extension(&track.base_name, target.extension()))
}

/// Fail if two tracks would be converted to the same staged file, e.g.
/// `01 A.flac` and `01 A.wav`.
pub fn check_collisions(album: &Album, staging: &Path, target: AudioFormat) -> Result<()> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    for track in &album.tracks {
        let output = staged_output(track, staging, target);
        if let Some(first) = seen.get(&output) {
            return Err(Error::StagingCollision {
                first: first.to_path_buf(),
                second: track.source_path.clone(),
                output,
            });
        }
        seen.insert(output, &track.source_path);
    }
    Ok(())
}

/// Remove any leftover staging directory and create it afresh.
pub fn prepare_staging(path: &Path) -> Result<()> {
    let staging_error = |error| Error::Staging {
        path: path.to_path_buf(),
        error,
    };

    match std::fs::remove_dir_all(path) {
        Ok(()) => info!("Removed stale {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(staging_error(e)),
    }
    std::fs::create_dir_all(path).map_err(staging_error)
}

#[must_use]
pub fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("Converting song {pos}/{len}: {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Convert every track into the staging directory, in order.
///
/// On success each track's `staged_path` is set and the staging directory is
/// returned. On failure nothing is recorded and whatever was already staged
/// stays on disk.
pub fn convert_all(
    album: &mut Album,
    tools: &impl Toolchain,
    config: &Config,
    progress: &ProgressBar,
) -> Result<PathBuf> {
    album.ensure_tracks()?;

    let staging = album.staging_dir(&config.convert.staging_dir);
    check_collisions(album, &staging, config.convert.target)?;
    prepare_staging(&staging)?;
    info!("Staging into {}", staging.display());

    let mut staged = Vec::with_capacity(album.tracks.len());
    for (index, track) in album.tracks.iter().enumerate() {
        progress.set_position(index as u64 + 1);
        progress.set_message(track.source_path.display().to_string());

        let probe = tools.probe(&track.source_path)?;
        let codec = choose_codec(&probe, config.convert.target);
        debug!("{}: {codec:?}", track.source_path.display());

        let job = build_job(album, track, codec, &staging, config);
        tools.transcode(&job)?;
        staged.push(job.output);
    }
    progress.finish();

    for (track, path) in album.tracks.iter_mut().zip(staged) {
        track.staged_path = Some(path);
    }
    Ok(staging)
}
