pub mod commit;
pub mod config;
pub mod discover;
pub mod infer;
pub mod prompt;
pub mod transcode;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Formats the converted files can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Flac,
    Ogg,
    Opus,
}

impl AudioFormat {
    /// File extension of the staged output.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
        }
    }

    /// Name ffprobe reports in `format_name` for this container.
    #[must_use]
    pub const fn probe_name(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Ogg | Self::Opus => "ogg",
        }
    }

    /// Codec ffprobe reports for the audio stream. Ogg and Opus share a
    /// container, so only this tells them apart.
    #[must_use]
    pub const fn codec_name(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Ogg => "vorbis",
            Self::Opus => "opus",
        }
    }

    /// ffmpeg encoder used when the source has to be re-encoded.
    #[must_use]
    pub const fn encoder(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::Flac => "flac",
            Self::Ogg => "libvorbis",
            Self::Opus => "libopus",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub number: Option<u32>,
    pub title: String,
    pub source_path: PathBuf,
    pub base_name: String,
    /// Set once the track has been converted into the staging directory.
    pub staged_path: Option<PathBuf>,
}

impl Track {
    /// Build a track from a file path, inferring number and title from its name.
    #[must_use]
    pub fn from_path(path: PathBuf) -> Self {
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (number, title) = infer::infer_number_and_title(&base_name);
        Self {
            number,
            title,
            source_path: path,
            base_name,
            staged_path: None,
        }
    }
}

/// Album-level metadata plus the tracks it applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Album {
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub year: Option<u32>,
    pub disk: Option<u32>,
    pub cover: Option<PathBuf>,
    pub tracks: Vec<Track>,
    /// Directory the staging directory is created in.
    pub parent_dir: PathBuf,
}

impl Album {
    #[must_use]
    pub fn staging_dir(&self, name: &str) -> PathBuf {
        self.parent_dir.join(name)
    }

    pub fn ensure_tracks(&self) -> Result<()> {
        if self.tracks.is_empty() {
            return Err(Error::NoTracks(self.parent_dir.clone()));
        }
        Ok(())
    }

    #[must_use]
    pub const fn is_single(&self) -> bool {
        self.tracks.len() == 1
    }
}

/// Which step of the commit protocol failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStep {
    RemoveOriginal,
    RenameStaged,
}

impl fmt::Display for CommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RemoveOriginal => "remove original",
            Self::RenameStaged => "move converted file into place",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}: {error}", path.display())]
    Access {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Unable to get parent dir of {}: {reason}", path.display())]
    ParentDir { path: PathBuf, reason: String },

    #[error("Unable to read album dir {}: {error}", path.display())]
    ListDir {
        path: PathBuf,
        error: walkdir::Error,
    },

    #[error("No songs found in {}", .0.display())]
    NoTracks(PathBuf),

    #[error("Input closed while waiting for an answer")]
    InputClosed,

    #[error("Unable to prepare staging dir {}: {error}", path.display())]
    Staging {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("'{0}' not found, is it installed and on PATH?")]
    ToolMissing(String),

    #[error("Unable to probe {}: {reason}", path.display())]
    Probe { path: PathBuf, reason: String },

    #[error("Song conversion failed for {} ({status})", path.display())]
    Transcode { path: PathBuf, status: String },

    #[error("Track {} was never converted", path.display())]
    NotStaged { path: PathBuf },

    #[error("Commit failed at track {index} ({step}) on {}: {error}", path.display())]
    Commit {
        index: usize,
        step: CommitStep,
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("All tracks replaced, but unable to remove staging dir {}: {error}", path.display())]
    Cleanup {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Tracks {} and {} would both be staged as {}", first.display(), second.display(), output.display())]
    StagingCollision {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn access(path: &Path, error: std::io::Error) -> Self {
        Self::Access {
            path: path.to_path_buf(),
            error,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Review the metadata with the user, convert every track, then swap the
/// converted files in for the originals.
pub fn process<R, W>(
    mut album: Album,
    session: &mut prompt::Session<R, W>,
    tools: &impl transcode::Toolchain,
    config: &config::Config,
    progress: &indicatif::ProgressBar,
) -> Result<()>
where
    R: std::io::BufRead,
    W: std::io::Write,
{
    album.ensure_tracks()?;
    session.review(&mut album)?;
    let staging = transcode::convert_all(&mut album, tools, config, progress)?;
    commit::commit(album, &staging)
}
