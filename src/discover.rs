//! Find the song file(s) behind a path given on the command line

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::infer::fix_title;
use crate::{Album, Error, Result, Track};

/// Result of looking at the input path.
#[derive(Debug)]
pub struct Discovery {
    pub album: Album,
    /// Subdirectories of an album directory, which are never descended into.
    pub skipped: Vec<PathBuf>,
}

/// Treat `input` as a single track or, for a directory, as an album.
///
/// # Errors
/// Returns an error if the path is inaccessible, the album directory can't be
/// listed, or a single track's parent directory can't be resolved.
pub fn discover(input: &Path, cover_names: &[String]) -> Result<Discovery> {
    let path = std::fs::canonicalize(input).map_err(|e| Error::access(input, e))?;
    let metadata = std::fs::metadata(&path).map_err(|e| Error::access(&path, e))?;

    if metadata.is_dir() {
        discover_album(&path, cover_names)
    } else {
        discover_track(path)
    }
}

fn discover_album(dir: &Path, cover_names: &[String]) -> Result<Discovery> {
    let mut album = Album {
        album: file_title(dir),
        artist: dir
            .parent()
            .filter(|p| p.is_dir())
            .map(file_title)
            .unwrap_or_default(),
        parent_dir: dir.to_path_buf(),
        ..Album::default()
    };
    let mut skipped = Vec::new();

    let entries = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in entries {
        let entry = entry.map_err(|error| Error::ListDir {
            path: dir.to_path_buf(),
            error,
        })?;
        let path = entry.path().to_path_buf();

        if entry.file_type().is_dir() {
            skipped.push(path);
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if cover_names.iter().any(|c| *c == name) {
            debug!("Cover image: {}", path.display());
            album.cover = Some(path);
            continue;
        }

        album.tracks.push(Track::from_path(path));
    }

    debug!("Found {} tracks in {}", album.tracks.len(), dir.display());
    Ok(Discovery { album, skipped })
}

fn discover_track(path: PathBuf) -> Result<Discovery> {
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::ParentDir {
            path: path.clone(),
            reason: "path has no parent".into(),
        })?;
    let is_dir = std::fs::metadata(&parent)
        .map_err(|e| Error::ParentDir {
            path: path.clone(),
            reason: e.to_string(),
        })?
        .is_dir();
    if !is_dir {
        return Err(Error::ParentDir {
            path,
            reason: "Not a directory".into(),
        });
    }

    Ok(Discovery {
        album: Album {
            tracks: vec![Track::from_path(path)],
            parent_dir: parent,
            ..Album::default()
        },
        skipped: Vec::new(),
    })
}

fn file_title(path: &Path) -> String {
    path.file_name()
        .map(|n| fix_title(&n.to_string_lossy()))
        .unwrap_or_default()
}
