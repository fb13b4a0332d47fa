//! Swap converted files in for the originals
//!
//! Each original is removed before its converted file is renamed over it, so
//! a failure leaves earlier tracks converted and later ones untouched. If the
//! rename itself fails the original is gone and the converted file is still
//! in the staging directory.

use std::path::Path;

use tracing::info;

use crate::{Album, CommitStep, Error, Result};

/// Replace every original with its staged counterpart, then drop the staging
/// directory. Stops at the first failure.
pub fn commit(album: Album, staging: &Path) -> Result<()> {
    for (index, track) in album.tracks.into_iter().enumerate() {
        let staged = track.staged_path.ok_or_else(|| Error::NotStaged {
            path: track.source_path.clone(),
        })?;

        std::fs::remove_file(&track.source_path).map_err(|error| Error::Commit {
            index,
            step: CommitStep::RemoveOriginal,
            path: track.source_path.clone(),
            error,
        })?;
        std::fs::rename(&staged, &track.source_path).map_err(|error| Error::Commit {
            index,
            step: CommitStep::RenameStaged,
            path: staged.clone(),
            error,
        })?;
        info!("Replaced {}", track.source_path.display());
    }

    std::fs::remove_dir_all(staging).map_err(|error| Error::Cleanup {
        path: staging.to_path_buf(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Track;
    use std::fs;
    use std::path::PathBuf;

    /// Album of `n` originals, each with a staged replacement.
    fn staged_album(dir: &Path, n: usize) -> (Album, PathBuf) {
        let staging = dir.join("converted");
        fs::create_dir(&staging).unwrap();

        let tracks = (1..=n)
            .map(|i| {
                let source = dir.join(format!("{i:02} Song.flac"));
                let staged = staging.join(format!("{i:02} Song.mp3"));
                fs::write(&source, format!("original {i}")).unwrap();
                fs::write(&staged, format!("converted {i}")).unwrap();
                Track {
                    staged_path: Some(staged),
                    ..Track::from_path(source)
                }
            })
            .collect();

        let album = Album {
            tracks,
            parent_dir: dir.to_path_buf(),
            ..Album::default()
        };
        (album, staging)
    }

    #[test]
    fn test_commit_replaces_originals() {
        let dir = tempfile::tempdir().unwrap();
        let (album, staging) = staged_album(dir.path(), 3);
        let sources: Vec<_> = album.tracks.iter().map(|t| t.source_path.clone()).collect();

        commit(album, &staging).unwrap();

        for (i, source) in sources.iter().enumerate() {
            assert_eq!(fs::read_to_string(source).unwrap(), format!("converted {}", i + 1));
        }
        assert!(!staging.exists());
    }

    #[test]
    fn test_remove_failure_stops_midway() {
        let dir = tempfile::tempdir().unwrap();
        let (mut album, staging) = staged_album(dir.path(), 4);

        // A directory where the original should be makes remove_file fail.
        let blocked = dir.path().join("03 Blocked");
        fs::create_dir(&blocked).unwrap();
        album.tracks[2].source_path = blocked.clone();
        let tracks = album.tracks.clone();

        let err = commit(album, &staging).unwrap_err();
        assert!(matches!(
            err,
            Error::Commit {
                index: 2,
                step: CommitStep::RemoveOriginal,
                ..
            }
        ));

        for track in &tracks[..2] {
            let body = fs::read_to_string(&track.source_path).unwrap();
            assert!(body.starts_with("converted"));
            assert!(!track.staged_path.as_ref().unwrap().exists());
        }
        assert!(blocked.is_dir());
        for track in &tracks[2..] {
            assert!(track.staged_path.as_ref().unwrap().exists());
        }
        assert_eq!(
            fs::read_to_string(&tracks[3].source_path).unwrap(),
            "original 4"
        );
        assert!(staging.exists());
    }

    #[test]
    fn test_rename_failure_keeps_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut album, staging) = staged_album(dir.path(), 2);
        let missing = staging.join("missing.mp3");
        album.tracks[1].staged_path = Some(missing);
        let second = album.tracks[1].source_path.clone();

        let err = commit(album, &staging).unwrap_err();

        assert!(matches!(
            err,
            Error::Commit {
                index: 1,
                step: CommitStep::RenameStaged,
                ..
            }
        ));
        assert!(!second.exists());
        assert!(staging.join("02 Song.mp3").exists());
    }

    #[test]
    fn test_cleanup_failure_after_all_tracks_committed() {
        let dir = tempfile::tempdir().unwrap();
        let (album, _staging) = staged_album(dir.path(), 2);
        let sources: Vec<_> = album.tracks.iter().map(|t| t.source_path.clone()).collect();
        let gone = dir.path().join("gone");

        let err = commit(album, &gone).unwrap_err();

        assert!(matches!(err, Error::Cleanup { ref path, .. } if *path == gone));
        assert!(!err.to_string().contains("track 0"));
        for source in &sources {
            assert!(fs::read_to_string(source).unwrap().starts_with("converted"));
        }
    }

    #[test]
    fn test_unstaged_track_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (mut album, staging) = staged_album(dir.path(), 1);
        album.tracks[0].staged_path = None;
        let source = album.tracks[0].source_path.clone();

        assert!(matches!(
            commit(album, &staging),
            Err(Error::NotStaged { .. })
        ));
        assert_eq!(fs::read_to_string(source).unwrap(), "original 1");
    }
}
