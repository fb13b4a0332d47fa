//! A full run of the `retag` binary against shell-script stand-ins for
//! ffprobe and ffmpeg.
#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Stdio};

const FFPROBE: &str = "#!/bin/sh\n\
printf 'format.format_name=\"mp3\"\\nstreams.stream.0.codec_name=\"mp3\"\\n'\n";

// Writes to the last argument, the output path.
const FFMPEG: &str = "#!/bin/sh\n\
for last in \"$@\"; do :; done\n\
printf 'converted' > \"$last\"\n";

fn script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn confirmed_run_replaces_track_and_prints_done() {
    let root = tempfile::tempdir().unwrap();
    let bin = root.path().join("bin");
    fs::create_dir(&bin).unwrap();
    script(&bin.join("ffprobe"), FFPROBE);
    script(&bin.join("ffmpeg"), FFMPEG);

    let config = root.path().join("config.toml");
    fs::write(
        &config,
        format!(
            "[tools]\nffmpeg = '{}'\nffprobe = '{}'\n",
            bin.join("ffmpeg").display(),
            bin.join("ffprobe").display()
        ),
    )
    .unwrap();

    let album = root.path().join("Artist").join("Album");
    fs::create_dir_all(&album).unwrap();
    let song = album.join("01 Intro.flac");
    fs::write(&song, b"original").unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_retag"))
        .arg("--config")
        .arg(&config)
        .arg(&album)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // number, title, artist, album, genre, year, disk, cover, confirm
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"\n\n\n\n\n2020\n\n\nyes\n")
        .unwrap();
    let out = child.wait_with_output().unwrap();

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "stderr was {stderr:?}");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.trim_end().ends_with("DONE!"));
    assert!(stdout.contains("Artist: Artist\n"));
    assert_eq!(fs::read_to_string(&song).unwrap(), "converted");
    assert!(!album.join("converted").exists());
}
