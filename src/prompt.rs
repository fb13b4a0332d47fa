//! Line-based prompts for reviewing metadata before conversion
//!
//! Every question shows its current value in brackets. An empty answer keeps
//! it, `-` clears it, anything else replaces it.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::{Album, Error, Result};

const RULE: &str = "==============================";
const CLEAR: &str = "-";

/// Input and output streams of an interactive session.
pub struct Session<R, W> {
    input: R,
    output: W,
}

impl Session<io::StdinLock<'static>, io::Stdout> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, label: &str, default: &str) -> Result<String> {
        let shown = if default.is_empty() { CLEAR } else { default };
        write!(self.output, "{label} [{shown}]: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::InputClosed);
        }

        Ok(match line.trim() {
            "" => default.to_string(),
            CLEAR => String::new(),
            answer => answer.to_string(),
        })
    }

    pub fn ask_string(&mut self, label: &str, current: &str) -> Result<String> {
        self.ask(label, current)
    }

    /// Ask for a positive integer, re-prompting until the answer parses.
    /// Zero and negative numbers count as unset.
    pub fn ask_number(&mut self, label: &str, current: Option<u32>) -> Result<Option<u32>> {
        let default = current.map(|n| n.to_string()).unwrap_or_default();
        loop {
            let answer = self.ask(label, &default)?;
            if answer.is_empty() {
                return Ok(None);
            }
            match answer.parse::<i64>() {
                Ok(n) if n <= 0 => return Ok(None),
                Ok(n) => match u32::try_from(n) {
                    Ok(n) => return Ok(Some(n)),
                    Err(_) => writeln!(self.output, "ERROR: Number too large, try again")?,
                },
                Err(_) => writeln!(self.output, "ERROR: Invalid number, try again")?,
            }
        }
    }

    /// Only a literal `yes` counts as agreement.
    pub fn ask_yes(&mut self, label: &str) -> Result<bool> {
        Ok(self.ask(label, "yes/no")? == "yes")
    }

    /// Ask for a cover image until the answer is empty or names an existing file.
    pub fn ask_cover(&mut self, current: Option<&Path>) -> Result<Option<PathBuf>> {
        let default = current
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        loop {
            let answer = self.ask("Cover image path", &default)?;
            if answer.is_empty() {
                return Ok(None);
            }
            match std::fs::metadata(&answer) {
                Ok(_) => return Ok(Some(PathBuf::from(answer))),
                Err(e) => writeln!(self.output, "ERROR: No such file, try again: {e}")?,
            }
        }
    }

    /// Walk through every editable field once.
    pub fn edit(&mut self, album: &mut Album) -> Result<()> {
        writeln!(self.output, "{RULE}")?;
        writeln!(self.output, "<Enter> for default value")?;
        writeln!(self.output, "    '-' for empty value")?;
        writeln!(self.output, "{RULE}")?;
        writeln!(self.output)?;

        if album.is_single() {
            let track = &mut album.tracks[0];
            track.number = self.ask_number("Number", track.number)?;
            track.title = self.ask_string("Title", &track.title)?;
        }

        album.artist = self.ask_string("Artist", &album.artist)?;
        album.album = self.ask_string("Album", &album.album)?;
        album.genre = self.ask_string("Genre", &album.genre)?;
        album.year = self.ask_number("Year", album.year)?;
        album.disk = self.ask_number("Disk", album.disk)?;
        album.cover = self.ask_cover(album.cover.as_deref())?;
        Ok(())
    }

    /// Show the summary and ask whether it is right.
    pub fn confirm(&mut self, album: &Album) -> Result<bool> {
        writeln!(self.output)?;
        writeln!(self.output, "{RULE}")?;
        writeln!(self.output, "Confirm")?;
        writeln!(self.output, "{RULE}")?;
        writeln!(self.output)?;
        write_summary(&mut self.output, album)?;
        writeln!(self.output)?;
        self.ask_yes("Ok?")
    }

    /// Edit and confirm until the user agrees.
    pub fn review(&mut self, album: &mut Album) -> Result<()> {
        loop {
            self.edit(album)?;
            if self.confirm(album)? {
                return Ok(());
            }
        }
    }
}

/// Render the album fields and the track table.
pub fn write_summary(out: &mut impl Write, album: &Album) -> io::Result<()> {
    let number = |n: Option<u32>| n.map_or_else(|| CLEAR.to_string(), |n| n.to_string());
    let text = |s: &str| if s.is_empty() { CLEAR.to_string() } else { s.to_string() };

    writeln!(out, "Artist: {}", text(album.artist.as_str()))?;
    writeln!(out, "Album: {}", text(album.album.as_str()))?;
    writeln!(out, "Genre: {}", text(album.genre.as_str()))?;
    writeln!(out, "Year: {}", number(album.year))?;
    writeln!(out, "Disk: {}", number(album.disk))?;
    let cover = album
        .cover
        .as_ref()
        .map_or_else(|| CLEAR.to_string(), |p| p.display().to_string());
    writeln!(out, "Cover image path: {cover}")?;
    writeln!(out)?;

    let rows: Vec<(String, String)> = album
        .tracks
        .iter()
        .map(|t| (number(t.number), text(t.title.as_str())))
        .collect();
    let width = rows
        .iter()
        .map(|(n, _)| n.chars().count())
        .chain(std::iter::once("Number".len()))
        .max()
        .unwrap_or_default();

    writeln!(out, "{:<width$} Title", "Number")?;
    for (n, title) in rows {
        writeln!(out, "{n:<width$} {title}")?;
    }
    Ok(())
}
