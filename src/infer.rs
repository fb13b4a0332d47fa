//! Default metadata from file and directory names
//!
//! Track files are expected to look like `<number> <title>.<ext>`. Since a
//! title can't contain a path separator, `___` stands in for `/`.

/// Trim a raw name and turn every `___` into `/`.
#[must_use]
pub fn fix_title(raw: &str) -> String {
    raw.trim().replace("___", "/")
}

/// Split a track's base name into its number and title.
///
/// The number is whatever precedes the first space, if it parses as a
/// positive integer. The rest, minus its extension, is the title.
#[must_use]
pub fn infer_number_and_title(base_name: &str) -> (Option<u32>, String) {
    let (number, title) = match base_name.split_once(' ') {
        Some((head, rest)) => (head.parse::<u32>().ok().filter(|n| *n > 0), rest),
        None => (None, base_name),
    };

    (number, fix_title(strip_extension(title.trim())))
}

/// Rewrite the extension of `base_name`. Names without one are left alone.
#[must_use]
pub fn with_extension(base_name: &str, ext: &str) -> String {
    match base_name.rfind('.') {
        Some(idx) if idx > 0 => format!("{}.{ext}", &base_name[..idx]),
        _ => base_name.to_string(),
    }
}

// A leading dot marks a hidden file, not an extension.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}
