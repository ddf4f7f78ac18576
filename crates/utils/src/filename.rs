//! Helpers for turning client supplied filenames into blob names.

const MAX_FILENAME_CHARS: usize = 100;

pub const THUMBNAIL_SUFFIX: &str = "_thumb.jpg";

/// Replace anything outside `[A-Za-z0-9._-]` with `_` and cap the length.
///
/// Path separators never survive, so the result is always a single path segment.
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_CHARS)
        .collect();

    match sanitized.trim_start_matches('.') {
        "" => "upload".to_string(),
        rest => rest.to_string(),
    }
}

/// Base name of a blob path: text after the last `/`, before the last `.`.
pub fn base_name(path: &str) -> &str {
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file,
    }
}

/// Filename for the thumbnail derived from `original_path`.
pub fn thumbnail_name(original_path: &str) -> String {
    format!("{}{}", base_name(original_path), THUMBNAIL_SUFFIX)
}
