use std::path::Path;

/// Filename ending that marks a recording for conversion, compared case-insensitively
pub const TARGET_SUFFIX: &str = "_TrLR.wav";

/// Check whether a filename carries the target marker
pub fn is_target(file_name: &str) -> bool {
    let suffix_len = TARGET_SUFFIX.len();
    if file_name.len() < suffix_len || !file_name.is_char_boundary(file_name.len() - suffix_len) {
        return false;
    }
    file_name[file_name.len() - suffix_len..].eq_ignore_ascii_case(TARGET_SUFFIX)
}

/// Same as [`is_target`], on the final component of a path
pub fn is_target_path(path: &Path) -> bool {
    path.file_name()
        .map(|name| is_target(&name.to_string_lossy()))
        .unwrap_or(false)
}
