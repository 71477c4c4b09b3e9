use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension appended to compressed files.
pub const COMPRESSED_SUFFIX: &str = "huff";

/// `notes.txt` -> `notes.txt.huff`
pub fn compressed_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(COMPRESSED_SUFFIX);
    PathBuf::from(name)
}

/// `notes.txt.huff` -> `notes.txt`; `None` when the suffix is missing.
pub fn decompressed_path(input: &Path) -> Option<PathBuf> {
    if input.extension()? != COMPRESSED_SUFFIX {
        return None;
    }
    let stem = input.file_stem()?;
    Some(input.with_file_name(stem))
}
