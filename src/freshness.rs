//! Mtime-based freshness detection for generated files.
//!
//! Used by the image task to skip outputs that are already up to date.
//! Timestamps are reliable here because the comparison is source file vs
//! its own generated output.

use std::path::Path;
use std::time::SystemTime;

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Check if an output file is fresh with respect to its source.
///
/// Fresh means the output exists and is not older than the source, so the
/// transformation can be skipped.
pub fn is_output_fresh(source: &Path, output: &Path) -> bool {
    let (Some(source_time), Some(output_time)) = (get_mtime(source), get_mtime(output)) else {
        return false;
    };
    output_time >= source_time
}
