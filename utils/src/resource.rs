//! Test resource directory lookup.
//!
//! Test fixtures live in a `resources` directory next to the directory holding
//! the test sources, e.g. `core/tests/suite/waits.rs` reads fixtures from
//! `core/tests/resources`.

use std::path::{Path, PathBuf};

pub const RESOURCE_DIR_NAME: &str = "resources";

/// The resource directory for a given test source file.
///
/// Pure path transform: drops the file name and its directory, then appends
/// [`RESOURCE_DIR_NAME`]. Nothing is checked on disk.
#[must_use]
pub fn resource_directory_for(source_file: &Path) -> PathBuf {
    let source_dir = source_file.parent().unwrap_or_else(|| Path::new(""));
    let root = source_dir.parent().unwrap_or_else(|| Path::new(""));
    root.join(RESOURCE_DIR_NAME)
}

/// Resolve a `file!()` path to the source file on disk.
///
/// `file!()` is relative to whichever directory cargo was invoked for (the
/// workspace root for workspace members), so the nearest ancestor of the
/// manifest directory that contains the path wins. Falls back to joining onto
/// the manifest directory when nothing matches.
#[must_use]
pub fn locate_source(manifest_dir: &Path, file: &str) -> PathBuf {
    let file = Path::new(file);
    if file.is_absolute() {
        return file.to_path_buf();
    }

    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(file);
        if candidate.is_file() {
            return candidate;
        }
    }

    tracing::debug!(
        manifest_dir = %manifest_dir.display(),
        file = %file.display(),
        "Source file not found under manifest ancestors"
    );
    manifest_dir.join(file)
}

/// Backing function for [`test_resource_directory!`](crate::test_resource_directory).
#[must_use]
pub fn test_resource_directory(manifest_dir: &str, file: &str) -> PathBuf {
    resource_directory_for(&locate_source(Path::new(manifest_dir), file))
}

/// The `resources` directory next to the calling test's source directory.
#[macro_export]
macro_rules! test_resource_directory {
    () => {
        $crate::test_resource_directory(env!("CARGO_MANIFEST_DIR"), file!())
    };
}
