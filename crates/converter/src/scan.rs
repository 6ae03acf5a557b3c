use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use log::{debug, info, warn};
use crate::error::{ConvertError, Result};
use crate::matcher;

/// Walk `root` and collect every file carrying the target marker.
///
/// The root must already exist. Results are in traversal order, which is not
/// sorted and may differ between filesystems. Symlinks are followed; a
/// directory reached twice (link loop or two links to one tree) is walked once.
pub fn scan_targets(root: &Path) -> Result<Vec<PathBuf>> {
    info!("Scanning directory: {}", root.display());

    let mut targets = Vec::new();
    let mut visited_dirs: HashSet<PathBuf> = HashSet::new();
    let mut entry_count = 0usize;

    let mut walker = WalkDir::new(root).follow_links(true).into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.loop_ancestor().is_some() => {
                warn!("Skipping symlink loop: {}", e);
                continue;
            }
            Err(e) => return Err(ConvertError::Scan(e)),
        };
        entry_count += 1;

        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            let canonical = path
                .canonicalize()
                .map_err(|e| ConvertError::io(format!("Failed to resolve directory: {}", path.display()), e))?;
            if !visited_dirs.insert(canonical) {
                debug!("Already visited, skipping: {}", path.display());
                walker.skip_current_dir();
            }
            continue;
        }

        if !file_type.is_file() {
            continue;
        }

        if matcher::is_target(&entry.file_name().to_string_lossy()) {
            debug!("Found target: {}", path.display());
            targets.push(path.to_path_buf());
        }
    }

    info!("Finished scanning {}: {} entries, {} targets",
          root.display(), entry_count, targets.len());
    Ok(targets)
}
