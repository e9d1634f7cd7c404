//! Remote-state file linkage repair
//!
//! The state backend keeps one well-known state file path per working
//! directory and does not support per-environment sub-paths, so the
//! well-known path is maintained as a symlink to a per-environment state
//! file. This routine makes that link correct no matter what it finds, and
//! is safe to re-run or interrupt: at no point does the per-environment
//! state file stop being referenceable by its own name.

use std::path::Path;

use crate::error::Result;

/// Ensure `link` is a symlink pointing at `target_name`.
///
/// - nothing at `link`: do nothing (first init creates the state remotely)
/// - already a symlink to `target_name`: do nothing
/// - a symlink elsewhere: re-point it
/// - a plain file: rename it to `target_name` beside the link, then link
pub fn repair_state_link(link: &Path, target_name: &str) -> Result<()> {
    let metadata = match std::fs::symlink_metadata(link) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(link = %link.display(), "no state file present, nothing to link");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if metadata.file_type().is_symlink() {
        let current = std::fs::read_link(link)?;
        if current == Path::new(target_name) {
            tracing::debug!(link = %link.display(), target = target_name, "state link already correct");
            return Ok(());
        }
        tracing::info!(
            link = %link.display(),
            from = %current.display(),
            to = target_name,
            "re-pointing state link"
        );
        std::fs::remove_file(link)?;
        symlink(target_name, link)?;
        return Ok(());
    }

    // Plain file: this directory was last used without per-environment
    // state. Claim the file for this environment, then link to it.
    let target = link
        .parent()
        .map(|dir| dir.join(target_name))
        .unwrap_or_else(|| target_name.into());
    tracing::info!(
        from = %link.display(),
        to = %target.display(),
        "renaming plain state file and linking"
    );
    std::fs::rename(link, &target)?;
    symlink(target_name, link)?;
    Ok(())
}

#[cfg(unix)]
fn symlink(target: &str, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}
