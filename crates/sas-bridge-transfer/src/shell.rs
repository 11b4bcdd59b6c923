//! Executable lookup utilities.

use std::path::{Path, PathBuf};

/// Resolve an executable by name.
///
/// The search order is:
/// 1. Explicit paths (absolute or containing a separator).
/// 2. The current process PATH via `which`.
#[must_use]
pub fn resolve_executable_path(executable: &str) -> Option<PathBuf> {
    if executable.trim().is_empty() {
        return None;
    }

    let path = Path::new(executable);
    if path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }

    match which::which(executable) {
        Ok(found) => Some(found),
        Err(err) => {
            tracing::debug!(executable, %err, "Executable not found on PATH");
            None
        }
    }
}

/// Derive the secure-copy program from a remote-shell program.
///
/// Only the file name is rewritten, so `/opt/ssh/bin/ssh` becomes
/// `/opt/ssh/bin/scp`.
#[must_use]
pub fn copy_program_for(shell_program: &str) -> String {
    let path = Path::new(shell_program);
    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => {
            let copy_name = name.replace("ssh", "scp");
            path.with_file_name(copy_name).to_string_lossy().into_owned()
        }
        None => shell_program.replace("ssh", "scp"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_program_for() {
        assert_eq!(copy_program_for("ssh"), "scp");
        assert_eq!(copy_program_for("/usr/bin/ssh"), "/usr/bin/scp");
        assert_eq!(copy_program_for("/home/ssh/bin/ssh"), "/home/ssh/bin/scp");
        assert_eq!(copy_program_for("plink"), "plink");
    }

    #[test]
    fn test_resolve_rejects_empty_and_missing() {
        assert!(resolve_executable_path("").is_none());
        assert!(resolve_executable_path("   ").is_none());
        assert!(resolve_executable_path("/nonexistent/bin/scp").is_none());
        assert!(resolve_executable_path("definitely-not-a-real-program-42").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_explicit_path() {
        let found = resolve_executable_path("/bin/sh").unwrap();
        assert_eq!(found, PathBuf::from("/bin/sh"));
    }
}
