use crate::error::AppError;
use std::env;
use std::path::{Path, PathBuf};

/// Resolves an external program the way a shell would: paths containing a
/// separator are taken as-is, bare names are looked up on `PATH`.
pub fn find_executable(program: &str) -> Result<PathBuf, AppError> {
    let unavailable = || AppError::ToolUnavailable {
        tool: program.to_string(),
    };

    if program.is_empty() {
        return Err(unavailable());
    }

    let candidate = Path::new(program);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return if is_executable(candidate) {
            Ok(candidate.to_path_buf())
        } else {
            Err(unavailable())
        };
    }

    let search_path = env::var_os("PATH").ok_or_else(unavailable)?;
    for dir in env::split_paths(&search_path) {
        for name in executable_names(program) {
            let full = dir.join(&name);
            if is_executable(&full) {
                log::debug!("Resolved {} to {:?}", program, full);
                return Ok(full);
            }
        }
    }

    Err(unavailable())
}

#[cfg(windows)]
fn executable_names(program: &str) -> Vec<String> {
    if Path::new(program).extension().is_some() {
        vec![program.to_string()]
    } else {
        vec![program.to_string(), format!("{}.exe", program)]
    }
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
