//! Platform-specific helpers: executable names for the external tools and
//! shell-style path expansion.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Returns the git executable name for this platform.
#[must_use]
pub const fn get_git_command() -> &'static str {
    if is_windows() {
        "git.exe"
    } else {
        "git"
    }
}

/// Returns the Azure CLI executable name for this platform.
///
/// On Windows `az` is installed as a batch wrapper, which `Command` does not
/// resolve without the extension.
#[must_use]
pub const fn get_az_command() -> &'static str {
    if is_windows() {
        "az.cmd"
    } else {
        "az"
    }
}

/// Checks whether `cmd` resolves to an executable on PATH.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Gets the home directory path for the current user.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine home directory.\n\n\
            Set the HOME environment variable (or USERPROFILE on Windows)"
        )
    })
}

/// Resolves a user-supplied path with `~/` and environment variable expansion.
///
/// ```rust,no_run
/// use imgsweep_cli::utils::platform::resolve_path;
///
/// # fn example() -> anyhow::Result<()> {
/// let repo = resolve_path("$HOME/src/bond")?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error for `~user` forms, a missing home directory, or an
/// undefined environment variable.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = if let Some(stripped) = path.strip_prefix("~/") {
        get_home_dir()?.join(stripped)
    } else if path.starts_with('~') && path.len() > 1 {
        return Err(anyhow::anyhow!(
            "Invalid path: {path}\n\n\
            Tilde expansion only supports '~/' for home directory"
        ));
    } else if path == "~" {
        get_home_dir()?
    } else {
        PathBuf::from(path)
    };

    let path_str = expanded.to_string_lossy();
    let expanded_str = shellexpand::env(&path_str)
        .with_context(|| {
            format!(
                "Failed to expand environment variables in path: {path_str}\n\n\
                Use $VAR or ${{VAR}} and make sure the variable is defined"
            )
        })?
        .into_owned();

    Ok(PathBuf::from(expanded_str))
}
