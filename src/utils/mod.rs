//! Cross-platform utilities.

pub mod platform;
pub(crate) mod process;

pub use platform::{
    command_exists, get_az_command, get_git_command, get_home_dir, is_windows, resolve_path,
};
