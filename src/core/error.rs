//! Error handling for imgsweep
//!
//! Errors follow two rules:
//! 1. **Strongly-typed errors** ([`SweepError`]) so callers can tell a failed
//!    git invocation apart from a parse failure or the empty-live-set guard
//! 2. **User-friendly messages** ([`ErrorContext`]) with details and a
//!    suggestion for CLI display
//!
//! Library functions return [`anyhow::Result`] and wrap [`SweepError`] values
//! with [`anyhow::Context`]. [`user_friendly_error`] digs the typed error back
//! out of the chain at the top level.
//!
//! # Error Categories
//!
//! - **Backend invocations**: [`SweepError::GitCommandError`],
//!   [`SweepError::AzCommandError`], [`SweepError::CommandTimedOut`]
//! - **Malformed input**: [`SweepError::TreeListingParse`],
//!   [`SweepError::MalformedImageReference`], [`SweepError::ManifestParseError`]
//! - **Safety guard**: [`SweepError::EmptyLiveSet`]
//! - **Setup**: [`SweepError::GitNotFound`], [`SweepError::GitRepoInvalid`],
//!   [`SweepError::ConfigError`], [`SweepError::InvalidMinAge`],
//!   [`SweepError::MinAgeOutOfRange`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use imgsweep_cli::core::{SweepError, user_friendly_error};
//!
//! let error = anyhow::Error::from(SweepError::EmptyLiveSet);
//! let ctx = user_friendly_error(error);
//! ctx.display(); // colored output on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for imgsweep operations.
///
/// Every variant is fatal to the run: nothing in the resolution engine retries
/// or recovers internally. References that fall outside the expected registry
/// prefix are not errors and have no variant here.
#[derive(Error, Debug)]
pub enum SweepError {
    /// A git invocation exited with a non-zero status.
    ///
    /// The captured output is kept verbatim so the top level can show exactly
    /// what git printed.
    #[error("Git command failed with {}: {command}", describe_exit_code(.exit_code))]
    GitCommandError {
        /// The full command line that was executed
        command: String,
        /// Process exit code, `None` when terminated by a signal
        exit_code: Option<i32>,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// An Azure CLI invocation exited with a non-zero status.
    #[error("Azure CLI command failed with {}: {command}", describe_exit_code(.exit_code))]
    AzCommandError {
        /// The full command line that was executed
        command: String,
        /// Process exit code, `None` when terminated by a signal
        exit_code: Option<i32>,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// A backend invocation did not finish within its timeout.
    #[error("Command timed out after {seconds} seconds: {command}")]
    CommandTimedOut {
        /// The full command line that was executed
        command: String,
        /// The timeout that elapsed
        seconds: u64,
    },

    /// Git executable not found in PATH
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// The repository path does not point at a git repository
    #[error("Not a valid git repository: {path}")]
    GitRepoInvalid {
        /// The path that was checked
        path: String,
    },

    /// A `git ls-tree` output line had fewer than three fields.
    #[error("Cannot parse ls-tree output: \"{line}\"")]
    TreeListingParse {
        /// The offending output line
        line: String,
    },

    /// An image reference under the expected prefix has no tag after a `:`.
    #[error("Image reference \"{reference}\" has no tag after a ':' separator")]
    MalformedImageReference {
        /// The offending reference
        reference: String,
    },

    /// No live tags were found.
    ///
    /// Deleting with an empty live set would remove every image older than
    /// the retention age, so this aborts the run before any registry call.
    #[error("No active tags. This can delete all images, so aborting.")]
    EmptyLiveSet,

    /// Negative `--min-age`
    #[error("--min-age must be non-negative, but got {value}")]
    InvalidMinAge {
        /// The rejected value
        value: i64,
    },

    /// `--min-age` too large to represent as a duration
    #[error("--min-age {value} days is out of range")]
    MinAgeOutOfRange {
        /// The rejected value
        value: i64,
    },

    /// Manifest JSON could not be decoded
    #[error("Invalid manifest listing from {source_name}: {reason}")]
    ManifestParseError {
        /// Where the listing came from (file path or command)
        source_name: String,
        /// Decoder error message
        reason: String,
    },

    /// Configuration file problems
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

#[allow(clippy::ref_option)]
fn describe_exit_code(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl Clone for SweepError {
    fn clone(&self) -> Self {
        match self {
            Self::GitCommandError {
                command,
                exit_code,
                stdout,
                stderr,
            } => Self::GitCommandError {
                command: command.clone(),
                exit_code: *exit_code,
                stdout: stdout.clone(),
                stderr: stderr.clone(),
            },
            Self::AzCommandError {
                command,
                exit_code,
                stdout,
                stderr,
            } => Self::AzCommandError {
                command: command.clone(),
                exit_code: *exit_code,
                stdout: stdout.clone(),
                stderr: stderr.clone(),
            },
            Self::CommandTimedOut {
                command,
                seconds,
            } => Self::CommandTimedOut {
                command: command.clone(),
                seconds: *seconds,
            },
            Self::GitNotFound => Self::GitNotFound,
            Self::GitRepoInvalid {
                path,
            } => Self::GitRepoInvalid {
                path: path.clone(),
            },
            Self::TreeListingParse {
                line,
            } => Self::TreeListingParse {
                line: line.clone(),
            },
            Self::MalformedImageReference {
                reference,
            } => Self::MalformedImageReference {
                reference: reference.clone(),
            },
            Self::EmptyLiveSet => Self::EmptyLiveSet,
            Self::InvalidMinAge {
                value,
            } => Self::InvalidMinAge {
                value: *value,
            },
            Self::MinAgeOutOfRange {
                value,
            } => Self::MinAgeOutOfRange {
                value: *value,
            },
            Self::ManifestParseError {
                source_name,
                reason,
            } => Self::ManifestParseError {
                source_name: source_name.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            // io::Error is not Clone; keep kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

impl SweepError {
    /// Returns true for failures of an external process invocation.
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::GitCommandError { .. } | Self::AzCommandError { .. } | Self::CommandTimedOut { .. }
        )
    }
}

/// Error wrapper carrying user-facing details and a suggestion.
///
/// ```rust,no_run
/// use imgsweep_cli::core::{ErrorContext, SweepError};
///
/// let context = ErrorContext::new(SweepError::GitNotFound)
///     .with_suggestion("Install git from https://git-scm.com/")
///     .with_details("imgsweep reads repository history with the git binary");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: SweepError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without details or suggestion.
    #[must_use]
    pub const fn new(error: SweepError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error (shown in green).
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error (shown in yellow).
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] for CLI display.
///
/// Typed [`SweepError`] values are found anywhere in the `anyhow` chain, so
/// context added on the way up does not hide them. IO errors get filesystem
/// guidance; everything else is shown with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(sweep_error) = error.chain().find_map(|e| e.downcast_ref::<SweepError>()) {
        let mut ctx = create_error_context(sweep_error.clone());
        // The outermost context says what the engine was doing when it failed
        if !sweep_error.is_backend_failure() && error.chain().count() > 1 {
            let outer = error.to_string();
            if outer != sweep_error.to_string() {
                ctx.details = Some(match ctx.details {
                    Some(details) => format!("{outer}\n{details}"),
                    None => outer,
                });
            }
        }
        return ctx;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(SweepError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct")
                .with_details(
                    "This error occurs when a required file or directory cannot be found",
                );
            }
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(SweepError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions")
                .with_details("imgsweep could not read a file it needs");
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(SweepError::Other {
        message,
    })
}

/// Render captured process output the way the CLI shows it.
fn captured_output(stdout: &str, stderr: &str) -> String {
    format!("STDOUT:\n{stdout}\nSTDERR:\n{stderr}")
}

fn create_error_context(error: SweepError) -> ErrorContext {
    match &error {
        SweepError::GitCommandError {
            stdout,
            stderr,
            ..
        } => {
            let details = captured_output(stdout, stderr);
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Check that every root filter is a valid 'git rev-list' argument list and that the repository has the referenced refs")
        }
        SweepError::AzCommandError {
            stdout,
            stderr,
            ..
        } => {
            let details = captured_output(stdout, stderr);
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Run 'az login' and verify access to the registry, or pass --manifests with a saved listing")
        }
        SweepError::CommandTimedOut {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Try running the command manually to see whether it hangs on a prompt"),
        SweepError::GitNotFound => ErrorContext::new(error)
            .with_suggestion("Install git from https://git-scm.com/ or your package manager (e.g., 'apt install git')")
            .with_details("imgsweep reads repository history with the system git binary"),
        SweepError::GitRepoInvalid {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass the path of a git checkout with --repo-path"),
        SweepError::TreeListingParse {
            ..
        } => ErrorContext::new(error)
            .with_details("Expected '<mode> <type> <id>\\t<path>' lines from 'git ls-tree'"),
        SweepError::MalformedImageReference {
            ..
        } => ErrorContext::new(error)
            .with_details("Image references must look like '<registry>.azurecr.io/<repository>:<tag>'")
            .with_suggestion("Fix the CI_BUILD_CONTAINER line in the tracked file"),
        SweepError::EmptyLiveSet => ErrorContext::new(error)
            .with_details("None of the selected commits reference an image in the expected repository")
            .with_suggestion("Check the root filters, --tracked-path, --registry and --repository settings"),
        SweepError::InvalidMinAge {
            ..
        }
        | SweepError::MinAgeOutOfRange {
            ..
        } => ErrorContext::new(error).with_suggestion("Pass the retention age in whole days, e.g. --min-age 30"),
        SweepError::ManifestParseError {
            ..
        } => ErrorContext::new(error)
            .with_details("Expected a JSON array of objects with 'digest', 'tags' and 'timestamp' fields"),
        SweepError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the TOML syntax and field names in the configuration file"),
        SweepError::IoError(_) | SweepError::Other { .. } => ErrorContext::new(error),
    }
}
