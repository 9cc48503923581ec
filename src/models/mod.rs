//! Value types flowing through the live-reference resolution engine.
//!
//! Every type here is an immutable value with string equality. Sets of them
//! are `HashSet`s; nothing in the engine depends on iteration order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_value {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a string value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_value!(
    /// Identifier of a commit as printed by `git rev-list`.
    CommitId
);

string_value!(
    /// Content-addressed id of a stored file revision (a git blob id).
    ///
    /// Many commits share one id when the tracked file did not change between
    /// them.
    ContentObjectId
);

string_value!(
    /// Full image name as written in the tracked file, e.g.
    /// `bondciimages.azurecr.io/ubuntu-1604:build-12345`.
    ///
    /// Not validated; the extractor passes malformed values through.
    ImageReference
);

string_value!(
    /// Image tag, the unit of liveness, e.g. `build-12345`.
    ImageTag
);

impl ImageReference {
    /// Tag part: everything after the first `:`, or `None` without a `:`.
    ///
    /// `host/repo:tag:extra` yields `tag:extra`.
    #[must_use]
    pub fn tag(&self) -> Option<ImageTag> {
        self.0.split_once(':').map(|(_, tag)| ImageTag::from(tag))
    }
}

/// Arguments for one `git rev-list` invocation selecting live commits.
///
/// On the command line a root spec is one argument with its items separated
/// by `;`, e.g. `--remotes=origin;--since=2~weeks~ago` or `--tags;-n;1`.
/// Several root specs are combined by union.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootSpec(Vec<String>);

impl RootSpec {
    /// Builds a root spec from its argument list.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(args.into_iter().map(Into::into).collect())
    }

    /// Splits a `;`-separated command-line value into a root spec.
    #[must_use]
    pub fn parse_semi_list(value: &str) -> Self {
        Self::new(value.split(';'))
    }

    /// The `rev-list` arguments in order.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.0
    }
}

impl FromStr for RootSpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_semi_list(s))
    }
}

impl fmt::Display for RootSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(";"))
    }
}
