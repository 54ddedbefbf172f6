//! Errors raised while loading, analyzing and generating.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Location;

/// Failure to read a source directory. Fatal for the run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    #[error("no Rust source files in `{}`", dir.display())]
    NoSources { dir: PathBuf },
}

/// Why a call site was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallSiteErrorKind {
    #[error("type argument `{ty}` is not reachable from the module top scope: {reason}")]
    UnreachableTypeArgument { ty: String, reason: String },

    #[error("type argument `{ty}` cannot be compared by field: {reason}")]
    UnsupportedTypeArgument { ty: String, reason: String },

    #[error("field argument `{arg}` is not a constant string")]
    NonLiteralFieldArgument { arg: String },

    #[error("`{field}` is not a field name")]
    InvalidFieldName { field: String },

    #[error("no fields specified")]
    NoFieldsSpecified,
}

/// A rejected call site, or one of its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}:{location}: {kind}", file.display())]
pub struct CallSiteError {
    pub file: PathBuf,
    pub location: Location,
    pub kind: CallSiteErrorKind,
}

/// The synthesizer produced code that does not parse. This is a bug in
/// cmpgen, not in the input.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("generated code for `{}` does not parse: {source}", file.display())]
    Malformed {
        file: PathBuf,
        #[source]
        source: syn::Error,
    },
}

/// Failure to write a companion file.
#[derive(Debug, Error)]
#[error("failed to write `{}`", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Collects errors so that one pass reports all of them.
#[derive(Debug)]
pub struct Accumulator<E> {
    errors: Vec<E>,
}

impl<E> Default for Accumulator<E> {
    fn default() -> Self {
        Self { errors: Vec::new() }
    }
}

impl<E> Accumulator<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: E) {
        self.errors.push(error);
    }

    /// Returns `value` if nothing was recorded, otherwise every recorded error.
    pub fn finish_with<T>(self, value: T) -> Result<T, Vec<E>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

/// Every rejected call site of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: PathBuf,
    pub errors: Vec<CallSiteError>,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}
