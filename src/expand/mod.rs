//! Companion file synthesis.

pub mod cmp;
pub mod common;
pub mod file;
pub mod imports;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SynthesisError;
use crate::types::ComparatorRequest;
use crate::unit::SourceFile;

/// Default stem suffix of companion files: `people.rs` gets
/// `people_generated.rs`.
pub const DEFAULT_SUFFIX: &str = "_generated";

/// Path of the companion of `source`.
pub fn companion_path(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}{suffix}.rs"))
}

/// Renders the companion of `source` for `requests`.
///
/// Returns `None` when there is nothing to register.
pub fn synthesize(
    source: &SourceFile,
    requests: &[ComparatorRequest],
    runtime: &syn::Path,
    suffix: &str,
) -> Result<Option<String>, SynthesisError> {
    if requests.is_empty() {
        return Ok(None);
    }

    let companion = companion_path(source.path(), suffix);
    let text = file::render(source.path(), source.syntax(), requests, runtime, &companion)
        .map_err(|source_error| SynthesisError::Malformed {
            file: companion.clone(),
            source: source_error,
        })?;

    debug!(
        companion = %companion.display(),
        comparators = requests.len(),
        "synthesized companion"
    );
    Ok(Some(text))
}
