//! Running analysis, validation and synthesis over a compilation unit.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::analyze::collect_calls;
use crate::error::{CallSiteError, FileFailure, SynthesisError, WriteError};
use crate::expand::{DEFAULT_SUFFIX, companion_path, synthesize};
use crate::types::{ComparatorRequest, Target};
use crate::unit::{CompilationUnit, SourceFile};
use crate::validate::validate_calls;

/// Marker functions scanned for by default.
pub const DEFAULT_TARGETS: &[&str] = &["cmpgen::cmp_by_fields", "cmpgen::try_cmp_by_fields"];

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Functions whose calls request comparators.
    pub targets: Vec<Target>,
    /// Path of the runtime crate in generated code.
    pub runtime: syn::Path,
    /// Companion stem suffix.
    pub suffix: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            targets: DEFAULT_TARGETS
                .iter()
                .filter_map(|target| target.parse().ok())
                .collect(),
            runtime: syn::parse_quote!(::cmpgen),
            suffix: DEFAULT_SUFFIX.to_owned(),
        }
    }
}

/// A rendered companion file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// The source file the companion belongs to.
    pub source: PathBuf,
    /// Where the companion goes.
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    /// Whether the companion on disk differs from `contents`.
    pub fn is_stale(&self) -> bool {
        !fs::read_to_string(&self.path).is_ok_and(|existing| existing == self.contents)
    }
}

/// Outcome of one run: companions for every file that validated, and the
/// errors of every file that did not.
#[derive(Debug, Default)]
pub struct Generation {
    pub generated: Vec<GeneratedFile>,
    pub failures: Vec<FileFailure>,
}

impl Generation {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Writes every companion whose contents changed. Returns the paths
    /// written.
    pub fn write(&self) -> Result<Vec<PathBuf>, WriteError> {
        let mut written = Vec::new();
        for file in &self.generated {
            if !file.is_stale() {
                continue;
            }
            fs::write(&file.path, &file.contents).map_err(|source| WriteError {
                path: file.path.clone(),
                source,
            })?;
            info!(path = %file.path.display(), "wrote companion");
            written.push(file.path.clone());
        }
        Ok(written)
    }

    /// Companions that are missing or out of date on disk.
    pub fn stale(&self) -> Vec<PathBuf> {
        self.generated
            .iter()
            .filter(|file| file.is_stale())
            .map(|file| file.path.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GenerateOptions,
}

impl Generator {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    /// Validated requests of one file, in source order.
    ///
    /// A marker whose result is called right away is reported by the
    /// analyzer twice; only the inner call is a request.
    pub fn requests(
        &self,
        unit: &CompilationUnit,
        file: &SourceFile,
    ) -> Result<Vec<ComparatorRequest>, Vec<CallSiteError>> {
        let mut calls: Vec<_> = self
            .options
            .targets
            .iter()
            .flat_map(|target| collect_calls(unit, file, target))
            .filter(|call| !call.via_call)
            .collect();
        calls.sort_by_key(|call| call.location());

        validate_calls(file.path(), &calls)
    }

    /// Processes every file of `unit`.
    ///
    /// Files with invalid call sites are recorded as failures and skipped;
    /// the other files still get their companions.
    pub fn run(&self, unit: &CompilationUnit) -> Result<Generation, SynthesisError> {
        let mut generation = Generation::default();

        for file in unit.files() {
            let requests = match self.requests(unit, file) {
                Ok(requests) => requests,
                Err(errors) => {
                    warn!(
                        file = %file.path().display(),
                        errors = errors.len(),
                        "skipping file with invalid call sites"
                    );
                    generation.failures.push(FileFailure {
                        file: file.path().to_path_buf(),
                        errors,
                    });
                    continue;
                }
            };

            let options = &self.options;
            let contents = synthesize(file, &requests, &options.runtime, &options.suffix)?;
            let Some(contents) = contents else {
                continue;
            };
            generation.generated.push(GeneratedFile {
                source: file.path().to_path_buf(),
                path: companion_path(file.path(), &self.options.suffix),
                contents,
            });
        }

        Ok(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = GenerateOptions::default();
        let targets: Vec<_> = options.targets.iter().map(Target::to_string).collect();

        assert_eq!(targets, DEFAULT_TARGETS);
        assert_eq!(options.suffix, "_generated");
    }

    #[test]
    fn test_try_variant_and_called_result() {
        let unit = CompilationUnit::from_sources(
            "app",
            [(
                "people.rs",
                r#"
                struct Person { age: u32 }
                fn sort(people: &mut [Person]) {
                    people.sort_by(|a, b| cmpgen::cmp_by_fields::<Person>(&["age"])(a, b));
                    let _ = cmpgen::try_cmp_by_fields::<Person>(&["age"]);
                }
                "#,
            )],
        )
        .unwrap();

        let requests = Generator::default()
            .requests(&unit, &unit.files()[0])
            .unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].location < requests[1].location);
    }

    #[test]
    fn test_files_without_calls_get_no_companion() {
        let unit = CompilationUnit::from_sources("app", [("lib.rs", "fn main() {}")]).unwrap();
        let generation = Generator::default().run(&unit).unwrap();

        assert!(generation.is_clean());
        assert!(generation.generated.is_empty());
    }
}
