use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The fully qualified path of a marker function, such as
/// `cmpgen::cmp_by_fields`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    segments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{input}` is not a function path like `crate_name::function`")]
pub struct TargetParseError {
    input: String,
}

impl Target {
    /// The function name.
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Whether `path`, an absolute path, names this function.
    pub fn matches(&self, path: &[String]) -> bool {
        self.segments == path
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = || TargetParseError {
            input: input.to_owned(),
        };

        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix("::").unwrap_or(trimmed);
        let segments: Vec<String> = trimmed.split("::").map(|s| s.trim().to_owned()).collect();

        // Keywords, `crate` and `self` included, are not identifiers.
        if segments.len() < 2 || segments.iter().any(|s| syn::parse_str::<syn::Ident>(s).is_err()) {
            return Err(error());
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}
