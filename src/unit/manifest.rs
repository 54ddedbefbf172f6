//! Module path discovery from the enclosing Cargo manifest.

use std::fs;
use std::path::{Component, Path};

use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    package: Option<Package>,
    lib: Option<Lib>,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Lib {
    name: Option<String>,
}

impl Manifest {
    fn crate_name(&self) -> Option<String> {
        let name = self
            .lib
            .as_ref()
            .and_then(|lib| lib.name.clone())
            .or_else(|| self.package.as_ref().map(|package| package.name.clone()))?;
        Some(name.replace('-', "_"))
    }
}

/// Works out the module path of the source directory `dir`.
///
/// The nearest `Cargo.toml` at or above `dir` gives the crate name; the
/// directories between the manifest's `src/` and `dir` are appended as module
/// names. Without a usable manifest the directory's own name is the path.
pub fn discover_module_path(dir: &Path) -> String {
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

    for root in dir.ancestors() {
        let manifest_path = root.join("Cargo.toml");
        let Ok(text) = fs::read_to_string(&manifest_path) else {
            continue;
        };

        let manifest: Manifest = match toml::from_str(&text) {
            Ok(manifest) => manifest,
            Err(err) => {
                debug!(path = %manifest_path.display(), %err, "ignoring unreadable manifest");
                continue;
            }
        };
        let Some(crate_name) = manifest.crate_name() else {
            continue;
        };

        let mut segments = vec![crate_name];
        if let Ok(relative) = dir.strip_prefix(root.join("src")) {
            segments.extend(relative.components().filter_map(|component| match component {
                Component::Normal(name) => name.to_str().map(str::to_owned),
                _ => None,
            }));
        }

        let module_path = segments.join("::");
        debug!(manifest = %manifest_path.display(), %module_path, "discovered module path");
        return module_path;
    }

    fallback(&dir)
}

fn fallback(dir: &Path) -> String {
    dir.file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| "crate".to_owned(), |name| name.replace('-', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_and_nested_dir() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join("Cargo.toml"),
            "[package]\nname = \"people-app\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        let nested = root.path().join("src").join("models");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(discover_module_path(&root.path().join("src")), "people_app");
        assert_eq!(discover_module_path(&nested), "people_app::models");
    }

    #[test]
    fn test_lib_name_wins() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join("Cargo.toml"),
            "[package]\nname = \"people-app\"\n\n[lib]\nname = \"people\"\n",
        )
        .unwrap();
        fs::create_dir_all(root.path().join("src")).unwrap();

        assert_eq!(discover_module_path(&root.path().join("src")), "people");
    }

    #[test]
    fn test_workspace_manifest_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("Cargo.toml"), "[workspace]\nmembers = [\"app\"]\n").unwrap();
        let src = root.path().join("app").join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            root.path().join("app").join("Cargo.toml"),
            "[package]\nname = \"app\"\n",
        )
        .unwrap();

        assert_eq!(discover_module_path(&src), "app");
    }
}
