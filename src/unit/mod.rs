//! Loading a directory of Rust sources and answering "what does this module
//! declare?".

mod manifest;
mod scope;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::LoadError;
use crate::expand::DEFAULT_SUFFIX;

pub use manifest::discover_module_path;
pub use scope::{
    ConstValue, DefKind, ModuleScope, ScopeKind, UseEntry, ValueItem, flatten_use_tree,
    is_prelude_type, is_prelude_value, is_primitive, is_std_root,
};

/// One parsed source file.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    syntax: syn::File,
    scope: ModuleScope,
}

impl SourceFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn syntax(&self) -> &syn::File {
        &self.syntax
    }

    /// Top-level names of the file's module.
    pub fn scope(&self) -> &ModuleScope {
        &self.scope
    }

    pub fn module_path(&self) -> &[String] {
        self.scope.path()
    }
}

/// The source files of one directory, parsed, with their symbol tables.
#[derive(Debug)]
pub struct CompilationUnit {
    module_path: Vec<String>,
    files: Vec<SourceFile>,
}

impl CompilationUnit {
    /// Loads every `.rs` file directly inside `dir`, except generated
    /// companions.
    ///
    /// `module_path` is the `::`-separated module the directory's `lib.rs`,
    /// `main.rs` or `mod.rs` defines, starting with the crate name.
    pub fn load(dir: impl AsRef<Path>, module_path: &str) -> Result<Self, LoadError> {
        Self::load_skipping(dir, module_path, DEFAULT_SUFFIX)
    }

    /// Like [`CompilationUnit::load`], skipping files whose stem ends with
    /// `suffix`.
    pub fn load_skipping(
        dir: impl AsRef<Path>,
        module_path: &str,
        suffix: &str,
    ) -> Result<Self, LoadError> {
        let dir = dir.as_ref();
        let io_error = |source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            let is_source = path.is_file()
                && path.extension().is_some_and(|ext| ext == "rs")
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| !stem.ends_with(suffix));
            if is_source {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(LoadError::NoSources {
                dir: dir.to_path_buf(),
            });
        }

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let text = fs::read_to_string(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            sources.push((path, text));
        }

        Self::from_sources(module_path, sources)
    }

    /// Builds a unit from in-memory sources, given as `(file path, text)`.
    pub fn from_sources<P, S>(
        module_path: &str,
        sources: impl IntoIterator<Item = (P, S)>,
    ) -> Result<Self, LoadError>
    where
        P: Into<PathBuf>,
        S: AsRef<str>,
    {
        let module_path: Vec<String> = module_path
            .split("::")
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();

        let mut files = Vec::new();
        for (path, text) in sources {
            let path = path.into();
            let syntax = syn::parse_file(text.as_ref()).map_err(|source| LoadError::Parse {
                path: path.clone(),
                source,
            })?;
            let scope = ModuleScope::build(file_module_path(&module_path, &path), &syntax.items);
            debug!(path = %path.display(), module = %scope.path().join("::"), "loaded source file");
            files.push(SourceFile {
                path,
                syntax,
                scope,
            });
        }

        if files.is_empty() {
            return Err(LoadError::NoSources { dir: PathBuf::new() });
        }

        Ok(Self { module_path, files })
    }

    /// The module of the directory's root file.
    pub fn module_path(&self) -> &[String] {
        &self.module_path
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// The scope of `module_path`, if one of the unit's files or one of their
    /// inline modules defines it.
    pub fn module(&self, module_path: &[String]) -> Option<&ModuleScope> {
        self.files.iter().find_map(|file| {
            let rest = module_path.strip_prefix(file.module_path())?;
            rest.iter()
                .try_fold(file.scope(), |scope, name| scope.submodule(name))
        })
    }
}

/// `lib.rs`, `main.rs` and `mod.rs` are the directory's module; any other
/// `x.rs` is its child module `x`.
fn file_module_path(unit_path: &[String], file: &Path) -> Vec<String> {
    let mut path = unit_path.to_vec();
    match file.file_stem().and_then(|stem| stem.to_str()) {
        Some("lib" | "main" | "mod") | None => {}
        Some(stem) => path.push(stem.to_owned()),
    }
    path
}
