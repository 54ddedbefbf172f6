//! Module-level symbol tables.
//!
//! Each parsed file gets a [`ModuleScope`] listing what its top level declares
//! and imports. Inline `mod name { ... }` blocks get their own nested scope.
//! Function-local names are not recorded here; the analyzer tracks those while
//! it walks function bodies.

use rustc_hash::FxHashMap;
use syn::{Expr, Item, Lit, UnOp, UseTree};

/// Where a definition lives, as seen from the file's top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Inside a function body, closure or block, or a generic parameter.
    Local,
    /// At the top of an inline module nested in the file.
    Submodule,
    /// At the top of the file's module, or imported there.
    Module,
    /// Primitives, the standard prelude and external crates.
    Universe,
}

impl ScopeKind {
    /// Whether generated code placed at the file's top level can name it.
    pub fn is_reachable(self) -> bool {
        matches!(self, Self::Module | Self::Universe)
    }
}

/// What a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefKind {
    Fn,
    Struct,
    Enum,
    Union,
    TypeAlias,
    Trait,
    Const,
    Static,
    Module,
    /// A `let`, parameter or pattern binding.
    Binding,
    /// A generic type parameter.
    GenericParam,
    /// A const generic parameter.
    ConstParam,
    /// `Self` inside an impl or trait.
    SelfType,
    /// A name brought in by `use`; the declaration is elsewhere.
    Import,
    Primitive,
    Prelude,
    /// A path rooted at an external crate.
    External,
}

/// A compile-time constant value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    Str(String),
    ByteStr(Vec<u8>),
    CStr(Vec<u8>),
    Byte(u8),
    Char(char),
    Bool(bool),
    /// Base-10 digits, with a leading `-` when negated.
    Int(String),
    /// Base-10 digits, with a leading `-` when negated.
    Float(String),
}

impl ConstValue {
    /// The value of a literal, if it has one.
    pub fn from_lit(lit: &Lit) -> Option<Self> {
        let value = match lit {
            Lit::Str(s) => Self::Str(s.value()),
            Lit::ByteStr(s) => Self::ByteStr(s.value()),
            Lit::CStr(s) => Self::CStr(s.value().into_bytes()),
            Lit::Byte(b) => Self::Byte(b.value()),
            Lit::Char(c) => Self::Char(c.value()),
            Lit::Bool(b) => Self::Bool(b.value),
            Lit::Int(i) => Self::Int(i.base10_digits().to_owned()),
            Lit::Float(f) => Self::Float(f.base10_digits().to_owned()),
            _ => return None,
        };
        Some(value)
    }

    /// The value of `-self`, for numeric values.
    pub fn negate(self) -> Option<Self> {
        match self {
            Self::Int(digits) => Some(Self::Int(negate_digits(digits))),
            Self::Float(digits) => Some(Self::Float(negate_digits(digits))),
            _ => None,
        }
    }

    /// The string, for string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

fn negate_digits(digits: String) -> String {
    match digits.strip_prefix('-') {
        Some(positive) => positive.to_owned(),
        None => format!("-{digits}"),
    }
}

/// Folds the literal-only constant expressions: literals, negated numeric
/// literals, parentheses and groups.
pub(crate) fn literal_value(expr: &Expr) -> Option<ConstValue> {
    match expr {
        Expr::Lit(lit) => ConstValue::from_lit(&lit.lit),
        Expr::Paren(paren) => literal_value(&paren.expr),
        Expr::Group(group) => literal_value(&group.expr),
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => {
            literal_value(&unary.expr)?.negate()
        }
        _ => None,
    }
}

/// A value-namespace item declared at module level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueItem {
    pub kind: DefKind,
    /// Folded initializer, for `const` items whose initializer is constant.
    pub value: Option<ConstValue>,
}

/// One name bound by a `use` item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UseEntry {
    /// The name the import binds.
    pub binding: String,
    /// The imported path as written, including any leading `crate`, `self`
    /// or `super`.
    pub path: Vec<String>,
}

/// Flattens a `use` tree into the names it binds and the glob prefixes it
/// imports. `_` renames bind nothing.
pub fn flatten_use_tree(tree: &UseTree, entries: &mut Vec<UseEntry>, globs: &mut Vec<Vec<String>>) {
    fn walk(
        tree: &UseTree,
        prefix: &mut Vec<String>,
        entries: &mut Vec<UseEntry>,
        globs: &mut Vec<Vec<String>>,
    ) {
        match tree {
            UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                walk(&path.tree, prefix, entries, globs);
                prefix.pop();
            }
            UseTree::Name(name) => {
                let name = name.ident.to_string();
                if name == "self" {
                    if let Some(last) = prefix.last() {
                        entries.push(UseEntry {
                            binding: last.clone(),
                            path: prefix.clone(),
                        });
                    }
                } else {
                    let mut path = prefix.clone();
                    path.push(name.clone());
                    entries.push(UseEntry {
                        binding: name,
                        path,
                    });
                }
            }
            UseTree::Rename(rename) => {
                let binding = rename.rename.to_string();
                if binding == "_" {
                    return;
                }
                let mut path = prefix.clone();
                if rename.ident != "self" {
                    path.push(rename.ident.to_string());
                }
                entries.push(UseEntry { binding, path });
            }
            UseTree::Glob(_) => globs.push(prefix.clone()),
            UseTree::Group(group) => {
                for tree in &group.items {
                    walk(tree, prefix, entries, globs);
                }
            }
        }
    }

    walk(tree, &mut Vec::new(), entries, globs);
}

/// Primitive type names.
const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize", "f32", "f64",
];

/// Type-namespace names of the standard prelude.
const PRELUDE_TYPES: &[&str] = &[
    "Box",
    "Option",
    "Result",
    "String",
    "Vec",
    "Clone",
    "Copy",
    "Send",
    "Sync",
    "Sized",
    "Unpin",
    "Drop",
    "Fn",
    "FnMut",
    "FnOnce",
    "Iterator",
    "IntoIterator",
    "DoubleEndedIterator",
    "ExactSizeIterator",
    "Extend",
    "FromIterator",
    "Default",
    "Eq",
    "PartialEq",
    "Ord",
    "PartialOrd",
    "AsRef",
    "AsMut",
    "Into",
    "From",
    "ToOwned",
    "ToString",
    "TryFrom",
    "TryInto",
];

/// Value-namespace names of the standard prelude.
const PRELUDE_VALUES: &[&str] = &["Some", "None", "Ok", "Err", "drop"];

/// Crate roots that are always in scope.
const STD_ROOTS: &[&str] = &["std", "core", "alloc"];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

pub fn is_prelude_type(name: &str) -> bool {
    PRELUDE_TYPES.contains(&name)
}

pub fn is_prelude_value(name: &str) -> bool {
    PRELUDE_VALUES.contains(&name)
}

pub fn is_std_root(name: &str) -> bool {
    STD_ROOTS.contains(&name)
}

/// The names a module declares and imports at its top level.
#[derive(Debug, Clone, Default)]
pub struct ModuleScope {
    path: Vec<String>,
    types: FxHashMap<String, DefKind>,
    values: FxHashMap<String, ValueItem>,
    imports: FxHashMap<String, Vec<String>>,
    globs: Vec<Vec<String>>,
    submodules: FxHashMap<String, ModuleScope>,
}

/// Bound on how many `const A: T = B;` or `use` hops are followed.
const MAX_ALIAS_HOPS: usize = 8;

impl ModuleScope {
    /// Builds the scope of a module at `path` from its items.
    pub fn build(path: Vec<String>, items: &[Item]) -> Self {
        let mut scope = Self {
            path,
            ..Self::default()
        };
        let mut const_aliases = Vec::new();

        for item in items {
            match item {
                Item::Fn(f) => scope.declare_value(&f.sig.ident, DefKind::Fn, None),
                Item::Struct(s) => {
                    scope.declare_type(&s.ident, DefKind::Struct);
                    if !matches!(s.fields, syn::Fields::Named(_)) {
                        // Tuple and unit structs are also constructors.
                        scope.declare_value(&s.ident, DefKind::Struct, None);
                    }
                }
                Item::Enum(e) => scope.declare_type(&e.ident, DefKind::Enum),
                Item::Union(u) => scope.declare_type(&u.ident, DefKind::Union),
                Item::Type(t) => scope.declare_type(&t.ident, DefKind::TypeAlias),
                Item::Trait(t) => scope.declare_type(&t.ident, DefKind::Trait),
                Item::TraitAlias(t) => scope.declare_type(&t.ident, DefKind::Trait),
                Item::Const(c) => {
                    let value = literal_value(&c.expr);
                    if value.is_none() {
                        if let Expr::Path(alias) = &*c.expr {
                            if let Some(ident) = alias.path.get_ident() {
                                const_aliases.push((c.ident.to_string(), ident.to_string()));
                            }
                        }
                    }
                    scope.declare_value(&c.ident, DefKind::Const, value);
                }
                Item::Static(s) => scope.declare_value(&s.ident, DefKind::Static, None),
                Item::Mod(m) => {
                    scope.declare_type(&m.ident, DefKind::Module);
                    if let Some((_, content)) = &m.content {
                        let mut path = scope.path.clone();
                        path.push(m.ident.to_string());
                        scope
                            .submodules
                            .insert(m.ident.to_string(), Self::build(path, content));
                    }
                }
                Item::Use(u) => {
                    let mut entries = Vec::new();
                    flatten_use_tree(&u.tree, &mut entries, &mut scope.globs);
                    for entry in entries {
                        scope.imports.insert(entry.binding, entry.path);
                    }
                }
                Item::ExternCrate(e) => {
                    let binding = match &e.rename {
                        Some((_, rename)) => rename.to_string(),
                        None => e.ident.to_string(),
                    };
                    if binding != "_" {
                        scope.imports.insert(binding, vec![e.ident.to_string()]);
                    }
                }
                _ => {}
            }
        }

        scope.fold_const_aliases(&const_aliases);
        scope
    }

    fn declare_type(&mut self, ident: &syn::Ident, kind: DefKind) {
        self.types.insert(ident.to_string(), kind);
    }

    fn declare_value(&mut self, ident: &syn::Ident, kind: DefKind, value: Option<ConstValue>) {
        self.values
            .insert(ident.to_string(), ValueItem { kind, value });
    }

    /// Resolves `const A: T = B;` chains to `B`'s folded value.
    fn fold_const_aliases(&mut self, aliases: &[(String, String)]) {
        for _ in 0..MAX_ALIAS_HOPS {
            let mut changed = false;
            for (name, target) in aliases {
                let resolved = self.values.get(target).and_then(|item| item.value.clone());
                if let Some(item) = self.values.get_mut(name) {
                    if item.value.is_none() && resolved.is_some() {
                        item.value = resolved;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// The module's full path, starting with the crate name.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The crate name.
    pub fn crate_name(&self) -> &str {
        self.path.first().map_or("crate", String::as_str)
    }

    pub fn type_item(&self, name: &str) -> Option<DefKind> {
        self.types.get(name).copied()
    }

    pub fn value_item(&self, name: &str) -> Option<&ValueItem> {
        self.values.get(name)
    }

    /// The path a `use` in this module binds `name` to, as written.
    pub fn import(&self, name: &str) -> Option<&[String]> {
        self.imports.get(name).map(Vec::as_slice)
    }

    /// Prefixes of this module's glob imports.
    pub fn globs(&self) -> &[Vec<String>] {
        &self.globs
    }

    pub fn submodule(&self, name: &str) -> Option<&ModuleScope> {
        self.submodules.get(name)
    }

    /// Turns a path written in this module into an absolute path starting with
    /// a crate name.
    ///
    /// `crate`, `self` and `super` are replaced, the first segment is expanded
    /// when it names an import or a module declared here, and anything else is
    /// taken to start with an external crate.
    pub fn absolute(&self, segments: &[String]) -> Vec<String> {
        self.absolute_within(segments, MAX_ALIAS_HOPS)
    }

    fn absolute_within(&self, segments: &[String], hops: usize) -> Vec<String> {
        let Some((first, rest)) = segments.split_first() else {
            return Vec::new();
        };

        let mut base = match first.as_str() {
            "crate" => vec![self.crate_name().to_owned()],
            "self" => self.path.clone(),
            "super" => {
                let mut base = self.path.clone();
                let mut rest = rest;
                base.pop();
                while let Some((next, tail)) = rest.split_first() {
                    if next != "super" {
                        break;
                    }
                    base.pop();
                    rest = tail;
                }
                base.extend(rest.iter().cloned());
                return base;
            }
            name => {
                if let Some(import) = self.import(name) {
                    if hops == 0 || import.first().is_some_and(|root| root == name) {
                        // `use foo;` of an external crate, or an import cycle.
                        import.to_vec()
                    } else {
                        self.absolute_within(import, hops - 1)
                    }
                } else if self.type_item(name).is_some() || self.value_item(name).is_some() {
                    let mut base = self.path.clone();
                    base.push(name.to_owned());
                    base
                } else {
                    vec![name.to_owned()]
                }
            }
        };

        base.extend(rest.iter().cloned());
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(src: &str) -> ModuleScope {
        let file = syn::parse_file(src).unwrap();
        ModuleScope::build(vec!["app".into(), "people".into()], &file.items)
    }

    fn strings(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_declarations_by_namespace() {
        let scope = scope(
            r#"
            struct Named { x: u8 }
            struct Tuple(u8);
            enum E { A }
            fn f() {}
            static S: u8 = 0;
            mod inner { pub struct Hidden; }
            "#,
        );

        assert_eq!(scope.type_item("Named"), Some(DefKind::Struct));
        assert!(scope.value_item("Named").is_none());
        assert_eq!(scope.value_item("Tuple").map(|v| v.kind), Some(DefKind::Struct));
        assert_eq!(scope.type_item("E"), Some(DefKind::Enum));
        assert_eq!(scope.value_item("f").map(|v| v.kind), Some(DefKind::Fn));
        assert_eq!(scope.value_item("S").map(|v| v.kind), Some(DefKind::Static));
        assert_eq!(scope.type_item("inner"), Some(DefKind::Module));
        assert_eq!(
            scope.submodule("inner").and_then(|m| m.type_item("Hidden")),
            Some(DefKind::Struct)
        );
    }

    #[test]
    fn test_const_folding() {
        let scope = scope(
            r#"
            const NAME: &str = "name";
            const ALIAS: &str = NAME;
            const NEG: i32 = -(5);
            const CALL: usize = len();
            "#,
        );

        assert_eq!(
            scope.value_item("NAME").and_then(|v| v.value.clone()),
            Some(ConstValue::Str("name".into()))
        );
        assert_eq!(
            scope.value_item("ALIAS").and_then(|v| v.value.clone()),
            Some(ConstValue::Str("name".into()))
        );
        assert_eq!(
            scope.value_item("NEG").and_then(|v| v.value.clone()),
            Some(ConstValue::Int("-5".into()))
        );
        assert_eq!(scope.value_item("CALL").and_then(|v| v.value.clone()), None);
    }

    #[test]
    fn test_use_flattening() {
        let scope = scope(
            r#"
            use std::collections::HashMap;
            use cmpgen::{self, cmp_by_fields as by, Registry};
            use crate::models::*;
            use serde::Serialize as _;
            extern crate alloc as heap;
            "#,
        );

        assert_eq!(scope.import("HashMap"), Some(&strings(&["std", "collections", "HashMap"])[..]));
        assert_eq!(scope.import("cmpgen"), Some(&strings(&["cmpgen"])[..]));
        assert_eq!(scope.import("by"), Some(&strings(&["cmpgen", "cmp_by_fields"])[..]));
        assert_eq!(scope.import("Registry"), Some(&strings(&["cmpgen", "Registry"])[..]));
        assert_eq!(scope.import("heap"), Some(&strings(&["alloc"])[..]));
        assert!(scope.import("_").is_none());
        assert_eq!(scope.globs(), &[strings(&["crate", "models"])]);
    }

    #[test]
    fn test_absolute_paths() {
        let scope = scope(
            r#"
            use cmpgen as cg;
            use self::helpers::sort;
            mod helpers {}
            fn local() {}
            "#,
        );

        assert_eq!(
            scope.absolute(&strings(&["crate", "x", "f"])),
            strings(&["app", "x", "f"])
        );
        assert_eq!(
            scope.absolute(&strings(&["self", "f"])),
            strings(&["app", "people", "f"])
        );
        assert_eq!(scope.absolute(&strings(&["super", "f"])), strings(&["app", "f"]));
        assert_eq!(
            scope.absolute(&strings(&["cg", "cmp_by_fields"])),
            strings(&["cmpgen", "cmp_by_fields"])
        );
        assert_eq!(
            scope.absolute(&strings(&["sort"])),
            strings(&["app", "people", "helpers", "sort"])
        );
        assert_eq!(
            scope.absolute(&strings(&["local"])),
            strings(&["app", "people", "local"])
        );
        assert_eq!(
            scope.absolute(&strings(&["serde", "Serialize"])),
            strings(&["serde", "Serialize"])
        );
    }
}
