//! The `use` items of a companion file.
//!
//! Companions are included into their source module, where the module's own
//! names are already visible. The source's explicit imports are repeated so
//! the companion reads on its own; glob imports are not, since a glob inside
//! the companion's block would shadow the module's own items. Runtime items
//! are imported under names nothing else in the file uses.

use proc_macro2::{Span, TokenStream, TokenTree};
use quote::{ToTokens, format_ident, quote};
use rustc_hash::FxHashSet;
use syn::{Attribute, Ident, Item, UseTree};

#[derive(Debug, Clone)]
struct Import {
    attrs: Vec<Attribute>,
    leading_colon: bool,
    path: Vec<Ident>,
    binding: Ident,
}

impl Import {
    fn to_item(&self) -> TokenStream {
        let attrs = &self.attrs;
        let colon = self.leading_colon.then(|| quote! { :: });
        let path = &self.path;
        let binding = &self.binding;

        let renamed = path.last().is_none_or(|last| last != binding);
        if renamed {
            quote! { #(#attrs)* use #colon #(#path)::* as #binding; }
        } else {
            quote! { #(#attrs)* use #colon #(#path)::*; }
        }
    }

    /// The path compared across spellings: no leading `::`, `std` and
    /// `alloc` re-exports of `core` items spelled as `core`.
    fn normalized(&self) -> Vec<String> {
        normalize(&self.path)
    }
}

fn normalize(path: &[Ident]) -> Vec<String> {
    let mut normalized: Vec<String> = path.iter().map(Ident::to_string).collect();
    if let Some(root) = normalized.first_mut() {
        if root == "std" || root == "alloc" {
            *root = "core".to_owned();
        }
    }
    normalized
}

/// Imports of one companion file plus the names it must not bind.
#[derive(Debug, Default)]
pub struct ImportSet {
    imports: Vec<Import>,
    seen: FxHashSet<String>,
    reserved: FxHashSet<String>,
}

impl ImportSet {
    /// Starts from the explicit top-level imports of `file`. Every name the
    /// file binds at top level is reserved.
    pub fn from_file(file: &syn::File) -> Self {
        let mut set = Self::default();

        for item in &file.items {
            match item {
                Item::Use(item) => {
                    let mut path = Vec::new();
                    let mut found = Vec::new();
                    flatten(&item.tree, &mut path, &mut found);
                    for (path, binding) in found {
                        set.reserve(binding.to_string());
                        set.push(Import {
                            attrs: item.attrs.clone(),
                            leading_colon: item.leading_colon.is_some(),
                            path,
                            binding,
                        });
                    }
                }
                _ => {
                    if let Some(name) = item_name(item) {
                        set.reserve(name);
                    }
                }
            }
        }

        set
    }

    fn push(&mut self, import: Import) {
        if self.seen.insert(import.to_item().to_string()) {
            self.imports.push(import);
        }
    }

    pub fn reserve(&mut self, name: impl Into<String>) {
        self.reserved.insert(name.into());
    }

    /// Reserves every identifier appearing in `tokens`.
    pub fn reserve_idents(&mut self, tokens: TokenStream) {
        for token in tokens {
            match token {
                TokenTree::Ident(ident) => self.reserve(ident.to_string()),
                TokenTree::Group(group) => self.reserve_idents(group.stream()),
                TokenTree::Punct(_) | TokenTree::Literal(_) => {}
            }
        }
    }

    /// The name under which `path` is usable in the companion, adding an
    /// import when the source does not already have one without attributes.
    pub fn require(&mut self, runtime: &syn::Path, path: &[&str]) -> Ident {
        let mut full: Vec<Ident> = runtime.segments.iter().map(|s| s.ident.clone()).collect();
        full.extend(path.iter().map(|segment| Ident::new(segment, Span::call_site())));
        let leading_colon = runtime.leading_colon.is_some();

        let wanted = normalize(&full);
        if let Some(existing) = self
            .imports
            .iter()
            .find(|import| import.attrs.is_empty() && import.normalized() == wanted)
        {
            return existing.binding.clone();
        }

        let name = path.last().copied().unwrap_or_default();
        let binding = self.fresh(name);
        self.push(Import {
            attrs: Vec::new(),
            leading_colon,
            path: full,
            binding: binding.clone(),
        });
        binding
    }

    /// `name` if it is free, otherwise the first free `Cmpgen<Name>`,
    /// `Cmpgen<Name>2`, ... The result is reserved.
    pub fn fresh(&mut self, name: &str) -> Ident {
        let mut candidate = format_ident!("{}", name);
        let mut counter: usize = 1;
        while self.reserved.contains(&candidate.to_string()) {
            let pascal = pascal_case(name);
            candidate = if counter == 1 {
                format_ident!("Cmpgen{}", pascal)
            } else {
                format_ident!("Cmpgen{}{}", pascal, counter)
            };
            counter += 1;
        }
        self.reserve(candidate.to_string());
        candidate
    }

    /// The `use` items, source imports first.
    pub fn items(&self) -> impl Iterator<Item = TokenStream> + '_ {
        self.imports.iter().map(Import::to_item)
    }
}

impl ToTokens for ImportSet {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(self.items());
    }
}

/// Collects `(path, binding)` pairs; globs and `_` imports are dropped.
fn flatten(tree: &UseTree, prefix: &mut Vec<Ident>, found: &mut Vec<(Vec<Ident>, Ident)>) {
    match tree {
        UseTree::Path(path) => {
            prefix.push(path.ident.clone());
            flatten(&path.tree, prefix, found);
            prefix.pop();
        }
        UseTree::Name(name) if name.ident == "self" => {
            if let Some(last) = prefix.last() {
                found.push((prefix.clone(), last.clone()));
            }
        }
        UseTree::Name(name) => {
            let mut path = prefix.clone();
            path.push(name.ident.clone());
            found.push((path, name.ident.clone()));
        }
        UseTree::Rename(rename) if rename.rename == "_" => {}
        UseTree::Rename(rename) => {
            let mut path = prefix.clone();
            if rename.ident != "self" {
                path.push(rename.ident.clone());
            }
            found.push((path, rename.rename.clone()));
        }
        UseTree::Glob(_) => {}
        UseTree::Group(group) => {
            for tree in &group.items {
                flatten(tree, prefix, found);
            }
        }
    }
}

fn item_name(item: &Item) -> Option<String> {
    let ident = match item {
        Item::Const(item) => &item.ident,
        Item::Enum(item) => &item.ident,
        Item::ExternCrate(item) => match &item.rename {
            Some((_, rename)) => rename,
            None => &item.ident,
        },
        Item::Fn(item) => &item.sig.ident,
        Item::Macro(item) => item.ident.as_ref()?,
        Item::Mod(item) => &item.ident,
        Item::Static(item) => &item.ident,
        Item::Struct(item) => &item.ident,
        Item::Trait(item) => &item.ident,
        Item::TraitAlias(item) => &item.ident,
        Item::Type(item) => &item.ident,
        Item::Union(item) => &item.ident,
        _ => return None,
    };
    Some(ident.to_string())
}

fn pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
