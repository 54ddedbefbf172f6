//! Name resolution as seen from a point inside a source file.
//!
//! The resolver answers three questions for the analyzer: which function a
//! callee path names, where a value path is defined, and whether a type
//! written at a call site can be written the same way at the top of the file.

use syn::{Expr, GenericArgument, Path, PathArguments, ReturnType, Type, TypeParamBound, UnOp};
use tracing::trace;

use crate::analyze::locals::{Local, Locals};
use crate::types::{Definition, TypeOrigin};
use crate::unit::{
    CompilationUnit, ConstValue, DefKind, ModuleScope, ScopeKind, SourceFile, is_prelude_type,
    is_prelude_value, is_primitive, is_std_root,
};

/// Bound on re-export hops followed through the unit's modules.
const MAX_REEXPORT_HOPS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Namespace {
    Type,
    Value,
}

pub(crate) struct Resolver<'ast> {
    unit: &'ast CompilationUnit,
    /// Current module first; the file's module is always at the bottom.
    modules: Vec<&'ast ModuleScope>,
    pub(crate) locals: Locals,
    /// Whether `Self` names something, per enclosing item.
    self_types: Vec<bool>,
}

impl<'ast> Resolver<'ast> {
    pub(crate) fn new(unit: &'ast CompilationUnit, file: &'ast SourceFile) -> Self {
        Self {
            unit,
            modules: vec![file.scope()],
            locals: Locals::default(),
            self_types: Vec::new(),
        }
    }

    fn root(&self) -> &'ast ModuleScope {
        self.modules[0]
    }

    fn scope(&self) -> &'ast ModuleScope {
        self.modules[self.modules.len() - 1]
    }

    /// Inline module nesting below the file's module.
    fn depth(&self) -> usize {
        self.modules.len() - 1
    }

    fn scope_kind(&self) -> ScopeKind {
        if self.depth() == 0 {
            ScopeKind::Module
        } else {
            ScopeKind::Submodule
        }
    }

    /// Enters the inline module `name` of the current module.
    pub(crate) fn enter_module(&mut self, name: &str) -> bool {
        match self.scope().submodule(name) {
            Some(module) => {
                self.modules.push(module);
                true
            }
            None => false,
        }
    }

    pub(crate) fn exit_module(&mut self) {
        if self.modules.len() > 1 {
            self.modules.pop();
        }
    }

    pub(crate) fn enter_item(&mut self, has_self: bool) {
        self.self_types.push(has_self);
    }

    pub(crate) fn exit_item(&mut self) {
        self.self_types.pop();
    }

    fn self_visible(&self) -> bool {
        self.self_types.last().copied().unwrap_or(false)
    }

    //=========================================================================
    // Callees
    //=========================================================================

    /// Absolute paths the function called through `path` may have.
    ///
    /// Empty when the path names a binding, a non-function item or nothing.
    /// More than one candidate only comes from glob imports of modules
    /// outside the unit.
    pub(crate) fn resolve_fn(&self, path: &Path) -> Vec<Vec<String>> {
        let segments = segments(path);
        if path.leading_colon.is_some() {
            return vec![segments];
        }
        let Some((first, rest)) = segments.split_first() else {
            return Vec::new();
        };
        let scope = self.scope();

        if rest.is_empty() {
            match self.locals.lookup(first, Namespace::Value) {
                Some(Local::Import(import)) => {
                    return self.unit_fn(&scope.absolute(import)).into_iter().collect();
                }
                Some(local) => {
                    trace!(name = %first, kind = ?local.kind(), "callee is shadowed by a local");
                    return Vec::new();
                }
                None => {}
            }
            if let Some(item) = scope.value_item(first) {
                if item.kind != DefKind::Fn {
                    return Vec::new();
                }
                let mut path = scope.path().to_vec();
                path.push(first.clone());
                return vec![path];
            }
            if let Some(import) = scope.import(first) {
                return self.unit_fn(&scope.absolute(import)).into_iter().collect();
            }
            return scope
                .globs()
                .iter()
                .filter_map(|glob| {
                    let mut path = scope.absolute(glob);
                    path.push(first.clone());
                    self.unit_fn(&path)
                })
                .collect();
        }

        if first == "Self" {
            return Vec::new();
        }
        match self.locals.lookup(first, Namespace::Type) {
            Some(Local::Import(import)) => {
                let mut path = scope.absolute(import);
                path.extend(rest.iter().cloned());
                self.unit_fn(&path).into_iter().collect()
            }
            Some(_) => Vec::new(),
            None => self.unit_fn(&scope.absolute(&segments)).into_iter().collect(),
        }
    }

    /// `path` when it names a function, following re-exports inside the
    /// unit. Paths leading outside the unit are taken on trust.
    fn unit_fn(&self, path: &[String]) -> Option<Vec<String>> {
        let mut path = path.to_vec();
        for _ in 0..MAX_REEXPORT_HOPS {
            let (name, prefix) = path.split_last()?;
            let Some(module) = self.unit.module(prefix) else {
                return Some(path);
            };
            if let Some(item) = module.value_item(name) {
                return (item.kind == DefKind::Fn).then_some(path);
            }
            path = module.absolute(module.import(name)?);
        }
        None
    }

    //=========================================================================
    // Values and types
    //=========================================================================

    /// Where `path` is defined, in `namespace`.
    pub(crate) fn resolve(&self, path: &Path, namespace: Namespace) -> Option<Definition> {
        let segments = segments(path);
        if path.leading_colon.is_some() {
            return Some(self.universe(segments, namespace));
        }
        let (first, rest) = segments.split_first()?;

        let first_namespace = if rest.is_empty() {
            namespace
        } else {
            Namespace::Type
        };
        if let Some(local) = self.locals.lookup(first, first_namespace) {
            return Some(self.local_definition(&segments, local, namespace));
        }
        if first == "Self" {
            return self.self_visible().then(|| Definition {
                name: last(&segments),
                kind: DefKind::SelfType,
                scope: ScopeKind::Local,
                path: None,
                value: None,
            });
        }

        match first.as_str() {
            "crate" => {
                let path = self.scope().absolute(&segments);
                let in_root = path.len() == self.root().path().len() + 1
                    && path.starts_with(self.root().path());
                if in_root {
                    let name = &path[path.len() - 1..];
                    self.lookup_in(self.root(), ScopeKind::Module, name, namespace)
                } else {
                    Some(self.universe(path, namespace))
                }
            }
            "self" if self.depth() == 0 => {
                self.lookup_in(self.root(), ScopeKind::Module, rest, namespace)
            }
            "super" if self.depth() == 0 => {
                Some(self.universe(self.scope().absolute(&segments), namespace))
            }
            "self" | "super" => {
                let path = self.scope().absolute(&segments);
                let (kind, value) = self
                    .unit_item(&path, namespace)
                    .unwrap_or((DefKind::External, None));
                Some(Definition {
                    name: last(&segments),
                    kind,
                    scope: ScopeKind::Submodule,
                    path: Some(path),
                    value,
                })
            }
            _ => self.lookup_in(self.scope(), self.scope_kind(), &segments, namespace),
        }
    }

    fn local_definition(
        &self,
        segments: &[String],
        local: &Local,
        namespace: Namespace,
    ) -> Definition {
        let (path, value) = match local {
            Local::Import(import) => {
                let mut path = self.scope().absolute(import);
                path.extend(segments[1..].iter().cloned());
                let value = self.unit_item(&path, namespace).and_then(|(_, value)| value);
                (Some(path), value)
            }
            Local::Item { value, .. } if segments.len() == 1 => (None, value.clone()),
            _ => (None, None),
        };
        Definition {
            name: last(segments),
            kind: local.kind(),
            scope: ScopeKind::Local,
            path,
            value,
        }
    }

    /// Resolves `segments` against the top-level names of `scope`, then the
    /// universe. `kind` is the scope kind of whatever `scope` itself binds.
    fn lookup_in(
        &self,
        scope: &ModuleScope,
        kind: ScopeKind,
        segments: &[String],
        namespace: Namespace,
    ) -> Option<Definition> {
        let (first, rest) = segments.split_first()?;
        let name = last(segments);

        if rest.is_empty() {
            let item = match namespace {
                Namespace::Type => scope.type_item(first).map(|kind| (kind, None)),
                Namespace::Value => scope
                    .value_item(first)
                    .map(|item| (item.kind, item.value.clone())),
            };
            if let Some((def_kind, value)) = item {
                let mut path = scope.path().to_vec();
                path.push(first.clone());
                return Some(Definition {
                    name,
                    kind: def_kind,
                    scope: kind,
                    path: Some(path),
                    value,
                });
            }
            if let Some(import) = scope.import(first) {
                let path = scope.absolute(import);
                return Some(self.imported(name, path, kind, namespace));
            }
            if namespace == Namespace::Type && is_primitive(first) {
                return Some(builtin(name, DefKind::Primitive));
            }
            let prelude = match namespace {
                Namespace::Type => is_prelude_type(first),
                Namespace::Value => is_prelude_value(first),
            };
            if prelude {
                return Some(builtin(name, DefKind::Prelude));
            }
            return self.lookup_glob(scope, kind, first, namespace);
        }

        let declared = scope.type_item(first).is_some() || scope.value_item(first).is_some();
        if declared || scope.import(first).is_some() {
            let path = scope.absolute(segments);
            if scope.import(first).is_some() && !declared {
                return Some(self.imported(name, path, kind, namespace));
            }
            let (def_kind, value) = self
                .unit_item(&path, namespace)
                .or_else(|| scope.type_item(first).map(|kind| (kind, None)))
                .unwrap_or((DefKind::External, None));
            return Some(Definition {
                name,
                kind: def_kind,
                scope: kind,
                path: Some(path),
                value,
            });
        }

        Some(self.universe(segments.to_vec(), namespace))
    }

    fn imported(
        &self,
        name: String,
        path: Vec<String>,
        kind: ScopeKind,
        namespace: Namespace,
    ) -> Definition {
        let value = self.unit_item(&path, namespace).and_then(|(_, value)| value);
        // `use super::Person;` in a first-level module names the same item as
        // `Person` at the top of the file.
        let scope = if kind == ScopeKind::Submodule && self.root_binds(&path, &name, namespace) {
            ScopeKind::Module
        } else {
            kind
        };
        Definition {
            name,
            kind: DefKind::Import,
            scope,
            path: Some(path),
            value,
        }
    }

    fn lookup_glob(
        &self,
        scope: &ModuleScope,
        kind: ScopeKind,
        name: &str,
        namespace: Namespace,
    ) -> Option<Definition> {
        let mut speculative = None;
        for glob in scope.globs() {
            let prefix = scope.absolute(glob);
            let mut path = prefix.clone();
            path.push(name.to_owned());

            match self.unit.module(&prefix) {
                Some(_) => {
                    if self.unit_item(&path, namespace).is_some() {
                        return Some(self.imported(name.to_owned(), path, kind, namespace));
                    }
                }
                None => {
                    speculative.get_or_insert(path);
                }
            }
        }

        let path = speculative?;
        trace!(%name, path = %path.join("::"), "assuming a glob import provides the name");
        Some(self.imported(name.to_owned(), path, kind, namespace))
    }

    /// Whether the file's module binds `name` to the item at `path`.
    fn root_binds(&self, path: &[String], name: &str, namespace: Namespace) -> bool {
        let root = self.root();
        let Some((last, prefix)) = path.split_last() else {
            return false;
        };
        last == name
            && prefix == root.path()
            && match namespace {
                Namespace::Type => root.type_item(name).is_some(),
                Namespace::Value => root.value_item(name).is_some(),
            }
    }

    /// Kind and folded value of the unit item at the absolute `path`.
    fn unit_item(
        &self,
        path: &[String],
        namespace: Namespace,
    ) -> Option<(DefKind, Option<ConstValue>)> {
        let mut path = path.to_vec();
        for _ in 0..MAX_REEXPORT_HOPS {
            let (name, prefix) = path.split_last()?;
            let module = self.unit.module(prefix)?;
            let item = match namespace {
                Namespace::Type => module.type_item(name).map(|kind| (kind, None)),
                Namespace::Value => module
                    .value_item(name)
                    .map(|item| (item.kind, item.value.clone())),
            };
            if item.is_some() {
                return item;
            }
            path = module.absolute(module.import(name)?);
        }
        None
    }

    fn universe(&self, path: Vec<String>, namespace: Namespace) -> Definition {
        let (kind, value) = self.unit_item(&path, namespace).unwrap_or_else(|| {
            let std = path.first().is_some_and(|root| is_std_root(root));
            (if std { DefKind::Prelude } else { DefKind::External }, None)
        });
        Definition {
            name: last(&path),
            kind,
            scope: ScopeKind::Universe,
            path: Some(path),
            value,
        }
    }

    //=========================================================================
    // Constants
    //=========================================================================

    /// The compile-time constant `expr` evaluates to, if it is one.
    pub(crate) fn const_value(&self, expr: &Expr) -> Option<ConstValue> {
        match expr {
            Expr::Lit(lit) => ConstValue::from_lit(&lit.lit),
            Expr::Paren(paren) => self.const_value(&paren.expr),
            Expr::Group(group) => self.const_value(&group.expr),
            Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => {
                self.const_value(&unary.expr)?.negate()
            }
            Expr::Path(path) if path.qself.is_none() => {
                self.resolve(&path.path, Namespace::Value)?.value
            }
            _ => None,
        }
    }

    //=========================================================================
    // Types
    //=========================================================================

    /// Whether `ty`, written as is at the top of the file, names the same
    /// type.
    pub(crate) fn type_origin(&self, ty: &Type) -> TypeOrigin {
        match ty {
            Type::Path(type_path) => {
                if let Some(qself) = &type_path.qself {
                    let origin = self.type_origin(&qself.ty);
                    if !origin.is_reachable() {
                        return origin;
                    }
                }
                let origin = self
                    .resolve(&type_path.path, Namespace::Type)
                    .map_or(TypeOrigin::Unresolved, |def| origin_of(&def));
                if !origin.is_reachable() {
                    return origin;
                }
                self.arguments_origin(&type_path.path).unwrap_or(origin)
            }
            Type::Reference(reference) => self.type_origin(&reference.elem),
            Type::Ptr(pointer) => self.type_origin(&pointer.elem),
            Type::Paren(paren) => self.type_origin(&paren.elem),
            Type::Group(group) => self.type_origin(&group.elem),
            Type::Tuple(tuple) => self.composite(tuple.elems.iter()),
            Type::Slice(slice) => self.composite([&*slice.elem]),
            Type::Array(array) => match self.composite([&*array.elem]) {
                TypeOrigin::Composite => {
                    let len = self.const_expr_origin(&array.len);
                    if len.is_reachable() {
                        TypeOrigin::Composite
                    } else {
                        len
                    }
                }
                origin => origin,
            },
            Type::Never(_) => TypeOrigin::Primitive,
            Type::BareFn(function) => {
                let output = match &function.output {
                    ReturnType::Default => None,
                    ReturnType::Type(_, ty) => Some(&**ty),
                };
                self.composite(function.inputs.iter().map(|arg| &arg.ty).chain(output))
            }
            Type::TraitObject(object) => {
                for bound in &object.bounds {
                    if let TypeParamBound::Trait(bound) = bound {
                        let origin = self
                            .resolve(&bound.path, Namespace::Type)
                            .map_or(TypeOrigin::Unresolved, |def| origin_of(&def));
                        let origin = self.arguments_origin(&bound.path).unwrap_or(origin);
                        if !origin.is_reachable() {
                            return origin;
                        }
                    }
                }
                TypeOrigin::Composite
            }
            _ => TypeOrigin::Unsupported,
        }
    }

    fn composite<'t>(&self, types: impl IntoIterator<Item = &'t Type>) -> TypeOrigin {
        types
            .into_iter()
            .map(|ty| self.type_origin(ty))
            .find(|origin| !origin.is_reachable())
            .unwrap_or(TypeOrigin::Composite)
    }

    /// The first unreachable origin among the generic arguments of `path`.
    fn arguments_origin(&self, path: &Path) -> Option<TypeOrigin> {
        let mut origins = Vec::new();
        for segment in &path.segments {
            match &segment.arguments {
                PathArguments::None => {}
                PathArguments::AngleBracketed(args) => {
                    for arg in &args.args {
                        match arg {
                            GenericArgument::Type(ty) => origins.push(self.type_origin(ty)),
                            GenericArgument::Const(expr) => {
                                origins.push(self.const_expr_origin(expr));
                            }
                            GenericArgument::AssocType(assoc) => {
                                origins.push(self.type_origin(&assoc.ty));
                            }
                            GenericArgument::AssocConst(assoc) => {
                                origins.push(self.const_expr_origin(&assoc.value));
                            }
                            _ => {}
                        }
                    }
                }
                PathArguments::Parenthesized(args) => {
                    origins.extend(args.inputs.iter().map(|ty| self.type_origin(ty)));
                    if let ReturnType::Type(_, ty) = &args.output {
                        origins.push(self.type_origin(ty));
                    }
                }
            }
        }
        origins.into_iter().find(|origin| !origin.is_reachable())
    }

    /// Reachability of a constant expression inside a type, such as an array
    /// length. The expression is emitted as written, so paths must be
    /// nameable from the top of the file.
    fn const_expr_origin(&self, expr: &Expr) -> TypeOrigin {
        match expr {
            Expr::Lit(_) => TypeOrigin::Primitive,
            Expr::Paren(paren) => self.const_expr_origin(&paren.expr),
            Expr::Group(group) => self.const_expr_origin(&group.expr),
            Expr::Unary(unary) => self.const_expr_origin(&unary.expr),
            Expr::Binary(binary) => {
                let left = self.const_expr_origin(&binary.left);
                if left.is_reachable() {
                    self.const_expr_origin(&binary.right)
                } else {
                    left
                }
            }
            Expr::Block(block) => match block.block.stmts.as_slice() {
                [syn::Stmt::Expr(expr, None)] => self.const_expr_origin(expr),
                _ => TypeOrigin::Unsupported,
            },
            Expr::Path(path) if path.qself.is_none() => self
                .resolve(&path.path, Namespace::Value)
                .map_or(TypeOrigin::Unresolved, |def| origin_of(&def)),
            _ => TypeOrigin::Unsupported,
        }
    }
}

/// Maps a definition found in the type namespace (or a constant inside a
/// type) to its origin.
pub(crate) fn origin_of(def: &Definition) -> TypeOrigin {
    match (def.scope, def.kind) {
        (ScopeKind::Local, DefKind::GenericParam | DefKind::ConstParam) => TypeOrigin::GenericParam,
        (ScopeKind::Local, DefKind::SelfType) => TypeOrigin::SelfType,
        (ScopeKind::Local, _) => TypeOrigin::Local,
        (ScopeKind::Submodule, _) => TypeOrigin::Submodule,
        (ScopeKind::Module, DefKind::Import) => TypeOrigin::Imported,
        (ScopeKind::Module, _) => TypeOrigin::Module,
        (ScopeKind::Universe, DefKind::Primitive) => TypeOrigin::Primitive,
        (ScopeKind::Universe, DefKind::Prelude) => TypeOrigin::Prelude,
        (ScopeKind::Universe, _) => TypeOrigin::External,
    }
}

fn segments(path: &Path) -> Vec<String> {
    path.segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect()
}

fn last(segments: &[String]) -> String {
    segments.last().cloned().unwrap_or_default()
}

fn builtin(name: String, kind: DefKind) -> Definition {
    Definition {
        path: Some(vec![name.clone()]),
        name,
        kind,
        scope: ScopeKind::Universe,
        value: None,
    }
}
