//! Finding marker calls and classifying their arguments.
//!
//! [`collect_calls`] walks one file with [`syn::visit::Visit`], tracking the
//! lexical scopes of function bodies, and reports every call whose callee
//! resolves to the target function. Each call's type argument and value
//! arguments are classified by whether code at the top of the file could
//! name them.

mod locals;
mod resolve;

use syn::visit::{self, Visit};
use syn::{
    Expr, ExprArray, ExprCall, ExprClosure, ExprForLoop, ExprIf, ExprLet, ExprPath, ExprStruct,
    ExprWhile, GenericArgument, GenericParam, Generics, ImplItemFn, Item, ItemConst, ItemFn,
    ItemImpl, ItemMod, ItemStatic, ItemTrait, Local as LetStmt, Pat, PatIdent, PathArguments,
    Signature, Stmt, TraitItemFn,
};
use tracing::{debug, trace};

use crate::analyze::locals::Local;
use crate::analyze::resolve::{Namespace, Resolver, origin_of};
use crate::types::{CallArgument, CallInfo, Definition, Target, TypeArgument};
use crate::unit::{CompilationUnit, DefKind, SourceFile, flatten_use_tree};

/// Every call of `target` in `file`, in source order.
pub fn collect_calls<'ast>(
    unit: &'ast CompilationUnit,
    file: &'ast SourceFile,
    target: &Target,
) -> Vec<CallInfo<'ast>> {
    let mut collector = CallCollector {
        resolver: Resolver::new(unit, file),
        target,
        calls: Vec::new(),
    };
    collector.visit_file(file.syntax());
    debug!(
        file = %file.path().display(),
        %target,
        calls = collector.calls.len(),
        "collected calls"
    );
    collector.calls
}

/// Every call of `target` in the unit, per file.
pub fn find_calls<'ast>(
    unit: &'ast CompilationUnit,
    target: &Target,
) -> Vec<(&'ast SourceFile, Vec<CallInfo<'ast>>)> {
    unit.files()
        .iter()
        .map(|file| (file, collect_calls(unit, file, target)))
        .collect()
}

/// One step of finding the function a call expression calls.
enum CalleeStep<'ast> {
    /// Parentheses or an invisible group around the callee.
    Unwrap(&'ast Expr),
    /// The callee is itself a call; its result is what gets called.
    Called(&'ast Expr),
    Path(&'ast ExprPath),
    GiveUp(&'static str),
}

impl<'ast> CalleeStep<'ast> {
    fn of(expr: &'ast Expr) -> Self {
        match expr {
            Expr::Paren(paren) => Self::Unwrap(&paren.expr),
            Expr::Group(group) => Self::Unwrap(&group.expr),
            Expr::Call(call) => Self::Called(&call.func),
            Expr::Path(path) => Self::Path(path),
            Expr::Field(_) => Self::GiveUp("callee is a stored value"),
            Expr::MethodCall(_) => Self::GiveUp("callee is returned by a method"),
            _ => Self::GiveUp("callee is not a path"),
        }
    }
}

/// One step of classifying a value argument.
enum OperandStep<'ast> {
    /// `&x`, `*x`, `-x`, `!x`, `(x)` and `x.field` are reachable when `x` is.
    Unwrap(&'ast Expr),
    Path(&'ast ExprPath),
    Struct(&'ast ExprStruct),
    /// Tuples and arrays are reachable when all their elements are.
    Elements(Vec<&'ast Expr>),
    Unreachable,
}

impl<'ast> OperandStep<'ast> {
    fn of(expr: &'ast Expr) -> Self {
        match expr {
            Expr::Reference(reference) => Self::Unwrap(&reference.expr),
            Expr::Unary(unary) => Self::Unwrap(&unary.expr),
            Expr::Paren(paren) => Self::Unwrap(&paren.expr),
            Expr::Group(group) => Self::Unwrap(&group.expr),
            Expr::Field(field) => Self::Unwrap(&field.base),
            Expr::Path(path) => Self::Path(path),
            Expr::Struct(literal) => Self::Struct(literal),
            Expr::Tuple(tuple) => Self::Elements(tuple.elems.iter().collect()),
            Expr::Array(array) => Self::Elements(array.elems.iter().collect()),
            _ => Self::Unreachable,
        }
    }
}

struct CallCollector<'ast, 't> {
    resolver: Resolver<'ast>,
    target: &'t Target,
    calls: Vec<CallInfo<'ast>>,
}

impl<'ast> CallCollector<'ast, '_> {
    fn inspect_call(&mut self, call: &'ast ExprCall) {
        let mut via_call = false;
        let mut current = &*call.func;
        let path = loop {
            match CalleeStep::of(current) {
                CalleeStep::Unwrap(inner) => current = inner,
                CalleeStep::Called(inner) => {
                    via_call = true;
                    current = inner;
                }
                CalleeStep::Path(path) => break path,
                CalleeStep::GiveUp(reason) => {
                    trace!(reason, "skipping call");
                    return;
                }
            }
        };
        if path.qself.is_some() {
            return;
        }

        let candidates = self.resolver.resolve_fn(&path.path);
        if !candidates.iter().any(|candidate| self.target.matches(candidate)) {
            if !candidates.is_empty() && path_name(path) == self.target.name() {
                trace!(?candidates, "same name, different function");
            }
            return;
        }

        let info = CallInfo {
            call,
            type_arguments: self.type_arguments(path),
            arguments: self.arguments(call),
            via_call,
        };
        debug!(
            location = %info.location(),
            type_arguments = info.type_arguments.len(),
            arguments = info.arguments.len(),
            via_call,
            "found call of {}",
            self.target
        );
        self.calls.push(info);
    }

    fn type_arguments(&self, path: &'ast ExprPath) -> Vec<TypeArgument<'ast>> {
        let Some(segment) = path.path.segments.last() else {
            return Vec::new();
        };
        let PathArguments::AngleBracketed(args) = &segment.arguments else {
            return Vec::new();
        };

        args.args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(TypeArgument {
                    ty,
                    origin: self.resolver.type_origin(ty),
                }),
                _ => None,
            })
            .collect()
    }

    /// Value arguments, with array literals flattened into their elements.
    fn arguments(&self, call: &'ast ExprCall) -> Vec<CallArgument<'ast>> {
        let mut arguments = Vec::new();
        for arg in &call.args {
            match array_literal(arg) {
                Some(array) => arguments.extend(array.elems.iter().map(|expr| self.argument(expr))),
                None => arguments.push(self.argument(arg)),
            }
        }
        arguments
    }

    fn argument(&self, expr: &'ast Expr) -> CallArgument<'ast> {
        let value = self.resolver.const_value(expr);
        let (definition, reachable) = self.operand(expr);
        CallArgument {
            expr,
            reachable: value.is_some() || reachable,
            value,
            definition,
        }
    }

    fn operand(&self, expr: &'ast Expr) -> (Option<Definition>, bool) {
        let mut current = expr;
        loop {
            match OperandStep::of(current) {
                OperandStep::Unwrap(inner) => current = inner,
                OperandStep::Path(path) => {
                    if path.qself.is_some() {
                        return (None, false);
                    }
                    let definition = self.resolver.resolve(&path.path, Namespace::Value);
                    let reachable = definition
                        .as_ref()
                        .is_some_and(|def| def.scope.is_reachable() || def.value.is_some());
                    return (definition, reachable);
                }
                OperandStep::Struct(literal) => {
                    if literal.qself.is_some() {
                        return (None, false);
                    }
                    let definition = self.resolver.resolve(&literal.path, Namespace::Type);
                    let reachable = definition
                        .as_ref()
                        .is_some_and(|def| origin_of(def).is_reachable());
                    return (definition, reachable);
                }
                OperandStep::Elements(elements) => {
                    let reachable = elements.into_iter().all(|element| {
                        self.resolver.const_value(element).is_some() || self.operand(element).1
                    });
                    return (None, reachable);
                }
                OperandStep::Unreachable => return (None, false),
            }
        }
    }

    //=========================================================================
    // Scopes
    //=========================================================================

    fn bind_generics(&mut self, generics: &Generics) {
        for param in &generics.params {
            match param {
                GenericParam::Type(param) => {
                    self.resolver
                        .locals
                        .bind(Namespace::Type, param.ident.to_string(), Local::GenericParam);
                }
                GenericParam::Const(param) => {
                    self.resolver
                        .locals
                        .bind(Namespace::Value, param.ident.to_string(), Local::ConstParam);
                }
                GenericParam::Lifetime(_) => {}
            }
        }
    }

    fn bind_signature(&mut self, sig: &Signature) {
        self.bind_generics(&sig.generics);
        for input in &sig.inputs {
            match input {
                syn::FnArg::Receiver(_) => {
                    self.resolver
                        .locals
                        .bind(Namespace::Value, "self", Local::Binding);
                }
                syn::FnArg::Typed(typed) => self.bind_pattern(&typed.pat),
            }
        }
    }

    fn bind_pattern(&mut self, pat: &Pat) {
        let mut bindings = PatBindings::default();
        bindings.visit_pat(pat);
        for name in bindings.names {
            self.resolver
                .locals
                .bind(Namespace::Value, name, Local::Binding);
        }
    }

    /// Items of a block are in scope for the whole block.
    fn predeclare<'i>(&mut self, items: impl IntoIterator<Item = &'i Item>) {
        for item in items {
            let item_local = |kind| Local::Item { kind, value: None };
            let (types, values): (Vec<(String, Local)>, Vec<(String, Local)>) = match item {
                Item::Fn(f) => (vec![], vec![(f.sig.ident.to_string(), item_local(DefKind::Fn))]),
                Item::Struct(s) => {
                    let name = s.ident.to_string();
                    let ty = vec![(name.clone(), item_local(DefKind::Struct))];
                    if matches!(s.fields, syn::Fields::Named(_)) {
                        (ty, vec![])
                    } else {
                        (ty, vec![(name, item_local(DefKind::Struct))])
                    }
                }
                Item::Enum(e) => (vec![(e.ident.to_string(), item_local(DefKind::Enum))], vec![]),
                Item::Union(u) => (vec![(u.ident.to_string(), item_local(DefKind::Union))], vec![]),
                Item::Type(t) => (
                    vec![(t.ident.to_string(), item_local(DefKind::TypeAlias))],
                    vec![],
                ),
                Item::Trait(t) => (vec![(t.ident.to_string(), item_local(DefKind::Trait))], vec![]),
                Item::Mod(m) => (vec![(m.ident.to_string(), item_local(DefKind::Module))], vec![]),
                Item::Const(c) => {
                    let local = Local::Item {
                        kind: DefKind::Const,
                        value: self.resolver.const_value(&c.expr),
                    };
                    (vec![], vec![(c.ident.to_string(), local)])
                }
                Item::Static(s) => {
                    (vec![], vec![(s.ident.to_string(), item_local(DefKind::Static))])
                }
                Item::Use(u) => {
                    let mut entries = Vec::new();
                    let mut globs = Vec::new();
                    flatten_use_tree(&u.tree, &mut entries, &mut globs);
                    let imports: Vec<_> = entries
                        .into_iter()
                        .map(|entry| (entry.binding, Local::Import(entry.path)))
                        .collect();
                    (imports.clone(), imports)
                }
                _ => (vec![], vec![]),
            };

            for (name, local) in types {
                self.resolver.locals.bind(Namespace::Type, name, local);
            }
            for (name, local) in values {
                self.resolver.locals.bind(Namespace::Value, name, local);
            }
        }
    }

    /// Visits an item body in a frame that hides the enclosing body's
    /// bindings and generic parameters.
    fn in_item(&mut self, has_self: bool, visit: impl FnOnce(&mut Self)) {
        self.resolver.locals.push_item();
        self.resolver.enter_item(has_self);
        visit(self);
        self.resolver.exit_item();
        self.resolver.locals.pop();
    }

    fn in_frame(&mut self, visit: impl FnOnce(&mut Self)) {
        self.resolver.locals.push();
        visit(self);
        self.resolver.locals.pop();
    }
}

impl<'ast> Visit<'ast> for CallCollector<'ast, '_> {
    fn visit_expr_call(&mut self, call: &'ast ExprCall) {
        self.inspect_call(call);
        visit::visit_expr_call(self, call);
    }

    fn visit_item_fn(&mut self, item: &'ast ItemFn) {
        self.in_item(false, |this| {
            this.bind_signature(&item.sig);
            this.visit_block(&item.block);
        });
    }

    fn visit_item_impl(&mut self, item: &'ast ItemImpl) {
        self.in_item(true, |this| {
            this.bind_generics(&item.generics);
            for impl_item in &item.items {
                this.visit_impl_item(impl_item);
            }
        });
    }

    fn visit_impl_item_fn(&mut self, item: &'ast ImplItemFn) {
        self.in_frame(|this| {
            this.bind_signature(&item.sig);
            this.visit_block(&item.block);
        });
    }

    fn visit_item_trait(&mut self, item: &'ast ItemTrait) {
        self.in_item(true, |this| {
            this.bind_generics(&item.generics);
            for trait_item in &item.items {
                this.visit_trait_item(trait_item);
            }
        });
    }

    fn visit_trait_item_fn(&mut self, item: &'ast TraitItemFn) {
        if let Some(block) = &item.default {
            self.in_frame(|this| {
                this.bind_signature(&item.sig);
                this.visit_block(block);
            });
        }
    }

    fn visit_item_const(&mut self, item: &'ast ItemConst) {
        self.in_item(false, |this| this.visit_expr(&item.expr));
    }

    fn visit_item_static(&mut self, item: &'ast ItemStatic) {
        self.in_item(false, |this| this.visit_expr(&item.expr));
    }

    fn visit_item_mod(&mut self, item: &'ast ItemMod) {
        let Some((_, items)) = &item.content else {
            return;
        };

        if self.resolver.locals.is_empty() {
            if self.resolver.enter_module(&item.ident.to_string()) {
                for item in items {
                    self.visit_item(item);
                }
                self.resolver.exit_module();
            }
        } else {
            // A module inside a body: its items are local to the body.
            self.in_item(false, |this| {
                this.predeclare(items);
                for item in items {
                    this.visit_item(item);
                }
            });
        }
    }

    fn visit_block(&mut self, block: &'ast syn::Block) {
        self.in_frame(|this| {
            this.predeclare(block.stmts.iter().filter_map(|stmt| match stmt {
                Stmt::Item(item) => Some(item),
                _ => None,
            }));
            for stmt in &block.stmts {
                this.visit_stmt(stmt);
            }
        });
    }

    fn visit_local(&mut self, local: &'ast LetStmt) {
        if let Some(init) = &local.init {
            self.visit_expr(&init.expr);
            if let Some((_, diverge)) = &init.diverge {
                self.visit_expr(diverge);
            }
        }
        self.bind_pattern(&local.pat);
    }

    fn visit_expr_closure(&mut self, closure: &'ast ExprClosure) {
        self.in_frame(|this| {
            for input in &closure.inputs {
                this.bind_pattern(input);
            }
            this.visit_expr(&closure.body);
        });
    }

    fn visit_expr_for_loop(&mut self, for_loop: &'ast ExprForLoop) {
        self.visit_expr(&for_loop.expr);
        self.in_frame(|this| {
            this.bind_pattern(&for_loop.pat);
            this.visit_block(&for_loop.body);
        });
    }

    fn visit_arm(&mut self, arm: &'ast syn::Arm) {
        self.in_frame(|this| {
            this.bind_pattern(&arm.pat);
            if let Some((_, guard)) = &arm.guard {
                this.visit_expr(guard);
            }
            this.visit_expr(&arm.body);
        });
    }

    fn visit_expr_let(&mut self, expr: &'ast ExprLet) {
        self.visit_expr(&expr.expr);
        self.bind_pattern(&expr.pat);
    }

    fn visit_expr_if(&mut self, expr: &'ast ExprIf) {
        self.in_frame(|this| {
            this.visit_expr(&expr.cond);
            this.visit_block(&expr.then_branch);
        });
        if let Some((_, else_branch)) = &expr.else_branch {
            self.visit_expr(else_branch);
        }
    }

    fn visit_expr_while(&mut self, expr: &'ast ExprWhile) {
        self.in_frame(|this| {
            this.visit_expr(&expr.cond);
            this.visit_block(&expr.body);
        });
    }
}

/// Names bound by a pattern.
#[derive(Default)]
struct PatBindings {
    names: Vec<String>,
}

impl<'ast> Visit<'ast> for PatBindings {
    fn visit_pat_ident(&mut self, pat: &'ast PatIdent) {
        let name = pat.ident.to_string();
        // `None`, `MAX` and unit structs in patterns are paths, not bindings.
        let looks_like_path = pat.by_ref.is_none()
            && pat.mutability.is_none()
            && pat.subpat.is_none()
            && name.starts_with(|c: char| c.is_uppercase());
        if !looks_like_path {
            self.names.push(name);
        }
        visit::visit_pat_ident(self, pat);
    }

    // Expressions inside patterns (literals, ranges) bind nothing.
    fn visit_expr(&mut self, _: &'ast Expr) {}
}

/// An array literal argument, through `&` and parentheses.
fn array_literal(expr: &Expr) -> Option<&ExprArray> {
    match expr {
        Expr::Array(array) => Some(array),
        Expr::Reference(reference) => array_literal(&reference.expr),
        Expr::Paren(paren) => array_literal(&paren.expr),
        Expr::Group(group) => array_literal(&group.expr),
        _ => None,
    }
}

fn path_name(path: &ExprPath) -> String {
    path.path
        .segments
        .last()
        .map(|segment| segment.ident.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use syn::parse::Parser;

    use super::*;

    fn unit(src: &str) -> CompilationUnit {
        CompilationUnit::from_sources("app", [("lib.rs", src)]).unwrap()
    }

    fn target() -> Target {
        "cmpgen::cmp_by_fields".parse().unwrap()
    }

    fn count(src: &str) -> usize {
        let unit = unit(src);
        collect_calls(&unit, &unit.files()[0], &target()).len()
    }

    #[test]
    fn test_callee_forms() {
        assert_eq!(
            count("fn f() { cmpgen::cmp_by_fields::<u8>(&[\"a\"]); }"),
            1
        );
        assert_eq!(
            count("use cmpgen::cmp_by_fields; fn f() { cmp_by_fields::<u8>(&[\"a\"]); }"),
            1
        );
        assert_eq!(
            count("use cmpgen::cmp_by_fields as by; fn f() { (by::<u8>)(&[\"a\"]); }"),
            1
        );
        assert_eq!(
            count("use cmpgen as cg; fn f() { cg::cmp_by_fields::<u8>(&[\"a\"]); }"),
            1
        );
        assert_eq!(
            count("fn f() { use cmpgen::cmp_by_fields; cmp_by_fields::<u8>(&[\"a\"]); }"),
            1
        );
        assert_eq!(count("use cmpgen::*; fn f() { cmp_by_fields::<u8>(&[\"a\"]); }"), 1);
    }

    #[test]
    fn test_other_functions_do_not_match() {
        // Declared here, so not the runtime's function.
        assert_eq!(
            count("fn cmp_by_fields<T>(_: &[&str]) {} fn f() { cmp_by_fields::<u8>(&[\"a\"]); }"),
            0
        );
        // A binding shadows the import.
        assert_eq!(
            count(
                "use cmpgen::cmp_by_fields; \
                 fn f(cmp_by_fields: fn(&[&str])) { cmp_by_fields(&[\"a\"]); }"
            ),
            0
        );
        assert_eq!(count("fn f(s: S) { s.cmp_by_fields(&[\"a\"]); }"), 0);
        assert_eq!(count("fn f(s: S) { (s.cmp)(&[\"a\"]); }"), 0);
    }

    #[test]
    fn test_called_result_is_reported_twice() {
        let unit = unit(
            "fn f(a: &u8, b: &u8) { cmpgen::cmp_by_fields::<u8>(&[\"a\"])(a, b); }",
        );
        let calls = collect_calls(&unit, &unit.files()[0], &target());

        assert_eq!(calls.len(), 2);
        assert!(calls[0].via_call);
        assert!(!calls[1].via_call);
        assert_eq!(calls[1].arguments.len(), 1);
    }

    #[test]
    fn test_macro_bodies_are_not_searched() {
        assert_eq!(
            count("fn f() { println!(\"{:?}\", cmpgen::cmp_by_fields::<u8>(&[\"a\"])); }"),
            0
        );
    }

    #[test]
    fn test_nested_bodies_are_searched() {
        let src = r#"
            struct S;
            impl S {
                fn method(&self) {
                    let by = || cmpgen::cmp_by_fields::<S>(&["a"]);
                }
            }
            trait T {
                fn provided() {
                    if true { cmpgen::cmp_by_fields::<u8>(&["b"]); }
                }
            }
            mod inner {
                fn f() { cmpgen::cmp_by_fields::<u8>(&["c"]); }
            }
            static CMP: fn() = || { cmpgen::cmp_by_fields::<u8>(&["d"]); };
        "#;
        assert_eq!(count(src), 4);
    }

    #[test]
    fn test_array_argument_is_flattened() {
        let unit = unit(
            r#"
            const AGE: &str = "age";
            fn f() {
                cmpgen::cmp_by_fields::<u8>(&["name", AGE]);
            }
            "#,
        );
        let calls = collect_calls(&unit, &unit.files()[0], &target());
        let values: Vec<_> = calls[0]
            .arguments
            .iter()
            .map(|arg| arg.value.as_ref().and_then(|v| v.as_str()))
            .collect();

        assert_eq!(values, [Some("name"), Some("age")]);
    }

    #[test]
    fn test_pattern_bindings() {
        let pat: Pat = Pat::parse_single
            .parse_str("(a, Some(ref b), Point { x, y: mut z }, None, c @ 1..=2, [d, ..])")
            .unwrap();
        let mut bindings = PatBindings::default();
        bindings.visit_pat(&pat);

        assert_eq!(bindings.names, ["a", "b", "x", "z", "c", "d"]);
    }
}
