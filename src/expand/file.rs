//! Rendering a whole companion file.

use std::path::Path;

use quote::{ToTokens, quote};

use crate::expand::cmp::expand_registrations;
use crate::expand::common::RuntimeNames;
use crate::expand::imports::ImportSet;
use crate::types::ComparatorRequest;

/// Renders the companion of `source` holding `requests`.
///
/// `syntax` is the source file, `runtime` the path of the runtime crate and
/// `companion` the companion's path.
pub fn render(
    source: &Path,
    syntax: &syn::File,
    requests: &[ComparatorRequest],
    runtime: &syn::Path,
    companion: &Path,
) -> syn::Result<String> {
    let mut imports = ImportSet::from_file(syntax);
    for request in requests {
        imports.reserve_idents(request.ty.to_token_stream());
    }

    let names = RuntimeNames {
        ordering: imports.require(&syn::parse_quote!(::core), &["cmp", "Ordering"]),
        registry: imports.require(runtime, &["Registry"]),
        registration: imports.require(runtime, &["Registration"]),
        compare_field: imports.require(runtime, &["compare_field"]),
        register_fn: imports.fresh("register_comparators"),
    };

    let register_fn = expand_registrations(requests, &names)?;
    let registration = &names.registration;
    let register_name = &names.register_fn;

    let tokens = quote! {
        #[allow(unused_imports)]
        const _: () = {
            #imports

            #register_fn

            #runtime::inventory::submit! {
                #registration::new(#register_name)
            }
        };
    };
    let file: syn::File = syn::parse2(tokens)?;

    Ok(format!(
        "{}\n{}",
        header(source, companion),
        prettyplease::unparse(&file)
    ))
}

fn header(source: &Path, companion: &Path) -> String {
    let file_name = |path: &Path| {
        path.file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
    };
    let source = file_name(source);
    let companion = file_name(companion);

    format!(
        "// @generated by cmpgen from `{source}`. Do not edit.\n\
         //\n\
         // Include it at the top level of `{source}`:\n\
         //\n\
         //     include!(\"{companion}\");\n"
    )
}

#[cfg(test)]
mod tests {
    use syn::visit::{self, Visit};
    use syn::{Expr, ExprLit, ExprMethodCall, FnArg, ItemFn, ItemUse, Lit, Macro};

    use super::*;
    use crate::types::{Location, tokens_text};

    fn request(ty: &str, fields: &[&str]) -> ComparatorRequest {
        ComparatorRequest {
            ty: syn::parse_str(ty).unwrap(),
            fields: fields.iter().map(|f| (*f).to_owned()).collect(),
            location: Location { line: 1, column: 1 },
        }
    }

    fn render_source(src: &str, requests: &[ComparatorRequest]) -> String {
        let syntax = syn::parse_file(src).unwrap();
        render(
            Path::new("src/people.rs"),
            &syntax,
            requests,
            &syn::parse_quote!(::cmpgen),
            Path::new("src/people_generated.rs"),
        )
        .unwrap()
    }

    #[test]
    fn test_header_names_both_files() {
        let text = render_source("struct Person { age: u8 }", &[request("Person", &["age"])]);
        assert!(text.starts_with("// @generated by cmpgen from `people.rs`. Do not edit.\n"));
        assert!(text.contains("//     include!(\"people_generated.rs\");\n"));
    }

    /// What a rendered companion declares, read back from its syntax tree.
    #[derive(Default)]
    struct Companion {
        uses: Vec<String>,
        params: Vec<String>,
        registrations: Vec<(String, Vec<String>)>,
        macros: Vec<String>,
    }

    impl Companion {
        fn parse(text: &str) -> Self {
            let file = syn::parse_file(text).unwrap();
            assert_eq!(file.items.len(), 1);
            let mut companion = Self::default();
            companion.visit_file(&file);
            companion
        }
    }

    impl<'ast> Visit<'ast> for Companion {
        fn visit_item_use(&mut self, item: &'ast ItemUse) {
            let leading = if item.leading_colon.is_some() { "::" } else { "" };
            self.uses.push(format!("{leading}{}", tokens_text(&item.tree)));
        }

        fn visit_item_fn(&mut self, item: &'ast ItemFn) {
            for input in &item.sig.inputs {
                if let FnArg::Typed(param) = input {
                    self.params.push(tokens_text(&param.ty));
                }
            }
            visit::visit_item_fn(self, item);
        }

        fn visit_expr_method_call(&mut self, call: &'ast ExprMethodCall) {
            if call.method == "register" {
                let ty = call
                    .turbofish
                    .iter()
                    .flat_map(|turbofish| &turbofish.args)
                    .map(tokens_text)
                    .collect::<Vec<_>>()
                    .join(", ");
                let fields = match call.args.first() {
                    Some(Expr::Reference(reference)) => match &*reference.expr {
                        Expr::Array(array) => array
                            .elems
                            .iter()
                            .filter_map(|elem| match elem {
                                Expr::Lit(ExprLit {
                                    lit: Lit::Str(field),
                                    ..
                                }) => Some(field.value()),
                                _ => None,
                            })
                            .collect(),
                        _ => Vec::new(),
                    },
                    _ => Vec::new(),
                };
                self.registrations.push((ty, fields));
            }
            visit::visit_expr_method_call(self, call);
        }

        fn visit_macro(&mut self, mac: &'ast Macro) {
            self.macros.push(tokens_text(&mac.path));
        }
    }

    fn strings(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_renders_parseable_block() {
        let text = render_source(
            "use std::fmt; struct Person { name: String, age: u8 }",
            &[request("Person", &["name", "age"])],
        );
        let companion = Companion::parse(&text);

        assert_eq!(
            companion.uses,
            [
                "std::fmt",
                "::core::cmp::Ordering",
                "::cmpgen::Registry",
                "::cmpgen::Registration",
                "::cmpgen::compare_field",
            ]
        );
        assert_eq!(companion.params, ["&mut Registry"]);
        assert_eq!(
            companion.registrations,
            [("Person".to_owned(), strings(&["name", "age"]))]
        );
        assert_eq!(companion.macros, ["::cmpgen::inventory::submit"]);
    }

    #[test]
    fn test_colliding_type_argument_renames_runtime_import() {
        let text = render_source(
            "mod local { pub struct Registry { pub id: u8 } } use local::Registry;",
            &[request("Registry", &["id"])],
        );
        let companion = Companion::parse(&text);

        assert!(companion.uses.contains(&"local::Registry".to_owned()));
        assert!(companion
            .uses
            .contains(&"::cmpgen::Registry as CmpgenRegistry".to_owned()));
        assert_eq!(companion.params, ["&mut CmpgenRegistry"]);
        assert_eq!(
            companion.registrations,
            [("Registry".to_owned(), strings(&["id"]))]
        );
    }
}
