//! Turning collected calls into comparator requests.

use std::path::Path;

use syn::{Member, Type};

use crate::error::{Accumulator, CallSiteError, CallSiteErrorKind};
use crate::types::{CallInfo, ComparatorRequest, Location, tokens_text};

/// Validates every call of one file.
///
/// Returns a request per call, in order, or every error found. One bad call
/// rejects the whole file.
pub fn validate_calls(
    file: &Path,
    calls: &[CallInfo<'_>],
) -> Result<Vec<ComparatorRequest>, Vec<CallSiteError>> {
    let mut errors = Accumulator::new();
    let mut requests = Vec::with_capacity(calls.len());

    for call in calls {
        let result = validate_call(call).map_err(|kinds| {
            kinds
                .into_iter()
                .map(|(location, kind)| CallSiteError {
                    file: file.to_path_buf(),
                    location,
                    kind,
                })
                .collect::<Vec<_>>()
        });
        match result {
            Ok(request) => requests.push(request),
            Err(call_errors) => {
                for error in call_errors {
                    errors.push(error);
                }
            }
        }
    }

    errors.finish_with(requests)
}

/// Validates one call, collecting every problem with it.
pub fn validate_call(
    call: &CallInfo<'_>,
) -> Result<ComparatorRequest, Vec<(Location, CallSiteErrorKind)>> {
    let mut errors = Accumulator::new();
    let location = call.location();

    let ty = match call.type_arguments.as_slice() {
        [] => {
            errors.push((
                location,
                CallSiteErrorKind::UnreachableTypeArgument {
                    ty: "_".to_owned(),
                    reason: "no explicit type argument".to_owned(),
                },
            ));
            None
        }
        [argument] if argument.is_reachable() => match fieldless(argument.ty) {
            Some(reason) => {
                errors.push((
                    location,
                    CallSiteErrorKind::UnsupportedTypeArgument {
                        ty: argument.to_string(),
                        reason: reason.to_owned(),
                    },
                ));
                None
            }
            None => Some(argument.ty.clone()),
        },
        [argument] => {
            errors.push((
                location,
                CallSiteErrorKind::UnreachableTypeArgument {
                    ty: argument.to_string(),
                    reason: argument.origin.reason().to_owned(),
                },
            ));
            None
        }
        [first, ..] => {
            errors.push((
                location,
                CallSiteErrorKind::UnreachableTypeArgument {
                    ty: first.to_string(),
                    reason: format!(
                        "expected one type argument, found {}",
                        call.type_arguments.len()
                    ),
                },
            ));
            None
        }
    };

    let mut fields = Vec::with_capacity(call.arguments.len());
    for argument in &call.arguments {
        let Some(field) = argument.value.as_ref().and_then(|value| value.as_str()) else {
            errors.push((
                argument.location(),
                CallSiteErrorKind::NonLiteralFieldArgument {
                    arg: tokens_text(argument.expr),
                },
            ));
            continue;
        };
        if syn::parse_str::<Member>(field).is_err() {
            errors.push((
                argument.location(),
                CallSiteErrorKind::InvalidFieldName {
                    field: field.to_owned(),
                },
            ));
            continue;
        }
        fields.push(field.to_owned());
    }

    if call.arguments.is_empty() {
        errors.push((location, CallSiteErrorKind::NoFieldsSpecified));
    }

    let Some(ty) = ty else {
        return Err(errors.finish_with(()).err().unwrap_or_default());
    };
    errors.finish_with(ComparatorRequest {
        ty,
        fields,
        location,
    })
}

/// Why values of `ty` have no fields to compare, when that shows in its
/// syntax. References are followed, since field access auto-derefs them.
fn fieldless(ty: &Type) -> Option<&'static str> {
    match ty {
        Type::Reference(reference) => fieldless(&reference.elem),
        Type::Paren(paren) => fieldless(&paren.elem),
        Type::Group(group) => fieldless(&group.elem),
        Type::Ptr(_) => Some("raw pointers do not dereference to their fields"),
        Type::Slice(_) | Type::Array(_) => Some("slices and arrays have no fields"),
        Type::BareFn(_) => Some("function pointers have no fields"),
        Type::TraitObject(_) | Type::ImplTrait(_) => Some("trait types have no fields"),
        Type::Never(_) => Some("`!` has no fields"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::collect_calls;
    use crate::types::Target;
    use crate::unit::CompilationUnit;

    fn validate(src: &str) -> Result<Vec<ComparatorRequest>, Vec<CallSiteError>> {
        let unit = CompilationUnit::from_sources("app", [("people.rs", src)]).unwrap();
        let file = &unit.files()[0];
        let target: Target = "cmpgen::cmp_by_fields".parse().unwrap();
        let calls = collect_calls(&unit, file, &target);
        validate_calls(file.path(), &calls)
    }

    fn kinds(errors: Vec<CallSiteError>) -> Vec<CallSiteErrorKind> {
        errors.into_iter().map(|error| error.kind).collect()
    }

    #[test]
    fn test_valid_call() {
        let requests = validate(
            r#"
            struct Person { name: String, age: u32 }
            const AGE: &str = "age";
            fn f() { cmpgen::cmp_by_fields::<Person>(&["name", AGE]); }
            "#,
        )
        .unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].fields, ["name", "age"]);
        assert_eq!(requests[0].location.line, 4);
    }

    #[test]
    fn test_duplicate_fields_are_kept() {
        let requests = validate(
            r#"
            struct P { a: u8 }
            fn f() { cmpgen::cmp_by_fields::<P>(&["a", "a"]); }
            "#,
        )
        .unwrap();
        assert_eq!(requests[0].fields, ["a", "a"]);
    }

    #[test]
    fn test_non_literal_field() {
        let errors = validate(
            r#"
            struct P { a: u8 }
            fn f(field: &str) { cmpgen::cmp_by_fields::<P>(&["a", field]); }
            "#,
        )
        .unwrap_err();

        assert_eq!(
            kinds(errors),
            [CallSiteErrorKind::NonLiteralFieldArgument {
                arg: "field".into()
            }]
        );
    }

    #[test]
    fn test_missing_and_local_type_arguments() {
        let errors = validate(
            r#"
            fn f() {
                cmpgen::cmp_by_fields(&["a"]);
                struct Local { a: u8 }
                cmpgen::cmp_by_fields::<Local>(&["a"]);
            }
            "#,
        )
        .unwrap_err();

        assert_eq!(
            kinds(errors),
            [
                CallSiteErrorKind::UnreachableTypeArgument {
                    ty: "_".into(),
                    reason: "no explicit type argument".into(),
                },
                CallSiteErrorKind::UnreachableTypeArgument {
                    ty: "Local".into(),
                    reason: "declared in a local scope".into(),
                },
            ]
        );
    }

    #[test]
    fn test_no_fields_and_bad_names() {
        let errors = validate(
            r#"
            struct P;
            fn f() {
                cmpgen::cmp_by_fields::<P>(&[]);
                cmpgen::cmp_by_fields::<P>(&["fn", 3]);
            }
            "#,
        )
        .unwrap_err();

        assert_eq!(
            kinds(errors),
            [
                CallSiteErrorKind::NoFieldsSpecified,
                CallSiteErrorKind::InvalidFieldName { field: "fn".into() },
                CallSiteErrorKind::NonLiteralFieldArgument { arg: "3".into() },
            ]
        );
    }

    #[test]
    fn test_fieldless_type_arguments() {
        let errors = validate(
            r#"
            struct P { a: u8 }
            fn f() {
                cmpgen::cmp_by_fields::<*const P>(&["a"]);
                cmpgen::cmp_by_fields::<&[P]>(&["a"]);
                cmpgen::cmp_by_fields::<fn() -> P>(&["a"]);
                cmpgen::cmp_by_fields::<&P>(&["a"]);
            }
            "#,
        )
        .unwrap_err();

        assert_eq!(
            kinds(errors),
            [
                CallSiteErrorKind::UnsupportedTypeArgument {
                    ty: "*const P".into(),
                    reason: "raw pointers do not dereference to their fields".into(),
                },
                CallSiteErrorKind::UnsupportedTypeArgument {
                    ty: "&[P]".into(),
                    reason: "slices and arrays have no fields".into(),
                },
                CallSiteErrorKind::UnsupportedTypeArgument {
                    ty: "fn() -> P".into(),
                    reason: "function pointers have no fields".into(),
                },
            ]
        );
    }

    #[test]
    fn test_tuple_index_field() {
        let requests = validate(
            r#"
            struct Pair(u8, u8);
            fn f() {
                cmpgen::cmp_by_fields::<Pair>(&["1", "0"]);
            }
            "#,
        )
        .unwrap();
        assert_eq!(requests[0].fields, ["1", "0"]);
    }
}
