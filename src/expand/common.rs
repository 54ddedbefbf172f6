/// Shared helpers for building comparator bodies.
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Ident, Member};

/// Names the generated code uses for runtime items, after import
/// deduplication and collision avoidance.
#[derive(Debug, Clone)]
pub struct RuntimeNames {
    pub ordering: Ident,
    pub registry: Ident,
    pub registration: Ident,
    pub compare_field: Ident,
    /// The block-local registration function.
    pub register_fn: Ident,
}

/// How to access a field of the two compared values.
pub struct FieldAccess {
    member: Member,
}

impl FieldAccess {
    /// Parses a field name: an identifier, or a tuple index such as `"0"`.
    pub fn parse(field: &str) -> syn::Result<Self> {
        let member = syn::parse_str(field)?;
        Ok(Self { member })
    }

    /// Builds references to the field of `lhs` and of `rhs`.
    pub fn as_refs(&self, lhs: &Ident, rhs: &Ident) -> (TokenStream, TokenStream) {
        let member = &self.member;
        (quote! { &#lhs.#member }, quote! { &#rhs.#member })
    }
}

/// Builds a comparison expression for a single field.
pub fn build_cmp_check(
    access: &FieldAccess,
    lhs: &Ident,
    rhs: &Ident,
    names: &RuntimeNames,
) -> TokenStream {
    let (lhs_ref, rhs_ref) = access.as_refs(lhs, rhs);
    let compare_field = &names.compare_field;
    quote! { #compare_field(#lhs_ref, #rhs_ref) }
}

/// Chains comparisons with early return on non-Equal.
pub fn chain_cmp_checks(
    comparisons: impl IntoIterator<Item = TokenStream>,
    names: &RuntimeNames,
) -> TokenStream {
    let ordering = &names.ordering;
    let mut iter = comparisons.into_iter();
    let Some(first) = iter.next() else {
        return quote! { #ordering::Equal };
    };
    iter.fold(first, |acc, cmp| {
        quote! {
            match #acc {
                #ordering::Equal => #cmp,
                other => other,
            }
        }
    })
}
