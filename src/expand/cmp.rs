/// Registration code for comparator requests.
///
/// This module contains:
/// - `expand_registrations`: the block-local function registering every
///   comparator of one file
/// - the per-request comparator closure built from the field chain
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::expand::common::{FieldAccess, RuntimeNames, build_cmp_check, chain_cmp_checks};
use crate::types::ComparatorRequest;

//=============================================================================
// Main Entry Point
//=============================================================================

/// Expands the requests of one file into a registration function.
pub fn expand_registrations(
    requests: &[ComparatorRequest],
    names: &RuntimeNames,
) -> syn::Result<TokenStream> {
    let registry = format_ident!("registry");
    let registry_ty = &names.registry;
    let register_fn = &names.register_fn;

    let registrations = requests
        .iter()
        .map(|request| expand_registration(request, &registry, names))
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        fn #register_fn(#registry: &mut #registry_ty) {
            #(#registrations)*
        }
    })
}

//=============================================================================
// Comparator Body Builders
//=============================================================================

fn expand_registration(
    request: &ComparatorRequest,
    registry: &syn::Ident,
    names: &RuntimeNames,
) -> syn::Result<TokenStream> {
    let ty = &request.ty;
    let fields = &request.fields;
    let body = build_cmp_body(request, names)?;

    Ok(quote! {
        #registry.register::<#ty>(&[#(#fields),*], |lhs: &#ty, rhs: &#ty| #body);
    })
}

fn build_cmp_body(request: &ComparatorRequest, names: &RuntimeNames) -> syn::Result<TokenStream> {
    let lhs = format_ident!("lhs");
    let rhs = format_ident!("rhs");

    let checks = request
        .fields
        .iter()
        .map(|field| {
            let access = FieldAccess::parse(field)?;
            Ok(build_cmp_check(&access, &lhs, &rhs, names))
        })
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(chain_cmp_checks(checks, names))
}
