use syn::Type;

use crate::types::Location;

/// A validated call site: compare `ty` by `fields`, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparatorRequest {
    pub ty: Type,
    pub fields: Vec<String>,
    pub location: Location,
}
