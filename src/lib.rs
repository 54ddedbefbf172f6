//! # cmpgen
//!
//! Field-ordered comparators, generated ahead of time and looked up by type
//! and field list at runtime.
//!
//! ## How it works
//!
//! - **Ask**: call [`cmp_by_fields::<T>(&["name", "age"])`](cmp_by_fields)
//!   wherever a comparator is needed. The type must be nameable from the top
//!   of the file and the fields must be string constants.
//! - **Generate**: `cmpgen generate src/` finds those calls and writes a
//!   `<file>_generated.rs` companion next to every source file that has them.
//! - **Include**: add `include!("<file>_generated.rs");` at the top level of
//!   the source file once. The companion registers its comparators with the
//!   global [`Registry`] through `inventory`.
//! - **Sort**: at runtime the call returns the registered comparator. A call
//!   whose comparator was never generated panics with a [`RegistryMiss`].
//!
//! ## Example
//!
//! A companion registers comparators like this one:
//!
//! ```rust
//! use std::cmp::Ordering;
//!
//! use cmpgen::{Registry, compare_field};
//!
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let mut registry = Registry::new();
//! registry.register::<Person>(&["name", "age"], |lhs: &Person, rhs: &Person| {
//!     match compare_field(&lhs.name, &rhs.name) {
//!         Ordering::Equal => compare_field(&lhs.age, &rhs.age),
//!         other => other,
//!     }
//! });
//!
//! let cmp = registry.lookup::<Person>(&["name", "age"]).unwrap();
//! let mut people = vec![
//!     Person { name: "Bob".into(), age: 24 },
//!     Person { name: "Alice".into(), age: 55 },
//!     Person { name: "Alice".into(), age: 20 },
//! ];
//! people.sort_by(cmp);
//!
//! let ages: Vec<_> = people.iter().map(|p| p.age).collect();
//! assert_eq!(ages, [20, 55, 24]);
//! assert!(registry.lookup::<Person>(&["age", "name"]).is_err());
//! ```
//!
//! ## Features
//!
//! - `codegen`: the analyzer and generator (`unit`, `analyze`, `validate`,
//!   `expand`, `generate`).
//! - `cli` (default): the `cmpgen` binary.
//!
//! Programs that only consume generated comparators can depend on cmpgen
//! with `default-features = false`.

mod compare;
mod registry;

#[cfg(feature = "codegen")]
pub mod analyze;
#[cfg(feature = "codegen")]
pub mod error;
#[cfg(feature = "codegen")]
pub mod expand;
#[cfg(feature = "codegen")]
pub mod generate;
#[cfg(feature = "codegen")]
pub mod types;
#[cfg(feature = "codegen")]
pub mod unit;
#[cfg(feature = "codegen")]
pub mod validate;

pub use crate::compare::{by_key, chain, compare_field};
pub use crate::registry::{
    Comparator, FIELD_SEPARATOR, Registration, Registry, RegistryKey, RegistryMiss, cmp_by_fields,
    try_cmp_by_fields,
};

#[cfg(feature = "codegen")]
pub use crate::generate::{GenerateOptions, Generation, Generator};
#[cfg(feature = "codegen")]
pub use crate::unit::CompilationUnit;

/// Used by generated code to submit registrations.
#[doc(hidden)]
pub use inventory;
