//! Runtime registry of generated comparators.
//!
//! Generated companion files submit a [`Registration`] through `inventory`.
//! The first lookup through [`Registry::global`] runs every submission into a
//! fresh registry, which is read-only from then on.
//!
//! # Thread Safety
//!
//! A [`Registry`] value is an ordinary map and is mutated only through
//! `&mut self`. The process-wide instance is built exactly once inside a
//! `OnceLock` and never handed out mutably, so concurrent readers need no lock.

use std::any::{Any, TypeId, type_name};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use thiserror::Error;

/// A comparator over two values of `T`.
pub type Comparator<T> = fn(&T, &T) -> Ordering;

/// Separator placed between field names in a [`RegistryKey`].
pub const FIELD_SEPARATOR: &str = ", ";

/// Identity of one generated comparator: the compared type plus the ordered
/// field list.
///
/// Keys built from `["name", "age"]` and `["age", "name"]` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    type_id: TypeId,
    fields: String,
}

impl RegistryKey {
    /// Builds the key for comparing `T` by `fields`, in order.
    pub fn new<T: 'static, S: AsRef<str>>(fields: &[S]) -> Self {
        let mut joined = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                joined.push_str(FIELD_SEPARATOR);
            }
            joined.push_str(field.as_ref());
        }

        Self {
            type_id: TypeId::of::<T>(),
            fields: joined,
        }
    }

    /// The joined field list.
    pub fn fields(&self) -> &str {
        &self.fields
    }
}

/// Returned when no comparator was registered for a type and field list.
///
/// The registry cannot tell a companion file that was never generated from
/// one that is out of date with its source; both end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "no comparator registered for `{type_name}` by [{fields}]; \
     the generated companion file is missing or stale, rerun cmpgen"
)]
pub struct RegistryMiss {
    /// Name of the requested type.
    pub type_name: &'static str,
    /// The requested fields, joined with [`FIELD_SEPARATOR`].
    pub fields: String,
}

/// A stored comparator. The boxed value is always the `Comparator<T>` for the
/// `T` whose `TypeId` is part of the entry's key.
struct Entry {
    type_name: &'static str,
    comparator: Box<dyn Any + Send + Sync>,
}

/// Map from [`RegistryKey`] to a comparator.
#[derive(Default)]
pub struct Registry {
    entries: FxHashMap<RegistryKey, Entry>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every [`Registration`] linked into the
    /// program.
    pub fn from_submissions() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<Registration> {
            (registration.register)(&mut registry);
        }
        registry
    }

    /// The process-wide registry, built from submissions on first use.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Self::from_submissions)
    }

    /// Stores `comparator` for `T` by `fields`, replacing any previous entry
    /// under the same key.
    pub fn register<T: 'static>(&mut self, fields: &[&str], comparator: Comparator<T>) {
        self.entries.insert(
            RegistryKey::new::<T, _>(fields),
            Entry {
                type_name: type_name::<T>(),
                comparator: Box::new(comparator),
            },
        );
    }

    /// Looks up the comparator for `T` by `fields`.
    pub fn lookup<T: 'static>(&self, fields: &[&str]) -> Result<Comparator<T>, RegistryMiss> {
        let key = RegistryKey::new::<T, _>(fields);
        self.entries
            .get(&key)
            .and_then(|entry| entry.comparator.downcast_ref::<Comparator<T>>())
            .copied()
            .ok_or_else(|| RegistryMiss {
                type_name: type_name::<T>(),
                fields: key.fields,
            })
    }

    /// Number of registered comparators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.type_name, key.fields()))
            .collect();
        entries.sort_unstable();
        f.debug_struct("Registry").field("entries", &entries).finish()
    }
}

/// One companion file's contribution to the global registry.
///
/// Submitted by generated code with `inventory::submit!`.
pub struct Registration {
    register: fn(&mut Registry),
}

impl Registration {
    /// Wraps the function that registers a companion file's comparators.
    pub const fn new(register: fn(&mut Registry)) -> Self {
        Self { register }
    }
}

inventory::collect!(Registration);

/// Returns the generated comparator for `T` by `fields`.
///
/// This is the marker function whose call sites `cmpgen` scans for. Every
/// call must name the type with a turbofish and the fields as string literals.
///
/// # Panics
///
/// Panics with the [`RegistryMiss`] message when the companion file for the
/// calling module was not generated, not included, or is stale. There is no
/// fallback comparator. Use [`try_cmp_by_fields`] to handle the miss instead.
pub fn cmp_by_fields<T: 'static>(fields: &[&str]) -> Comparator<T> {
    match try_cmp_by_fields(fields) {
        Ok(comparator) => comparator,
        Err(miss) => panic!("{miss}"),
    }
}

/// Like [`cmp_by_fields`], but returns the miss.
pub fn try_cmp_by_fields<T: 'static>(fields: &[&str]) -> Result<Comparator<T>, RegistryMiss> {
    Registry::global().lookup(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    fn person(name: &str, age: u32) -> Person {
        Person {
            name: name.to_owned(),
            age,
        }
    }

    #[test]
    fn test_register_then_lookup() {
        let mut registry = Registry::new();
        registry.register::<Person>(&["age"], |a, b| a.age.cmp(&b.age));

        let cmp = registry.lookup::<Person>(&["age"]).unwrap();
        assert_eq!(cmp(&person("A", 1), &person("B", 2)), Ordering::Less);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_miss_names_type_and_fields() {
        let registry = Registry::new();
        let miss = registry.lookup::<Person>(&["name", "age"]).unwrap_err();

        assert!(miss.type_name.ends_with("Person"));
        assert_eq!(miss.fields, "name, age");
        assert!(miss.to_string().contains("rerun cmpgen"));
    }

    #[test]
    fn test_keys_are_order_sensitive() {
        assert_ne!(
            RegistryKey::new::<Person, _>(&["name", "age"]),
            RegistryKey::new::<Person, _>(&["age", "name"])
        );

        let mut registry = Registry::new();
        registry.register::<Person>(&["name", "age"], |a, b| a.name.cmp(&b.name));
        assert!(registry.lookup::<Person>(&["age", "name"]).is_err());
    }

    #[test]
    fn test_keys_are_type_sensitive() {
        let mut registry = Registry::new();
        registry.register::<Person>(&["age"], |a, b| a.age.cmp(&b.age));

        // Same field list, different type.
        assert!(registry.lookup::<(u32, u32)>(&["age"]).is_err());
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = Registry::new();
        registry.register::<Person>(&["age"], |a, b| a.age.cmp(&b.age));
        registry.register::<Person>(&["age"], |a, b| b.age.cmp(&a.age));

        let cmp = registry.lookup::<Person>(&["age"]).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(cmp(&person("A", 1), &person("B", 2)), Ordering::Greater);
    }

    #[test]
    fn test_key_from_owned_fields_matches_literals() {
        let owned = vec!["name".to_owned(), "age".to_owned()];
        assert_eq!(
            RegistryKey::new::<Person, _>(&owned),
            RegistryKey::new::<Person, _>(&["name", "age"])
        );
    }

    #[test]
    fn test_empty_registry_debug() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(format!("{registry:?}"), "Registry { entries: [] }");
    }
}
