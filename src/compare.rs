//! Comparison helpers shared by generated code and hand-written comparators.

use std::cmp::Ordering;

/// Compares two field values by their natural order.
///
/// Numbers compare numerically and strings byte-lexicographically. Values that
/// are unordered with themselves (floating-point NaN) sort before everything
/// else and equal to each other, so the result is a total order.
pub fn compare_field<T: PartialOrd + ?Sized>(a: &T, b: &T) -> Ordering {
    if let Some(ordering) = a.partial_cmp(b) {
        return ordering;
    }

    let a_unordered = a.partial_cmp(a).is_none();
    let b_unordered = b.partial_cmp(b).is_none();
    b_unordered.cmp(&a_unordered)
}

/// Builds a comparator from a key extraction function.
pub fn by_key<T, K, F>(key: F) -> impl Fn(&T, &T) -> Ordering
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    move |a, b| compare_field(&key(a), &key(b))
}

/// Combines comparators: the first non-`Equal` result wins.
pub fn chain<T, I, F>(comparators: I) -> impl Fn(&T, &T) -> Ordering
where
    I: IntoIterator<Item = F>,
    F: Fn(&T, &T) -> Ordering,
{
    let comparators: Vec<F> = comparators.into_iter().collect();
    move |a, b| {
        comparators
            .iter()
            .map(|cmp| cmp(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn test_compare_field_numbers_and_strings() {
        assert_eq!(compare_field(&1, &2), Ordering::Less);
        assert_eq!(compare_field(&-3i64, &-3i64), Ordering::Equal);
        assert_eq!(compare_field("Bob", "Alice"), Ordering::Greater);
        assert_eq!(
            compare_field(&"Alice".to_owned(), &"Alicia".to_owned()),
            Ordering::Less
        );
    }

    #[test]
    fn test_compare_field_nan_sorts_first() {
        assert_eq!(compare_field(&f64::NAN, &1.0), Ordering::Less);
        assert_eq!(compare_field(&1.0, &f64::NAN), Ordering::Greater);
        assert_eq!(compare_field(&f32::NAN, &f32::NAN), Ordering::Equal);
        assert_eq!(compare_field(&0.5, &0.25), Ordering::Greater);
    }

    #[test]
    fn test_chain_by_key() {
        let mut people = vec![
            Person {
                name: "Bob".into(),
                age: 24,
            },
            Person {
                name: "Alice".into(),
                age: 55,
            },
            Person {
                name: "Alice".into(),
                age: 20,
            },
        ];

        let by_name: Box<dyn Fn(&Person, &Person) -> Ordering> =
            Box::new(by_key(|p: &Person| p.name.clone()));
        let by_age: Box<dyn Fn(&Person, &Person) -> Ordering> =
            Box::new(by_key(|p: &Person| p.age));
        let cmp = chain([by_name, by_age]);
        people.sort_by(|a, b| cmp(a, b));

        let ages: Vec<_> = people.iter().map(|p| p.age).collect();
        assert_eq!(ages, [20, 55, 24]);
    }

    #[test]
    fn test_chain_of_nothing_is_equal() {
        let cmp = chain(Vec::<fn(&u8, &u8) -> Ordering>::new());
        assert_eq!(cmp(&1, &2), Ordering::Equal);
    }
}
