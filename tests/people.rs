//! Sorting through a checked-in companion file.

#[path = "fixtures/people/people.rs"]
mod people;

use std::cmp::Ordering;

use cmpgen::{RegistryMiss, cmp_by_fields, try_cmp_by_fields};
use people::Person;
use pretty_assertions::assert_eq;

fn people() -> Vec<Person> {
    vec![
        Person::new("Alice", 55),
        Person::new("Bob", 24),
        Person::new("Gopher", 13),
        Person::new("Alice", 20),
    ]
}

#[test]
fn test_sort_by_name_then_age() {
    let mut sorted = people();
    people::by_name_then_age(&mut sorted);

    assert_eq!(
        sorted,
        [
            Person::new("Alice", 20),
            Person::new("Alice", 55),
            Person::new("Bob", 24),
            Person::new("Gopher", 13),
        ]
    );
}

#[test]
fn test_sort_by_age() {
    let mut sorted = people();
    people::by_age(&mut sorted);

    let ages: Vec<_> = sorted.iter().map(|person| person.age).collect();
    assert_eq!(ages, [13, 20, 24, 55]);
}

#[test]
fn test_sort_by_age_then_name() {
    let mut sorted = vec![
        Person::new("Bob", 20),
        Person::new("Alice", 30),
        Person::new("Alice", 20),
    ];
    people::by_age_then_name(&mut sorted);

    assert_eq!(
        sorted,
        [
            Person::new("Alice", 20),
            Person::new("Bob", 20),
            Person::new("Alice", 30),
        ]
    );
}

#[test]
fn test_field_order_changes_the_comparator() {
    let bob = Person::new("Bob", 20);
    let alice = Person::new("Alice", 30);

    let by_name_age = cmp_by_fields::<Person>(&["name", "age"]);
    let by_age_name = cmp_by_fields::<Person>(&["age", "name"]);

    assert_eq!(by_name_age(&bob, &alice), Ordering::Greater);
    assert_eq!(by_age_name(&bob, &alice), Ordering::Less);
}

#[test]
fn test_unregistered_field_order_is_a_miss() {
    let miss = try_cmp_by_fields::<Person>(&["name"]).unwrap_err();

    assert_eq!(
        miss,
        RegistryMiss {
            type_name: std::any::type_name::<Person>(),
            fields: "name".to_owned(),
        }
    );
}

#[test]
#[should_panic(expected = "no comparator registered")]
fn test_marker_panics_on_a_miss() {
    let _ = cmp_by_fields::<Person>(&["name", "age", "name"]);
}

#[cfg(feature = "codegen")]
#[test]
fn test_companion_matches_synthesizer_output() {
    use std::path::Path;

    use cmpgen::expand::file::render;
    use cmpgen::generate::Generator;
    use cmpgen::unit::CompilationUnit;

    let source = Path::new("fixtures/people/people.rs");
    let unit = CompilationUnit::from_sources(
        "people",
        [(source, include_str!("fixtures/people/people.rs"))],
    )
    .unwrap();
    let file = &unit.files()[0];

    let requests = Generator::default().requests(&unit, file).unwrap();
    assert_eq!(requests.len(), 3);

    let rendered = render(
        source,
        file.syntax(),
        &requests,
        &syn::parse_quote!(::cmpgen),
        Path::new("fixtures/people/people_generated.rs"),
    )
    .unwrap();
    let checked_in = include_str!("fixtures/people/people_generated.rs");

    // Layout is prettyplease's; compare what it makes of both.
    let normalized = |text: &str| prettyplease::unparse(&syn::parse_file(text).unwrap());
    assert_eq!(normalized(checked_in), normalized(&rendered));

    let header = |text: &str| text.lines().take(5).collect::<Vec<_>>().join("\n");
    assert_eq!(header(checked_in), header(&rendered));
}
