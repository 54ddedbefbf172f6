// @generated by cmpgen from `people.rs`. Do not edit.
//
// Include it at the top level of `people.rs`:
//
//     include!("people_generated.rs");

#[allow(unused_imports)]
const _: () = {
    use cmpgen::cmp_by_fields;
    use ::core::cmp::Ordering;
    use ::cmpgen::Registry;
    use ::cmpgen::Registration;
    use ::cmpgen::compare_field;
    fn register_comparators(registry: &mut Registry) {
        registry
            .register::<
                Person,
            >(
                &["name", "age"],
                |lhs: &Person, rhs: &Person| match compare_field(&lhs.name, &rhs.name) {
                    Ordering::Equal => compare_field(&lhs.age, &rhs.age),
                    other => other,
                },
            );
        registry
            .register::<
                Person,
            >(&["age"], |lhs: &Person, rhs: &Person| compare_field(&lhs.age, &rhs.age));
        registry
            .register::<
                Person,
            >(
                &["age", "name"],
                |lhs: &Person, rhs: &Person| match compare_field(&lhs.age, &rhs.age) {
                    Ordering::Equal => compare_field(&lhs.name, &rhs.name),
                    other => other,
                },
            );
    }
    ::cmpgen::inventory::submit! {
        Registration::new(register_comparators)
    }
};
