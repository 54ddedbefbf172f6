//! A module that sorts people through generated comparators.

use cmpgen::cmp_by_fields;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: String,
    pub age: u32,
}

impl Person {
    pub fn new(name: &str, age: u32) -> Self {
        Self {
            name: name.to_owned(),
            age,
        }
    }
}

include!("people_generated.rs");

pub fn by_name_then_age(people: &mut [Person]) {
    people.sort_by(cmp_by_fields::<Person>(&["name", "age"]));
}

pub fn by_age(people: &mut [Person]) {
    people.sort_by(cmp_by_fields::<Person>(&["age"]));
}

pub fn by_age_then_name(people: &mut [Person]) {
    people.sort_by(cmp_by_fields::<Person>(&["age", "name"]));
}
