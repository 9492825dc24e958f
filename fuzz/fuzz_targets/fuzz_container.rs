#![no_main]

//! Fuzz target for registration and resolution
//!
//! Registers arbitrary entries (including malformed records) under a small set
//! of names and checks the container's invariants after every operation.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use service_container::{ClassDescriptor, Container, DiError, ServiceDefinition, Value};
use std::collections::HashSet;
use std::sync::Arc;

const NAMES: [&str; 4] = ["a", "b", "c", "d"];
const CLASSES: [&str; 3] = ["Counter", "Missing", ""];
const METHODS: [&str; 3] = ["bump", "add", "nope"];

struct Counter {
    total: i64,
}

/// Bounded-depth stand-in for a JSON record
#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(u8),
    List(Vec<FuzzScalar>),
    Map(Vec<(u8, FuzzScalar)>),
}

#[derive(Debug, Arbitrary)]
enum FuzzScalar {
    Int(i64),
    Str(u8),
    Null,
}

impl From<&FuzzScalar> for Value {
    fn from(scalar: &FuzzScalar) -> Self {
        match scalar {
            FuzzScalar::Int(i) => Value::from(*i),
            FuzzScalar::Str(i) => Value::from(pick(&METHODS, *i)),
            FuzzScalar::Null => Value::Null,
        }
    }
}

impl From<&FuzzValue> for Value {
    fn from(value: &FuzzValue) -> Self {
        const KEYS: [&str; 4] = ["class", "arguments", "initialize", "method"];
        match value {
            FuzzValue::Null => Value::Null,
            FuzzValue::Bool(b) => Value::Bool(*b),
            FuzzValue::Int(i) => Value::from(*i),
            FuzzValue::Str(i) => Value::from(pick(&CLASSES, *i)),
            FuzzValue::List(items) => Value::Array(items.iter().map(Value::from).collect()),
            FuzzValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (pick(&KEYS, *k).to_owned(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Arbitrary)]
enum Step {
    Bump,
    Add(i64),
    Named(u8),
}

#[derive(Debug, Arbitrary)]
enum Entry {
    Shorthand(u8),
    Definition {
        class: u8,
        start: Option<i64>,
        steps: Vec<Step>,
    },
    Record(FuzzValue),
}

#[derive(Debug, Arbitrary)]
enum Op {
    Register(u8, Entry),
    Get(u8),
    Has(u8),
}

fn pick<'a>(options: &[&'a str], index: u8) -> &'a str {
    options[index as usize % options.len()]
}

fn counter_class() -> ClassDescriptor {
    ClassDescriptor::builder("Counter", |args| {
        let total = if args.is_empty() { 0 } else { args.int(0)? };
        Ok(Counter { total })
    })
    .method0("bump", |c: &mut Counter| c.total = c.total.wrapping_add(1))
    .method("add", 1, |c: &mut Counter, args| {
        c.total = c.total.wrapping_add(args.int(0)?);
        Ok(())
    })
    .build()
}

fn definition(class: u8, start: Option<i64>, steps: &[Step]) -> ServiceDefinition {
    let mut definition = ServiceDefinition::new(pick(&CLASSES, class));
    if let Some(start) = start {
        definition = definition.arg(start);
    }
    for step in steps {
        definition = match step {
            Step::Bump => definition.method("bump"),
            Step::Add(n) => definition.call("add", [*n]),
            Step::Named(i) => definition.method(pick(&METHODS, *i)),
        };
    }
    definition
}

fuzz_target!(|ops: Vec<Op>| {
    let container = Container::new();
    container.define_class(counter_class());

    let mut registered = HashSet::new();

    for op in ops {
        match op {
            Op::Register(name, entry) => {
                let name = pick(&NAMES, name);
                let result = match &entry {
                    Entry::Shorthand(class) => {
                        container.register_service(name, pick(&CLASSES, *class))
                    }
                    Entry::Definition { class, start, steps } => {
                        container.register_service(name, definition(*class, *start, steps))
                    }
                    Entry::Record(value) => container.register_service(name, Value::from(value)),
                };

                // Names are write-once
                if registered.insert(name) {
                    assert!(result.is_ok());
                } else {
                    assert!(matches!(result, Err(DiError::DuplicateService { .. })));
                }
            }
            Op::Get(name) => {
                let name = pick(&NAMES, name);
                match container.get_any(name) {
                    Ok(first) => {
                        assert!(container.is_resolved(name));
                        let second = container.get_any(name).unwrap();
                        assert!(Arc::ptr_eq(&first, &second));
                    }
                    Err(DiError::ServiceNotFound { .. }) => {
                        assert!(!registered.contains(name));
                    }
                    Err(_) => {
                        assert!(!container.is_resolved(name));
                    }
                }
            }
            Op::Has(name) => {
                let name = pick(&NAMES, name);
                assert_eq!(container.has(name), registered.contains(name));
            }
        }
    }
});
