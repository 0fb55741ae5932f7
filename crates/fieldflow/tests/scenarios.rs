//! End-to-end scenarios: fields, predicates, comparators and pipelines together.

use fieldflow::{
    Entity, Executor, FieldflowError, InMemoryExecutor, Inclusion, IntermediateOperation,
    IntermediateOperationType, PipelineFactory, PredicateType, StandardPipelineFactory,
    TerminalOperation, TerminalOperationType, ValueSet,
};

#[derive(Debug, Clone, PartialEq, Entity)]
struct Person {
    #[field(unique)]
    id: u32,
    #[field]
    name: Option<String>,
    #[field]
    age: i32,
}

fn person(id: u32, name: Option<&str>, age: i32) -> Person {
    Person {
        id,
        name: name.map(str::to_string),
        age,
    }
}

fn people() -> Vec<Person> {
    vec![
        person(1, Some("Bo"), 17),
        person(2, Some("Ann"), 18),
        person(3, None, 40),
        person(4, Some("Cy"), 65),
        person(5, Some("Ann"), 66),
    ]
}

// ============================================================================
// Scenario 1: inclusive range over an int field
// ============================================================================

#[test]
fn age_between_inclusive_bounds() {
    let between = Person::AGE.between(18, 65, Inclusion::StartInclusiveEndInclusive);
    let not_between = Person::AGE.not_between(18, 65, Inclusion::StartInclusiveEndInclusive);

    for age in [18, 65] {
        assert!(between.test(&person(0, None, age)), "{age}");
        assert!(!not_between.test(&person(0, None, age)), "{age}");
    }
    for age in [17, 66] {
        assert!(!between.test(&person(0, None, age)), "{age}");
        assert!(not_between.test(&person(0, None, age)), "{age}");
    }
}

#[test]
fn not_between_is_the_negation_of_between() {
    let between = Person::AGE.between(18, 65, Inclusion::StartInclusiveEndInclusive);
    let negated = between.negate();
    assert_eq!(negated.predicate_type(), PredicateType::NotBetween);
    for age in 10..80 {
        let p = person(0, None, age);
        assert_eq!(negated.test(&p), !between.test(&p));
    }
}

// ============================================================================
// Scenario 2: set membership over a nullable string field
// ============================================================================

#[test]
fn name_in_set_with_null_records() {
    let names = || ["Ann".to_string(), "Bo".to_string()];
    let is_in = Person::NAME.is_in(names());
    let not_in = Person::NAME.not_in(names());

    assert!(is_in.test(&person(0, Some("Ann"), 0)));
    assert!(is_in.test(&person(0, Some("Bo"), 0)));
    assert!(!is_in.test(&person(0, Some("Cy"), 0)));

    let nameless = person(0, None, 0);
    assert!(!is_in.test(&nameless));
    assert!(not_in.test(&nameless));
}

#[test]
fn null_member_is_explicit() {
    let set = ValueSet::from_nullable([Some("Ann".to_string()), None]);
    let is_in = Person::NAME.is_in_set(set.clone());
    let not_in = Person::NAME.not_in_set(set);

    let nameless = person(0, None, 0);
    assert!(is_in.test(&nameless));
    assert!(!not_in.test(&nameless));
}

#[test]
fn equality_against_null() {
    let nameless = Person::NAME.equal_nullable(None);
    let named = Person::NAME.not_equal_nullable(None);

    let ids: Vec<u32> = people()
        .iter()
        .filter(|p| nameless.test(p))
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, [3]);

    let ids: Vec<u32> = people()
        .iter()
        .filter(|p| named.test(p))
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, [1, 2, 4, 5]);

    assert_eq!(nameless.predicate_type(), PredicateType::Equal);
    assert_eq!(nameless.negate().predicate_type(), PredicateType::NotEqual);
    let ann = Person::NAME.equal_nullable(Some("Ann".to_string()));
    assert_eq!(people().iter().filter(|p| ann.test(p)).count(), 2);
}

// ============================================================================
// Scenario 3: filter, sort and collect pipeline
// ============================================================================

#[test]
fn filter_sort_collect_pipeline() {
    let factory = StandardPipelineFactory::new();
    let mut pipeline = factory.create_pipeline::<Person>();
    assert!(pipeline.operations().is_empty());
    assert!(pipeline.terminal().is_none());

    pipeline
        .append(IntermediateOperation::filter(Person::AGE.between(
            18,
            65,
            Inclusion::StartInclusiveEndInclusive,
        )))
        .unwrap()
        .append(IntermediateOperation::sorted(Person::NAME.comparator()))
        .unwrap()
        .set_terminal(TerminalOperation::collect::<Person>())
        .unwrap();

    assert_eq!(pipeline.operations().len(), 2);
    assert_eq!(
        pipeline.operations()[0].kind(),
        IntermediateOperationType::Filter
    );
    assert_eq!(
        pipeline.operations()[1].kind(),
        IntermediateOperationType::Sorted
    );
    assert_eq!(
        pipeline.terminal().map(|t| t.kind()),
        Some(TerminalOperationType::Collect)
    );

    let err = pipeline
        .append(IntermediateOperation::limit::<Person>(1))
        .unwrap_err();
    assert!(matches!(err, FieldflowError::PipelineSealed { .. }));
    assert_eq!(pipeline.operations().len(), 2);

    let adults: Vec<Person> = InMemoryExecutor
        .execute(&pipeline, people())
        .unwrap()
        .into_vec()
        .unwrap();
    let ids: Vec<u32> = adults.iter().map(|p| p.id).collect();
    assert_eq!(ids, [2, 4, 3]);
}

#[test]
fn predicate_and_comparator_arguments_are_introspectable() {
    let pipeline = StandardPipelineFactory::new()
        .create_stream::<Person>()
        .filter(Person::AGE.greater_than(20))
        .sorted(Person::NAME.comparator_null_fields_first())
        .collect();

    let filter = &pipeline.operations()[0];
    let predicate = filter.arguments()[0].as_predicate::<Person>().unwrap();
    assert_eq!(predicate.predicate_type(), Some(PredicateType::GreaterThan));

    let sorted = &pipeline.operations()[1];
    assert!(sorted.arguments()[0].as_comparator::<Person>().is_some());
}

#[test]
fn field_projection_is_introspectable_and_replays() {
    let pipeline = StandardPipelineFactory::new()
        .create_stream::<Person>()
        .sorted(Person::ID.reversed())
        .map_field(Person::NAME)
        .collect();

    let map = &pipeline.operations()[1];
    assert_eq!(map.kind(), IntermediateOperationType::Map);
    let field = map.arguments()[0].as_field::<Person, String>().unwrap();
    assert_eq!(field.column_name(), "name");
    assert!(pipeline.current_type().is::<Option<String>>());

    let names: Vec<Option<String>> = InMemoryExecutor
        .execute(&pipeline, people())
        .unwrap()
        .into_vec()
        .unwrap();
    let expected: Vec<Option<String>> = [Some("Ann"), Some("Cy"), None, Some("Ann"), Some("Bo")]
        .into_iter()
        .map(|n| n.map(str::to_string))
        .collect();
    assert_eq!(names, expected);
}

// ============================================================================
// Further pipelines
// ============================================================================

#[test]
fn combined_predicates_in_a_pipeline() {
    let young_or_nameless = Person::AGE.less_than(18).or(Person::NAME.is_null());
    let pipeline = StandardPipelineFactory::new()
        .create_stream::<Person>()
        .filter(young_or_nameless)
        .map(|p: Person| p.id)
        .collect();
    let ids: Vec<u32> = InMemoryExecutor
        .execute(&pipeline, people())
        .unwrap()
        .into_vec()
        .unwrap();
    assert_eq!(ids, [1, 3]);
}

#[test]
fn distinct_names_in_descending_order() {
    let pipeline = StandardPipelineFactory::new()
        .create_stream::<Person>()
        .filter(Person::NAME.is_not_null())
        .sorted(Person::NAME.reversed())
        .flat_map(|p: Person| p.name)
        .distinct()
        .collect();
    let names: Vec<String> = InMemoryExecutor
        .execute(&pipeline, people())
        .unwrap()
        .into_vec()
        .unwrap();
    assert_eq!(names, ["Cy", "Bo", "Ann"]);
}

#[test]
fn reduce_ages() {
    let pipeline = StandardPipelineFactory::new()
        .create_stream::<Person>()
        .map(|p: Person| p.age)
        .reduce(0, |a, b| a + b);
    let total: i32 = InMemoryExecutor
        .execute(&pipeline, people())
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(total, 17 + 18 + 40 + 65 + 66);
}

#[test]
fn oldest_person() {
    let pipeline = StandardPipelineFactory::new()
        .create_stream::<Person>()
        .max(Person::AGE.comparator());
    let oldest: Option<Person> = InMemoryExecutor
        .execute(&pipeline, people())
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(oldest.map(|p| p.id), Some(5));
}

#[test]
fn unique_column_metadata() {
    let unique: Vec<_> = Person::unique_columns().iter().map(|c| c.name).collect();
    assert_eq!(unique, ["id"]);
    assert!(Person::ID.is_unique());
    assert!(!Person::AGE.is_unique());
}
