//! Coverage tests for the public API surface: tags, errors, outcomes and
//! pipeline bookkeeping.

use std::sync::Arc;

use fieldflow::{
    Argument, Combiner, Element, Elements, Executor, Field, FieldflowError, FunctionalType,
    InMemoryExecutor, Inclusion, IntermediateOperation, IntermediateOperationType, NullOrder,
    Outcome, Pipeline, PipelineFactory, PipelineOptions, PredicateType, StandardPipelineFactory,
    TerminalFunction, TerminalOperation, TerminalOperationType, TypeTag, ValueKind, ValueSet,
};

#[derive(Debug, Clone, PartialEq)]
struct Item {
    label: String,
    weight: Option<u32>,
}

fn label(item: &Item) -> &String {
    &item.label
}

fn weight(item: &Item) -> Option<&u32> {
    item.weight.as_ref()
}

fn item(label: &str, weight: Option<u32>) -> Item {
    Item {
        label: label.to_string(),
        weight,
    }
}

// ============================================================================
// Tags
// ============================================================================

#[test]
fn predicate_type_tags_round_trip() {
    for kind in PredicateType::ALL {
        assert_eq!(kind.as_str().parse::<PredicateType>().unwrap(), kind);
        assert_eq!(kind.to_string(), kind.as_str());
        assert_eq!(kind.negate().negate(), kind);
        assert_ne!(kind.is_negated(), kind.negate().is_negated());
    }
    assert_eq!(" NOT_BETWEEN ".parse::<PredicateType>().unwrap(), PredicateType::NotBetween);
}

#[test]
fn predicate_type_pairs() {
    assert_eq!(PredicateType::GreaterThan.negate(), PredicateType::LessOrEqual);
    assert_eq!(PredicateType::LessThan.negate(), PredicateType::GreaterOrEqual);
    assert_eq!(PredicateType::In.negate(), PredicateType::NotIn);
    assert_eq!(PredicateType::NotMatches.positive(), PredicateType::Matches);
    assert!(PredicateType::NotContainsIgnoreCase.is_string_op());
    assert!(!PredicateType::Between.is_string_op());
}

#[test]
fn unknown_tags_are_rejected() {
    let err = "roughly_equal".parse::<PredicateType>().unwrap_err();
    assert!(matches!(err, FieldflowError::UnknownTag { kind: "predicate type", .. }));
    assert!("fold".parse::<TerminalOperationType>().is_err());
    assert!("window".parse::<IntermediateOperationType>().is_err());
    assert!("xx".parse::<Inclusion>().is_err());
    assert!("middle".parse::<NullOrder>().is_err());
}

#[test]
fn inclusion_tags_and_bounds() {
    assert_eq!("ie".parse::<Inclusion>().unwrap(), Inclusion::StartInclusiveEndExclusive);
    assert_eq!("EI".parse::<Inclusion>().unwrap(), Inclusion::StartExclusiveEndInclusive);
    assert_eq!(Inclusion::default(), Inclusion::StartInclusiveEndExclusive);
    for (start, end) in [(false, false), (false, true), (true, false), (true, true)] {
        let inclusion = Inclusion::from_bounds(start, end);
        assert_eq!(inclusion.includes_start(), start);
        assert_eq!(inclusion.includes_end(), end);
        assert_eq!(inclusion.as_str().parse::<Inclusion>().unwrap(), inclusion);
    }
}

#[test]
fn null_order_tags() {
    assert_eq!(NullOrder::default(), NullOrder::Last);
    assert_eq!("nulls_first".parse::<NullOrder>().unwrap(), NullOrder::First);
    assert_eq!("Last".parse::<NullOrder>().unwrap(), NullOrder::Last);
}

#[test]
fn operation_type_tags() {
    for kind in IntermediateOperationType::ALL {
        assert_eq!(kind.as_str().parse::<IntermediateOperationType>().unwrap(), kind);
    }
    assert!(!IntermediateOperationType::Map.preserves_type());
    assert!(!IntermediateOperationType::FlatMap.preserves_type());
    assert!(IntermediateOperationType::Sorted.preserves_type());

    for kind in TerminalOperationType::ALL {
        assert_eq!(kind.as_str().parse::<TerminalOperationType>().unwrap(), kind);
    }
    assert_eq!(TerminalOperationType::ForEach.functional_type(), FunctionalType::Accept);
    assert_eq!(TerminalOperationType::Count.functional_type(), FunctionalType::ToCount);
    assert_eq!(TerminalOperationType::NoneMatch.functional_type(), FunctionalType::ToBool);
    assert_eq!(TerminalOperationType::Min.functional_type(), FunctionalType::Apply);
}

#[test]
fn combiner_flip() {
    assert_eq!(Combiner::And.flip(), Combiner::Or);
    assert_eq!(Combiner::Or.flip(), Combiner::And);
}

#[test]
fn value_kinds() {
    assert!(ValueKind::I64.is_integer());
    assert!(ValueKind::U8.is_integer());
    assert!(!ValueKind::F64.is_integer());
    assert!(ValueKind::F32.is_floating());
    assert_eq!(ValueKind::String.to_string(), "string");
}

#[test]
fn type_tags() {
    let tag = TypeTag::of::<Item>();
    assert!(tag.is::<Item>());
    assert!(!tag.is::<String>());
    assert_eq!(tag, TypeTag::of::<Item>());
    assert!(tag.name().ends_with("Item"));
}

// ============================================================================
// Fields and predicates
// ============================================================================

#[test]
fn blank_column_is_rejected() {
    let err = Field::new("  ", label, false).unwrap_err();
    assert!(matches!(err, FieldflowError::InvalidArgument { name: "column", .. }));
    assert!(Field::nullable("", weight, false).is_err());
}

#[test]
fn invalid_pattern_is_rejected() {
    let field = Field::new("label", label, false).unwrap();
    let err = field.matches("(unclosed").unwrap_err();
    assert!(matches!(err, FieldflowError::InvalidRegex(_)));
}

#[test]
fn field_metadata() {
    let field = Field::nullable("weight", weight, true).unwrap();
    assert_eq!(field.column_name(), "weight");
    assert_eq!(field.kind(), ValueKind::U32);
    assert_eq!(field.table(), TypeTag::of::<Item>());
    assert!(field.is_nullable());
    assert!(field.is_unique());
    assert_eq!(field.get(&item("a", None)), None);
}

#[test]
fn predicate_introspection() {
    let field = Field::nullable("weight", weight, false).unwrap();
    let between = field.between(1, 9, Inclusion::StartExclusiveEndInclusive);
    assert_eq!(between.predicate_type(), PredicateType::Between);
    assert_eq!(between.inclusion(), Some(Inclusion::StartExclusiveEndInclusive));
    assert_eq!(between.field().column_name(), "weight");
    assert_eq!(field.equal(3).inclusion(), None);
}

#[test]
fn string_predicates_on_non_null_values() {
    let field = Field::new("label", label, false).unwrap();
    let apple = item("Apple pie", None);
    assert!(field.equal_ignore_case("APPLE PIE").test(&apple));
    assert!(field.starts_with("Apple").test(&apple));
    assert!(!field.starts_with("apple").test(&apple));
    assert!(field.starts_with_ignore_case("apple").test(&apple));
    assert!(field.ends_with_ignore_case("PIE").test(&apple));
    assert!(field.not_ends_with("cake").test(&apple));
    assert!(field.contains("e p").test(&apple));
    assert!(field.not_contains_ignore_case("tart").test(&apple));
    assert!(field.is_not_empty().test(&apple));
    assert!(field.is_empty().test(&item("", None)));
    assert!(field.matches(r"\bpie$").unwrap().test(&apple));
    assert!(field.not_matches("^pie").unwrap().test(&apple));
}

#[test]
fn value_set_null_membership() {
    let plain = ValueSet::new([1u32, 2, 2, 3]);
    assert_eq!(plain.len(), 3);
    assert!(!plain.contains(None));
    assert!(plain.contains(Some(&2)));

    let with_null = plain.clone().with_null();
    assert!(with_null.contains(None));
    assert!(with_null.contains_null());
    assert!(!with_null.same_members(&plain));
    assert!(ValueSet::<u32>::new([]).is_empty());
}

// ============================================================================
// Pipelines
// ============================================================================

#[test]
fn pipeline_options_flow_from_factory() {
    assert_eq!(
        PipelineOptions::default(),
        PipelineOptions {
            ordered: true,
            parallel: false,
        }
    );
    let options = PipelineOptions::default().ordered(false).parallel(true);
    let factory = StandardPipelineFactory::with_options(options);
    let pipeline = factory.create_pipeline::<Item>();
    assert_eq!(pipeline.options(), options);
    assert_eq!(pipeline.root(), TypeTag::of::<Item>());
    assert!(pipeline.is_empty());
    assert!(!pipeline.is_sealed());
}

#[test]
fn stage_input_must_match_current_type() {
    let mut pipeline = Pipeline::<Item>::new(PipelineOptions::default());
    pipeline
        .append(IntermediateOperation::map(|i: Item| i.label))
        .unwrap();
    assert_eq!(pipeline.current_type(), TypeTag::of::<String>());

    let err = pipeline
        .append(IntermediateOperation::limit::<Item>(2))
        .unwrap_err();
    assert!(matches!(err, FieldflowError::TypeMismatch { position: 1, .. }));

    let err = pipeline
        .set_terminal(TerminalOperation::count::<Item>())
        .unwrap_err();
    assert!(matches!(err, FieldflowError::TypeMismatch { .. }));
    assert!(!pipeline.is_sealed());
    assert_eq!(pipeline.operations().len(), 1);
}

#[test]
fn sealed_pipeline_rejects_second_terminal() {
    let mut pipeline = Pipeline::<Item>::new(PipelineOptions::default());
    pipeline
        .set_terminal(TerminalOperation::count::<Item>())
        .unwrap();
    let err = pipeline
        .set_terminal(TerminalOperation::find_first::<Item>())
        .unwrap_err();
    assert!(matches!(err, FieldflowError::PipelineSealed { terminal: "count" }));
    assert_eq!(
        pipeline.terminal().map(|t| t.kind()),
        Some(TerminalOperationType::Count)
    );
}

#[test]
fn terminal_shape_is_checked() {
    let apply = TerminalFunction::Apply(Arc::new(|_: Elements| -> fieldflow::Result<Element> {
        let unit: Element = Box::new(());
        Ok(unit)
    }));
    let err = TerminalOperation::new(
        TerminalOperationType::Count,
        TypeTag::of::<Item>(),
        TypeTag::of::<usize>(),
        apply.clone(),
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FieldflowError::FunctionalShapeMismatch {
            operation: "count",
            expected: "to_count",
            actual: "apply",
        }
    ));

    let ok = TerminalOperation::new(
        TerminalOperationType::FindFirst,
        TypeTag::of::<Item>(),
        TypeTag::of::<()>(),
        apply,
        Vec::new(),
    )
    .unwrap();
    assert_eq!(ok.functional_type(), FunctionalType::Apply);
}

#[test]
fn operation_arguments() {
    let limit = IntermediateOperation::limit::<Item>(4);
    assert_eq!(limit.kind(), IntermediateOperationType::Limit);
    assert_eq!(limit.arguments().len(), 1);
    assert_eq!(limit.arguments()[0].as_count(), Some(4));
    assert!(matches!(limit.arguments()[0], Argument::Count(4)));

    let reduce = TerminalOperation::reduce(0u32, |a, b| a + b);
    assert_eq!(reduce.kind(), TerminalOperationType::Reduce);
    assert_eq!(reduce.arguments()[0].as_value::<u32>(), Some(&0));
    assert_eq!(reduce.arguments()[0].as_value::<i64>(), None);
}

#[test]
fn outcome_accessors() {
    assert_eq!(Outcome::Bool(true).as_bool(), Some(true));
    assert_eq!(Outcome::Count(3).as_count(), Some(3));
    assert!(Outcome::Unit.is_unit());
    assert_eq!(Outcome::Unit.as_count(), None);

    let err = Outcome::Count(1).into_value::<usize>().unwrap_err();
    assert!(matches!(err, FieldflowError::ElementType { .. }));
    let err = Outcome::Value(Box::new(5u8)).into_value::<u16>().unwrap_err();
    assert!(matches!(err, FieldflowError::ElementType { .. }));
}

#[test]
fn match_terminals() {
    let heavy = Field::nullable("weight", weight, false).unwrap().greater_than(10);
    let items = || vec![item("a", Some(3)), item("b", Some(30)), item("c", None)];
    let factory = StandardPipelineFactory::new();

    let any = factory.create_stream::<Item>().any_match(heavy.clone());
    let all = factory.create_stream::<Item>().all_match(heavy.clone());
    let none = factory.create_stream::<Item>().none_match(heavy.clone());

    assert_eq!(InMemoryExecutor.execute(&any, items()).unwrap().as_bool(), Some(true));
    assert_eq!(InMemoryExecutor.execute(&all, items()).unwrap().as_bool(), Some(false));
    assert_eq!(InMemoryExecutor.execute(&none, items()).unwrap().as_bool(), Some(false));

    let all_empty = factory.create_stream::<Item>().all_match(heavy);
    assert_eq!(
        InMemoryExecutor.execute(&all_empty, Vec::new()).unwrap().as_bool(),
        Some(true)
    );
}

fn itself(n: &u32) -> &u32 {
    n
}

#[test]
fn remaining_stages_in_memory() {
    let n = Field::new("n", itself, false).unwrap();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let pipeline = StandardPipelineFactory::new()
        .create_stream::<u32>()
        .peek(move |n: &u32| sink.lock().unwrap().push(*n))
        .drop_while(n.less_than(3))
        .take_while(n.less_than(8))
        .sorted_natural()
        .collect();

    let out: Vec<u32> = InMemoryExecutor
        .execute(&pipeline, vec![1, 2, 5, 3, 9, 4])
        .unwrap()
        .into_vec()
        .unwrap();
    assert_eq!(out, [3, 5]);
    assert_eq!(*seen.lock().unwrap(), [1, 2, 5, 3, 9, 4]);
}

#[test]
fn reduce_optional_and_find_first_on_empty() {
    let factory = StandardPipelineFactory::new();
    let sum = factory
        .create_stream::<u32>()
        .reduce_optional(|a, b| a + b);
    let none: Option<u32> = InMemoryExecutor
        .execute(&sum, Vec::new())
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(none, None);

    let first = factory.create_stream::<u32>().find_first();
    let found: Option<u32> = InMemoryExecutor
        .execute(&first, vec![7, 8])
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(found, Some(7));
}

#[test]
fn unterminated_pipeline_returns_stream() {
    let pipeline = StandardPipelineFactory::new()
        .create_stream::<Item>()
        .skip(1)
        .build();
    assert!(!pipeline.is_sealed());
    let rest: Vec<Item> = InMemoryExecutor
        .execute(&pipeline, vec![item("a", None), item("b", None)])
        .unwrap()
        .into_vec()
        .unwrap();
    assert_eq!(rest, [item("b", None)]);
}

// ============================================================================
// Serde
// ============================================================================

#[cfg(feature = "serde")]
#[test]
fn tags_serialize_as_snake_case() {
    assert_eq!(
        serde_json::to_string(&PredicateType::NotBetween).unwrap(),
        "\"not_between\""
    );
    assert_eq!(
        serde_json::to_string(&NullOrder::First).unwrap(),
        "\"first\""
    );
    let options: PipelineOptions = serde_json::from_str(r#"{"parallel": true}"#).unwrap();
    assert_eq!(options, PipelineOptions::default().parallel(true));
}
