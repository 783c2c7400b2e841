//! Input/output type validation through the full pipeline.

use callscope::demo;
use callscope::registry::TypeSpec;
use callscope::{
    CallArgs, CallError, Callable, ConfigError, Engine, Module, ModuleLoader, Signature,
    ValidationError, Value, ValueType,
};

fn engine_with_m() -> Engine {
    let mut engine = Engine::new();
    engine.set_profiling(false);
    engine.provide("m", |_| {
        let mut module = Module::new("m");
        module.add_function(Callable::new("add", Signature::new(&["a", "b"]), |args| {
            Ok(Value::Int(args.int("a")? + args.int("b")?))
        }));
        Ok(module)
    });
    engine
}

#[test]
fn test_add_scenario() {
    let mut engine = engine_with_m();
    engine.set_input_types("m", "add", vec![ValueType::Int.into(), ValueType::Int.into()]);
    engine.set_output_types("m", "add", vec![ValueType::Int.into()]);
    let module = engine.load("m").unwrap();

    // add(2, 3) passes validation and returns 5.
    assert_eq!(
        module.call("add", &CallArgs::new().arg(2i64).arg(3i64)).unwrap(),
        Value::Int(5)
    );

    // add(2, 3.0) names position 2.
    let err = module.call("add", &CallArgs::new().arg(2i64).arg(3.0)).unwrap_err();
    match err {
        CallError::Validation(ValidationError::ArgumentTypeMismatch {
            position, expected, ..
        }) => {
            assert_eq!(position, 2);
            assert_eq!(expected, ValueType::Int);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // add(2) fails the arity check.
    let err = module.call("add", &CallArgs::new().arg(2i64)).unwrap_err();
    assert!(matches!(
        err,
        CallError::Validation(ValidationError::ArgumentCountMismatch {
            expected: 2,
            received: 1,
            ..
        })
    ));
}

#[test]
fn test_output_validation_single_value() {
    let mut engine = engine_with_m();
    engine.set_output_types("m", "add", vec![ValueType::Float.into()]);
    let module = engine.load("m").unwrap();
    // add returns an int; the declared float output rejects it at position 1.
    let err = module.call("add", &CallArgs::new().arg(2i64).arg(3i64)).unwrap_err();
    assert!(matches!(
        err,
        CallError::Validation(ValidationError::ReturnTypeMismatch { position: 1, .. })
    ));
}

#[test]
fn test_validation_with_tracing_composed() {
    let mut engine = engine_with_m();
    engine.trace("m", Some(&["add"]));
    engine.set_input_types("m", "add", vec![ValueType::Int.into(), ValueType::Int.into()]);
    engine.set_output_types("m", "add", vec![ValueType::Int.into()]);
    let module = engine.load("m").unwrap();

    assert_eq!(
        module.call("add", &CallArgs::new().arg(2i64).arg(3i64)).unwrap(),
        Value::Int(5)
    );
    assert!(module.call("add", &CallArgs::new().arg(2i64).arg(3.0)).is_err());
}

#[test]
fn test_owner_sentinel_on_methods() {
    let mut engine = Engine::new();
    engine.set_profiling(false);
    demo::install(&mut engine);
    engine.set_input_types(
        demo::SHAPES,
        "Square.area",
        vec![TypeSpec::Owner, ValueType::Float.into()],
    );
    engine.set_output_types(demo::SHAPES, "Square.area", vec![ValueType::Float.into()]);
    let shapes = engine.load(demo::SHAPES).unwrap();
    let square = shapes.class("Square").unwrap();
    let instance = square.instantiate(&CallArgs::new().arg("my_square")).unwrap();

    // The receiver slot is exempt; the float side passes, an int side fails.
    assert_eq!(
        square.call_method("area", &instance, &CallArgs::new().arg(2.0)).unwrap(),
        Value::Float(4.0)
    );
    let err =
        square.call_method("area", &instance, &CallArgs::new().arg(2i64)).unwrap_err();
    assert!(matches!(
        err,
        CallError::Validation(ValidationError::ArgumentTypeMismatch { position: 2, .. })
    ));
}

#[test]
fn test_keyword_arguments_count_toward_arity() {
    let mut engine = engine_with_m();
    engine.set_input_types("m", "add", vec![ValueType::Int.into(), ValueType::Int.into()]);
    let module = engine.load("m").unwrap();
    let args = CallArgs::new().arg(2i64).kwarg("b", 3i64);
    assert_eq!(module.call("add", &args).unwrap(), Value::Int(5));
}

#[test]
fn test_unrecognized_kind_is_invalid_configuration() {
    let mut engine = engine_with_m();
    let err = engine.register("m", Some(&["add"]), "signature", None).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidConfiguration(ref kind) if kind == "signature"));
}

#[test]
fn test_dynamic_registration_api() {
    let mut engine = engine_with_m();
    engine
        .register(
            "m",
            Some(&["add"]),
            "input-types",
            Some(vec![ValueType::Int.into(), ValueType::Int.into()]),
        )
        .unwrap();
    engine.register("m", Some(&["add"]), "trace", None).unwrap();
    let module = engine.load("m").unwrap();
    assert!(module.call("add", &CallArgs::new().arg(1i64).arg(2.0)).is_err());
    assert_eq!(
        module.call("add", &CallArgs::new().arg(1i64).arg(2i64)).unwrap(),
        Value::Int(3)
    );
}
