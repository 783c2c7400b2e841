//! Validate argument and return types of instrumented callables.
//!
//! `addition` only accepts two ints and must return an int; `Square.area`
//! takes its receiver (the owner sentinel, exempt from checking) plus a
//! float, and must return a float. Checks are exact — passing `3.0` where
//! an int is declared raises, with the offending position named.

use callscope::demo;
use callscope::registry::TypeSpec;
use callscope::{CallArgs, Engine, ModuleLoader, Value, ValueType};

fn main() -> anyhow::Result<()> {
    let mut engine = Engine::new();
    demo::install(&mut engine);
    engine.set_profiling(false);

    engine.trace(demo::MATH, Some(&["addition"]));
    engine.set_input_types(
        demo::MATH,
        "addition",
        vec![ValueType::Int.into(), ValueType::Int.into()],
    );
    engine.set_output_types(demo::MATH, "addition", vec![ValueType::Int.into()]);

    engine.set_input_types(
        demo::SHAPES,
        "Square.area",
        vec![TypeSpec::Owner, ValueType::Float.into()],
    );
    engine.set_output_types(demo::SHAPES, "Square.area", vec![ValueType::Float.into()]);

    let math = engine.load(demo::MATH)?;
    let sum = math.call("addition", &CallArgs::new().arg(2i64).arg(1i64))?;
    println!("addition(2, 1) -> {sum:?}");

    // Generate the errors the validators exist for:
    if let Err(e) = math.call("addition", &CallArgs::new().arg(2i64).arg(Value::Float(1.0))) {
        println!("addition(2, 1.0) rejected: {e}");
    }
    if let Err(e) = math.call("addition", &CallArgs::new().arg(2i64)) {
        println!("addition(2) rejected: {e}");
    }

    let shapes = engine.load(demo::SHAPES)?;
    let square = shapes.class("Square").expect("Square");
    let o = square.instantiate(&CallArgs::new().arg("my_square"))?;
    let area = square.call_method("area", &o, &CallArgs::new().arg(2.0))?;
    println!("Square.area(2.0) -> {area:?}");
    if let Err(e) = square.call_method("area", &o, &CallArgs::new().arg(2i64)) {
        println!("Square.area(2) rejected: {e}");
    }

    Ok(())
}
