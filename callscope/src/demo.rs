//! Demo modules
//!
//! Small business-logic modules used by the examples, the demo binary and
//! the integration tests: arithmetic free functions and a pair of shape
//! classes. Bodies carry `probe!()` markers and wrap-time source spans, so
//! tracing them with profiling enabled produces real line tables over this
//! file.

use crate::domain::errors::CallError;
use crate::domain::types::SourceSpan;
use crate::engine::Engine;
use crate::module::{BoundArgs, CallResult, Callable, ClassDef, Module, Signature, CONSTRUCTOR};
use crate::probe;
use crate::value::{Value, ValueType};

/// Module id of the arithmetic demo functions.
pub const MATH: &str = "demo.math";

/// Module id of the shape demo classes.
pub const SHAPES: &str = "demo.shapes";

/// Provide both demo modules through the engine's loading machinery.
pub fn install(engine: &mut Engine) {
    engine.provide(MATH, |_| Ok(math_module()));
    engine.provide(SHAPES, |_| Ok(shapes_module()));
}

/// Apply an arithmetic operation: int when both operands are ints, float
/// when either is a float.
fn binary_numeric(
    args: &BoundArgs,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> CallResult {
    match (args.value("a")?, args.value("b")?) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(*x, *y))),
        (x, y) => match (x.as_number(), y.as_number()) {
            (Some(x), Some(y)) => Ok(Value::Float(float_op(x, y))),
            _ => Err(CallError::WrongType { name: "a".to_string(), expected: ValueType::Float }),
        },
    }
}

fn math_module() -> Module {
    let mut module = Module::new(MATH);

    let first = line!() + 1;
    let addition = Callable::new("addition", Signature::new(&["a", "b"]), |args| {
        probe!();
        binary_numeric(args, |x, y| x.saturating_add(y), |x, y| x + y)
    })
    .with_span(SourceSpan::new(file!(), first, line!()));
    module.add_function(addition);

    let first = line!() + 1;
    let subtraction = Callable::new("subtraction", Signature::new(&["a", "b"]), |args| {
        probe!();
        binary_numeric(args, |x, y| x.saturating_sub(y), |x, y| x - y)
    })
    .with_span(SourceSpan::new(file!(), first, line!()));
    module.add_function(subtraction);

    let first = line!() + 1;
    let factorial = Callable::new("factorial", Signature::new(&["n"]), |args| {
        let n = args.int("n")?;
        if n < 0 {
            return Err(CallError::Raised("factorial of a negative number".to_string()));
        }
        let mut acc: i64 = 1;
        for i in 1..=n {
            probe!();
            acc = acc.saturating_mul(i);
        }
        Ok(Value::Int(acc))
    })
    .with_span(SourceSpan::new(file!(), first, line!()));
    module.add_function(factorial);

    let first = line!() + 1;
    let power = Callable::new(
        "power",
        Signature::new(&["base", "exponent"]).with_default("exponent", 2i64),
        |args| {
            probe!();
            let base = args.number("base")?;
            let exponent = args.int("exponent")?;
            let result = base.powi(i32::try_from(exponent).unwrap_or(i32::MAX));
            probe!();
            Ok(Value::Float(result))
        },
    )
    .with_span(SourceSpan::new(file!(), first, line!()));
    module.add_function(power);

    module
}

fn shapes_module() -> Module {
    let mut module = Module::new(SHAPES);

    // Constructors are short enough that no profiling span is attached.
    let named_init = || {
        Callable::new(CONSTRUCTOR, Signature::new(&["self", "name"]), |args| {
            args.instance()?.set("name", args.value("name")?.clone());
            Ok(Value::None)
        })
    };

    let first = line!() + 1;
    let square_area = Callable::new("area", Signature::new(&["self", "side"]), |args| {
        probe!();
        let side = args.number("side")?;
        let area = side * side;
        probe!();
        args.instance()?.set("area", Value::Float(area));
        Ok(Value::Float(area))
    })
    .with_span(SourceSpan::new(file!(), first, line!()));
    module.add_class(ClassDef::new("Square").with_method(named_init()).with_method(square_area));

    let first = line!() + 1;
    let triangle_area =
        Callable::new("area", Signature::new(&["self", "base", "vertical_height"]), |args| {
            probe!();
            let base = args.number("base")?;
            let height = args.number("vertical_height")?;
            let area = 0.5 * base * height;
            probe!();
            args.instance()?.set("area", Value::Float(area));
            Ok(Value::Float(area))
        })
        .with_span(SourceSpan::new(file!(), first, line!()));
    module.add_class(
        ClassDef::new("Triangle").with_method(named_init()).with_method(triangle_area),
    );

    module
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::CallArgs;

    #[test]
    fn test_addition_keeps_int_type() {
        let module = math_module();
        let result = module.call("addition", &CallArgs::new().arg(2i64).arg(1i64)).unwrap();
        assert_eq!(result, Value::Int(3));
    }

    #[test]
    fn test_addition_widens_to_float() {
        let module = math_module();
        let result = module.call("addition", &CallArgs::new().arg(2i64).arg(1.5)).unwrap();
        assert_eq!(result, Value::Float(3.5));
    }

    #[test]
    fn test_factorial() {
        let module = math_module();
        assert_eq!(
            module.call("factorial", &CallArgs::new().arg(5i64)).unwrap(),
            Value::Int(120)
        );
        assert_eq!(
            module.call("factorial", &CallArgs::new().arg(0i64)).unwrap(),
            Value::Int(1)
        );
        assert!(module.call("factorial", &CallArgs::new().arg(-1i64)).is_err());
    }

    #[test]
    fn test_power_default_exponent() {
        let module = math_module();
        assert_eq!(
            module.call("power", &CallArgs::new().arg(3i64)).unwrap(),
            Value::Float(9.0)
        );
        let args = CallArgs::new().arg(2i64).kwarg("exponent", 10i64);
        assert_eq!(module.call("power", &args).unwrap(), Value::Float(1024.0));
    }

    #[test]
    fn test_square_area() {
        let module = shapes_module();
        let square = module.class("Square").unwrap();
        let instance = square.instantiate(&CallArgs::new().arg("my_square")).unwrap();
        assert_eq!(instance.get("name"), Some(Value::str("my_square")));
        let area = square.call_method("area", &instance, &CallArgs::new().arg(2.0)).unwrap();
        assert_eq!(area, Value::Float(4.0));
        assert_eq!(instance.get("area"), Some(Value::Float(4.0)));
    }

    #[test]
    fn test_triangle_area_with_keyword() {
        let module = shapes_module();
        let triangle = module.class("Triangle").unwrap();
        let instance = triangle.instantiate(&CallArgs::new().arg("my_triangle")).unwrap();
        let args = CallArgs::new().arg(2.0).kwarg("vertical_height", 3.0);
        let area = triangle.call_method("area", &instance, &args).unwrap();
        assert_eq!(area, Value::Float(3.0));
    }

    #[test]
    fn test_callables_carry_spans_over_this_file() {
        let module = math_module();
        let span = module.function("factorial").unwrap().span().unwrap();
        assert!(span.file.ends_with("demo.rs"));
        assert!(span.first_line < span.last_line);
    }
}
