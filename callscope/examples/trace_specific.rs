//! Trace a chosen subset of callables.
//!
//! Only `addition` and `subtraction` are registered: `factorial` runs
//! without any banner. For classes, a bare class name follows every
//! method, while `Class.method` identifiers select individual ones.

use callscope::demo;
use callscope::{CallArgs, Engine, ModuleLoader};

fn main() -> anyhow::Result<()> {
    let mut engine = Engine::new();
    demo::install(&mut engine);

    engine.trace(demo::MATH, Some(&["addition", "subtraction"]));
    engine.trace(demo::SHAPES, Some(&["Square", "Triangle.area"]));

    let math = engine.load(demo::MATH)?;
    math.call("addition", &CallArgs::new().arg(2i64).arg(1i64))?;
    math.call("subtraction", &CallArgs::new().arg(2i64).arg(1i64))?;
    // Untraced: no banner, no profile.
    math.call("factorial", &CallArgs::new().arg(5i64))?;

    let shapes = engine.load(demo::SHAPES)?;
    // Every Square method is traced, including its constructor.
    let square = shapes.class("Square").expect("Square");
    let o = square.instantiate(&CallArgs::new().arg("my_square"))?;
    square.call_method("area", &o, &CallArgs::new().arg(2.0))?;

    // Only Triangle.area is traced; the constructor stays silent.
    let triangle = shapes.class("Triangle").expect("Triangle");
    let o = triangle.instantiate(&CallArgs::new().arg("my_triangle"))?;
    triangle.call_method("area", &o, &CallArgs::new().arg(2.0).arg(3.0))?;

    Ok(())
}
