//! Trace every callable of the demo modules.
//!
//! The wildcard registration selects all top-level functions and every
//! method of every class. Profiling is disabled here, so each call prints
//! its banner and timing footer only.

use callscope::demo;
use callscope::{CallArgs, Engine, ModuleLoader};

fn main() -> anyhow::Result<()> {
    let mut engine = Engine::new();
    demo::install(&mut engine);
    engine.set_profiling(false);

    // Select everything — must happen before the modules load.
    engine.trace(demo::MATH, None);
    engine.trace(demo::SHAPES, None);

    let math = engine.load(demo::MATH)?;
    math.call("addition", &CallArgs::new().arg(2i64).arg(1i64))?;
    math.call("subtraction", &CallArgs::new().arg(2i64).arg(1i64))?;
    math.call("factorial", &CallArgs::new().arg(2i64))?;

    let shapes = engine.load(demo::SHAPES)?;
    let square = shapes.class("Square").expect("Square");
    let o = square.instantiate(&CallArgs::new().arg("my_square"))?;
    square.call_method("area", &o, &CallArgs::new().arg(2.0))?;

    let triangle = shapes.class("Triangle").expect("Triangle");
    let o = triangle.instantiate(&CallArgs::new().arg("my_triangle"))?;
    triangle.call_method("area", &o, &CallArgs::new().arg(2.0).arg(3.0))?;

    Ok(())
}
