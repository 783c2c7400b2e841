//! # callscope - Demo Entry Point
//!
//! Runs the bundled demo modules under instrumentation: pick a scenario,
//! optionally disable line profiling, optionally export the last profile
//! session as JSON.

use anyhow::{Context, Result};
use callscope::cli::{Args, Scenario};
use callscope::demo;
use callscope::export::SessionReport;
use callscope::loader::ModuleLoader;
use callscope::registry::TypeSpec;
use callscope::value::{Value, ValueType};
use callscope::{CallArgs, Engine};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut engine = Engine::new();
    demo::install(&mut engine);
    if args.no_profile {
        engine.set_profiling(false);
    }

    if !args.quiet {
        println!("callscope v{}", env!("CARGO_PKG_VERSION"));
        println!("scenario: {:?}", args.scenario);
        println!("profiling: {}", engine.profiling_enabled());
    }

    // Registration first — it must precede the first load of each module.
    match args.scenario {
        Scenario::All => {
            engine.trace(demo::MATH, None);
            engine.trace(demo::SHAPES, None);
        }
        Scenario::Functions => {
            engine.trace(demo::MATH, Some(&["addition", "subtraction"]));
        }
        Scenario::Shapes => {
            engine.trace(demo::SHAPES, Some(&["Square", "Triangle"]));
        }
        Scenario::Typed => {
            engine.trace(demo::MATH, Some(&["addition"]));
            engine.set_input_types(
                demo::MATH,
                "addition",
                vec![ValueType::Int.into(), ValueType::Int.into()],
            );
            engine.set_output_types(demo::MATH, "addition", vec![ValueType::Int.into()]);
            engine.trace(demo::SHAPES, Some(&["Square.area"]));
            engine.set_input_types(
                demo::SHAPES,
                "Square.area",
                vec![TypeSpec::Owner, ValueType::Float.into()],
            );
            engine.set_output_types(demo::SHAPES, "Square.area", vec![ValueType::Float.into()]);
        }
    }

    match args.scenario {
        Scenario::All => {
            run_functions(&mut engine)?;
            run_shapes(&mut engine)?;
        }
        Scenario::Functions => run_functions(&mut engine)?,
        Scenario::Shapes => run_shapes(&mut engine)?,
        Scenario::Typed => run_typed(&mut engine)?,
    }

    if let Some(export_path) = args.export {
        let session = engine
            .take_session()
            .context("no profile session captured (profiling disabled or no traced call ran)")?;
        let report = SessionReport::from_session("last traced call", &session);
        let file = File::create(&export_path).context("failed to create export file")?;
        report.export(BufWriter::new(file)).context("failed to export session")?;
        if !args.quiet {
            println!("saved: {}", export_path.display());
        }
    }

    Ok(())
}

fn run_functions(engine: &mut Engine) -> Result<()> {
    let math = engine.load(demo::MATH).context("failed to load demo.math")?;
    math.call("addition", &CallArgs::new().arg(2i64).arg(1i64))?;
    math.call("subtraction", &CallArgs::new().arg(2i64).arg(1i64))?;
    math.call("factorial", &CallArgs::new().arg(6i64))?;
    math.call("power", &CallArgs::new().arg(2i64).kwarg("exponent", 16i64))?;
    Ok(())
}

fn run_shapes(engine: &mut Engine) -> Result<()> {
    let shapes = engine.load(demo::SHAPES).context("failed to load demo.shapes")?;

    let square = shapes
        .class("Square")
        .context("demo.shapes does not expose Square")?;
    let instance = square.instantiate(&CallArgs::new().arg("my_square"))?;
    square.call_method("area", &instance, &CallArgs::new().arg(2.0))?;

    let triangle = shapes
        .class("Triangle")
        .context("demo.shapes does not expose Triangle")?;
    let instance = triangle.instantiate(&CallArgs::new().arg("my_triangle"))?;
    triangle.call_method(
        "area",
        &instance,
        &CallArgs::new().arg(2.0).kwarg("vertical_height", 3.0),
    )?;
    Ok(())
}

fn run_typed(engine: &mut Engine) -> Result<()> {
    let math = engine.load(demo::MATH).context("failed to load demo.math")?;

    let sum = math.call("addition", &CallArgs::new().arg(2i64).arg(3i64))?;
    println!("addition(2, 3) -> {sum:?}");

    // Deliberate violations: surfaced, not fatal to the demo.
    if let Err(e) = math.call("addition", &CallArgs::new().arg(2i64).arg(Value::Float(3.0))) {
        println!("addition(2, 3.0) rejected: {e}");
    }
    if let Err(e) = math.call("addition", &CallArgs::new().arg(2i64)) {
        println!("addition(2) rejected: {e}");
    }

    let shapes = engine.load(demo::SHAPES).context("failed to load demo.shapes")?;
    let square = shapes
        .class("Square")
        .context("demo.shapes does not expose Square")?;
    let instance = square.instantiate(&CallArgs::new().arg("my_square"))?;
    square.call_method("area", &instance, &CallArgs::new().arg(2.0))?;
    if let Err(e) = square.call_method("area", &instance, &CallArgs::new().arg(2i64)) {
        println!("Square.area(2) rejected: {e}");
    }
    Ok(())
}
