//! Bounded human-readable rendering of runtime values
//!
//! Signatures are printed for humans, so rendering is bounded: sequences
//! past [`MAX_INLINE_ELEMENTS`] elements show the first and last
//! [`EDGE_ELEMENTS`] with an ellipsis between, and arrays collapse to a
//! single line regardless of rank.

use super::{ArrayValue, Value};

/// Longest sequence rendered in full. One past this, truncation kicks in.
pub const MAX_INLINE_ELEMENTS: usize = 10;

/// Elements kept at each end of a truncated sequence.
const EDGE_ELEMENTS: usize = 5;

/// Render a value into a bounded, human-readable string.
#[must_use]
pub fn render(value: &Value) -> String {
    match value {
        Value::None => "None".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(x) => format!("{x:?}"),
        Value::Str(s) => format!("{s:?}"),
        Value::List(items) => render_seq(items, "[", "]"),
        Value::Tuple(items) => render_seq(items, "(", ")"),
        Value::Set(items) => render_seq(items, "{", "}"),
        Value::Array(array) => render_array(array),
        Value::Instance(instance) => format!("<{} instance>", instance.class_name()),
    }
}

fn render_seq(items: &[Value], open: &str, close: &str) -> String {
    let rendered: Vec<String> = items.iter().map(render).collect();
    format!("{open}{}{close}", join_bounded(rendered))
}

/// Arrays render as `array([...])` with nested brackets per dimension,
/// collapsed to one line.
fn render_array(array: &ArrayValue) -> String {
    format!("array({})", render_dim(array.shape(), array.data()))
}

fn render_dim(shape: &[usize], data: &[f64]) -> String {
    match shape {
        [] => data.first().map_or_else(String::new, |x| format!("{x}")),
        [_] => {
            let rendered: Vec<String> = data.iter().map(|x| format!("{x}")).collect();
            format!("[{}]", join_bounded(rendered))
        }
        [rows, rest @ ..] => {
            let stride: usize = rest.iter().product();
            let rendered: Vec<String> =
                (0..*rows).map(|r| render_dim(rest, &data[r * stride..(r + 1) * stride])).collect();
            format!("[{}]", join_bounded(rendered))
        }
    }
}

/// Join rendered elements, truncating to `5, ..., 5` past the inline limit.
fn join_bounded(rendered: Vec<String>) -> String {
    if rendered.len() <= MAX_INLINE_ELEMENTS {
        return rendered.join(", ");
    }
    let mut parts: Vec<&str> =
        rendered[..EDGE_ELEMENTS].iter().map(String::as_str).collect();
    parts.push("...");
    parts.extend(rendered[rendered.len() - EDGE_ELEMENTS..].iter().map(String::as_str));
    parts.join(", ")
}
