//! Message formatting capability
//!
//! Messages are built from a template and positional arguments. The template
//! syntax is deliberately small:
//!
//! - `{}` renders the next positional argument
//! - `{N}` renders argument `N` (zero based) without advancing the cursor
//! - `{{` and `}}` render literal braces
//!
//! A placeholder with no matching argument, or with unrecognised contents, is
//! copied to the output unchanged.
//!
//! Any value can be logged by implementing [`RenderTo`]. Every
//! [`Display`](std::fmt::Display) type already does.
//!
//! # Example
//!
//! ```
//! use rust_sink_logger::core::formatter::{format_message, RenderTo};
//!
//! struct Point { x: i32, y: i32 }
//!
//! impl RenderTo for Point {
//!     fn render_to(&self, buf: &mut String) {
//!         buf.push_str(&format!("Point({}, {})", self.x, self.y));
//!     }
//! }
//!
//! let p = Point { x: 1, y: 2 };
//! assert_eq!(format_message("at {} after {}ms", &[&p, &15]), "at Point(1, 2) after 15ms");
//! ```

use std::fmt::{self, Write};
use std::sync::Arc;

/// Capability of rendering a value into a message buffer
pub trait RenderTo {
    fn render_to(&self, buf: &mut String);
}

impl<T: fmt::Display + ?Sized> RenderTo for T {
    fn render_to(&self, buf: &mut String) {
        // Writing into a String cannot fail
        let _ = write!(buf, "{}", self);
    }
}

/// Pluggable formatter turning a template plus arguments into a message
pub trait MessageFormatter: Send + Sync {
    fn format(&self, template: &str, args: &[&dyn RenderTo]) -> String;
}

/// Shared handle to a message formatter
pub type SharedMessageFormatter = Arc<dyn MessageFormatter>;

/// Default formatter implementing the brace syntax described above
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceFormatter;

impl MessageFormatter for BraceFormatter {
    fn format(&self, template: &str, args: &[&dyn RenderTo]) -> String {
        format_message(template, args)
    }
}

/// Render `template` with `args` using the brace syntax
#[must_use]
pub fn format_message(template: &str, args: &[&dyn RenderTo]) -> String {
    if args.is_empty() && !template.contains(['{', '}']) {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut next_arg = 0usize;
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        // tail starts with a single '{'
        let Some(close) = tail.find('}') else {
            out.push_str(tail);
            rest = "";
            break;
        };
        let inner = &tail[1..close];
        let placeholder = &tail[..=close];
        rest = &tail[close + 1..];

        let index = if inner.is_empty() {
            let i = next_arg;
            next_arg += 1;
            Some(i)
        } else {
            inner.parse::<usize>().ok()
        };

        match index.and_then(|i| args.get(i)) {
            Some(arg) => arg.render_to(&mut out),
            None => out.push_str(placeholder),
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point {
        x: i32,
        y: i32,
    }

    impl RenderTo for Point {
        fn render_to(&self, buf: &mut String) {
            let _ = write!(buf, "Point({}, {})", self.x, self.y);
        }
    }

    #[test]
    fn test_positional_arguments() {
        let out = format_message("Number: {}, String: {}, Float: {}", &[&42, &"Hello", &3.14]);
        assert_eq!(out, "Number: 42, String: Hello, Float: 3.14");
    }

    #[test]
    fn test_indexed_arguments() {
        let out = format_message("{1} before {0}, then {}", &[&"a", &"b"]);
        assert_eq!(out, "b before a, then a");
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(format_message("{{}} {}", &[&1]), "{} 1");
        assert_eq!(format_message("a } b", &[]), "a } b");
    }

    #[test]
    fn test_missing_argument_left_verbatim() {
        assert_eq!(format_message("{} and {}", &[&"one"]), "one and {}");
        assert_eq!(format_message("{name}", &[&1]), "{name}");
        assert_eq!(format_message("open { brace", &[&1]), "open { brace");
    }

    #[test]
    fn test_custom_type() {
        let p = Point { x: 1, y: 2 };
        assert_eq!(format_message("{}", &[&p]), "Point(1, 2)");
    }

    #[test]
    fn test_brace_formatter_matches_free_function() {
        let formatter = BraceFormatter;
        assert_eq!(formatter.format("x={}", &[&5]), format_message("x={}", &[&5]));
    }
}
