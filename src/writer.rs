//! Renders a [`BuildConfiguration`] back into `tailwind.config.js` form.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::config::BuildConfiguration;
use crate::errors::Result;

const TYPE_ANNOTATION: &str = "/** @type {import('tailwindcss').Config} */";

fn identifier() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier regex"))
}

/// Render `config` as a CommonJS config module
pub fn to_js_module(config: &BuildConfiguration) -> Result<String> {
    let value = serde_json::to_value(config)?;

    let mut out = String::new();
    out.push_str(TYPE_ANNOTATION);
    out.push_str("\nmodule.exports = ");

    match &value {
        Value::Object(map) if !map.is_empty() => {
            out.push_str("{\n");
            for (key, value) in map {
                indent(&mut out, 1);
                write_key(&mut out, key);
                if key == "plugins" {
                    write_plugins(&mut out, value, 1);
                } else {
                    write_value(&mut out, value, 1);
                }
                out.push_str(",\n");
            }
            out.push_str("}\n");
        }
        other => {
            write_value(&mut out, other, 0);
            out.push('\n');
        }
    }

    Ok(out)
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn write_key(out: &mut String, key: &str) {
    if identifier().is_match(key) {
        out.push_str(key);
    } else {
        write_string(out, key);
    }
    out.push_str(": ");
}

fn write_string(out: &mut String, s: &str) {
    // JSON string escapes are valid JavaScript
    out.push_str(&Value::String(s.to_string()).to_string());
}

fn write_value(out: &mut String, value: &Value, level: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for item in items {
                indent(out, level + 1);
                write_value(out, item, level + 1);
                out.push_str(",\n");
            }
            indent(out, level);
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (key, item) in map {
                indent(out, level + 1);
                write_key(out, key);
                write_value(out, item, level + 1);
                out.push_str(",\n");
            }
            indent(out, level);
            out.push('}');
        }
    }
}

/// Plugin references become `require(...)` calls
fn write_plugins(out: &mut String, plugins: &Value, level: usize) {
    let Value::Array(items) = plugins else {
        write_value(out, plugins, level);
        return;
    };
    if items.is_empty() {
        out.push_str("[]");
        return;
    }

    out.push_str("[\n");
    for item in items {
        indent(out, level + 1);
        match item {
            Value::String(name) => {
                out.push_str("require(");
                write_string(out, name);
                out.push(')');
            }
            Value::Object(map) => match map.get("name") {
                Some(Value::String(name)) => {
                    out.push_str("require(");
                    write_string(out, name);
                    out.push(')');
                    if let Some(options) = map.get("options") {
                        out.push('(');
                        write_value(out, options, level + 1);
                        out.push(')');
                    }
                }
                _ => write_value(out, item, level + 1),
            },
            other => write_value(out, other, level + 1),
        }
        out.push_str(",\n");
    }
    indent(out, level);
    out.push(']');
}
