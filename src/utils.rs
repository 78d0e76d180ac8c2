//! Miscellaneous utility functions.

use anyhow::Context as _;
use colored::Colorize;
use std::io::Write;
use std::io::{self, ErrorKind};

use crate::value::Value;

// ==============================================================================
// Colorized JSON Output
// ==============================================================================

/// Write a single matched document as colorized JSON to `writer`.
/// Silently returns `Ok(())` on broken pipe so that piping to tools
/// like `less` or `head` exits cleanly.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_colored_doc<W: Write>(
    writer: &mut W,
    doc: &Value,
    pretty: bool,
) -> anyhow::Result<()> {
    let result = (|| -> io::Result<()> {
        write_colored_json(writer, doc, 0, pretty)?;
        writeln!(writer)?;
        Ok(())
    })();

    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err).context("write colorized JSON to stdout"),
    }
}

/// Recursively write a value with syntax highlighting.
fn write_colored_json<W: Write>(
    writer: &mut W,
    value: &Value,
    indent: usize,
    pretty: bool,
) -> io::Result<()> {
    let next_indent = indent + 2;

    match value {
        Value::Null => write!(writer, "{}", "null".red().dimmed()),
        Value::Bool(b) => {
            write!(writer, "{}", b.to_string().yellow().bold())
        }
        Value::Number(_) => {
            // NOTE: Re-serialize so integral numbers print without a
            // trailing ".0".
            let rendered = value.to_json().expect("number serialization cannot fail");
            write!(writer, "{}", rendered.yellow())
        }
        Value::String(s) => {
            // NOTE: Re-serialize to get proper JSON escaping and quoting.
            let quoted =
                serde_json::to_string(s).expect("string serialization cannot fail");
            write!(writer, "{}", quoted.green())
        }
        Value::Regex(pattern, flags) => {
            write!(writer, "{}", format!("/{pattern}/{flags}").magenta())
        }
        Value::Array(elems) => {
            write!(writer, "[")?;
            for (i, elem) in elems.iter().enumerate() {
                if pretty {
                    writeln!(writer)?;
                    write!(writer, "{:width$}", "", width = next_indent)?;
                }
                write_colored_json(writer, elem, next_indent, pretty)?;
                if i < elems.len() - 1 {
                    write!(writer, ",")?;
                }
            }
            if pretty && !elems.is_empty() {
                writeln!(writer)?;
                write!(writer, "{:width$}", "", width = indent)?;
            }
            write!(writer, "]")
        }
        Value::Map(entries) => {
            write!(writer, "{{")?;
            for (i, (key, val)) in entries.iter().enumerate() {
                if pretty {
                    writeln!(writer)?;
                    write!(writer, "{:width$}", "", width = next_indent)?;
                }
                // Key with quotes -> colored cyan.
                let quoted_key =
                    serde_json::to_string(key).expect("key serialization cannot fail");
                write!(writer, "{}", quoted_key.cyan())?;
                if pretty {
                    write!(writer, ": ")?;
                } else {
                    write!(writer, ":")?;
                }
                write_colored_json(writer, val, next_indent, pretty)?;
                if i < entries.len() - 1 {
                    write!(writer, ",")?;
                }
            }
            if pretty && !entries.is_empty() {
                writeln!(writer)?;
                write!(writer, "{:width$}", "", width = indent)?;
            }
            write!(writer, "}}")
        }
    }
}
