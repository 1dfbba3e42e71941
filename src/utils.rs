//! Output helpers for the `jpq` binary.

use anyhow::Context as _;
use colored::Colorize;
use serde_json::Value;
use std::io::Write;
use std::io::{self, ErrorKind};

/// Write the matched nodes as a single JSON array followed by a newline.
///
/// Silently returns `Ok(())` on broken pipe so that piping to tools like
/// `less` or `head` exits cleanly.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_result<W: Write>(
    writer: &mut W,
    nodes: &[&Value],
    pretty: bool,
) -> anyhow::Result<()> {
    let result = (|| -> io::Result<()> {
        if pretty {
            serde_json::to_writer_pretty(&mut *writer, nodes)?;
        } else {
            serde_json::to_writer(&mut *writer, nodes)?;
        }
        writeln!(writer)
    })();
    ignore_broken_pipe(result).context("write JSON to stdout")
}

/// Like [`write_result`], with syntax highlighting.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_colored_result<W: Write>(
    writer: &mut W,
    nodes: &[&Value],
    pretty: bool,
) -> anyhow::Result<()> {
    let result = (|| -> io::Result<()> {
        write_colored_items(
            writer,
            nodes.iter().copied(),
            nodes.len(),
            0,
            pretty,
        )?;
        writeln!(writer)
    })();
    ignore_broken_pipe(result).context("write colorized JSON to stdout")
}

fn ignore_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Write `len` array items between brackets.
fn write_colored_items<'v, W: Write>(
    writer: &mut W,
    items: impl Iterator<Item = &'v Value>,
    len: usize,
    indent: usize,
    pretty: bool,
) -> io::Result<()> {
    let next_indent = indent + 2;
    write!(writer, "[")?;
    for (i, item) in items.enumerate() {
        if pretty {
            writeln!(writer)?;
            write!(writer, "{:width$}", "", width = next_indent)?;
        }
        write_colored_json(writer, item, next_indent, pretty)?;
        if i + 1 < len {
            write!(writer, ",")?;
        }
    }
    if pretty && len > 0 {
        writeln!(writer)?;
        write!(writer, "{:width$}", "", width = indent)?;
    }
    write!(writer, "]")
}

/// Recursively write a JSON value with syntax highlighting.
fn write_colored_json<W: Write>(
    writer: &mut W,
    value: &Value,
    indent: usize,
    pretty: bool,
) -> io::Result<()> {
    let next_indent = indent + 2;

    match value {
        Value::Null => write!(writer, "{}", "null".red().dimmed()),
        Value::Bool(b) => write!(writer, "{}", b.to_string().yellow().bold()),
        Value::Number(n) => write!(writer, "{}", n.to_string().yellow()),
        // Display of a `Value` is its JSON encoding
        Value::String(_) => write!(writer, "{}", value.to_string().green()),
        Value::Array(arr) => {
            write_colored_items(writer, arr.iter(), arr.len(), indent, pretty)
        }
        Value::Object(obj) => {
            write!(writer, "{{")?;
            for (i, (key, val)) in obj.iter().enumerate() {
                if pretty {
                    writeln!(writer)?;
                    write!(writer, "{:width$}", "", width = next_indent)?;
                }
                let key = Value::from(key.as_str()).to_string();
                write!(writer, "{}", key.cyan())?;
                write!(writer, "{}", if pretty { ": " } else { ":" })?;
                write_colored_json(writer, val, next_indent, pretty)?;
                if i + 1 < obj.len() {
                    write!(writer, ",")?;
                }
            }
            if pretty && !obj.is_empty() {
                writeln!(writer)?;
                write!(writer, "{:width$}", "", width = indent)?;
            }
            write!(writer, "}}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(nodes: &[&Value], pretty: bool, colored: bool) -> String {
        let mut out = Vec::new();
        if colored {
            write_colored_result(&mut out, nodes, pretty).unwrap();
        } else {
            write_result(&mut out, nodes, pretty).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn plain_output() {
        let doc = json!({"a": [1, "x"]});
        assert_eq!(render(&[&doc], false, false), "[{\"a\":[1,\"x\"]}]\n");
        assert_eq!(render(&[], true, false), "[]\n");
    }

    #[test]
    fn colored_output_is_valid_json_without_escapes() {
        colored::control::set_override(false);
        let doc = json!({"k\"ey": [null, true, 1.5, "s"], "o": {}});
        let pretty = render(&[&doc, &doc["o"]], true, true);
        let parsed: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(parsed, json!([doc.clone(), {}]));
        assert_eq!(
            render(&[&doc["k\"ey"]], false, true),
            "[[null,true,1.5,\"s\"]]\n"
        );
    }
}
