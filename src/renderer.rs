//! ASCII-safe normalization and output encoding

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use thiserror::Error;

use crate::charmap::{char_map, Style};
use crate::decoder::Codec;
use crate::document::{join_nodes, Node, Txc};

/// A value that can be normalized: text, numbers, and containers of them
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Normalized character by character
    Text(String),
    /// Passed through
    Int(i64),
    /// Passed through
    Float(f64),
    /// Normalized element-wise
    List(Vec<Value>),
    /// Keys kept, values normalized; insertion order is preserved
    Map(Vec<(String, Value)>),
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Normalize a string: each character becomes its table entry, anything
/// past Latin-1 becomes `?`
pub fn normalize_str(text: &str, style: Style) -> String {
    char_map().simplify(text, style)
}

/// Normalize a value recursively
pub fn normalize(value: &Value, style: Style) -> Value {
    match value {
        Value::Text(text) => Value::Text(normalize_str(text, style)),
        Value::Int(n) => Value::Int(*n),
        Value::Float(n) => Value::Float(*n),
        Value::List(items) => Value::List(items.iter().map(|v| normalize(v, style)).collect()),
        Value::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(key, v)| (key.clone(), normalize(v, style)))
                .collect(),
        ),
    }
}

/// Replace punctuation past Latin-1 that has a known ASCII form
/// (dashes, curly quotes, bullet); other characters are kept
pub fn replace_symbols(text: &str) -> Cow<'_, str> {
    let map = char_map();
    if !text.chars().any(|c| u32::from(c) >= 0x100 && map.find_other(u32::from(c)).is_some()) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match map.find_other(u32::from(c)) {
            Some(entry) if u32::from(c) >= 0x100 => out.push_str(entry.text),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// A line the output codec cannot fully represent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: cannot encode '{text}' as {codec} (simplified: '{normalized}')")]
pub struct EncodeError {
    /// 1-based line number
    pub line: usize,
    /// 1-based character column of the first unrepresentable character
    pub column: usize,
    /// The line as given, without its line break
    pub text: String,
    /// ASCII-simplified preview of the line
    pub normalized: String,
    /// Target codec
    pub codec: Codec,
}

/// Output of a render pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rendered {
    /// Encoded output; unrepresentable characters are left out
    pub bytes: Vec<u8>,
    /// One entry per line that lost characters
    pub errors: Vec<EncodeError>,
}

impl Rendered {
    /// Whether every character was encoded
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Bytes if clean, otherwise the collected errors
    pub fn into_result(self) -> std::result::Result<Vec<u8>, Vec<EncodeError>> {
        if self.errors.is_empty() {
            Ok(self.bytes)
        } else {
            Err(self.errors)
        }
    }
}

/// Renders text or nodes into bytes
#[derive(Debug, Clone)]
pub struct Renderer {
    codec: Codec,
    simplify: bool,
    style: Style,
    allow_symbols: bool,
}

impl Renderer {
    /// Render verbatim in `codec`
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            simplify: false,
            style: Style::Primary,
            allow_symbols: false,
        }
    }

    /// Render ASCII-simplified; encoding cannot fail
    pub fn simple(style: Style) -> Self {
        Self::new(Codec::Ascii).with_simplify(true).with_style(style)
    }

    /// Normalize through the substitution tables before encoding
    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    /// Table used when simplifying and for error previews
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Replace known punctuation past Latin-1 before anything else
    pub fn with_symbols(mut self, allow_symbols: bool) -> Self {
        self.allow_symbols = allow_symbols;
        self
    }

    /// Output codec
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Render text
    pub fn render_text(&self, text: &str) -> Rendered {
        let mut rendered = Rendered::default();

        for (idx, raw) in text.split_inclusive('\n').enumerate() {
            let mut line: Cow<'_, str> = Cow::Borrowed(raw);
            if self.allow_symbols {
                line = Cow::Owned(replace_symbols(&line).into_owned());
            }
            if self.simplify {
                line = Cow::Owned(normalize_str(&line, self.style));
            }

            let mut first_bad = None;
            for (col, c) in line.chars().enumerate() {
                if !self.codec.encode_char(c, &mut rendered.bytes) && first_bad.is_none() {
                    first_bad = Some(col + 1);
                }
            }

            if let Some(column) = first_bad {
                let text = line.trim_end_matches(['\n', '\r']).to_string();
                let error = EncodeError {
                    line: idx + 1,
                    column,
                    normalized: normalize_str(&text, self.style),
                    text,
                    codec: self.codec,
                };
                warn!("{}", error);
                rendered.errors.push(error);
            }
        }

        rendered
    }

    /// Render nodes joined back into text
    pub fn render_nodes(&self, nodes: &[Node], trailing_blank: bool) -> Rendered {
        self.render_text(&join_nodes(nodes, trailing_blank))
    }

    /// Render a whole document, directive line included
    pub fn render_txc(&self, txc: &Txc) -> Rendered {
        self.render_text(&txc.source_text())
    }

    /// Render text to a writer; returns the collected encode errors
    pub fn render_to_writer<W: Write>(&self, text: &str, mut writer: W) -> Result<Vec<EncodeError>> {
        let rendered = self.render_text(text);
        writer.write_all(&rendered.bytes).context("Failed to write rendered text")?;
        Ok(rendered.errors)
    }

    /// Render text to a file; returns the collected encode errors
    pub fn render_to_file(&self, text: &str, path: &Path) -> Result<Vec<EncodeError>> {
        let rendered = self.render_text(text);
        std::fs::write(path, &rendered.bytes)
            .with_context(|| format!("Failed to write: {}", path.display()))?;
        Ok(rendered.errors)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Codec::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_styles() {
        assert_eq!(normalize_str("S\u{e3}o Jo\u{e3}o", Style::Primary), "Sao Joao");
        assert_eq!(normalize_str("S\u{e3}o Jo\u{e3}o", Style::Alternate), "Sa~o Joa~o");
        assert_eq!(normalize_str("a\r\n\tb", Style::Primary), "a\n\tb");
        assert_eq!(normalize_str("\u{201c}x\u{201d}", Style::Primary), "?x?");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "plain",
            "\u{c7}a\u{e7}a \u{e0} \u{ab}noite\u{bb} \u{ae}",
            "tab\there\r\n",
            "\u{4e16}\u{754c} \u{2014} \u{ff}\u{80}",
        ];
        for style in [Style::Primary, Style::Alternate] {
            for s in samples {
                let once = normalize_str(s, style);
                assert_eq!(normalize_str(&once, style), once);
            }
        }
    }

    #[test]
    fn test_normalize_values() {
        let value = Value::Map(vec![
            ("name".into(), Value::from("Jos\u{e9}")),
            ("age".into(), Value::from(42i64)),
            ("ratio".into(), Value::from(0.5f64)),
            ("tags".into(), Value::from(vec!["p\u{e3}o", "ok"])),
        ]);
        let expected = Value::Map(vec![
            ("name".into(), Value::from("Jose'")),
            ("age".into(), Value::Int(42)),
            ("ratio".into(), Value::Float(0.5)),
            ("tags".into(), Value::from(vec!["pa~o", "ok"])),
        ]);
        assert_eq!(normalize(&value, Style::Alternate), expected);
    }

    #[test]
    fn test_map_keys_untouched() {
        let value = Value::Map(vec![("ch\u{e3}o".into(), Value::from("ch\u{e3}o"))]);
        let Value::Map(entries) = normalize(&value, Style::Primary) else {
            panic!("expected a map");
        };
        assert_eq!(entries[0].0, "ch\u{e3}o");
        assert_eq!(entries[0].1, Value::from("chao"));
    }

    #[test]
    fn test_replace_symbols() {
        assert_eq!(replace_symbols("a \u{2014} b"), "a -- b");
        assert_eq!(replace_symbols("\u{2022} \u{201c}q\u{201d}"), "-o- \"q\"");
        assert!(matches!(replace_symbols("caf\u{e9} \u{ab}"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_simple_render_is_ascii() {
        let rendered = Renderer::simple(Style::Primary).render_text("ma\u{e7}\u{e3} \u{2014} x\n");
        assert!(rendered.is_clean());
        assert_eq!(rendered.bytes, b"maca ? x\n");
    }

    #[test]
    fn test_simple_render_with_symbols() {
        let renderer = Renderer::simple(Style::Alternate).with_symbols(true);
        let rendered = renderer.render_text("\u{2022} ma\u{e7}\u{e3} \u{2014} x\n");
        assert_eq!(rendered.into_result().unwrap(), b"-o- mac,a~ -- x\n");
    }

    #[test]
    fn test_verbatim_latin1() {
        let rendered = Renderer::new(Codec::Latin1).render_text("caf\u{e9}\n");
        assert_eq!(rendered.into_result().unwrap(), b"caf\xe9\n");
    }

    #[test]
    fn test_encode_errors_collected() {
        let text = "ok\ncaf\u{e9} \u{2014} ok\nend \u{2013}\nlast\n";
        let rendered = Renderer::new(Codec::Latin1).render_text(text);

        assert_eq!(rendered.errors.len(), 2);
        assert_eq!(rendered.errors[0].line, 2);
        assert_eq!(rendered.errors[0].column, 6);
        assert_eq!(rendered.errors[0].text, "caf\u{e9} \u{2014} ok");
        assert_eq!(rendered.errors[0].normalized, "cafe ? ok");
        assert_eq!(rendered.errors[1].line, 3);

        // Representable characters are still written
        assert_eq!(rendered.bytes, b"ok\ncaf\xe9  ok\nend \nlast\n");
    }

    #[test]
    fn test_render_nodes_utf8() {
        let nodes = vec![Node::Header("s".into()), Node::Item(vec!["\u{e9}".into()])];
        let rendered = Renderer::new(Codec::Utf8).render_nodes(&nodes, false);
        assert_eq!(rendered.bytes, "# s\n\n\u{e9}\n".as_bytes());
    }

    #[test]
    fn test_render_to_writer() {
        let mut out = Vec::new();
        let errors = Renderer::new(Codec::Ascii).render_to_writer("a\u{e9}\n", &mut out).unwrap();
        assert_eq!(out, b"a\n");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("simplified: 'ae'"));
    }

    #[test]
    fn test_render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let errors = Renderer::simple(Style::Primary).render_to_file("n\u{e3}o\n", &path).unwrap();
        assert!(errors.is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), b"nao\n");
    }
}
