//! TXC document data structures

use std::fmt;

use thiserror::Error;

use crate::charmap::{char_map, Style};
use crate::decoder::{Codec, Directive, DirectiveError};

/// Prefix of a header line
pub const HEADER_PREFIX: &str = "# ";
/// Suffixes stripped from a file name to get its base name
pub const SPECIAL_SUFFIXES: &[&str] = &[".txc", ".txt"];

/// A classified unit of parsed content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `# name` title line; only ever the first node
    Header(String),
    /// Contiguous non-blank lines
    Item(Vec<String>),
    /// An explicit blank separator
    Blank,
}

impl Node {
    /// Short kind name: `header`, `item` or `blank`
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Header(_) => "header",
            Node::Item(_) => "item",
            Node::Blank => "blank",
        }
    }

    /// Lines carried by the node
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Node::Header(text) => vec![text.as_str()],
            Node::Item(lines) => lines.iter().map(String::as_str).collect(),
            Node::Blank => Vec::new(),
        }
    }
}

impl fmt::Display for Node {
    /// `kind=[..]`, payload simplified to decorated ASCII
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: Vec<String> = self
            .lines()
            .into_iter()
            .map(|line| char_map().simplify(line, Style::Alternate))
            .collect();
        write!(f, "{}={:?}", self.kind(), shown)
    }
}

/// Which structural deviations the parser accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToleratePolicy {
    /// Accept a header that does not match the file's base name
    pub header_mismatch_basename: bool,
    /// Accept a final item with no blank line after it
    pub last_line_empty: bool,
    /// Accept a blank first body line
    pub first_line_empty: bool,
}

impl Default for ToleratePolicy {
    fn default() -> Self {
        Self {
            header_mismatch_basename: false,
            last_line_empty: true,
            first_line_empty: false,
        }
    }
}

impl ToleratePolicy {
    /// Reject every deviation
    pub fn strict() -> Self {
        Self {
            header_mismatch_basename: false,
            last_line_empty: false,
            first_line_empty: false,
        }
    }

    /// Accept every deviation
    pub fn lenient() -> Self {
        Self {
            header_mismatch_basename: true,
            last_line_empty: true,
            first_line_empty: true,
        }
    }
}

/// How many blank lines separate items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separation {
    /// Start at one; the first run of two blanks promotes it to two,
    /// and the first completed run settles it for the rest of the file
    #[default]
    Infer,
    /// Fixed width (at least one)
    Fixed(usize),
}

/// Header line problems
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Header text has leading or trailing whitespace
    #[error("header is not trimmed: '{header}'")]
    NotTrimmed { header: String },

    /// The line after the header is not blank
    #[error("header must be followed by one blank line")]
    MissingBlankAfterHeader,

    /// Header text does not name the file
    #[error("header '{header}' does not match base name '{base_name}'")]
    BasenameMismatch { header: String, base_name: String },
}

/// Blank run problems
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlankRunError {
    /// A blank line that does not fit the separation
    #[error("unexpected blank line (separation is {separation})")]
    UnexpectedBlankLine { separation: usize },

    /// An item preceded by too short a blank run
    #[error("too few blank lines: found {found}, expected {separation}")]
    TooFewBlankLines { found: usize, separation: usize },
}

/// End of input problems
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrailingItemError {
    /// Body ends inside an item
    #[error("last item is not followed by a blank line")]
    MissingTrailingBlank,
}

/// What went wrong in a parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    BlankRun(#[from] BlankRunError),
    #[error(transparent)]
    TrailingItem(#[from] TrailingItemError),
}

/// A structural error with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    /// The failure
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: usize, kind: impl Into<ParseErrorKind>) -> Self {
        Self { line, kind: kind.into() }
    }
}

/// Any failure reading a TXC source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxcError {
    #[error(transparent)]
    Directive(#[from] DirectiveError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A parsed TXC source and the layout needed to write it back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Txc {
    /// Source name as given to the reader
    pub name: String,
    /// Codec of the payload
    pub codec: Codec,
    /// Coding directive, if present
    pub directive: Option<Directive>,
    /// Bytes taken by the directive line
    pub payload_offset: usize,
    /// Bytes of the blank line consumed after the directive (0, 1 or 2)
    pub skipped_blank: usize,
    /// Parsed nodes
    pub nodes: Vec<Node>,
    /// Whether the body's last line is blank
    pub trailing_blank: bool,
}

impl Txc {
    /// Header text, if any
    pub fn header(&self) -> Option<&str> {
        match self.nodes.first() {
            Some(Node::Header(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Item nodes' lines, in order
    pub fn items(&self) -> impl Iterator<Item = &[String]> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Item(lines) => Some(lines.as_slice()),
            _ => None,
        })
    }

    /// The body text the nodes were parsed from
    pub fn body_text(&self) -> String {
        join_nodes(&self.nodes, self.trailing_blank)
    }

    /// Full source text: directive line, consumed blank, body
    pub fn source_text(&self) -> String {
        let mut text = String::new();
        if let Some(directive) = &self.directive {
            text.push_str(&directive.raw_tag_line);
            text.push_str(directive.line_break);
            match self.skipped_blank {
                2 => text.push_str("\r\n"),
                1 => text.push('\n'),
                _ => {}
            }
        }
        text.push_str(&self.body_text());
        text
    }
}

/// Join nodes back into text.
///
/// Each item is followed by its terminating blank line, except a final
/// item when the body did not end with one.
pub fn join_nodes(nodes: &[Node], trailing_blank: bool) -> String {
    let mut text = String::new();
    for (idx, node) in nodes.iter().enumerate() {
        match node {
            Node::Header(header) => {
                text.push_str(HEADER_PREFIX);
                text.push_str(header);
                text.push_str("\n\n");
            }
            Node::Item(lines) => {
                for line in lines {
                    text.push_str(line);
                    text.push('\n');
                }
                if idx + 1 < nodes.len() || trailing_blank {
                    text.push('\n');
                }
            }
            Node::Blank => text.push('\n'),
        }
    }
    text
}

/// Split a path into its base name and recognized suffix
pub fn base_name(path: &str) -> (String, String) {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    for suffix in SPECIAL_SUFFIXES {
        if let Some(base) = file_name.strip_suffix(suffix) {
            if !base.is_empty() {
                return (base.to_string(), suffix.to_string());
            }
        }
    }
    (file_name.to_string(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(lines: &[&str]) -> Node {
        Node::Item(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_node_display() {
        assert_eq!(Node::Header("sample".into()).to_string(), r#"header=["sample"]"#);
        assert_eq!(item(&["ol\u{e1}", "x"]).to_string(), r#"item=["ola'", "x"]"#);
        assert_eq!(Node::Blank.to_string(), "blank=[]");
    }

    #[test]
    fn test_default_policy() {
        let policy = ToleratePolicy::default();
        assert!(!policy.header_mismatch_basename);
        assert!(policy.last_line_empty);
        assert!(!policy.first_line_empty);
        assert!(!ToleratePolicy::strict().last_line_empty);
        assert!(ToleratePolicy::lenient().first_line_empty);
    }

    #[test]
    fn test_join_nodes() {
        let nodes = vec![Node::Header("sample".into()), item(&["hello", "world"]), item(&["bye"])];
        assert_eq!(join_nodes(&nodes, false), "# sample\n\nhello\nworld\n\nbye\n");
        assert_eq!(join_nodes(&nodes, true), "# sample\n\nhello\nworld\n\nbye\n\n");
    }

    #[test]
    fn test_join_with_blank_nodes() {
        let nodes = vec![item(&["a"]), Node::Blank, item(&["b"])];
        assert_eq!(join_nodes(&nodes, false), "a\n\n\nb\n");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("dir/sample.txc"), ("sample".into(), ".txc".into()));
        assert_eq!(base_name("C:\\notes\\todo.txt"), ("todo".into(), ".txt".into()));
        assert_eq!(base_name("plain.md"), ("plain.md".into(), String::new()));
        assert_eq!(base_name(".txc"), (".txc".into(), String::new()));
    }

    #[test]
    fn test_error_messages() {
        let err = ParseError::new(2, HeaderError::MissingBlankAfterHeader);
        assert_eq!(err.to_string(), "line 2: header must be followed by one blank line");

        let err = ParseError::new(7, BlankRunError::TooFewBlankLines { found: 1, separation: 2 });
        assert!(err.to_string().contains("found 1, expected 2"));
    }

    #[test]
    fn test_txc_source_text() {
        let txc = Txc {
            name: "sample.txc".into(),
            codec: Codec::Utf8,
            directive: Some(Directive {
                label: "coding".into(),
                code_name: "UTF-8".into(),
                raw_tag_line: "#-*- coding: UTF-8 -*-".into(),
                line_break: "\n",
            }),
            payload_offset: 23,
            skipped_blank: 1,
            nodes: vec![Node::Header("sample".into()), item(&["x"])],
            trailing_blank: false,
        };
        assert_eq!(txc.header(), Some("sample"));
        assert_eq!(txc.items().count(), 1);
        assert_eq!(txc.source_text(), "#-*- coding: UTF-8 -*-\n\n# sample\n\nx\n");
    }

    #[test]
    fn test_txc_source_text_keeps_crlf_directive() {
        let txc = Txc {
            name: "sample.txc".into(),
            codec: Codec::Latin1,
            directive: Some(Directive {
                label: "coding".into(),
                code_name: "ISO-8859-1".into(),
                raw_tag_line: "#-*- coding: ISO-8859-1 -*-".into(),
                line_break: "\r\n",
            }),
            payload_offset: 29,
            skipped_blank: 2,
            nodes: vec![item(&["x"])],
            trailing_blank: false,
        };
        assert_eq!(txc.source_text(), "#-*- coding: ISO-8859-1 -*-\r\n\r\nx\n");
    }
}
