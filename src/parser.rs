//! Header / item / blank node parser
//!
//! A single pass over the body lines classifies them into [`Node`]s:
//!
//! ```text
//! # sample          <- optional header, must name the file
//!                   <- exactly one blank after the header
//! first item
//! still first item
//!                   <- closes the item
//! second item
//! ```
//!
//! Items are separated by a run of blank lines whose width is the
//! *separation*. The blank that closes an item is the first of the run;
//! any further blanks up to the separation become [`Node::Blank`]s.
//! Parsing stops at the first structural error.

use log::{debug, warn};

use crate::charmap::{char_map, Style};
use crate::document::{
    BlankRunError, HeaderError, Node, ParseError, Separation, ToleratePolicy, TrailingItemError,
    HEADER_PREFIX,
};

/// Parses TXC body lines into nodes
#[derive(Debug, Clone, Default)]
pub struct NodeParser {
    policy: ToleratePolicy,
    separation: Separation,
}

impl NodeParser {
    /// Create a parser with the given tolerance policy
    pub fn new(policy: ToleratePolicy) -> Self {
        Self { policy, separation: Separation::default() }
    }

    /// Set the separation rule
    pub fn with_separation(mut self, separation: Separation) -> Self {
        self.separation = separation;
        self
    }

    /// Parse lines of one source.
    ///
    /// `base_name` and `ext` name the file, for the header check.
    ///
    /// # Errors
    /// The first structural error, with its 1-based line number. No nodes
    /// are returned on failure.
    pub fn parse<S: AsRef<str>>(
        &self,
        lines: &[S],
        base_name: &str,
        ext: &str,
    ) -> Result<Vec<Node>, ParseError> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let mut state = ParseState::new(self.policy, self.separation);
        let mut body_start = 0;

        if let Some(header) = lines[0].as_ref().strip_prefix(HEADER_PREFIX) {
            let next = lines.get(1).map(|line| line.as_ref());
            state.handle_header(header, next, base_name, ext)?;
            body_start = 2;
        }

        for (idx, line) in lines.iter().enumerate().skip(body_start) {
            state.parse_line(line.as_ref(), idx + 1, idx == body_start)?;
        }

        state.finish(lines.len())
    }
}

/// Parse lines with the default separation rule
pub fn parse<S: AsRef<str>>(
    lines: &[S],
    base_name: &str,
    ext: &str,
    policy: ToleratePolicy,
) -> Result<Vec<Node>, ParseError> {
    NodeParser::new(policy).parse(lines, base_name, ext)
}

/// Per-call parser state
struct ParseState {
    policy: ToleratePolicy,
    nodes: Vec<Node>,
    series: Vec<String>,
    empties: usize,
    separation: usize,
    settled: bool,
    items: usize,
}

impl ParseState {
    fn new(policy: ToleratePolicy, separation: Separation) -> Self {
        let (separation, settled) = match separation {
            Separation::Infer => (1, false),
            Separation::Fixed(width) => (width.max(1), true),
        };
        Self {
            policy,
            nodes: Vec::new(),
            series: Vec::new(),
            empties: 0,
            separation,
            settled,
            items: 0,
        }
    }

    fn handle_header(
        &mut self,
        header: &str,
        next: Option<&str>,
        base_name: &str,
        ext: &str,
    ) -> Result<(), ParseError> {
        if header.trim() != header {
            return Err(ParseError::new(
                1,
                HeaderError::NotTrimmed { header: header.to_string() },
            ));
        }

        if next != Some("") {
            return Err(ParseError::new(2, HeaderError::MissingBlankAfterHeader));
        }

        if !Self::header_matches(header, base_name, ext) {
            if !self.policy.header_mismatch_basename {
                return Err(ParseError::new(
                    1,
                    HeaderError::BasenameMismatch {
                        header: header.to_string(),
                        base_name: base_name.to_string(),
                    },
                ));
            }
            warn!("header '{}' does not match base name '{}'", header, base_name);
        }

        self.nodes.push(Node::Header(header.to_string()));
        Ok(())
    }

    fn header_matches(header: &str, base_name: &str, ext: &str) -> bool {
        let map = char_map();
        let wanted = map.simplify(header, Style::Primary);
        let with_ext = format!("{}{}", base_name, ext);
        [base_name, with_ext.as_str()]
            .iter()
            .any(|name| map.simplify(name, Style::Primary).eq_ignore_ascii_case(&wanted))
    }

    fn parse_line(&mut self, line: &str, line_num: usize, first: bool) -> Result<(), ParseError> {
        if line.is_empty() {
            self.handle_blank(line_num, first)
        } else {
            self.handle_text(line, line_num)
        }
    }

    fn handle_text(&mut self, line: &str, line_num: usize) -> Result<(), ParseError> {
        if self.series.is_empty() && self.items > 0 {
            if !self.settled {
                self.settled = true;
                debug!("separation settled at {} (line {})", self.separation, line_num);
            }
            if self.empties < self.separation {
                return Err(ParseError::new(
                    line_num,
                    BlankRunError::TooFewBlankLines {
                        found: self.empties,
                        separation: self.separation,
                    },
                ));
            }
        }

        self.series.push(line.to_string());
        self.empties = 0;
        Ok(())
    }

    fn handle_blank(&mut self, line_num: usize, first: bool) -> Result<(), ParseError> {
        self.empties += 1;

        if !self.series.is_empty() {
            let lines = std::mem::take(&mut self.series);
            self.nodes.push(Node::Item(lines));
            self.items += 1;
            return Ok(());
        }

        if self.items == 0 {
            // Blank before any item
            if first && self.policy.first_line_empty {
                warn!("line {}: leading blank line accepted", line_num);
                self.nodes.push(Node::Blank);
                return Ok(());
            }
            return Err(ParseError::new(
                line_num,
                BlankRunError::UnexpectedBlankLine { separation: self.separation },
            ));
        }

        if self.empties == 2 && self.separation == 1 && !self.settled {
            self.separation = 2;
            self.settled = true;
            debug!("separation promoted to 2 (line {})", line_num);
        }

        if self.empties != self.separation {
            return Err(ParseError::new(
                line_num,
                BlankRunError::UnexpectedBlankLine { separation: self.separation },
            ));
        }

        self.nodes.push(Node::Blank);
        Ok(())
    }

    fn finish(mut self, last_line: usize) -> Result<Vec<Node>, ParseError> {
        if !self.series.is_empty() {
            if !self.policy.last_line_empty {
                return Err(ParseError::new(last_line, TrailingItemError::MissingTrailingBlank));
            }
            warn!("line {}: last item has no trailing blank line", last_line);
            let lines = std::mem::take(&mut self.series);
            self.nodes.push(Node::Item(lines));
        }
        Ok(self.nodes)
    }
}
