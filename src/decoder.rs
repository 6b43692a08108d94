//! Coding directive detection and payload decoding

use std::fmt;

use log::debug;
use thiserror::Error;

/// Opening marker of a directive line, e.g. `#-*- coding: UTF-8 -*-`
pub const DIRECTIVE_PREFIX: &str = "#-*-";
/// Closing marker of a directive line
pub const DIRECTIVE_SUFFIX: &str = "-*-";
/// Only this many leading bytes are inspected for a directive
pub const HEAD_LEN: usize = 32;
/// Hyphenated code names a directive may declare
pub const VALID_CODE_NAMES: &[&str] = &["ISO-8859-1", "UTF-8"];

/// Character codec of a TXC payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    /// 7-bit ASCII
    Ascii,
    /// ISO-8859-1: every byte is the code point of the same value
    #[default]
    Latin1,
    /// UTF-8
    Utf8,
}

impl Codec {
    /// Canonical code name
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Ascii => "ascii",
            Codec::Latin1 => "ISO-8859-1",
            Codec::Utf8 => "UTF-8",
        }
    }

    /// Resolve one of [`VALID_CODE_NAMES`], ignoring ASCII case
    pub fn from_code_name(name: &str) -> Option<Self> {
        [Codec::Latin1, Codec::Utf8]
            .into_iter()
            .find(|codec| codec.name().eq_ignore_ascii_case(name))
    }

    /// Decode bytes; on failure returns the index of the first bad byte
    pub fn decode(&self, bytes: &[u8]) -> Result<String, usize> {
        match self {
            Codec::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(pos),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            Codec::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Codec::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|e| e.valid_up_to()),
        }
    }

    /// Whether `c` has a representation in this codec
    pub fn can_encode(&self, c: char) -> bool {
        match self {
            Codec::Ascii => c.is_ascii(),
            Codec::Latin1 => u32::from(c) < 0x100,
            Codec::Utf8 => true,
        }
    }

    /// Append the encoding of `c`; returns false (and writes nothing)
    /// if the codec cannot represent it
    pub fn encode_char(&self, c: char, out: &mut Vec<u8>) -> bool {
        if !self.can_encode(c) {
            return false;
        }
        match self {
            Codec::Ascii | Codec::Latin1 => out.push(u32::from(c) as u8),
            Codec::Utf8 => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
        true
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed `#-*- label: name -*-` first line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Text before the colon, usually `coding`
    pub label: String,
    /// Effective code name: a canonical valid name, or `ascii`
    pub code_name: String,
    /// The directive line as found, without its line break
    pub raw_tag_line: String,
    /// Line break ending the directive: `"\n"`, `"\r\n"`, or empty at end of input
    pub line_break: &'static str,
}

/// Error for a malformed or disallowed directive, or an undecodable payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    /// Tag has no `label: name` separator
    #[error("coding directive '{tag}' has no ':' separator")]
    MissingColon { tag: String },

    /// Tag names no codec
    #[error("coding directive has an empty code name")]
    EmptyCodeName,

    /// Hyphenated code name outside [`VALID_CODE_NAMES`]
    #[error("invalid code name '{name}' (expected one of: ISO-8859-1, UTF-8)")]
    InvalidCodeName { name: String },

    /// Payload bytes the resolved codec cannot decode
    #[error("byte offset {position}: payload is not valid {codec}")]
    Undecodable { codec: Codec, position: usize },
}

/// Result of decoding one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Decoded payload, ready for line splitting
    pub text: String,
    /// Bytes taken by the directive line and its newline (0 without one)
    pub payload_offset: usize,
    /// Bytes of the blank line consumed right after the directive:
    /// 0 (none), 1 (`\n`) or 2 (`\r\n`)
    pub skipped_blank: usize,
    /// Codec used for the payload
    pub codec: Codec,
    /// The directive, when the source has one
    pub directive: Option<Directive>,
}

impl Decoded {
    /// Byte offset at which `text` starts in the source
    pub fn text_offset(&self) -> usize {
        self.payload_offset + self.skipped_blank
    }
}

/// Decodes TXC sources, honoring an optional coding directive
#[derive(Debug, Clone, Default)]
pub struct DirectiveDecoder {
    // Stateless; no encoding state survives between calls
}

impl DirectiveDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self {}
    }

    /// Decode a whole source
    pub fn decode(&self, bytes: &[u8]) -> Result<Decoded, DirectiveError> {
        let mut directive = match Self::head_line(bytes) {
            Some(line) => Self::parse_directive(line)?,
            None => None,
        };

        let (codec, payload_offset) = match &mut directive {
            Some(d) => {
                let codec = Codec::from_code_name(&d.code_name).unwrap_or(Codec::Ascii);
                let offset = match bytes.iter().position(|&b| b == b'\n') {
                    Some(pos) => pos + 1,
                    None => bytes.len(),
                };
                Self::complete_directive(d, &bytes[..offset], codec)?;
                (codec, offset)
            }
            None => (Codec::Latin1, 0),
        };

        // A directive is normally followed by one blank line of its own
        let rest = &bytes[payload_offset..];
        let skipped_blank = match directive {
            Some(_) if rest.starts_with(b"\r\n") => 2,
            Some(_) if rest.starts_with(b"\n") => 1,
            _ => 0,
        };
        let start = payload_offset + skipped_blank;

        let text = codec
            .decode(&bytes[start..])
            .map_err(|pos| DirectiveError::Undecodable { codec, position: start + pos })?;

        debug!(
            "decoded {} bytes as {} (directive: {}, offset {})",
            bytes.len(),
            codec,
            directive.is_some(),
            payload_offset
        );

        Ok(Decoded { text, payload_offset, skipped_blank, codec, directive })
    }

    /// Take the whole directive line, which may run past the head
    fn complete_directive(
        directive: &mut Directive,
        line: &[u8],
        codec: Codec,
    ) -> Result<(), DirectiveError> {
        let (line, line_break) = if let Some(line) = line.strip_suffix(b"\r\n") {
            (line, "\r\n")
        } else if let Some(line) = line.strip_suffix(b"\n") {
            (line, "\n")
        } else {
            (line, "")
        };
        directive.raw_tag_line = codec
            .decode(line)
            .map_err(|position| DirectiveError::Undecodable { codec, position })?;
        directive.line_break = line_break;
        Ok(())
    }

    /// First line of the head, if it is plain ASCII
    fn head_line(bytes: &[u8]) -> Option<&str> {
        let head = &bytes[..bytes.len().min(HEAD_LEN)];
        let line = match head.iter().position(|&b| b == b'\n') {
            Some(pos) => &head[..pos],
            None => head,
        };
        if !line.is_ascii() {
            return None;
        }
        let line = std::str::from_utf8(line).ok()?;
        Some(line.strip_suffix('\r').unwrap_or(line))
    }

    /// Parse a directive line like `#-*- coding: ISO-8859-1 -*-`.
    ///
    /// Returns `Ok(None)` when the line is not a directive at all.
    pub fn parse_directive(line: &str) -> Result<Option<Directive>, DirectiveError> {
        let rest = match line.strip_prefix(DIRECTIVE_PREFIX) {
            Some(rest) => rest,
            None => return Ok(None),
        };
        let end = match rest.find(DIRECTIVE_SUFFIX) {
            Some(end) => end,
            None => return Ok(None),
        };

        let tag = rest[..end].trim();
        let (label, name) = tag
            .split_once(':')
            .ok_or_else(|| DirectiveError::MissingColon { tag: tag.to_string() })?;
        let name = name.trim();

        if name.is_empty() {
            return Err(DirectiveError::EmptyCodeName);
        }

        let code_name = if name.contains('-') {
            Codec::from_code_name(name)
                .ok_or_else(|| DirectiveError::InvalidCodeName { name: name.to_string() })?
                .name()
        } else {
            Codec::Ascii.name()
        };

        Ok(Some(Directive {
            label: label.trim().to_string(),
            code_name: code_name.to_string(),
            raw_tag_line: line.to_string(),
            line_break: "",
        }))
    }
}
