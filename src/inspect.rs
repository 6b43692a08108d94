//! Physical shape of a text source: line endings, control clutter and
//! bytes outside 7-bit ASCII

/// Line ending convention of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n` only
    Nl,
    /// Every line break is `\r\n`
    DosCr,
    /// Some of each, or stray `\r`
    Mixed,
}

impl LineEnding {
    /// Short name, as shown in listings
    pub fn name(&self) -> &'static str {
        match self {
            LineEnding::Nl => "NL",
            LineEnding::DosCr => "DOS_CR",
            LineEnding::Mixed => "MixCR",
        }
    }
}

/// Where a notable byte sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BytePosition {
    /// 1-based line
    pub line: usize,
    /// 1-based byte column within the line
    pub column: usize,
    /// The byte
    pub byte: u8,
}

/// Summary of a byte source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextInfo {
    /// Number of lines, counting an unterminated last line
    pub lines: usize,
    /// Number of `\n`
    pub newlines: usize,
    /// Number of `\r`
    pub cr_count: usize,
    /// Number of `\r\n` pairs
    pub crlf_count: usize,
    /// Last line has no line break
    pub no_eol: bool,
    /// Control characters other than tab, CR and LF
    pub clutter: Vec<BytePosition>,
    /// Bytes at or above 0x7f
    pub non_ascii: Vec<BytePosition>,
}

impl TextInfo {
    /// Scan a byte source
    pub fn scan(bytes: &[u8]) -> Self {
        let mut info = TextInfo::default();
        let mut line = 1;
        let mut column = 0;
        let mut prev = None;

        for &byte in bytes {
            column += 1;
            match byte {
                b'\n' => {
                    info.newlines += 1;
                    if prev == Some(b'\r') {
                        info.crlf_count += 1;
                    }
                    line += 1;
                    column = 0;
                }
                b'\r' => info.cr_count += 1,
                b'\t' => {}
                0x00..=0x1f => info.clutter.push(BytePosition { line, column, byte }),
                0x7f..=0xff => info.non_ascii.push(BytePosition { line, column, byte }),
                _ => {}
            }
            prev = Some(byte);
        }

        info.no_eol = !bytes.is_empty() && prev != Some(b'\n');
        info.lines = info.newlines + usize::from(info.no_eol);
        info
    }

    /// Line ending convention
    pub fn line_ending(&self) -> LineEnding {
        if self.cr_count == 0 {
            LineEnding::Nl
        } else if self.cr_count == self.crlf_count && self.crlf_count == self.newlines {
            LineEnding::DosCr
        } else {
            LineEnding::Mixed
        }
    }

    /// Uniform line endings and no clutter; with `require_ascii7`, also
    /// nothing outside 7-bit ASCII
    pub fn is_text_ok(&self, require_ascii7: bool) -> bool {
        let endings_ok = self.line_ending() != LineEnding::Mixed;
        let ascii_ok = !require_ascii7 || self.non_ascii.is_empty();
        endings_ok && self.clutter.is_empty() && ascii_ok
    }
}
