//! Per-byte substitution tables
//!
//! Two parallel 256-entry tables map every Latin-1 code point to a short
//! ASCII string:
//!
//! - **primary**: the plain letter, e.g. `ã` -> `a`
//! - **alternate**: a decorated spelling that keeps the diacritic as an
//!   ASCII marker, e.g. `ã` -> `a~`, `á` -> `a'`, `à` -> `'a`, `ç` -> `c,`
//!
//! Punctuation that has more than one useful rendering (trademark, angle
//! quotes, dashes, curly quotes) is described by [`OtherLookupEntry`].
//! The tables are built once per process and shared read-only through
//! [`char_map`].

use std::sync::OnceLock;

/// Printable ASCII, starting at 0x20
const PRINTABLE: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";
const PRINTABLE_FIRST: usize = 0x20;
const PRINTABLE_END: usize = 0x7f;

/// Substitute for bytes with no defined rendering
pub const UNDEFINED: &str = ".";

/// Accented Latin-1 letters: (byte, primary, alternate)
const ACCENTS: &[(u8, &str, &str)] = &[
    (0xc1, "A", "A'"), // A acute
    (0xc9, "E", "E'"),
    (0xcd, "I", "I'"),
    (0xd3, "O", "O'"),
    (0xda, "U", "U'"),
    (0xe1, "a", "a'"),
    (0xe9, "e", "e'"),
    (0xed, "i", "i'"),
    (0xf3, "o", "o'"),
    (0xfa, "u", "u'"),
    (0xc3, "A", "A~"), // A tilde
    (0xd5, "O", "O~"),
    (0xe3, "a", "a~"),
    (0xf5, "o", "o~"),
    (0xc0, "A", "'A"), // A grave
    (0xd4, "O", "'O"),
    (0xe0, "a", "'a"),
    (0xf4, "o", "'o"),
    (0xc7, "C", "C,"), // C cedilla
    (0xe7, "c", "c,"),
];

/// Kind of a multi-representation punctuation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Registered trademark and similar marks
    Trademark,
    /// Guillemets
    AngleQuote,
    /// Spaces, dots, dashes, quotes
    Punctuation,
}

/// A punctuation character with an ASCII form and an HTML entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtherLookupEntry {
    /// Unicode code point
    pub codepoint: u32,
    /// Short ASCII rendering
    pub text: &'static str,
    /// HTML named entity
    pub html: &'static str,
    /// Human readable name
    pub description: &'static str,
    /// Kind of punctuation
    pub category: Category,
}

const fn other(
    codepoint: u32,
    text: &'static str,
    html: &'static str,
    description: &'static str,
    category: Category,
) -> OtherLookupEntry {
    OtherLookupEntry { codepoint, text, html, description, category }
}

/// Punctuation with more than one useful rendering, in lookup order
pub const OTHER_LOOKUP: &[OtherLookupEntry] = &[
    other(0xae, "(R)", "&reg;", "Registered trademark", Category::Trademark),
    other(0xab, "<<", "&laquo;", "Angle quotation mark (left)", Category::AngleQuote),
    other(0xbb, ">>", "&raquo;", "Angle quotation mark (right)", Category::AngleQuote),
    other(0xa0, " ", "&nbsp;", "Non-breaking space", Category::Punctuation),
    other(0xb7, "-", "&middot;", "Middle dot", Category::Punctuation),
    other(0x2013, "--", "&ndash;", "EN dash", Category::Punctuation),
    other(0x2014, "--", "&mdash;", "EM dash", Category::Punctuation),
    other(0x201c, "\"", "&ldquo;", "Left double quotation mark", Category::Punctuation),
    other(0x201d, "\"", "&rdquo;", "Right double quotation mark", Category::Punctuation),
    other(0x2022, "-o-", "&bull;", "Bullet", Category::Punctuation),
];

/// Which of the two tables to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// Plain letters (`ã` -> `a`)
    #[default]
    Primary,
    /// Decorated spellings (`ã` -> `a~`)
    Alternate,
}

/// The pair of substitution tables plus the punctuation list
#[derive(Debug, Clone)]
pub struct CharMap {
    primary: [&'static str; 256],
    alternate: [&'static str; 256],
    others: &'static [OtherLookupEntry],
}

impl CharMap {
    /// Build both tables.
    ///
    /// # Panics
    /// If a code point appears twice across the accent table and the
    /// punctuation list, or an accent entry overrides printable ASCII.
    pub fn build() -> Self {
        Self::check_entries();

        let mut primary = [UNDEFINED; 256];
        let mut alternate = [UNDEFINED; 256];

        for idx in PRINTABLE_FIRST..PRINTABLE_END {
            let offset = idx - PRINTABLE_FIRST;
            let chars = &PRINTABLE[offset..offset + 1];
            primary[idx] = chars;
            alternate[idx] = chars;
        }

        for &(byte, plain, decorated) in ACCENTS {
            primary[byte as usize] = plain;
            alternate[byte as usize] = decorated;
        }

        for entry in OTHER_LOOKUP.iter().filter(|e| e.codepoint < 256) {
            primary[entry.codepoint as usize] = entry.text;
            alternate[entry.codepoint as usize] = entry.text;
        }

        for (byte, chars) in [(b'\t', "\t"), (b'\n', "\n"), (b'\r', "")] {
            primary[byte as usize] = chars;
            alternate[byte as usize] = chars;
        }

        Self { primary, alternate, others: OTHER_LOOKUP }
    }

    fn check_entries() {
        let codepoints: Vec<u32> = ACCENTS
            .iter()
            .map(|&(byte, _, _)| u32::from(byte))
            .chain(OTHER_LOOKUP.iter().map(|e| e.codepoint))
            .collect();

        for (idx, cp) in codepoints.iter().enumerate() {
            assert!(
                !codepoints[idx + 1..].contains(cp),
                "duplicate substitution entry for U+{:04X}",
                cp
            );
        }

        for &(byte, _, _) in ACCENTS {
            assert!(
                !(PRINTABLE_FIRST..PRINTABLE_END).contains(&(byte as usize)),
                "accent entry 0x{:02x} overrides printable ASCII",
                byte
            );
        }
    }

    /// Plain ASCII substitute for a byte
    pub fn to_ascii(&self, byte: u8) -> &'static str {
        self.primary[byte as usize]
    }

    /// Decorated ASCII substitute for a byte
    pub fn to_decorated(&self, byte: u8) -> &'static str {
        self.alternate[byte as usize]
    }

    /// Table entry for a byte in the given style
    pub fn lookup(&self, byte: u8, style: Style) -> &'static str {
        match style {
            Style::Primary => self.to_ascii(byte),
            Style::Alternate => self.to_decorated(byte),
        }
    }

    /// ASCII substitute for one character; anything past Latin-1 is `?`
    pub fn char_to_ascii(&self, c: char, style: Style) -> &'static str {
        match u8::try_from(u32::from(c)) {
            Ok(byte) => self.lookup(byte, style),
            Err(_) => "?",
        }
    }

    /// Rewrite a string through the table
    pub fn simplify(&self, text: &str, style: Style) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            out.push_str(self.char_to_ascii(c, style));
        }
        out
    }

    /// Punctuation entry for a code point
    pub fn find_other(&self, codepoint: u32) -> Option<&'static OtherLookupEntry> {
        self.others.iter().find(|e| e.codepoint == codepoint)
    }

    /// All punctuation entries
    pub fn others(&self) -> &'static [OtherLookupEntry] {
        self.others
    }
}

/// The process-wide table, built on first use
pub fn char_map() -> &'static CharMap {
    static CHAR_MAP: OnceLock<CharMap> = OnceLock::new();
    CHAR_MAP.get_or_init(CharMap::build)
}
