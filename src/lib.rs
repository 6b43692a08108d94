//! # emx-txc
//!
//! TXC ("text with context") file support: coding directives, item
//! parsing and ASCII-safe rendering.
//!
//! ## Format
//!
//! A TXC file is small, line oriented text:
//!
//! ```text
//! #-*- coding: ISO-8859-1 -*-
//!
//! # sample
//!
//! first item
//! still the first item
//!
//! second item
//! ```
//!
//! - An optional first-line **directive** names the codec of the rest
//!   (`ISO-8859-1` or `UTF-8`; unhyphenated names mean `ascii`). Without
//!   one the payload is read as ISO-8859-1.
//! - An optional `# name` **header** must name the file, and is followed
//!   by exactly one blank line.
//! - The body is a sequence of **items** separated by blank lines. The
//!   separation is one blank line, or two when the file itself uses two.
//!
//! ## Rendering
//!
//! Any text can be rendered ASCII-safe through per-byte substitution
//! tables: `São` becomes `Sao` (primary style) or `Sa~o` (alternate
//! style). Rendering into a real codec collects a non-fatal
//! [`EncodeError`] per line that cannot be represented.
//!
//! ```rust
//! use emx_txc::{Renderer, Style, TxcReader};
//!
//! let txc = TxcReader::new().read("sample.txc", b"# sample\n\nS\xe3o Paulo\n")?;
//! assert_eq!(txc.items().count(), 1);
//!
//! let rendered = Renderer::simple(Style::Alternate).render_nodes(&txc.nodes, txc.trailing_blank);
//! assert_eq!(rendered.bytes, b"# sample\n\nSa~o Paulo\n");
//! # Ok::<(), emx_txc::TxcError>(())
//! ```

pub mod charmap;
pub mod decoder;
pub mod document;
pub mod inspect;
pub mod parser;
pub mod reader;
pub mod renderer;

pub use charmap::{char_map, Category, CharMap, OtherLookupEntry, Style};
pub use decoder::{Codec, Decoded, Directive, DirectiveDecoder, DirectiveError};
pub use document::{
    base_name, join_nodes, BlankRunError, HeaderError, Node, ParseError, ParseErrorKind,
    Separation, ToleratePolicy, TrailingItemError, Txc, TxcError,
};
pub use inspect::{BytePosition, LineEnding, TextInfo};
pub use parser::{parse, NodeParser};
pub use reader::TxcReader;
pub use renderer::{normalize, normalize_str, EncodeError, Rendered, Renderer, Value};
