//! One-call TXC reader: decode, split, parse

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::decoder::DirectiveDecoder;
use crate::document::{base_name, Separation, ToleratePolicy, Txc, TxcError};
use crate::inspect::{LineEnding, TextInfo};
use crate::parser::NodeParser;

/// Reads TXC sources into [`Txc`] documents
#[derive(Debug, Clone, Default)]
pub struct TxcReader {
    decoder: DirectiveDecoder,
    parser: NodeParser,
}

impl TxcReader {
    /// Create a reader with the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tolerance policy
    pub fn with_policy(mut self, policy: ToleratePolicy) -> Self {
        self.parser = NodeParser::new(policy);
        self
    }

    /// Set the separation rule
    pub fn with_separation(mut self, separation: Separation) -> Self {
        self.parser = self.parser.with_separation(separation);
        self
    }

    /// Read a source; `name` is its path, used for the header check
    pub fn read(&self, name: &str, bytes: &[u8]) -> std::result::Result<Txc, TxcError> {
        let info = TextInfo::scan(bytes);
        if info.line_ending() != LineEnding::Nl {
            warn!("{}: {} line endings are not kept", name, info.line_ending().name());
        }

        let decoded = self.decoder.decode(bytes)?;
        let (base, ext) = base_name(name);
        let lines: Vec<&str> = decoded.text.lines().collect();
        let nodes = self.parser.parse(&lines, &base, &ext).map_err(|mut err| {
            // Report lines of the file, not of the payload
            if decoded.directive.is_some() {
                err.line += 1 + usize::from(decoded.skipped_blank > 0);
            }
            err
        })?;

        debug!("{}: {} lines, {} nodes, codec {}", name, lines.len(), nodes.len(), decoded.codec);

        Ok(Txc {
            name: name.to_string(),
            codec: decoded.codec,
            directive: decoded.directive,
            payload_offset: decoded.payload_offset,
            skipped_blank: decoded.skipped_blank,
            nodes,
            trailing_blank: lines.last() == Some(&""),
        })
    }

    /// Read a file
    pub fn read_path(&self, path: &Path) -> Result<Txc> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?;
        let name = path.to_string_lossy();
        self.read(&name, &bytes)
            .with_context(|| format!("Invalid TXC file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charmap::Style;
    use crate::decoder::Codec;
    use crate::document::{HeaderError, Node, ParseErrorKind};
    use crate::renderer::Renderer;

    #[test]
    fn test_read_sample() {
        let txc = TxcReader::new()
            .read("notes/sample.txc", b"# sample\n\nhello\nworld\n\nbye\n")
            .unwrap();
        assert_eq!(txc.codec, Codec::Latin1);
        assert_eq!(txc.header(), Some("sample"));
        assert_eq!(
            txc.nodes,
            vec![
                Node::Header("sample".into()),
                Node::Item(vec!["hello".into(), "world".into()]),
                Node::Item(vec!["bye".into()]),
            ]
        );
        assert!(!txc.trailing_blank);
    }

    #[test]
    fn test_round_trip_bytes() {
        let sources: [&[u8]; 4] = [
            b"# sample\n\nhello\nworld\n\nbye\n",
            b"#-*- coding: ISO-8859-1 -*-\n\n# sample\n\nS\xe3o\n\n\nPaulo\n\n",
            b"#-*- coding: UTF-8 -*-\n# sample\n\nol\xc3\xa1\n",
            b"one\n\ntwo\n\n",
        ];
        let reader = TxcReader::new();
        for source in sources {
            let txc = reader.read("sample.txt", source).unwrap();
            let rendered = Renderer::new(txc.codec).render_txc(&txc);
            assert_eq!(rendered.into_result().unwrap(), source);
        }
    }

    #[test]
    fn test_directive_error_surfaces() {
        let err = TxcReader::new().read("x.txc", b"#-*- coding: EBCDIC-US -*-\n").unwrap_err();
        assert!(matches!(err, TxcError::Directive(_)));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let err = TxcReader::new().read("sample.txc", b"# sample\nhello\n").unwrap_err();
        let TxcError::Parse(err) = err else {
            panic!("expected a parse error");
        };
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ParseErrorKind::Header(HeaderError::MissingBlankAfterHeader));
    }

    #[test]
    fn test_parse_error_line_counts_directive() {
        let reader = TxcReader::new();
        let err = reader.read("sample.txc", b"#-*- coding: UTF-8 -*-\n\n# sample\nhello\n").unwrap_err();
        let TxcError::Parse(err) = err else {
            panic!("expected a parse error");
        };
        assert_eq!(err.line, 4);
        assert_eq!(err.kind, ParseErrorKind::Header(HeaderError::MissingBlankAfterHeader));

        let err = reader.read("sample.txc", b"#-*- coding: UTF-8 -*-\n# sample\nhello\n").unwrap_err();
        let TxcError::Parse(err) = err else {
            panic!("expected a parse error");
        };
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_read_crlf_with_directive() {
        let source = b"#-*- coding: ISO-8859-1 -*-\r\n\r\n# sample\r\n\r\nx\r\n";
        let txc = TxcReader::new().read("sample.txc", source).unwrap();
        assert_eq!(txc.codec, Codec::Latin1);
        assert_eq!(txc.skipped_blank, 2);
        assert_eq!(txc.nodes, vec![Node::Header("sample".into()), Node::Item(vec!["x".into()])]);
        assert_eq!(txc.source_text(), "#-*- coding: ISO-8859-1 -*-\r\n\r\n# sample\n\nx\n");

        let err = TxcReader::new()
            .read("sample.txc", b"#-*- coding: ISO-8859-1 -*-\r\n\r\n# sample\r\nx\r\n")
            .unwrap_err();
        let TxcError::Parse(err) = err else {
            panic!("expected a parse error");
        };
        assert_eq!(err.line, 4);
    }

    #[test]
    fn test_round_trip_long_directive_line() {
        let source = b"#-*- coding: UTF-8 -*- vim: ft=txt\n# sample\n\nx\n";
        let txc = TxcReader::new().read("sample.txc", source).unwrap();
        assert_eq!(
            txc.directive.as_ref().unwrap().raw_tag_line,
            "#-*- coding: UTF-8 -*- vim: ft=txt"
        );
        let rendered = Renderer::new(txc.codec).render_txc(&txc);
        assert_eq!(rendered.into_result().unwrap(), source);
    }

    #[test]
    fn test_with_policy() {
        let reader = TxcReader::new().with_policy(ToleratePolicy::lenient());
        let txc = reader.read("sample.txc", b"# other\n\nx\n").unwrap();
        assert_eq!(txc.header(), Some("other"));
    }

    #[test]
    fn test_read_path_and_simplify() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cidade.txc");
        std::fs::write(&path, b"# cidade\n\nS\xe3o Paulo\n\nCura\xe7ao\n").unwrap();

        let txc = TxcReader::new().read_path(&path).unwrap();
        assert_eq!(txc.items().count(), 2);

        let rendered = Renderer::simple(Style::Alternate).render_nodes(&txc.nodes, txc.trailing_blank);
        assert_eq!(rendered.bytes, b"# cidade\n\nSa~o Paulo\n\nCurac,ao\n");
    }

    #[test]
    fn test_read_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TxcReader::new().read_path(&dir.path().join("none.txc")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
