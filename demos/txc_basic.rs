//! Example of reading a TXC file and rendering it ASCII-safe
//!
//! Run with a path to read that file, or without one to use a built-in sample.

use std::path::Path;

use emx_txc::{Renderer, Style, TextInfo, TxcReader};

const SAMPLE: &[u8] = b"#-*- coding: ISO-8859-1 -*-\n\n# sample\n\nS\xe3o Paulo\n\nCura\xe7ao\nWillemstad\n";

fn main() -> anyhow::Result<()> {
    println!("=== TXC Example ===\n");

    let reader = TxcReader::new();
    let (txc, info) = match std::env::args().nth(1) {
        Some(path) => {
            let path = Path::new(&path);
            let bytes = std::fs::read(path)?;
            (reader.read_path(path)?, TextInfo::scan(&bytes))
        }
        None => (reader.read("sample.txc", SAMPLE)?, TextInfo::scan(SAMPLE)),
    };

    println!(
        "{}: codec {}, {} lines, {} endings",
        txc.name,
        txc.codec,
        info.lines,
        info.line_ending().name()
    );
    if let Some(directive) = &txc.directive {
        println!("directive: {} ({})", directive.raw_tag_line, directive.code_name);
    }

    println!("\n{} nodes:", txc.nodes.len());
    for node in &txc.nodes {
        println!("  {}", node);
    }

    // Simplified rendering never fails
    let rendered = Renderer::simple(Style::Alternate).render_nodes(&txc.nodes, txc.trailing_blank);
    println!("\nASCII rendering:");
    println!("---");
    print!("{}", String::from_utf8_lossy(&rendered.bytes));
    println!("---");

    // Writing back in the source codec gives the source again
    let source = Renderer::new(txc.codec).render_txc(&txc);
    println!("\nRendered back: {} bytes, clean: {}", source.bytes.len(), source.is_clean());

    Ok(())
}
