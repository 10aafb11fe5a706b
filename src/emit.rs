//! Serialization of a corpus as an assembly-data listing, in the exact
//! shape the hardware harness assembles and loads: a leading element-count
//! record and one 64-byte-aligned labeled block per array, packed into
//! 32-bit words.

use std::io::{self, Write};

use super::gen::{Block, Corpus};

/// Write the corpus as an assembly-data listing.
///
/// Each `.word` packs `4 / byte_width` consecutive elements with the
/// highest index first, so the elements sit in little-endian order in
/// memory. The `N` block carries the element count as an 8-byte record.
pub fn write_listing<W: Write>(w: &mut W, corpus: &Corpus) -> io::Result<()> {
    writeln!(w, ".section .data,\"aw\",@progbits")?;

    writeln!(w, ".global N")?;
    writeln!(w, ".balign 8")?;
    writeln!(w, "N:")?;
    writeln!(w, "    .word 0x{:08x}", corpus.count)?;
    writeln!(w, "    .word 0x00000000")?;

    for block in &corpus.blocks {
        write_block(w, block)?;
    }
    Ok(())
}

fn write_block<W: Write>(w: &mut W, block: &Block) -> io::Result<()> {
    writeln!(w, ".global {}", block.name)?;
    writeln!(w, ".balign 64")?;
    writeln!(w, "{}:", block.name)?;

    let per_word = 4 / block.byte_width;
    let digits = block.byte_width * 2;
    for word in block.data.chunks(per_word) {
        write!(w, "    .word 0x")?;
        for j in (0..word.len()).rev() {
            write!(w, "{:0digits$x}", word[j], digits = digits)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
fn render(corpus: &Corpus) -> String {
    let mut out = Vec::new();
    write_listing(&mut out, corpus).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_listing_header() {
    let corpus = Corpus { count: 128, blocks: Vec::new() };
    let s = render(&corpus);
    assert_eq!(
        s,
        ".section .data,\"aw\",@progbits\n\
         .global N\n\
         .balign 8\n\
         N:\n\
         \x20   .word 0x00000080\n\
         \x20   .word 0x00000000\n"
    );
}

#[test]
fn test_word_packing() {
    // Byte elements pack four per word, highest index first.
    let corpus = Corpus {
        count: 4,
        blocks: vec![Block {
            name: "x".to_string(),
            byte_width: 1,
            data: vec![0x01, 0x02, 0x03, 0x04],
        }],
    };
    let s = render(&corpus);
    assert!(s.contains(".global x\n.balign 64\nx:\n    .word 0x04030201\n"));

    // Half-word elements pack two per word.
    let corpus = Corpus {
        count: 4,
        blocks: vec![Block {
            name: "h".to_string(),
            byte_width: 2,
            data: vec![0xaaaa, 0xbbbb, 0x7c00, 0x0001],
        }],
    };
    let s = render(&corpus);
    assert!(s.contains("h:\n    .word 0xbbbbaaaa\n    .word 0x00017c00\n"));

    // Full words pass through one per line.
    let corpus = Corpus {
        count: 2,
        blocks: vec![Block {
            name: "f".to_string(),
            byte_width: 4,
            data: vec![0x7f80_0000, 0x0000_0001],
        }],
    };
    let s = render(&corpus);
    assert!(s.contains("f:\n    .word 0x7f800000\n    .word 0x00000001\n"));
}

#[test]
fn test_generated_listing_is_loadable() {
    use super::gen::{generate, COUNT};

    let corpus = generate();
    let s = render(&corpus);

    // Every block is aligned and fully emitted.
    assert_eq!(s.matches(".balign 64").count(), corpus.blocks.len());
    for block in &corpus.blocks {
        assert!(s.contains(&format!(".global {}\n", block.name)));
        assert!(s.contains(&format!("{}:\n", block.name)));
    }

    // The fp16 operand block spans COUNT/2 words.
    let word_lines = s.lines().filter(|l| l.starts_with("    .word")).count();
    let expected: usize = corpus
        .blocks
        .iter()
        .map(|b| COUNT / (4 / b.byte_width))
        .sum::<usize>()
        + 2; // the N record
    assert_eq!(word_lines, expected);
}
