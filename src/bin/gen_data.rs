//! Generates the golden vector corpus and prints it as an assembly-data
//! listing, ready to be assembled into the hardware test harness.

use std::io::{self, BufWriter, Write};

use lofloat::{generate, write_listing};

fn main() -> io::Result<()> {
    let corpus = generate();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_listing(&mut out, &corpus)?;
    out.flush()
}
