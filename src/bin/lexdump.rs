//! Debugging tool. Reads stdin, lexes it as markup, and dumps the token tree
//! to stdout.

use std::env::args;
use std::io::stdin;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    let verbosity: usize = match args().nth(1) {
        Some(arg) => arg.parse().context("Verbosity must be a number")?,
        None => 3,
    };

    stderrlog::new()
    .verbosity(verbosity)
    .init()?;

    let mut input = String::new();

    for line in stdin().lines() {
        let line = line?;
        input.push_str(&line);
        input.push('\n');
    }

    let root = hookmark::lexer::lex(&input);

    println!("{root}");

    Ok(())
}
