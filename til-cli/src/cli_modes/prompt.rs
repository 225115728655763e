use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Asks a y/N question on stdout. Anything but `y`/`yes` is a no.
pub fn confirm(question: &str) -> Result<bool> {
    print!("{question} (y/n): ");
    io::stdout().flush().context("flushing stdout")?;
    read_answer(&mut io::stdin().lock())
}

fn read_answer(input: &mut impl BufRead) -> Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line).context("reading answer")?;
    let answer = line.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
