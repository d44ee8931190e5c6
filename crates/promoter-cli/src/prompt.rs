//! The yes/no confirmation asked before anything is written.

use std::io::{self, BufRead, Write};

const QUESTION: &str = "Do you want to proceed? [y/n] ";

/// Interpret a yes/no answer. `None` for anything unrecognised.
pub fn parse_answer(answer: &str) -> Option<bool> {
  match answer.trim().to_ascii_lowercase().as_str() {
    "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
    "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
    _ => None,
  }
}

/// Ask until a recognisable answer is given. End of input counts as no.
pub fn confirm(
  mut input: impl BufRead,
  mut output: impl Write,
) -> io::Result<bool> {
  loop {
    write!(output, "{QUESTION}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
      writeln!(output)?;
      return Ok(false);
    }
    match parse_answer(&line) {
      Some(answer) => return Ok(answer),
      None => writeln!(output, "Please answer yes or no.")?,
    }
  }
}
