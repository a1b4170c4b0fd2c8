//! Yes/no questions on the terminal

use std::io::{self, BufRead, ErrorKind, Write};

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
pub trait Prompt: Send + Sync {
    /// Asks `question` and returns the answer
    fn confirm(&self, question: &str) -> io::Result<bool>;
}

/// Reads answers from stdin and writes questions to stderr
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        let stdin = io::stdin();
        ask_yes_no(&mut stdin.lock(), &mut io::stderr(), question)
    }
}

/// Asks until a usable answer arrives.
///
/// An empty answer means yes. Anything starting with `y` or `n` (any case)
/// is accepted, everything else repeats the question. End of input is an
/// `UnexpectedEof` error.
pub fn ask_yes_no<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<bool> {
    let mut line = String::new();
    loop {
        write!(output, "{} (Y/n): ", question)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(ErrorKind::UnexpectedEof, "no answer provided"));
        }

        let answer = line.trim().to_lowercase();
        if answer.is_empty() || answer.starts_with('y') {
            return Ok(true);
        }
        if answer.starts_with('n') {
            return Ok(false);
        }

        writeln!(output, "Unexpected option provided: {}", answer)?;
    }
}
