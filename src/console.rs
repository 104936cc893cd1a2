/*!
  The interactive collaborator of a machine. When a machine is interactive and its input
  queue is empty, the input operation asks the console for a value instead of blocking, and
  every output is echoed to it. Pipelines never install a console.
*/

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use crate::bytecode::Word;
use crate::error::{IntcodeError, Result};

pub const PROMPT: &str = "Please enter a value: ";

pub trait Console {
  /// Reads one value. `Ok(None)` means the source is exhausted and the machine should block.
  fn read_value(&mut self) -> Result<Option<Word>>;

  fn show_output(&mut self, value: Word) -> Result<()>;
}

/// A line oriented console: one integer per input line, one `Output: n` line per output.
pub struct LineConsole<R, W> {
  reader : R,
  writer : W,
}

impl<R: BufRead, W: Write> LineConsole<R, W> {
  pub fn new(reader: R, writer: W) -> Self {
    LineConsole { reader, writer }
  }

  pub fn into_inner(self) -> (R, W) {
    (self.reader, self.writer)
  }
}

impl LineConsole<BufReader<Stdin>, Stdout> {
  /// A console bound to the process's standard input and output. Standard input is not held
  /// locked between reads.
  pub fn stdio() -> Self {
    LineConsole::new(BufReader::new(io::stdin()), io::stdout())
  }
}

impl<R: BufRead, W: Write> Console for LineConsole<R, W> {
  fn read_value(&mut self) -> Result<Option<Word>> {
    write!(self.writer, "{}", PROMPT)?;
    self.writer.flush()?;

    let mut line = String::new();
    if self.reader.read_line(&mut line)? == 0 {
      return Ok(None);
    }

    let trimmed = line.trim();
    trimmed
      .parse::<Word>()
      .map(Some)
      .map_err(|_| IntcodeError::InvalidInput(trimmed.to_string()))
  }

  fn show_output(&mut self, value: Word) -> Result<()> {
    writeln!(self.writer, "Output: {}", value)?;
    Ok(())
  }
}
