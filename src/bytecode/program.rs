/*!
  The textual form of a program is a comma separated list of signed decimal integers, which
  is loaded verbatim into memory starting at address zero. Whitespace around the numbers
  (including a trailing newline) is tolerated.
*/

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use nom::{
  character::complete::{
    char as one_char,
    digit1,
    multispace0,
    one_of
  },
  combinator::{all_consuming, map_res, opt, recognize},
  multi::separated_nonempty_list,
  sequence::{delimited, pair},
  Err as NomErr,
  IResult
};

use super::Word;
use crate::error::{IntcodeError, Result};

/// How much of the offending text to quote in a parse error.
const CONTEXT_LENGTH: usize = 16;

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Program {
  words: Vec<Word>,
}

impl Program {
  pub fn new(words: Vec<Word>) -> Program {
    Program { words }
  }

  pub fn words(&self) -> &[Word] {
    &self.words
  }

  /// Reads and parses a program file.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Program> {
    fs::read_to_string(path)?.parse()
  }
}

fn word(input: &str) -> IResult<&str, Word> {
  map_res(
    recognize(pair(opt(one_of("+-")), digit1)),
    |text: &str| text.parse::<Word>()
  )(input)
}

fn word_list(input: &str) -> IResult<&str, Vec<Word>> {
  all_consuming(
    delimited(
      multispace0,
      separated_nonempty_list(
        delimited(multispace0, one_char(','), multispace0),
        word
      ),
      multispace0
    )
  )(input)
}

impl FromStr for Program {
  type Err = IntcodeError;

  fn from_str(text: &str) -> Result<Self> {
    let rest = match word_list(text) {
      Ok((_rest, words)) => return Ok(Program::new(words)),
      | Err(NomErr::Error((rest, _kind)))
      | Err(NomErr::Failure((rest, _kind))) => rest,
      Err(NomErr::Incomplete(_)) => "",
    };

    let position = text.len() - rest.len();
    let reason = match rest.is_empty() {
      true  => "expected an integer at end of input".to_string(),
      false => format!(
        "expected a comma separated list of integers near `{}`",
        rest.chars().take(CONTEXT_LENGTH).collect::<String>()
      ),
    };

    Err(IntcodeError::MalformedProgram { position, reason })
  }
}

impl Display for Program {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{}",
      self.words
          .iter()
          .map(Word::to_string)
          .collect::<Vec<String>>()
          .join(",")
    )
  }
}
