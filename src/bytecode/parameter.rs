use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display as StrumDisplay;

use super::Word;
use crate::address::Address;
use crate::error::{IntcodeError, Result};
use crate::memory::Memory;

/// How a parameter's raw word is interpreted. The discriminant is the mode digit.
#[derive(
  StrumDisplay, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,             Eq, PartialEq, Debug, Hash
)]
#[repr(u8)]
pub enum AddressingMode {
  /// The raw word is an address.
  Position  = 0,
  /// The raw word is the value itself. Never a valid write target.
  Immediate = 1,
  /// The raw word is an offset from the relative base.
  Relative  = 2,
}

impl Default for AddressingMode {
  fn default() -> Self {
    AddressingMode::Position
  }
}

impl AddressingMode {
  /// Converts one decimal digit of an opcode word.
  pub fn from_digit(digit: Word) -> Result<AddressingMode> {
    u8::try_from(digit)
      .ok()
      .and_then(|d| AddressingMode::try_from(d).ok())
      .ok_or(IntcodeError::UnknownAddressingMode { mode: digit })
  }
}

/**
  A decoded operand. Resolving it needs the memory it reads from and the relative base of
  the machine that owns that memory; handlers only ever call `value` and `write_address`,
  so addressing modes are invisible to them.
*/
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Parameter {
  pub raw  : Word,
  pub mode : AddressingMode,
}

impl Parameter {
  pub fn new(raw: Word, mode: AddressingMode) -> Parameter {
    Parameter { raw, mode }
  }

  /// The address this parameter refers to, or `None` for immediates.
  fn effective_address(&self, relative_base: Word) -> Result<Option<Address>> {
    match self.mode {
      AddressingMode::Position  => Address::try_from(self.raw).map(Some),
      AddressingMode::Relative  => Address::offset(relative_base, self.raw).map(Some),
      AddressingMode::Immediate => Ok(None),
    }
  }

  pub fn value(&self, memory: &Memory, relative_base: Word) -> Result<Word> {
    match self.effective_address(relative_base)? {
      Some(address) => Ok(memory.get(address)),
      None          => Ok(self.raw),
    }
  }

  pub fn write_address(&self, relative_base: Word) -> Result<Address> {
    self
      .effective_address(relative_base)?
      .ok_or(IntcodeError::InvalidWriteTarget)
  }
}

impl Display for Parameter {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.mode {
      AddressingMode::Position  => write!(f, "[{}]", self.raw),
      AddressingMode::Immediate => write!(f, "#{}", self.raw),
      AddressingMode::Relative if self.raw < 0 => write!(f, "[rb{}]", self.raw),
      AddressingMode::Relative  => write!(f, "[rb+{}]", self.raw),
    }
  }
}
