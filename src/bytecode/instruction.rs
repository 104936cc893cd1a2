use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumString};

use super::{AddressingMode, Parameter, Word};
use crate::address::Address;
use crate::error::{IntcodeError, Result};
use crate::memory::Memory;

/// The most parameters any operation takes.
pub const MAX_ARITY: usize = 3;

/**
  Opcodes of the virtual machine. The discriminant is the opcode number as it appears in the
  low two decimal digits of an instruction word.
  Order-dependencies:
      ```
      Opcode::arity()
      ```
*/
#[derive(
StrumDisplay, EnumString, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,       Eq, PartialEq,    Debug,         Hash
)]
#[repr(u8)]
pub enum Opcode {
  Add                =  1, // add( a, b, dest )
  Multiply           =  2, // multiply( a, b, dest )
  Input              =  3, // input( dest )
  Output             =  4, // output( a )
  JumpIfTrue         =  5, // jump_if_true( a, target )
  JumpIfFalse        =  6, // jump_if_false( a, target )
  LessThan           =  7, // less_than( a, b, dest )
  Equals             =  8, // equals( a, b, dest )
  AdjustRelativeBase =  9, // adjust_relative_base( a )
  Halt               = 99, // halt
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  pub fn arity(&self) -> usize {
    match self {
      | Opcode::Add
      | Opcode::Multiply
      | Opcode::LessThan
      | Opcode::Equals             => 3,

      | Opcode::JumpIfTrue
      | Opcode::JumpIfFalse        => 2,

      | Opcode::Input
      | Opcode::Output
      | Opcode::AdjustRelativeBase => 1,

      Opcode::Halt                 => 0,
    }
  }

  /**
    Splits a raw instruction word into its opcode and the mode digits of its parameters. The
    mode digits are returned as the remaining number, least significant digit first.
  */
  fn split(raw: Word) -> Result<(Opcode, Word)> {
    let (code, modes) = match raw > 99 {
      true  => (raw % 100, raw / 100),
      false => (raw, 0),
    };

    let opcode =
      u8::try_from(code)
        .ok()
        .and_then(|c| Opcode::try_from(c).ok())
        .ok_or(IntcodeError::UnknownOpcode { opcode: code })?;

    Ok((opcode, modes))
  }
}

/// A decoded instruction together with the address it was decoded from.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Instruction {
  pub address    : Address,
  pub raw        : Word,
  pub opcode     : Opcode,
  pub parameters : Vec<Parameter>,
}

impl Instruction {
  /**
    Decodes the instruction stored at `address`. Reads the opcode word and then one word per
    parameter, in stream order. Memory is not modified.
  */
  pub fn decode(memory: &Memory, address: Address) -> Result<Instruction> {
    let raw = memory.get(address);
    let (opcode, mut modes) = Opcode::split(raw)?;

    let mut parameters = Vec::with_capacity(MAX_ARITY);
    for i in 0..opcode.arity() {
      let mode = AddressingMode::from_digit(modes % 10)?;
      modes /= 10;
      parameters.push(Parameter::new(memory.get(address + (i + 1)), mode));
    }

    Ok(Instruction { address, raw, opcode, parameters })
  }

  /// Number of words the instruction occupies.
  pub fn len(&self) -> usize {
    1 + self.parameters.len()
  }

  /// Where execution continues if the instruction does not jump.
  pub fn next_address(&self) -> Address {
    self.address + self.len()
  }

  /// The parameter at `index`. Decoding guarantees there are exactly `opcode.arity()` of them.
  pub fn parameter(&self, index: usize) -> Parameter {
    self.parameters[index]
  }

  /// The raw words of this instruction, for tracing.
  pub fn words(&self) -> Vec<Word> {
    let mut words = Vec::with_capacity(self.len());
    words.push(self.raw);
    words.extend(self.parameters.iter().map(|p| p.raw));
    words
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.parameters.is_empty() {

      true  => {
        write!(f, "{}", self.opcode)
      }

      false => {
        write!(
          f,
          "{}({})",
          self.opcode,
          self.parameters
              .iter()
              .map(Parameter::to_string)
              .collect::<Vec<String>>()
              .join(", ")
        )
      }

    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn plain_opcodes_default_to_position_mode() {
    let memory = Memory::from_words(&[1, 9, 10, 3, 99]);
    let instruction = Instruction::decode(&memory, Address(0)).unwrap();

    assert_eq!(instruction.opcode, Opcode::Add);
    assert_eq!(
      instruction.parameters,
      vec![
        Parameter::new(9, AddressingMode::Position),
        Parameter::new(10, AddressingMode::Position),
        Parameter::new(3, AddressingMode::Position),
      ]
    );
    assert_eq!(instruction.next_address(), Address(4));
  }

  #[test]
  fn mode_digits_are_read_right_to_left() {
    let memory = Memory::from_words(&[1002, 4, 3, 4, 33]);
    let instruction = Instruction::decode(&memory, Address(0)).unwrap();

    assert_eq!(instruction.opcode, Opcode::Multiply);
    assert_eq!(instruction.parameter(0).mode, AddressingMode::Position);
    assert_eq!(instruction.parameter(1).mode, AddressingMode::Immediate);
    assert_eq!(instruction.parameter(2).mode, AddressingMode::Position);

    let memory = Memory::from_words(&[0, 21101, 5, -3, 7]);
    let instruction = Instruction::decode(&memory, Address(1)).unwrap();
    assert_eq!(instruction.opcode, Opcode::Add);
    assert_eq!(instruction.parameter(0).mode, AddressingMode::Immediate);
    assert_eq!(instruction.parameter(1).mode, AddressingMode::Immediate);
    assert_eq!(instruction.parameter(2).mode, AddressingMode::Relative);
    assert_eq!(instruction.to_string(), "Add(#5, #-3, [rb+7])");
  }

  #[test]
  fn mode_digits_past_the_arity_are_ignored() {
    let memory = Memory::from_words(&[3104, 50]);
    let instruction = Instruction::decode(&memory, Address(0)).unwrap();
    assert_eq!(instruction.opcode, Opcode::Output);
    assert_eq!(instruction.parameter(0).mode, AddressingMode::Immediate);
    assert_eq!(instruction.len(), 2);
  }

  #[test]
  fn halt_has_no_parameters() {
    let memory = Memory::from_words(&[99]);
    let instruction = Instruction::decode(&memory, Address(0)).unwrap();
    assert_eq!(instruction.opcode, Opcode::Halt);
    assert_eq!(instruction.len(), 1);
    assert_eq!(instruction.to_string(), "Halt");
  }

  #[test]
  fn unknown_opcodes() {
    for (word, code) in &[(0, 0), (42, 42), (1050, 50), (-1, -1)] {
      let memory = Memory::from_words(&[*word]);
      match Instruction::decode(&memory, Address(0)) {
        Err(IntcodeError::UnknownOpcode { opcode }) => assert_eq!(opcode, *code),
        other => panic!("expected UnknownOpcode for {}, got {:?}", word, other),
      }
    }
  }

  #[test]
  fn unknown_modes() {
    let memory = Memory::from_words(&[301, 1, 2, 3]);
    assert!(matches!(
      Instruction::decode(&memory, Address(0)),
      Err(IntcodeError::UnknownAddressingMode { mode: 3 })
    ));
  }

  #[test]
  fn opcode_table() {
    assert_eq!(Opcode::Halt.code(), 99);
    assert_eq!(Opcode::AdjustRelativeBase.arity(), 1);
    assert_eq!(Opcode::from_str("JumpIfFalse").unwrap(), Opcode::JumpIfFalse);
    assert!(Opcode::from_str("Jump").is_err());
  }

  #[test]
  fn no_opcode_exceeds_the_maximum_arity() {
    let opcodes: Vec<Opcode> = (0..=u8::MAX).filter_map(|c| Opcode::try_from(c).ok()).collect();
    assert_eq!(opcodes.len(), 10);
    assert!(opcodes.iter().all(|opcode| opcode.arity() <= MAX_ARITY));

    let memory = Memory::from_words(&[1, 0, 0, 0]);
    let instruction = Instruction::decode(&memory, Address(0)).unwrap();
    assert_eq!(instruction.parameters.len(), MAX_ARITY);
  }
}
