//! Error types for loading programs, running machines, and driving pipelines.

use std::io;

use thiserror::Error;

use crate::address::Address;
use crate::bytecode::Word;

/// Everything that can go wrong inside a single machine or while loading its program.
#[derive(Debug, Error)]
pub enum IntcodeError {
  #[error("unknown opcode {opcode}")]
  UnknownOpcode { opcode: Word },

  #[error("unknown addressing mode {mode}")]
  UnknownAddressingMode { mode: Word },

  #[error("invalid address {0}")]
  InvalidAddress(Word),

  /// An immediate-mode parameter was used as the destination of a write.
  #[error("immediate-mode parameter used as a write target")]
  InvalidWriteTarget,

  #[error("arithmetic overflow")]
  ArithmeticOverflow,

  #[error("malformed program at byte {position}: {reason}")]
  MalformedProgram { position: usize, reason: String },

  #[error("could not read an integer from `{0}`")]
  InvalidInput(String),

  #[error("i/o error: {0}")]
  Io(#[from] io::Error),
}

/**
  A fatal error raised while executing an instruction, paired with the address of that
  instruction. The machine does not advance past the faulting instruction.
*/
#[derive(Debug, Error)]
#[error("{error} (instruction pointer {instruction_pointer})")]
pub struct Fault {
  pub instruction_pointer: Address,
  #[source]
  pub error: IntcodeError,
}

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("machine {machine} faulted: {fault}")]
  Fault {
    machine: usize,
    #[source]
    fault: Fault,
  },

  #[error("machine {machine} produced no output to relay")]
  NoOutput { machine: usize },

  #[error("pipeline stalled waiting on machine {machine}")]
  Stalled { machine: usize },

  #[error("no phase settings given")]
  NoPhases,
}

pub type Result<T> = std::result::Result<T, IntcodeError>;
