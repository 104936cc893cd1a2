//! The fetch-decode-execute loop of a single virtual machine, including the suspend/resume
//! contract for input that is not available yet.

use std::collections::VecDeque;
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};

use log::{debug, info};
use prettytable::{format as TableFormat, Table};
use strum_macros::Display as StrumDisplay;

use crate::address::Address;
use crate::bytecode::{Instruction, Opcode, Parameter, Program, Word};
use crate::console::{Console, LineConsole};
use crate::error::{Fault, IntcodeError, Result};
use crate::memory::Memory;

/**
  Where a machine is in its lifecycle. `Halted` is terminal. `BlockedOnInput` means an input
  instruction found the queue empty; it has not been executed and the instruction pointer
  still points at it.
*/
#[derive(StrumDisplay, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Status {
  Ready,
  Running,
  BlockedOnInput,
  Halted,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MachineOptions {
  /// Log every decoded instruction and every state change at `debug` level.
  pub verbose     : bool,
  /// Ask the console for input instead of blocking, and echo outputs to it.
  pub interactive : bool,
}

/// What the loop does after an operation has run.
enum Control {
  Continue,
  Jump(Address),
  Block,
  Halt,
}

pub struct Machine {
  name    : String,
  options : MachineOptions,
  console : Option<Box<dyn Console>>,

  // Memory Store
  memory : Memory,

  // Registers //
  instruction_pointer : Address,
  relative_base       : Word,
  status              : Status,
  /// The input instruction the machine is blocked on, already decoded.
  pending             : Option<Instruction>,
  steps               : u64,

  // I/O Queues
  inputs  : VecDeque<Word>,
  outputs : Vec<Word>,
}

impl Machine {

  // region Construction and configuration

  pub fn new(program: &Program) -> Machine {
    Machine {
      name                : String::from("machine"),
      options             : MachineOptions::default(),
      console             : None,
      memory              : Memory::from_words(program.words()),
      instruction_pointer : Address(0),
      relative_base       : 0,
      status              : Status::Ready,
      pending             : None,
      steps               : 0,
      inputs              : VecDeque::new(),
      outputs             : Vec::new(),
    }
  }

  pub fn with_options(mut self, options: MachineOptions) -> Machine {
    self.options = options;
    self
  }

  /// Names the machine in trace output.
  pub fn with_name<S: Into<String>>(mut self, name: S) -> Machine {
    self.name = name.into();
    self
  }

  /// Installs the console used in interactive mode. Without one, standard I/O is used.
  pub fn with_console<C: Console + 'static>(mut self, console: C) -> Machine {
    self.console = Some(Box::new(console));
    self
  }

  // endregion

  // region Accessors

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn options(&self) -> MachineOptions {
    self.options
  }

  pub fn status(&self) -> Status {
    self.status
  }

  pub fn is_halted(&self) -> bool {
    self.status == Status::Halted
  }

  pub fn instruction_pointer(&self) -> Address {
    self.instruction_pointer
  }

  pub fn relative_base(&self) -> Word {
    self.relative_base
  }

  /// Number of instructions executed to completion.
  pub fn steps(&self) -> u64 {
    self.steps
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  pub fn read(&self, address: Word) -> Result<Word> {
    self.memory.read(address)
  }

  /// Writes a memory cell from outside the machine, e.g. to patch a program before running it.
  pub fn poke(&mut self, address: Word, value: Word) -> Result<()> {
    self.memory.write(address, value)
  }

  /// Queues one input value.
  pub fn input(&mut self, value: Word) -> &mut Machine {
    self.inputs.push_back(value);
    self
  }

  pub fn extend_input<I: IntoIterator<Item = Word>>(&mut self, values: I) -> &mut Machine {
    self.inputs.extend(values);
    self
  }

  /// Inputs queued but not yet consumed.
  pub fn pending_inputs(&self) -> usize {
    self.inputs.len()
  }

  /// The most recent output, if any.
  pub fn output(&self) -> Option<Word> {
    self.outputs.last().copied()
  }

  pub fn outputs(&self) -> &[Word] {
    &self.outputs
  }

  pub fn take_outputs(&mut self) -> Vec<Word> {
    std::mem::take(&mut self.outputs)
  }

  // endregion

  // region Execution loop

  /**
    Runs until the machine halts or blocks on input. A blocked machine retries its pending
    input instruction first; if there is still no input it returns immediately. Running a
    halted machine does nothing.
  */
  pub fn run(&mut self) -> std::result::Result<Status, Fault> {
    loop {
      match self.step()? {
        Status::Running => continue,
        status          => return Ok(status),
      }
    }
  }

  /**
    Executes exactly one instruction, or retries the pending input instruction if the
    machine is blocked. On a fault the machine returns to `Ready` with the instruction
    pointer left on the faulting instruction.
  */
  pub fn step(&mut self) -> std::result::Result<Status, Fault> {
    if self.status == Status::Halted {
      return Ok(Status::Halted);
    }

    let instruction = match self.pending.take() {
      Some(instruction) => instruction,
      None              => {
        Instruction::decode(&self.memory, self.instruction_pointer)
          .map_err(|error| self.fault(self.instruction_pointer, error))?
      }
    };

    if self.options.verbose {
      self.trace(format_args!(
        "{}: {:?} -> {}", instruction.address, instruction.words(), instruction
      ));
    }

    self.status = Status::Running;
    let control =
      self.dispatch(&instruction)
          .map_err(|error| self.fault(instruction.address, error))?;

    match control {

      Control::Continue => {
        self.instruction_pointer = instruction.next_address();
      }

      Control::Jump(target) => {
        self.instruction_pointer = target;
      }

      Control::Block => {
        self.trace(format_args!("blocked on input at {}", instruction.address));
        self.instruction_pointer = instruction.address;
        self.pending = Some(instruction);
        self.status  = Status::BlockedOnInput;
      }

      Control::Halt => {
        self.instruction_pointer = instruction.next_address();
        self.status = Status::Halted;
      }

    }

    if self.pending.is_none() {
      self.steps += 1;
    }

    #[cfg(feature = "trace_computation")] println!("{}", self);

    Ok(self.status)
  }

  fn fault(&mut self, instruction_pointer: Address, error: IntcodeError) -> Fault {
    self.status = Status::Ready;
    self.trace(format_args!("fault at {}: {}", instruction_pointer, error));
    Fault { instruction_pointer, error }
  }

  fn dispatch(&mut self, instruction: &Instruction) -> Result<Control> {
    let p = |i: usize| instruction.parameter(i);

    match instruction.opcode {
      Opcode::Add                => self.add(p(0), p(1), p(2)),
      Opcode::Multiply           => self.multiply(p(0), p(1), p(2)),
      Opcode::Input              => self.input_value(p(0)),
      Opcode::Output             => self.output_value(p(0)),
      Opcode::JumpIfTrue         => self.jump_if(true, p(0), p(1)),
      Opcode::JumpIfFalse        => self.jump_if(false, p(0), p(1)),
      Opcode::LessThan           => self.less_than(p(0), p(1), p(2)),
      Opcode::Equals             => self.equals(p(0), p(1), p(2)),
      Opcode::AdjustRelativeBase => self.adjust_relative_base(p(0)),
      Opcode::Halt               => {
        self.trace(format_args!("halt"));
        Ok(Control::Halt)
      }
    }
  }

  // endregion

  // region VM instruction methods

  fn value(&self, parameter: Parameter) -> Result<Word> {
    parameter.value(&self.memory, self.relative_base)
  }

  fn store(&mut self, operation: &str, destination: Parameter, value: Word) -> Result<()> {
    let address = destination.write_address(self.relative_base)?;
    self.memory.set(address, value);
    self.trace(format_args!("{} wrote {} to {}", operation, value, address));
    Ok(())
  }

  fn add(&mut self, a: Parameter, b: Parameter, destination: Parameter) -> Result<Control> {
    let sum = self.value(a)?
                  .checked_add(self.value(b)?)
                  .ok_or(IntcodeError::ArithmeticOverflow)?;
    self.store("add", destination, sum)?;
    Ok(Control::Continue)
  }

  fn multiply(&mut self, a: Parameter, b: Parameter, destination: Parameter) -> Result<Control> {
    let product = self.value(a)?
                      .checked_mul(self.value(b)?)
                      .ok_or(IntcodeError::ArithmeticOverflow)?;
    self.store("multiply", destination, product)?;
    Ok(Control::Continue)
  }

  /**
    Consumes one queued input. With an empty queue, an interactive machine asks its console;
    otherwise the instruction blocks without touching memory. The destination is resolved
    first so that a bad destination faults instead of blocking.
  */
  fn input_value(&mut self, destination: Parameter) -> Result<Control> {
    destination.write_address(self.relative_base)?;

    let value = match self.inputs.pop_front() {
      Some(value) => value,
      None        => match self.read_console()? {
        Some(value) => value,
        None        => return Ok(Control::Block),
      }
    };

    self.store("input", destination, value)?;
    Ok(Control::Continue)
  }

  fn output_value(&mut self, a: Parameter) -> Result<Control> {
    let value = self.value(a)?;
    self.outputs.push(value);
    if self.options.verbose {
      info!("[{}] Output: {}", self.name, value);
    }
    if self.options.interactive {
      self.console().show_output(value)?;
    }
    Ok(Control::Continue)
  }

  fn jump_if(&mut self, condition: bool, a: Parameter, target: Parameter) -> Result<Control> {
    let operation = match condition {
      true  => "jump_if_true",
      false => "jump_if_false",
    };

    match (self.value(a)? != 0) == condition {

      true  => {
        let target_word = self.value(target)?;
        let target      = Address::try_from(target_word)?;
        self.trace(format_args!("{} changing instruction pointer to {}", operation, target));
        Ok(Control::Jump(target))
      }

      false => {
        self.trace(format_args!("{} noop", operation));
        Ok(Control::Continue)
      }

    }
  }

  fn less_than(&mut self, a: Parameter, b: Parameter, destination: Parameter) -> Result<Control> {
    let result = (self.value(a)? < self.value(b)?) as Word;
    self.store("less_than", destination, result)?;
    Ok(Control::Continue)
  }

  fn equals(&mut self, a: Parameter, b: Parameter, destination: Parameter) -> Result<Control> {
    let result = (self.value(a)? == self.value(b)?) as Word;
    self.store("equals", destination, result)?;
    Ok(Control::Continue)
  }

  fn adjust_relative_base(&mut self, increment: Parameter) -> Result<Control> {
    let increment = self.value(increment)?;
    self.relative_base = self.relative_base
                             .checked_add(increment)
                             .ok_or(IntcodeError::ArithmeticOverflow)?;
    self.trace(format_args!(
      "adjust_relative_base by {}, new relative base {}", increment, self.relative_base
    ));
    Ok(Control::Continue)
  }

  // endregion

  // region Console and tracing

  fn console(&mut self) -> &mut dyn Console {
    &mut **self.console
               .get_or_insert_with(|| Box::new(LineConsole::stdio()) as Box<dyn Console>)
  }

  fn read_console(&mut self) -> Result<Option<Word>> {
    match self.options.interactive {
      true  => self.console().read_value(),
      false => Ok(None),
    }
  }

  fn trace(&self, message: fmt::Arguments<'_>) {
    if self.options.verbose {
      debug!("[{}] {}", self.name, message);
    }
  }

  // endregion

  // region Display methods

  fn make_memory_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (address, word) in self.memory.iter() {
      match address == self.instruction_pointer {

        true  => {
          table.add_row(row![r->format!("* --> {} =", address), word]);
        }

        false => {
          table.add_row(row![r->format!("{} =", address), word]);
        }

      } // end match on highlight
    } // end for
    table
  }

  fn make_register_table(&self) -> Table {
    let pending = match &self.pending {
      Some(instruction) => instruction.to_string(),
      None              => String::from("-"),
    };

    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);
    table.add_row(row![r->"IP =",      self.instruction_pointer]);
    table.add_row(row![r->"RB =",      self.relative_base]);
    table.add_row(row![r->"Status =",  self.status]);
    table.add_row(row![r->"Steps =",   self.steps]);
    table.add_row(row![r->"Pending =", pending]);
    table.add_row(row![r->"Inputs =",  join_words(self.inputs.iter())]);
    table.add_row(row![r->"Outputs =", join_words(self.outputs.iter())]);
    table
  }

  // endregion

}

fn join_words<'a, I: Iterator<Item = &'a Word>>(words: I) -> String {
  words.map(Word::to_string).collect::<Vec<String>>().join(", ")
}

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Machine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let memory_table   = self.make_memory_table();
    let register_table = self.make_register_table();

    let mut combined_table = table!([memory_table, register_table]);

    combined_table.set_titles(row![ub->"Memory", ub->"Registers"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(f, "{}: {}\n{}", self.name, self.status, combined_table)
  }
}
