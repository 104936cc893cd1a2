/*!
  A register-less virtual machine that executes programs of integers against a sparse memory,
  suspends when it needs input that is not there yet, and can be chained with other machines
  into linear or feedback pipelines.

  ```
  use intcode::{Machine, Program, Status};

  let program: Program = "3,0,4,0,99".parse().unwrap();
  let mut machine = Machine::new(&program);
  assert_eq!(machine.run().unwrap(), Status::BlockedOnInput);

  machine.input(7);
  assert_eq!(machine.run().unwrap(), Status::Halted);
  assert_eq!(machine.outputs(), &[7]);
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod bytecode;
pub mod console;
pub mod error;
pub mod machine;
pub mod memory;
pub mod pipeline;

pub use address::Address;
pub use bytecode::{AddressingMode, Instruction, Opcode, Parameter, Program, Word};
pub use console::{Console, LineConsole};
pub use error::{Fault, IntcodeError, PipelineError};
pub use machine::{Machine, MachineOptions, Status};
pub use memory::Memory;
pub use pipeline::{max_signal, max_signal_with_options, Pipeline, Topology};
