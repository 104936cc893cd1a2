/*!

  The VM uses a signed 64 bit word for everything: instructions, parameters, addresses and
  data all share one memory store, so programs may freely rewrite their own code.

  An instruction is an opcode word followed by as many parameter words as the opcode
  requires. The low two decimal digits of the opcode word select the operation; the
  remaining digits, read right to left, give the addressing mode of the first, second and
  third parameter. Missing digits mean position mode. For example `1002` decodes as
  `Multiply` with modes (position, immediate, position).

  Operations are a closed enum and dispatch is an exhaustive match, so there is no way to
  name an operation that has no handler. Decoding never mutates the machine; the caller
  decides where the instruction pointer goes after execution.

*/

mod instruction;
mod parameter;
mod program;

pub use instruction::{Instruction, Opcode, MAX_ARITY};
pub use parameter::{AddressingMode, Parameter};
pub use program::Program;

// If you change this you must also change the program parser.
pub type Word = i64;
