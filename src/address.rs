//! A validated memory address with some convenience functions. Machine words are signed, but
//! an address never is, so every word used as an address passes through `Address::try_from`.

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::ops::Add;

use crate::bytecode::Word;
use crate::error::IntcodeError;

// `AddressNumberType` is `usize`, as it is naturally an index into a memory store.
pub type AddressNumberType = usize;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default)]
pub struct Address(pub AddressNumberType);

impl Address {
  /// Converts the address to an index into memory.
  pub fn idx(&self) -> AddressNumberType {
    self.0
  }

  /**
    Resolves `base + offset` the way relative-mode parameters do. Either operand may be
    negative as long as the sum is not.
  */
  pub fn offset(base: Word, offset: Word) -> Result<Address, IntcodeError> {
    let effective = base.checked_add(offset).ok_or(IntcodeError::ArithmeticOverflow)?;
    Address::try_from(effective)
  }
}

impl TryFrom<Word> for Address {
  type Error = IntcodeError;

  fn try_from(word: Word) -> Result<Self, Self::Error> {
    match usize::try_from(word) {
      Ok(idx) => Ok(Address(idx)),
      Err(_)  => Err(IntcodeError::InvalidAddress(word))
    }
  }
}

impl Display for Address {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "MEM[{}]", self.0)
  }
}

// Increment an address
impl Add<AddressNumberType> for Address {
  type Output = Address;
  fn add(self, rhs: AddressNumberType) -> Address {
    Address(self.0 + rhs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn negative_words_are_not_addresses() {
    match Address::try_from(-1 as Word) {
      Err(IntcodeError::InvalidAddress(-1)) => {}
      other => panic!("expected InvalidAddress, got {:?}", other),
    }
    assert_eq!(Address::try_from(17 as Word).unwrap(), Address(17));
  }

  #[test]
  fn relative_offsets() {
    assert_eq!(Address::offset(2000, -7).unwrap(), Address(1993));
    assert_eq!(Address::offset(0, 5).unwrap() + 3, Address(8));
    assert!(Address::offset(3, -4).is_err());
    match Address::offset(Word::MAX, 1) {
      Err(IntcodeError::ArithmeticOverflow) => {}
      other => panic!("expected ArithmeticOverflow, got {:?}", other),
    }
  }

  #[test]
  fn display() {
    assert_eq!(format!("{}", Address(42)), "MEM[42]");
  }
}
