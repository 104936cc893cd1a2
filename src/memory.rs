/*!
  Sparse, auto-extending memory. Only cells that have been loaded or written are stored;
  reading any other non-negative address yields zero. Cells are never removed.
*/

use std::collections::BTreeMap;
use std::convert::TryFrom;

use crate::address::Address;
use crate::bytecode::Word;
use crate::error::Result;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Memory {
  cells: BTreeMap<Address, Word>,
}

impl Memory {
  pub fn new() -> Memory {
    Memory::default()
  }

  /// Loads `words` at addresses `0..words.len()`.
  pub fn from_words(words: &[Word]) -> Memory {
    Memory {
      cells: words
        .iter()
        .enumerate()
        .map(|(i, word)| (Address(i), *word))
        .collect(),
    }
  }

  /// Reads the cell at a signed address. Fails with `InvalidAddress` if `address` is negative.
  pub fn read(&self, address: Word) -> Result<Word> {
    Ok(self.get(Address::try_from(address)?))
  }

  /// Writes the cell at a signed address. Fails with `InvalidAddress` if `address` is negative.
  pub fn write(&mut self, address: Word, value: Word) -> Result<()> {
    self.set(Address::try_from(address)?, value);
    Ok(())
  }

  pub fn get(&self, address: Address) -> Word {
    self.cells.get(&address).copied().unwrap_or(0)
  }

  pub fn set(&mut self, address: Address, value: Word) {
    self.cells.insert(address, value);
  }

  /// One past the highest address ever loaded or written.
  pub fn extent(&self) -> usize {
    self.cells.keys().next_back().map_or(0, |address| address.idx() + 1)
  }

  /// The number of cells actually allocated.
  pub fn allocated(&self) -> usize {
    self.cells.len()
  }

  /// Allocated cells in address order.
  pub fn iter(&self) -> impl Iterator<Item = (Address, Word)> + '_ {
    self.cells.iter().map(|(address, word)| (*address, *word))
  }

  /// The contiguous words `0..extent()`, with unset cells filled in as zero.
  pub fn to_words(&self) -> Vec<Word> {
    (0..self.extent()).map(|i| self.get(Address(i))).collect()
  }
}
