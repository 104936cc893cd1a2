/*!
  Chains of machines that relay values to one another. Every machine runs the same program
  and is seeded with its own phase setting before the first relay. Scheduling is cooperative:
  a machine only advances while the pipeline is inside its `run` call.
*/

use itertools::Itertools;
use log::debug;
use strum_macros::{Display as StrumDisplay, EnumString};

use crate::bytecode::{Program, Word};
use crate::error::PipelineError;
use crate::machine::{Machine, MachineOptions, Status};

#[derive(StrumDisplay, EnumString, Clone, Copy, Eq, PartialEq, Debug, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum Topology {
  /// Every machine runs to completion once, in order.
  Linear,
  /// The last machine feeds the first, and machines are resumed round robin until the last
  /// one halts.
  Feedback,
}

pub struct Pipeline {
  machines : Vec<Machine>,
  topology : Topology,
}

impl Pipeline {
  /// One fresh machine per phase setting, in order.
  pub fn new(program: &Program, phases: &[Word], topology: Topology) -> Pipeline {
    let machines =
      phases
        .iter()
        .enumerate()
        .map(|(i, phase)| {
          let mut machine = Machine::new(program).with_name(format!("machine-{}", i));
          machine.input(*phase);
          machine
        })
        .collect();

    Pipeline { machines, topology }
  }

  /// Applies `options` to every machine. Interactive mode is never enabled inside a pipeline.
  pub fn with_options(mut self, options: MachineOptions) -> Pipeline {
    let options = MachineOptions { interactive: false, ..options };
    self.machines =
      self.machines
          .into_iter()
          .map(|machine| machine.with_options(options))
          .collect();
    self
  }

  pub fn machines(&self) -> &[Machine] {
    &self.machines
  }

  pub fn topology(&self) -> Topology {
    self.topology
  }

  /// Relays `signal` through the chain and returns the last machine's final output.
  pub fn run(&mut self, signal: Word) -> Result<Word, PipelineError> {
    if self.machines.is_empty() {
      return Err(PipelineError::NoPhases);
    }

    match self.topology {
      Topology::Linear   => self.run_linear(signal),
      Topology::Feedback => self.run_feedback(signal),
    }
  }

  fn run_linear(&mut self, signal: Word) -> Result<Word, PipelineError> {
    let mut relay = signal;

    for (i, machine) in self.machines.iter_mut().enumerate() {
      machine.input(relay);
      let status =
        machine.run()
               .map_err(|fault| PipelineError::Fault { machine: i, fault })?;

      if status != Status::Halted {
        return Err(PipelineError::Stalled { machine: i });
      }
      relay = machine.output().ok_or(PipelineError::NoOutput { machine: i })?;
    }

    Ok(relay)
  }

  fn run_feedback(&mut self, signal: Word) -> Result<Word, PipelineError> {
    let count   = self.machines.len();
    let last    = count - 1;
    let mut relay   = signal;
    let mut current = 0;
    // Consecutive resumptions that produced nothing to relay.
    let mut idle    = 0;

    loop {
      let machine = &mut self.machines[current];
      let emitted = machine.outputs().len();

      if !machine.is_halted() {
        machine.input(relay);
        machine.run()
               .map_err(|fault| PipelineError::Fault { machine: current, fault })?;
      }

      match machine.outputs()[emitted..].last() {
        Some(value) => {
          relay = *value;
          idle  = 0;
        }
        None => {
          idle += 1;
        }
      }

      if current == last && machine.is_halted() {
        return machine.output().ok_or(PipelineError::NoOutput { machine: last });
      }
      if idle >= count {
        return Err(PipelineError::Stalled { machine: current });
      }

      current = (current + 1) % count;
    }
  }
}

/**
  Tries every ordering of `phases` and returns the largest result together with the ordering
  that produced it. The first ordering found wins ties.
*/
pub fn max_signal(
  program  : &Program,
  phases   : &[Word],
  topology : Topology,
  signal   : Word
) -> Result<(Word, Vec<Word>), PipelineError> {
  max_signal_with_options(program, phases, topology, signal, MachineOptions::default())
}

/// Like `max_signal`, with `options` applied to the machines of every pipeline tried.
pub fn max_signal_with_options(
  program  : &Program,
  phases   : &[Word],
  topology : Topology,
  signal   : Word,
  options  : MachineOptions
) -> Result<(Word, Vec<Word>), PipelineError> {
  let mut best: Option<(Word, Vec<Word>)> = None;

  for permutation in phases.iter().copied().permutations(phases.len()) {
    let result =
      Pipeline::new(program, &permutation, topology)
        .with_options(options)
        .run(signal)?;
    debug!("{} pipeline with phases {:?} -> {}", topology, permutation, result);

    if best.as_ref().map_or(true, |(best_result, _)| result > *best_result) {
      best = Some((result, permutation));
    }
  }

  best.ok_or(PipelineError::NoPhases)
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  fn parse(text: &str) -> Program {
    text.parse().unwrap()
  }

  #[test]
  fn linear_examples() {
    let cases: [(&str, Vec<Word>, Word); 3] = [
      ("3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0", vec![4, 3, 2, 1, 0], 43210),
      (
        "3,23,3,24,1002,24,10,24,1002,23,-1,23,101,5,23,23,1,24,23,23,4,23,99,0,0",
        vec![0, 1, 2, 3, 4],
        54321
      ),
      (
        "3,31,3,32,1002,32,10,32,1001,31,-2,31,1007,31,0,33,\
         1002,33,7,33,1,33,31,31,1,32,31,31,4,31,99,0,0,0",
        vec![1, 0, 4, 3, 2],
        65210
      ),
    ];

    for (text, phases, expected) in cases.iter() {
      let program = parse(text);

      let result = Pipeline::new(&program, phases, Topology::Linear).run(0).unwrap();
      assert_eq!(result, *expected);

      let (best, best_phases) = max_signal(&program, &[0, 1, 2, 3, 4], Topology::Linear, 0).unwrap();
      assert_eq!(best, *expected);
      assert_eq!(&best_phases, phases);
    }
  }

  #[test]
  fn linear_search_matches_brute_force() {
    // output = relay * 2 + phase
    let program = parse("3,15,3,16,1002,16,2,16,1,15,16,16,4,16,99,0,0");
    let phases: Vec<Word> = (0..5).collect();

    let expected =
      phases
        .iter()
        .copied()
        .permutations(phases.len())
        .map(|p| p.iter().fold(0, |signal, phase| signal * 2 + phase))
        .max()
        .unwrap();

    let (best, best_phases) = max_signal(&program, &phases, Topology::Linear, 0).unwrap();
    assert_eq!(best, expected);
    assert_eq!(best, 98);
    assert_eq!(best_phases, vec![4, 3, 2, 1, 0]);
  }

  #[test]
  fn feedback_examples() {
    let cases: [(&str, Vec<Word>, Word); 2] = [
      (
        "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,\
         27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5",
        vec![9, 8, 7, 6, 5],
        139629729
      ),
      (
        "3,52,1001,52,-5,52,3,53,1,52,56,54,1007,54,5,55,1005,55,26,1001,54,\
         -5,54,1105,1,12,1,53,54,53,1008,54,0,55,1001,55,1,55,2,53,55,53,4,\
         53,1001,56,-1,56,1005,56,6,99,0,0,0,0,10",
        vec![9, 7, 8, 5, 6],
        18216
      ),
    ];

    for (text, phases, expected) in cases.iter() {
      let program = parse(text);

      let mut pipeline = Pipeline::new(&program, phases, Topology::Feedback);
      let result = pipeline.run(0).unwrap();
      assert_eq!(result, *expected);

      // The result is exactly what the last machine emitted when it halted.
      let last = pipeline.machines().last().unwrap();
      assert!(last.is_halted());
      assert_eq!(last.output(), Some(result));

      let (best, best_phases) = max_signal(&program, &[5, 6, 7, 8, 9], Topology::Feedback, 0).unwrap();
      assert_eq!(best, *expected);
      assert_eq!(&best_phases, phases);
    }
  }

  #[test]
  fn machines_are_named_and_options_apply() {
    let program = parse("3,0,4,0,99");
    let options = MachineOptions { verbose: true, interactive: true };
    let pipeline = Pipeline::new(&program, &[1, 2], Topology::Linear).with_options(options);

    assert_eq!(pipeline.machines()[1].name(), "machine-1");
    assert!(pipeline.machines()[0].options().verbose);
    assert!(!pipeline.machines()[0].options().interactive);
    assert_eq!(pipeline.topology(), Topology::Linear);
  }

  #[test]
  fn linear_failures() {
    let mut pipeline = Pipeline::new(&parse("3,0,3,0,99"), &[0, 1], Topology::Linear);
    assert!(matches!(pipeline.run(0), Err(PipelineError::NoOutput { machine: 0 })));

    let mut pipeline = Pipeline::new(&parse("3,0,3,0,3,0,4,0,99"), &[0, 1], Topology::Linear);
    assert!(matches!(pipeline.run(0), Err(PipelineError::Stalled { machine: 0 })));

    let mut pipeline = Pipeline::new(&parse("3,0,3,0,77"), &[0, 1], Topology::Linear);
    match pipeline.run(0) {
      Err(PipelineError::Fault { machine, fault }) => {
        assert_eq!(machine, 0);
        assert_eq!(fault.instruction_pointer.idx(), 4);
      }
      other => panic!("expected a fault, got {:?}", other.map(|_| ())),
    }

    let mut pipeline = Pipeline::new(&parse("99"), &[], Topology::Linear);
    assert!(matches!(pipeline.run(0), Err(PipelineError::NoPhases)));
    assert!(matches!(
      max_signal(&parse("99"), &[], Topology::Linear, 0),
      Err(PipelineError::NoPhases)
    ));
  }

  #[test]
  fn search_options_reach_every_machine() {
    let program = parse("3,15,3,16,1002,16,2,16,1,15,16,16,4,16,99,0,0");
    let options = MachineOptions { verbose: true, interactive: true };
    let (best, best_phases) =
      max_signal_with_options(&program, &[0, 1, 2], Topology::Linear, 0, options).unwrap();
    assert_eq!((best, best_phases), max_signal(&program, &[0, 1, 2], Topology::Linear, 0).unwrap());

    // Interactive mode stays off, so a starved stage stalls instead of prompting.
    let starved = parse("3,0,3,0,3,0,4,0,99");
    assert!(matches!(
      max_signal_with_options(&starved, &[0, 1], Topology::Linear, 0, options),
      Err(PipelineError::Stalled { machine: 0 })
    ));
  }

  #[test]
  fn feedback_deadlock_is_reported() {
    let mut pipeline = Pipeline::new(&parse("3,0,3,0,3,0,99"), &[5, 6, 7], Topology::Feedback);
    assert!(matches!(pipeline.run(0), Err(PipelineError::Stalled { .. })));
  }

  #[test]
  fn topology_names() {
    assert_eq!(Topology::from_str("feedback").unwrap(), Topology::Feedback);
    assert_eq!(Topology::Linear.to_string(), "linear");
  }
}
