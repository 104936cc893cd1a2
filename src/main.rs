use std::error::Error;
use std::convert::TryFrom;
use std::io::{self, Read, Write};
use std::process;
use std::str::FromStr;

use argh::FromArgs;
use env_logger::Env;
use log::warn;

use intcode::{max_signal_with_options, Machine, MachineOptions, Program, Status, Topology, Word};

/// Runs integer programs on a small virtual machine.
#[derive(FromArgs)]
struct Arguments {
  #[argh(subcommand)]
  command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
  Run(RunArguments),
  Amplify(AmplifyArguments),
}

/// Run a program on a single machine and print its outputs.
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
struct RunArguments {
  /// the program file; read from stdin when omitted
  #[argh(positional)]
  program: Option<String>,

  /// a value to queue as input; may be repeated
  #[argh(option, short = 'i')]
  input: Vec<Word>,

  /// patch memory before running, as `address=value`; may be repeated
  #[argh(option)]
  set: Vec<Patch>,

  /// prompt for input on stdin instead of blocking
  #[argh(switch)]
  interactive: bool,

  /// trace every instruction
  #[argh(switch, short = 'v')]
  verbose: bool,

  /// wait for enter between instructions
  #[argh(switch)]
  step: bool,

  /// print the machine state when the run ends
  #[argh(switch)]
  dump: bool,
}

/// Search phase settings for a chain of machines and print the best signal.
#[derive(FromArgs)]
#[argh(subcommand, name = "amplify")]
struct AmplifyArguments {
  /// the program file; read from stdin when omitted
  #[argh(positional)]
  program: Option<String>,

  /// feed the last machine's output back into the first
  #[argh(switch)]
  feedback: bool,

  /// number of machines in the chain
  #[argh(option, default = "5")]
  machines: usize,

  /// the smallest phase setting; defaults to 0, or 5 with --feedback
  #[argh(option)]
  first_phase: Option<Word>,

  /// the signal sent into the first machine
  #[argh(option, default = "0")]
  signal: Word,

  /// trace every instruction and log the signal of every phase ordering tried
  #[argh(switch, short = 'v')]
  verbose: bool,
}

/// A memory patch given on the command line as `address=value`.
struct Patch {
  address : Word,
  value   : Word,
}

impl FromStr for Patch {
  type Err = String;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    let mut parts = text.splitn(2, '=');
    let parse = |part: Option<&str>| {
      part.map(str::trim)
          .and_then(|p| p.parse::<Word>().ok())
          .ok_or_else(|| format!("expected `address=value`, got `{}`", text))
    };
    let address = parse(parts.next())?;
    let value   = parse(parts.next())?;
    Ok(Patch { address, value })
  }
}

/// Loads the program at `path`, or reads it from `stdin` when there is no path.
fn load_program<R: Read>(path: Option<&str>, mut stdin: R) -> Result<Program, Box<dyn Error>> {
  match path {
    Some(path) => Ok(Program::from_file(path)?),
    None       => {
      let mut text = String::new();
      stdin.read_to_string(&mut text)?;
      Ok(text.parse::<Program>()?)
    }
  }
}

/// The phase settings `first, first + 1, ...` for `count` machines.
fn phase_settings(first: Word, count: usize) -> Result<Vec<Word>, String> {
  (0..count)
    .map(|i| {
      Word::try_from(i)
        .ok()
        .and_then(|i| first.checked_add(i))
        .ok_or_else(|| format!("{} machines starting at phase {} overflow a word", count, first))
    })
    .collect()
}

/// Executes one instruction at a time, showing the machine state and waiting for enter.
fn step_through(machine: &mut Machine) -> Result<Status, Box<dyn Error>> {
  loop {
    println!("{}", machine);
    print!("Press enter to process the next instruction...");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
      return Ok(machine.status());
    }

    match machine.step()? {
      Status::Running => continue,
      status          => return Ok(status),
    }
  }
}

fn run(arguments: RunArguments) -> Result<(), Box<dyn Error>> {
  let program = load_program(arguments.program.as_deref(), io::stdin())?;
  let options = MachineOptions {
    verbose     : arguments.verbose,
    interactive : arguments.interactive,
  };

  let mut machine = Machine::new(&program).with_options(options).with_name("intcode");
  for patch in &arguments.set {
    machine.poke(patch.address, patch.value)?;
  }
  machine.extend_input(arguments.input.iter().copied());

  let status = match arguments.step {
    true  => step_through(&mut machine)?,
    false => machine.run()?,
  };

  if arguments.dump {
    println!("{}", machine);
  }

  // Interactive machines have already echoed their outputs.
  if !arguments.interactive {
    for output in machine.outputs() {
      println!("{}", output);
    }
  }
  if machine.outputs().is_empty() {
    println!("Value at address 0: {}", machine.read(0)?);
  }

  if status == Status::BlockedOnInput {
    warn!(
      "machine is still waiting for input at {} after {} steps",
      machine.instruction_pointer(),
      machine.steps()
    );
  }

  Ok(())
}

fn amplify(arguments: AmplifyArguments) -> Result<(), Box<dyn Error>> {
  let program  = load_program(arguments.program.as_deref(), io::stdin())?;
  let topology = match arguments.feedback {
    true  => Topology::Feedback,
    false => Topology::Linear,
  };
  let first_phase = arguments.first_phase.unwrap_or(match topology {
    Topology::Linear   => 0,
    Topology::Feedback => 5,
  });
  let phases  = phase_settings(first_phase, arguments.machines)?;
  let options = MachineOptions { verbose: arguments.verbose, interactive: false };

  let (signal, best_phases) =
    max_signal_with_options(&program, &phases, topology, arguments.signal, options)?;
  println!("Max {} signal is {} with phases {:?}", topology, signal, best_phases);

  Ok(())
}

fn main() {
  let arguments: Arguments = argh::from_env();

  let verbose = match &arguments.command {
    Command::Run(run_arguments)         => run_arguments.verbose,
    Command::Amplify(amplify_arguments) => amplify_arguments.verbose,
  };
  let default_filter = match verbose {
    true  => "debug",
    false => "warn",
  };
  env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

  let result = match arguments.command {
    Command::Run(run_arguments)         => run(run_arguments),
    Command::Amplify(amplify_arguments) => amplify(amplify_arguments),
  };

  if let Err(error) = result {
    eprintln!("Error: {}", error);
    process::exit(1);
  }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;

  fn parse_arguments(args: &[&str]) -> Arguments {
    Arguments::from_args(&["intcode"], args).unwrap()
  }

  #[test]
  fn program_path_is_optional() {
    match parse_arguments(&["run", "-i", "7"]).command {
      Command::Run(arguments) => {
        assert_eq!(arguments.program, None);
        assert_eq!(arguments.input, vec![7]);
      }
      _ => panic!("expected the run command"),
    }

    match parse_arguments(&["amplify", "--feedback"]).command {
      Command::Amplify(arguments) => {
        assert_eq!(arguments.program, None);
        assert!(arguments.feedback);
      }
      _ => panic!("expected the amplify command"),
    }

    match parse_arguments(&["run", "day9.txt"]).command {
      Command::Run(arguments) => assert_eq!(arguments.program.as_deref(), Some("day9.txt")),
      _ => panic!("expected the run command"),
    }
  }

  #[test]
  fn programs_load_from_stdin() {
    let program = load_program(None, Cursor::new("3,0,4,0,99\n")).unwrap();
    assert_eq!(program.words(), &[3, 0, 4, 0, 99]);

    let mut machine = Machine::new(&program);
    machine.input(7);
    assert_eq!(machine.run().unwrap(), Status::Halted);
    assert_eq!(machine.outputs(), &[7]);

    assert!(load_program(None, Cursor::new("3,0,,99")).is_err());
  }

  #[test]
  fn phase_ranges() {
    assert_eq!(phase_settings(5, 5).unwrap(), vec![5, 6, 7, 8, 9]);
    assert!(phase_settings(0, 0).unwrap().is_empty());
    assert_eq!(phase_settings(Word::MAX, 1).unwrap(), vec![Word::MAX]);
    assert!(phase_settings(Word::MAX - 1, 3).is_err());
  }

  #[test]
  fn patches() {
    let patch: Patch = "1 = 12".parse().unwrap();
    assert_eq!((patch.address, patch.value), (1, 12));
    assert!("1".parse::<Patch>().is_err());
    assert!("a=2".parse::<Patch>().is_err());
  }
}
