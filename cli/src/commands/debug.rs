//! A line-oriented debugger over the VM's stepping API.

use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use tracing::debug;
use vm::{RunOutcome, VM};

use super::{compile_for_host, read_source};
use crate::config::BotsConfig;
use crate::host::Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Step into calls
    Step,
    /// Step over calls
    Next,
    Continue,
    Locals,
    Stack,
    Break(u32),
    Clear(u32),
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let name = words.next().unwrap_or("");
        let line = |arg: Option<&str>| -> Result<u32, String> {
            arg.and_then(|a| a.parse().ok())
                .ok_or_else(|| format!("'{}' needs a line number", name))
        };
        let command = match name {
            "step" | "s" => Command::Step,
            "next" | "n" => Command::Next,
            "continue" | "c" => Command::Continue,
            "locals" | "l" => Command::Locals,
            "stack" | "bt" => Command::Stack,
            "break" | "b" => Command::Break(line(words.next())?),
            "clear" => Command::Clear(line(words.next())?),
            "quit" | "q" => Command::Quit,
            other => return Err(format!("Unknown command '{}'", other)),
        };
        Ok(command)
    }
}

pub fn debug_file(path: &str, breakpoints: &[u32], config: &BotsConfig) -> Result<()> {
    let source = read_source(path)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    debug_source(&source, breakpoints, config, &mut input, &mut output)
}

/// Debug `source`, reading commands (and dialog answers) from `input`.
/// Ends on `quit`, at the end of input, or when the program completes.
pub fn debug_source(
    source: &str,
    breakpoints: &[u32],
    config: &BotsConfig,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<()> {
    let host = Host::new()?;
    let module = compile_for_host(source, &host)?;
    let mut session = Session {
        vm: module.vm_with_config(config.vm),
        host,
        budget: config.budget(None),
    };
    for &line in config.breakpoints.iter().chain(breakpoints) {
        session.vm.set_breakpoint(line);
    }
    session.report(output)?;

    let mut line = String::new();
    while !session.vm.is_completed() {
        write!(output, "(bots) ")?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let command = match line.trim().parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => command,
            Err(message) => {
                writeln!(output, "{}", message)?;
                continue;
            }
        };
        debug!(?command, "debugger command");
        session.execute(command, input, output)?;
    }
    Ok(())
}

struct Session {
    vm: VM,
    host: Host,
    budget: usize,
}

impl Session {
    fn execute(
        &mut self,
        command: Command,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> Result<()> {
        match command {
            Command::Step => {
                while self.vm.step_into()? == RunOutcome::Suspended {
                    self.host.service(input, output)?;
                }
                self.host.flush(output)?;
                self.report(output)
            }
            Command::Next => {
                let mut snapshot = None;
                loop {
                    snapshot = self.vm.step_over(snapshot)?;
                    self.host.flush(output)?;
                    match snapshot {
                        None => break,
                        Some(_) if self.vm.is_suspended() => self.host.service(input, output)?,
                        Some(_) => {}
                    }
                }
                self.report(output)
            }
            Command::Continue => {
                loop {
                    let outcome = self.vm.run(self.budget)?;
                    self.host.flush(output)?;
                    match outcome {
                        RunOutcome::Completed | RunOutcome::Breakpoint(_) => break,
                        RunOutcome::Suspended => self.host.service(input, output)?,
                        RunOutcome::BudgetExhausted | RunOutcome::Stepped => {}
                    }
                }
                self.report(output)
            }
            Command::Locals => {
                let Some(top) = self.vm.frames().len().checked_sub(1) else {
                    return Ok(());
                };
                for local in self.vm.frame_locals(top) {
                    match &local.value {
                        Some(value) => {
                            writeln!(output, "  {}: {} = {}", local.name, local.type_name, value)?
                        }
                        None => writeln!(output, "  {}: {} = <unset>", local.name, local.type_name)?,
                    }
                }
                Ok(())
            }
            Command::Stack => {
                for frame in self.vm.call_stack() {
                    writeln!(output, "  #{} {} line {}", frame.index, frame.signature, frame.line)?;
                }
                Ok(())
            }
            Command::Break(line) => {
                self.vm.set_breakpoint(line);
                writeln!(output, "breakpoint set at line {}", line)?;
                Ok(())
            }
            Command::Clear(line) => {
                self.vm.clear_breakpoint(line);
                writeln!(output, "breakpoint cleared at line {}", line)?;
                Ok(())
            }
            Command::Quit => Ok(()),
        }
    }

    fn report(&self, output: &mut impl Write) -> Result<()> {
        if self.vm.is_completed() {
            writeln!(output, "program completed")?;
        } else if let Some(line) = self.vm.hit_breakpoint() {
            writeln!(output, "breakpoint at line {}", line)?;
        } else {
            writeln!(output, "stopped at line {}", self.vm.line_number())?;
        }
        Ok(())
    }
}
