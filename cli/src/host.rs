//! The terminal host: prints to stdout, runs `pause` timers and answers
//! `ask` dialogs from an input stream.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::debug;
use vm::stdlib::{register_core, register_output};
use vm::{pending, ExternalRegistry, NativeCall, Param, Resolver, RunOutcome, RuntimeError, Value, VM};

struct Timer {
    due: Instant,
    resolver: Resolver,
}

struct Dialog {
    prompt: String,
    resolver: Resolver,
}

/// Calls the host still owes the program an answer for.
#[derive(Default)]
struct Outstanding {
    timers: Vec<Timer>,
    dialogs: Vec<Dialog>,
}

pub struct Host {
    registry: ExternalRegistry,
    printed: Rc<RefCell<Vec<String>>>,
    outstanding: Rc<RefCell<Outstanding>>,
}

impl Host {
    pub fn new() -> Result<Self> {
        let printed = Rc::new(RefCell::new(Vec::new()));
        let outstanding = Rc::new(RefCell::new(Outstanding::default()));

        let mut registry = ExternalRegistry::new();
        register_core(&mut registry)?;
        let sink = Rc::clone(&printed);
        register_output(
            &mut registry,
            Rc::new(move |line: String| sink.borrow_mut().push(line)),
        )?;

        let timers = Rc::clone(&outstanding);
        registry.add_function(
            "pause",
            vec![Param::new("milliseconds", "number")],
            "nothing",
            true,
            Rc::new(move |args: &[Value]| -> Result<NativeCall, RuntimeError> {
                let millis = args.first().and_then(Value::as_number).unwrap_or(0.0);
                let (resolver, result) = pending();
                timers.borrow_mut().timers.push(Timer {
                    due: Instant::now() + Duration::from_millis(millis.max(0.0) as u64),
                    resolver,
                });
                Ok(NativeCall::Pending(result))
            }),
        )?;

        let dialogs = Rc::clone(&outstanding);
        registry.add_function(
            "ask",
            vec![Param::new("prompt", "string")],
            "string",
            true,
            Rc::new(move |args: &[Value]| -> Result<NativeCall, RuntimeError> {
                let prompt = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| RuntimeError::Native {
                        name: "ask".to_string(),
                        message: "prompt is not a string".to_string(),
                    })?
                    .to_string();
                let (resolver, result) = pending();
                dialogs.borrow_mut().dialogs.push(Dialog { prompt, resolver });
                Ok(NativeCall::Pending(result))
            }),
        )?;

        Ok(Self {
            registry,
            printed,
            outstanding,
        })
    }

    pub fn registry(&self) -> &ExternalRegistry {
        &self.registry
    }

    /// Write out everything `print` produced since the last flush.
    pub fn flush(&self, out: &mut impl Write) -> io::Result<()> {
        for line in self.printed.borrow_mut().drain(..) {
            writeln!(out, "{}", line)?;
        }
        out.flush()
    }

    /// Answer what can be answered: first the dialogs (a line from `input`
    /// each, end of input stops the program), then timers. When only
    /// timers are left and none is due yet, sleep until the earliest one.
    pub fn service(&self, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
        self.flush(out)?;

        let dialogs = std::mem::take(&mut self.outstanding.borrow_mut().dialogs);
        for dialog in dialogs {
            write!(out, "{} ", dialog.prompt)?;
            out.flush()?;
            let mut answer = String::new();
            let read = input.read_line(&mut answer).context("Failed to read answer")?;
            if read == 0 {
                debug!(prompt = %dialog.prompt, "input closed, stopping program");
                dialog.resolver.stop();
            } else {
                let answer = answer.trim_end_matches(['\r', '\n']);
                dialog.resolver.complete(Value::string(answer));
            }
        }

        let mut outstanding = self.outstanding.borrow_mut();
        if let Some(earliest) = outstanding.timers.iter().map(|t| t.due).min() {
            let now = Instant::now();
            if earliest > now {
                thread::sleep(earliest - now);
            }
        }
        let now = Instant::now();
        let (due, waiting): (Vec<Timer>, Vec<Timer>) =
            outstanding.timers.drain(..).partition(|t| t.due <= now);
        outstanding.timers = waiting;
        for timer in due {
            timer.resolver.complete(Value::Nothing);
        }
        Ok(())
    }

    /// Run `vm` to completion, `budget` instructions per tick, servicing
    /// async calls between ticks. Breakpoints are ignored.
    pub fn drive(
        &self,
        vm: &mut VM,
        budget: usize,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> Result<()> {
        loop {
            let outcome = vm.run(budget)?;
            self.flush(out)?;
            match outcome {
                RunOutcome::Completed => return Ok(()),
                RunOutcome::Suspended => self.service(input, out)?,
                RunOutcome::Breakpoint(_) | RunOutcome::BudgetExhausted | RunOutcome::Stepped => {}
            }
        }
    }
}
