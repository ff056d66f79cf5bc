//! Debugger protocol: breakpoints, stepping and introspection.

use tracing::debug;

use crate::code::Liveness;
use crate::error::Result;
use crate::value::Value;

use super::vm::{RunOutcome, VM};

/// Where a `step_over` started, so it can be resumed on a later host tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOverSnapshot {
    pub frame_index: usize,
    pub line: i64,
}

/// One entry of the call stack view, innermost first.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub index: usize,
    pub function: String,
    pub signature: String,
    pub line: i64,
}

/// A slot that is live at the frame's current position.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalView {
    pub slot: usize,
    pub name: String,
    pub type_name: String,
    pub live: Liveness,
    pub value: Option<Value>,
}

impl VM {
    // ========================================================================
    // Breakpoints
    // ========================================================================

    pub fn set_breakpoint(&mut self, line: u32) {
        if self.breakpoints.insert(line) {
            self.rebuild_breakpoints();
        }
    }

    pub fn clear_breakpoint(&mut self, line: u32) {
        if self.breakpoints.remove(&line) {
            self.rebuild_breakpoints();
        }
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
        self.rebuild_breakpoints();
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = u32> + '_ {
        self.breakpoints.iter().copied()
    }

    pub(super) fn rebuild_breakpoints(&mut self) {
        for function in self.functions.iter_mut() {
            function.resolve_breakpoints(self.breakpoints.iter());
        }
        debug!(lines = ?self.breakpoints, "breakpoint tables rebuilt");
    }

    /// The breakpoint line on the top frame's next instruction, if any.
    pub fn hit_breakpoint(&self) -> Option<u32> {
        if self.is_completed() {
            return None;
        }
        let frame = self.frames.last()?;
        let code = self.functions.get(frame.function)?;
        code.breakpoints.get(frame.pc).copied().flatten().map(|bp| bp.line)
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Source line of the top frame, `-1` once completed. While an async
    /// call is outstanding this is the line of the call.
    pub fn line_number(&self) -> i64 {
        if self.is_completed() {
            return -1;
        }
        let Some(frame) = self.frames.last() else {
            return -1;
        };
        let pc = if self.pending.is_some() {
            frame.pc.saturating_sub(1)
        } else {
            frame.pc
        };
        self.functions
            .get(frame.function)
            .and_then(|code| code.line_at(pc))
            .map_or(-1, i64::from)
    }

    /// Run until control is back in the starting frame (or a shallower one)
    /// on a different line, or a breakpoint is reached. Returns a snapshot to
    /// resume from when the iteration limit is reached or an async call is
    /// outstanding; `None` when the step finished.
    pub fn step_over(
        &mut self,
        snapshot: Option<StepOverSnapshot>,
    ) -> Result<Option<StepOverSnapshot>> {
        if self.is_completed() {
            return Ok(None);
        }
        let snapshot = snapshot.unwrap_or_else(|| StepOverSnapshot {
            frame_index: self.frames.len().saturating_sub(1),
            line: self.line_number(),
        });

        let mut executed = 0;
        loop {
            match self.step()? {
                RunOutcome::Completed => return Ok(None),
                RunOutcome::Suspended => return Ok(Some(snapshot)),
                _ => {}
            }
            if self.hit_breakpoint().is_some() {
                return Ok(None);
            }
            let frame_index = self.frames.len().saturating_sub(1);
            if frame_index <= snapshot.frame_index && self.line_number() != snapshot.line {
                return Ok(None);
            }
            executed += 1;
            if executed >= self.config.step_over_limit {
                return Ok(Some(snapshot));
            }
        }
    }

    /// Run until the line or the frame depth differs from where we started,
    /// or a breakpoint is reached.
    pub fn step_into(&mut self) -> Result<RunOutcome> {
        if self.is_completed() {
            return Ok(RunOutcome::Completed);
        }
        let depth = self.frames.len();
        let line = self.line_number();

        for _ in 0..self.config.step_over_limit {
            match self.step()? {
                RunOutcome::Completed => return Ok(RunOutcome::Completed),
                RunOutcome::Suspended => return Ok(RunOutcome::Suspended),
                _ => {}
            }
            if let Some(line) = self.hit_breakpoint() {
                return Ok(RunOutcome::Breakpoint(line));
            }
            if self.frames.len() != depth || self.line_number() != line {
                return Ok(RunOutcome::Stepped);
            }
        }
        Ok(RunOutcome::BudgetExhausted)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn call_stack(&self) -> Vec<FrameView> {
        let top = self.frames.len().saturating_sub(1);
        self.frames
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(index, frame)| {
                let code = self.functions.get(frame.function)?;
                let line = if index == top {
                    self.line_number()
                } else {
                    // Callers sit just past their call instruction.
                    code.line_at(frame.pc.saturating_sub(1)).map_or(-1, i64::from)
                };
                Some(FrameView {
                    index,
                    function: code.name.clone(),
                    signature: code.signature.clone(),
                    line,
                })
            })
            .collect()
    }

    /// Slots of frame `index` (0 = `$main`) that are live at its current
    /// position, in slot order.
    pub fn frame_locals(&self, index: usize) -> Vec<LocalView> {
        let Some(frame) = self.frames.get(index) else {
            return Vec::new();
        };
        let Some(code) = self.functions.get(frame.function) else {
            return Vec::new();
        };
        code.locals
            .iter()
            .enumerate()
            .filter(|(_, local)| local.live.contains(frame.pc))
            .map(|(slot, local)| LocalView {
                slot,
                name: local.name.clone(),
                type_name: local.type_name.clone(),
                live: local.live,
                value: frame.slots.get(slot).cloned().flatten(),
            })
            .collect()
    }
}
