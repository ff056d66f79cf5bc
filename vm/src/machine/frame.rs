use crate::value::Value;

/// Represents a single call frame in the execution stack.
///
/// Each frame tracks:
/// - `function`: index of the function in the module
/// - `slots`: parameters and locals, `None` until first written
/// - `pc`: index of the next instruction to execute
/// - `stack_base`: operand stack height when the frame was entered, after
///   its arguments were popped
#[derive(Debug, Clone)]
pub struct Frame {
    pub function: usize,
    pub slots: Vec<Option<Value>>,
    pub pc: usize,
    pub stack_base: usize,
}

impl Frame {
    pub fn new(function: usize, num_slots: usize, stack_base: usize) -> Self {
        Self {
            function,
            slots: vec![None; num_slots],
            pc: 0,
            stack_base,
        }
    }
}
