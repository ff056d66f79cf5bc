pub mod check;
pub mod debug;
pub mod dump;
pub mod run;

use anyhow::{anyhow, Context, Result};
use compiler::{compile, Module};
use std::fs;

use crate::host::Host;

pub(crate) fn read_source(path: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
}

/// Compile against the natives the CLI host provides.
pub(crate) fn compile_for_host(source: &str, host: &Host) -> Result<Module> {
    compile(source, host.registry()).map_err(|e| anyhow!("Compile error: {}", e.render(source)))
}
