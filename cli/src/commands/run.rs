use anyhow::Result;
use std::io::{self, BufRead, Write};
use tracing::info;

use super::{compile_for_host, read_source};
use crate::config::BotsConfig;
use crate::host::Host;

pub fn run_file(path: &str, budget: Option<usize>, config: &BotsConfig) -> Result<()> {
    let source = read_source(path)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    run_source(&source, budget, config, &mut input, &mut output)
}

/// Compile `source` and run it to completion, reading dialog answers from
/// `input` and writing program output to `output`.
pub fn run_source(
    source: &str,
    budget: Option<usize>,
    config: &BotsConfig,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<()> {
    let host = Host::new()?;
    let module = compile_for_host(source, &host)?;
    let mut vm = module.vm_with_config(config.vm);

    let budget = config.budget(budget);
    info!(functions = module.code.len(), budget, "running program");
    host.drive(&mut vm, budget, input, output)
}
