use anyhow::Result;

use super::{compile_for_host, read_source};
use crate::host::Host;

pub fn check_file(path: &str) -> Result<()> {
    let source = read_source(path)?;
    println!("{}", check_source(&source)?);
    Ok(())
}

/// Type check `source`; the summary names what was declared.
pub fn check_source(source: &str) -> Result<String> {
    let host = Host::new()?;
    let module = compile_for_host(source, &host)?;
    Ok(format!(
        "ok: {} function(s), {} record(s)",
        module.code.len() - 1,
        module.records.len()
    ))
}
