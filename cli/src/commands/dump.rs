use anyhow::{Context, Result};
use compiler::{module_to_json, module_to_string};

use super::{compile_for_host, read_source};
use crate::host::Host;

pub fn dump_file(path: &str, json: bool) -> Result<()> {
    let source = read_source(path)?;
    print!("{}", dump_source(&source, json)?);
    Ok(())
}

pub fn dump_source(source: &str, json: bool) -> Result<String> {
    let host = Host::new()?;
    let module = compile_for_host(source, &host)?;
    if json {
        let value = module_to_json(&module).context("Failed to serialize module")?;
        let mut text = serde_json::to_string_pretty(&value)?;
        text.push('\n');
        Ok(text)
    } else {
        Ok(module_to_string(&module))
    }
}
