//! Human-readable and JSON listings of a compiled module.

use std::fmt::Write;

use serde_json::{json, Value as Json};
use vm::{FunctionCode, Instruction};

use crate::module::Module;

/// One block per function: signature, locals with liveness, then the
/// instructions with the source line each came from.
pub fn module_to_string(module: &Module) -> String {
    let mut out = String::new();
    for (index, code) in module.code.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        function_to_string(&mut out, module, code);
    }
    out
}

fn function_to_string(out: &mut String, module: &Module, code: &FunctionCode) {
    let _ = writeln!(out, "== {} ==", code.signature);

    if !code.locals.is_empty() {
        let _ = writeln!(out, "locals:");
        for (slot, local) in code.locals.iter().enumerate() {
            let kind = if slot < code.num_params { "param" } else { "var" };
            let _ = writeln!(
                out,
                "  {:>3} {:<5} {}: {} [{}, {}]",
                slot, kind, local.name, local.type_name, local.live.start, local.live.end
            );
        }
    }

    for (pc, instruction) in code.instructions.iter().enumerate() {
        let line = code.line_at(pc).unwrap_or(0);
        let mut text = instruction.to_string();
        match instruction {
            Instruction::Call(index) => {
                if let Some(callee) = module.code.get(*index) {
                    let _ = write!(text, " ({})", callee.signature);
                }
            }
            Instruction::CallExternal(index) => {
                if let Some(external) = module.externals.function(*index) {
                    let _ = write!(text, " ({})", external.full_signature());
                }
            }
            Instruction::Jump(offset) | Instruction::JumpIfFalse(offset) => {
                let _ = write!(text, " (-> {:04})", pc as isize + offset);
            }
            _ => {}
        }
        let _ = writeln!(out, "{:04} {:<40} ; line {}", pc, text, line);
    }
}

/// The module as JSON for tooling: code objects, the type table and the
/// external signatures calls refer to by index.
pub fn module_to_json(module: &Module) -> serde_json::Result<Json> {
    let externals: Vec<Json> = module
        .externals
        .functions()
        .iter()
        .map(|f| {
            json!({
                "signature": f.full_signature(),
                "async": f.is_async,
            })
        })
        .collect();

    Ok(json!({
        "functions": serde_json::to_value(&module.code)?,
        "types": serde_json::to_value(&module.types)?,
        "externals": externals,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use vm::ExternalRegistry;

    #[test]
    fn listing_shows_signatures_and_lines() {
        let module = compile(
            "fun add(a: number, b: number): number\n  return a + b\nend\nadd(1, 2)",
            &ExternalRegistry::new(),
        )
        .unwrap();
        let text = module_to_string(&module);
        assert!(text.contains("== $main() =="));
        assert!(text.contains("== add(number,number):number =="));
        assert!(text.contains("param a: number"));
        assert!(text.contains("(add(number,number):number)"));
        assert!(text.contains("; line 2"));
    }

    #[test]
    fn json_lists_every_function() {
        let module = compile("var x = 1\nx = x + 1", &ExternalRegistry::new()).unwrap();
        let json = module_to_json(&module).unwrap();
        let functions = json["functions"].as_array().unwrap();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0]["name"], "$main");
        assert_eq!(functions[0]["instructions"][0]["op"], "push");
        assert!(json["types"]["types"].as_array().unwrap().len() >= 4);
    }
}
