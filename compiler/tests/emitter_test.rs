use compiler::{compile, Module};
use proptest::prelude::*;
use vm::stdlib::register_core;
use vm::{BinaryOperator, ExternalRegistry, FunctionCode, Instruction, UnaryOperator, Value};

fn compile_ok(source: &str) -> Module {
    let mut registry = ExternalRegistry::new();
    register_core(&mut registry).unwrap();
    match compile(source, &registry) {
        Ok(module) => module,
        Err(err) => panic!("unexpected compile error: {}", err.render(source)),
    }
}

fn ops(code: &FunctionCode) -> Vec<&'static str> {
    code.instructions.iter().map(Instruction::name).collect()
}

#[test]
fn test_empty_program_is_a_single_return() {
    let module = compile_ok("");
    assert_eq!(module.code.len(), 1);
    assert_eq!(ops(module.main()), ["return"]);
    assert_eq!(module.main().name, "$main");
}

#[test]
fn test_unused_values_are_popped() {
    let module = compile_ok("123 34.56");
    assert_eq!(ops(module.main()), ["push", "pop", "push", "pop", "return"]);
    assert_eq!(
        module.main().instructions[2],
        Instruction::Push(Value::Number(34.56))
    );

    let module = compile_ok("1 + 2");
    assert_eq!(
        ops(module.main()),
        ["push", "push", "binaryOp", "pop", "return"]
    );
}

#[test]
fn test_calls_returning_nothing_are_not_popped() {
    let module = compile_ok("fun f()\nend\nf()\nlength(\"abc\")");
    assert_eq!(ops(module.main()), ["call", "push", "callExt", "pop", "return"]);
    assert_eq!(module.main().instructions[0], Instruction::Call(1));
}

#[test]
fn test_parameters_take_the_first_slots() {
    let module = compile_ok("fun add(a: number, b: number): number\n  var c = a + b\n  return c\nend");
    let add = module.function("add").unwrap();
    assert_eq!(add.num_params, 2);
    assert!(add.returns_value);
    let names: Vec<&str> = add.locals.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);
    assert_eq!(
        add.instructions,
        vec![
            Instruction::Load(0),
            Instruction::Load(1),
            Instruction::Binary(BinaryOperator::Add),
            Instruction::Store(2),
            Instruction::Load(2),
            Instruction::Return,
        ]
    );
}

#[test]
fn test_if_else_chain_jumps() {
    let module = compile_ok("var x = 1\nif x > 0 then\n  x = 2\nelse\n  x = 3\nend");
    let main = module.main();
    assert_eq!(main.instructions[5], Instruction::JumpIfFalse(4));
    assert_eq!(main.instructions[8], Instruction::Jump(3));
    assert_eq!(main.instructions[11], Instruction::Return);
    assert_eq!(main.instructions.len(), 12);
}

#[test]
fn test_elseif_branches_all_jump_to_the_end() {
    let module = compile_ok(
        "var x = 1\nif x == 1 then\n  x = 10\nelseif x == 2 then\n  x = 20\nelse\n  x = 30\nend",
    );
    let main = &module.main().instructions;
    let end = main.len() - 1;
    let targets: Vec<usize> = main
        .iter()
        .enumerate()
        .filter_map(|(i, instr)| match instr {
            Instruction::Jump(offset) => Some((i as isize + offset) as usize),
            _ => None,
        })
        .collect();
    assert_eq!(targets, vec![end, end]);
}

#[test]
fn test_while_loop_shape() {
    let module = compile_ok("var i = 0\nwhile i < 3 do\n  i = i + 1\nend");
    let main = module.main();
    assert_eq!(main.instructions[5], Instruction::JumpIfFalse(6));
    assert_eq!(main.instructions[10], Instruction::Jump(-8));
    assert_eq!(main.instructions[11], Instruction::Return);
}

#[test]
fn test_repeat_loop_shape() {
    let module = compile_ok("repeat 3 times\nend");
    assert_eq!(
        module.main().instructions,
        vec![
            Instruction::Push(Value::Number(3.0)),
            Instruction::Dup,
            Instruction::Push(Value::Number(0.0)),
            Instruction::Binary(BinaryOperator::Gt),
            Instruction::JumpIfFalse(4),
            Instruction::Push(Value::Number(1.0)),
            Instruction::Binary(BinaryOperator::Sub),
            Instruction::Jump(-6),
            Instruction::Pop,
            Instruction::Return,
        ]
    );
}

#[test]
fn test_break_in_repeat_pops_the_count() {
    let module = compile_ok("repeat 3 times\n  break\nend");
    let main = &module.main().instructions;
    assert_eq!(main[5], Instruction::Pop);
    // Past the loop's own pop.
    assert_eq!(main[6], Instruction::Jump(5));
    assert_eq!(main[10], Instruction::Pop);
    assert_eq!(main[11], Instruction::Return);
}

#[test]
fn test_continue_in_repeat_goes_to_the_decrement() {
    let module = compile_ok("repeat 3 times\n  continue\nend");
    let main = &module.main().instructions;
    assert_eq!(main[5], Instruction::Jump(1));
    assert_eq!(main[6], Instruction::Push(Value::Number(1.0)));
}

#[test]
fn test_continue_in_while_goes_to_the_head() {
    let module = compile_ok("while true do\n  continue\nend");
    let main = &module.main().instructions;
    assert_eq!(main[2], Instruction::Jump(-2));
}

#[test]
fn test_record_equality_uses_equals() {
    let source = "record P\n  x: number\nend\nfun equals(a: P, b: P): boolean\n  return a.x == b.x\nend\nvar same = P(1) == P(1)\nvar differ = P(1) != P(2)";
    let module = compile_ok(source);
    let main = &module.main().instructions;
    let calls: Vec<usize> = main
        .iter()
        .enumerate()
        .filter(|(_, i)| **i == Instruction::Call(1))
        .map(|(pc, _)| pc)
        .collect();
    assert_eq!(calls.len(), 2);
    assert_eq!(main[calls[1] + 1], Instruction::Unary(UnaryOperator::Not));
    assert!(!main.contains(&Instruction::Binary(BinaryOperator::Eq)));
}

#[test]
fn test_record_equality_without_equals_compares_identity() {
    let module = compile_ok("record P\n  x: number\nend\nvar p = P(1)\nvar same = p == p");
    assert!(module
        .main()
        .instructions
        .contains(&Instruction::Binary(BinaryOperator::Eq)));
}

#[test]
fn test_field_store_pushes_record_then_value() {
    let module = compile_ok("record P\n  x: number\n  y: number\nend\nvar p = P(1, 2)\np.y = 5");
    let main = &module.main().instructions;
    let n = main.len();
    assert_eq!(
        main[n - 4..],
        [
            Instruction::Load(0),
            Instruction::Push(Value::Number(5.0)),
            Instruction::StoreField(1),
            Instruction::Return,
        ]
    );
}

#[test]
fn test_implicit_return_sits_on_the_end_line() {
    let module = compile_ok("fun f()\n  var a = 1\nend");
    let f = module.function("f").unwrap();
    assert_eq!(f.instructions.last(), Some(&Instruction::Return));
    assert_eq!(f.line_infos.last().unwrap().line, 3);
}

#[test]
fn test_no_implicit_return_after_explicit_one() {
    let module = compile_ok("fun f(): number\n  return 1\nend");
    let f = module.function("f").unwrap();
    assert_eq!(ops(f), ["push", "return"]);
}

#[test]
fn test_line_infos_follow_statements() {
    let module = compile_ok("var a = 1\n\nvar b = a + 2");
    let lines: Vec<u32> = module.main().line_infos.iter().map(|l| l.line).collect();
    assert_eq!(lines, vec![1, 1, 3, 3, 3, 3, 3]);
}

#[test]
fn test_multi_line_statement_stays_on_its_first_line() {
    let module = compile_ok("var x = 1 +\n  2\nvar y = length(\n  \"ab\")");
    let lines: Vec<u32> = module.main().line_infos.iter().map(|l| l.line).collect();
    assert_eq!(lines, vec![1, 1, 1, 1, 3, 3, 3, 4]);
}

#[test]
fn test_branch_end_jumps_stay_on_the_last_body_line() {
    let module = compile_ok("var a = true\nif a then\n  if a then\n    a = false\n  end\nend");
    let main = module.main();
    let jump_lines: Vec<u32> = main
        .instructions
        .iter()
        .zip(&main.line_infos)
        .filter(|(instr, _)| matches!(instr, Instruction::Jump(_)))
        .map(|(_, info)| info.line)
        .collect();
    assert_eq!(jump_lines, vec![4, 4]);
}

#[test]
fn test_multi_line_condition_stays_on_the_if_line() {
    let module = compile_ok("var a = true\nif a and\n  not a then\n  a = false\nend");
    let main = module.main();
    let skip = main
        .instructions
        .iter()
        .position(|instr| matches!(instr, Instruction::JumpIfFalse(_)))
        .unwrap();
    assert!(main.line_infos[2..=skip].iter().all(|info| info.line == 2));
}

#[test]
fn test_falling_off_a_value_function_returns_a_default() {
    let module = compile_ok(
        "fun f(): number\n  while true do\n    return 1\n  end\nend\nfun g(): string\nend\nfun h(): boolean\nend",
    );
    let f = module.function("f").unwrap();
    let n = f.instructions.len();
    assert_eq!(f.instructions[n - 2], Instruction::Push(Value::Number(0.0)));
    assert_eq!(f.instructions[n - 1], Instruction::Return);
    assert_eq!(f.line_infos[n - 2].line, 5);

    let g = module.function("g").unwrap();
    assert_eq!(g.instructions, vec![Instruction::Push(Value::string("")), Instruction::Return]);
    let h = module.function("h").unwrap();
    assert_eq!(h.instructions, vec![Instruction::Push(Value::Boolean(false)), Instruction::Return]);
}

#[test]
fn test_liveness_ranges() {
    let module = compile_ok("fun f(n: number)\n  if n > 0 then\n    var m = n\n    toString(m)\n  end\n  var k = 2\nend");
    let f = module.function("f").unwrap();
    let last = f.instructions.len() - 1;

    let n = &f.locals[0];
    assert_eq!((n.live.start, n.live.end), (0, last));

    // m is stored at 5; the if block ends with the pop at 8.
    let m = &f.locals[1];
    assert_eq!(m.name, "m");
    assert_eq!(m.live.start, 6);
    assert_eq!(m.live.end, 8);
    assert!(!m.live.contains(9));

    let k = &f.locals[2];
    assert_eq!(k.live.end, last);
    assert!(k.live.start > m.live.end);
}

#[test]
fn test_constructor_calls_are_external() {
    let mut registry = ExternalRegistry::new();
    register_core(&mut registry).unwrap();
    let host_functions = registry.functions().len();

    let module = compile("record P\n  x: number\nend\nvar p = P(1)", &registry).unwrap();
    assert_eq!(module.externals.functions().len(), host_functions + 1);
    assert_eq!(
        module.main().instructions[1],
        Instruction::CallExternal(host_functions)
    );
}

proptest! {
    #[test]
    fn prop_sum_chain_shape(values in proptest::collection::vec(0u32..1000, 1..12)) {
        let source = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" + ");
        let module = compile_ok(&source);
        let names = ops(module.main());
        let pushes = names.iter().filter(|n| **n == "push").count();
        let adds = names.iter().filter(|n| **n == "binaryOp").count();
        prop_assert_eq!(pushes, values.len());
        prop_assert_eq!(adds, values.len() - 1);
        prop_assert_eq!(&names[names.len() - 2..], &["pop", "return"]);
    }
}
