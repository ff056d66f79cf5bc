use compiler::{compile, CompileError, Module};
use vm::stdlib::register_core;
use vm::{ExternalRegistry, Param};

fn externals() -> ExternalRegistry {
    let mut registry = ExternalRegistry::new();
    register_core(&mut registry).unwrap();
    registry
}

fn compile_ok(source: &str) -> Module {
    match compile(source, &externals()) {
        Ok(module) => module,
        Err(err) => panic!("unexpected compile error: {}", err.render(source)),
    }
}

fn compile_err(source: &str) -> CompileError {
    match compile(source, &externals()) {
        Ok(_) => panic!("expected a compile error for {:?}", source),
        Err(err) => err,
    }
}

/// The text of `source` the error points at.
fn pointed_at<'a>(source: &'a str, err: &CompileError) -> &'a str {
    err.location.text(source).unwrap()
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_arithmetic_operand_mismatch_points_at_operand() {
    let source = "1 + \"a\"";
    let err = compile_err(source);
    assert_eq!(
        err.message,
        "Right operand of + operator is not a 'number', but a 'string'."
    );
    assert_eq!(pointed_at(source, &err), "\"a\"");

    let source = "true - 1";
    let err = compile_err(source);
    assert_eq!(
        err.message,
        "Left operand of - operator is not a 'number', but a 'boolean'."
    );
    assert_eq!(pointed_at(source, &err), "true");
    assert_eq!(err.location.start.column, 1);
}

#[test]
fn test_concat_requires_strings() {
    compile_ok("var s = \"a\" .. \"b\"");
    let err = compile_err("var s = \"a\" .. 1");
    assert_eq!(
        err.message,
        "Right operand of .. operator is not a 'string', but a 'number'."
    );
}

#[test]
fn test_comparison_mismatch_points_at_whole_expression() {
    let source = "var b = 1 == \"one\"";
    let err = compile_err(source);
    assert_eq!(err.message, "Can not compare a 'number' to a 'string'.");
    assert_eq!(pointed_at(source, &err), "1 == \"one\"");
}

#[test]
fn test_unary_operands() {
    compile_ok("var a = not true\nvar b = -3");
    let err = compile_err("var a = not 1");
    assert_eq!(
        err.message,
        "Operand of not operator is not a 'boolean', but a 'number'."
    );
    let err = compile_err("var a = -false");
    assert_eq!(
        err.message,
        "Operand of - operator is not a 'number', but a 'boolean'."
    );
}

#[test]
fn test_logical_operators_require_booleans() {
    compile_ok("var a = true and false or true xor false");
    let err = compile_err("var a = true and 1");
    assert_eq!(
        err.message,
        "Right operand of and operator is not a 'boolean', but a 'number'."
    );
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_conditions_must_be_boolean() {
    let err = compile_err("if 1 then end");
    assert_eq!(
        err.message,
        "Condition of if statement must be a 'boolean', but is a 'number'."
    );
    let err = compile_err("if true then elseif \"x\" then end");
    assert_eq!(
        err.message,
        "Condition of if statement must be a 'boolean', but is a 'string'."
    );
    let err = compile_err("while 0 do end");
    assert_eq!(
        err.message,
        "Condition of while statement must be a 'boolean', but is a 'number'."
    );
    let err = compile_err("repeat true times end");
    assert_eq!(
        err.message,
        "Count of repeat statement must be a 'number', but is a 'boolean'."
    );
}

#[test]
fn test_variable_redeclaration() {
    let err = compile_err("var x = 1\nif true then\n  var x = 2\nend");
    assert_eq!(err.message, "Variable x already defined in line 1, column 5.");
    assert_eq!(err.location.start.line, 3);

    // Sibling blocks may reuse a name.
    compile_ok("if true then var x = 1 else var x = 2 end");
}

#[test]
fn test_variable_type_annotations() {
    compile_ok("var x: number = 1");
    let err = compile_err("var x: string = 1");
    assert_eq!(
        err.message,
        "Can not assign a value of type 'number' to variable 'x' with type 'string'."
    );
    let err = compile_err("var x: Foo = 1");
    assert_eq!(err.message, "Unknown type 'Foo' for variable 'x'.");
}

#[test]
fn test_unknown_variable() {
    let err = compile_err("a = 1");
    assert_eq!(err.message, "Can not find variable or parameter with name 'a'.");
    let err = compile_err("var b = a + 1");
    assert_eq!(err.message, "Can not find variable or parameter with name 'a'.");
}

#[test]
fn test_assignment_type_must_match() {
    let err = compile_err("var a = 1\na = true");
    assert_eq!(
        err.message,
        "Can not assign a value of type 'boolean' to a variable of type 'number'."
    );
}

#[test]
fn test_break_and_continue_need_a_loop() {
    let err = compile_err("break");
    assert_eq!(
        err.message,
        "'break' can only be used inside a 'while' or 'repeat' loop."
    );
    let err = compile_err("fun f()\n  continue\nend");
    assert_eq!(
        err.message,
        "'continue' can only be used inside a 'while' or 'repeat' loop."
    );
    compile_ok("while true do\n  if true then break end\nend");
}

#[test]
fn test_variables_of_main_are_not_visible_in_functions() {
    let err = compile_err("var g = 1\nfun f(): number\n  return g\nend");
    assert_eq!(err.message, "Can not find variable or parameter with name 'g'.");
}

// ============================================================================
// Returns
// ============================================================================

#[test]
fn test_return_rules() {
    let err = compile_err("return 1");
    assert_eq!(err.message, "Can not return a value from the main program.");
    compile_ok("return");

    let err = compile_err("fun foo(): number\n  return\nend");
    assert_eq!(
        err.message,
        "Function 'foo():number' must return a value of type 'number'."
    );

    let err = compile_err("fun foo()\n  return 1\nend");
    assert_eq!(err.message, "Function 'foo()' must not return a value.");

    let err = compile_err("fun foo(): number\n  return \"x\"\nend");
    assert_eq!(
        err.message,
        "Function 'foo():number' must return a value of type 'number', but a value of type 'string' is returned."
    );
}

#[test]
fn test_value_functions_may_fall_off_the_end() {
    compile_ok("fun sign(n: number): number\n  if n < 0 then return -1 end\nend");
    compile_ok("fun f(): number\n  while true do\n    return 1\n  end\nend");
    compile_ok("fun name(): string\nend");
}

// ============================================================================
// Functions and calls
// ============================================================================

#[test]
fn test_unknown_function_names_signature() {
    let err = compile_err("sig(1, \"a\")");
    assert_eq!(err.message, "Can not find function 'sig(number,string)'.");
}

#[test]
fn test_overloads_resolve_by_argument_types() {
    let module = compile_ok(
        "fun show(n: number): string\n  return toString(n)\nend\nfun show(b: boolean): string\n  return toString(b)\nend\nshow(1)\nshow(true)",
    );
    assert_eq!(module.code.len(), 3);
    assert_eq!(module.code[1].signature, "show(number):string");
    assert_eq!(module.code[2].signature, "show(boolean):string");
}

#[test]
fn test_duplicate_functions() {
    let err = compile_err("fun f(a: number)\nend\nfun f(b: number)\nend");
    assert_eq!(err.message, "Function 'f(number)' already defined in line 1.");

    let err = compile_err("fun length(s: string): number\n  return 0\nend");
    assert_eq!(err.message, "Function 'length(string)' already defined externally.");
}

#[test]
fn test_parameter_errors() {
    let err = compile_err("fun f(a: number, a: string)\nend");
    assert_eq!(
        err.message,
        "Duplicate parameter name 'a' in function 'f', see line 1, column 7."
    );
    let err = compile_err("fun f(a: Foo)\nend");
    assert_eq!(err.message, "Unknown type 'Foo' for parameter 'a' of function 'f'.");
    let err = compile_err("fun f(): Foo\nend");
    assert_eq!(err.message, "Unknown return type 'Foo'.");
}

#[test]
fn test_nothing_results_can_not_be_used_as_values() {
    let err = compile_err("fun f()\nend\nvar x = f()");
    assert_eq!(err.message, "This expression does not produce a value.");
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_records_and_constructors() {
    let module = compile_ok(
        "record Point\n  x: number\n  y: number\nend\nvar p = Point(1, 2)\np.x = p.y + 1",
    );
    assert!(module.types.lookup("Point").is_some());
    assert!(module.externals.lookup("Point", &["number", "number"]).is_some());
}

#[test]
fn test_record_errors() {
    let err = compile_err("record A\n  x: number\nend\nrecord A\n  y: number\nend");
    assert_eq!(err.message, "Record 'A' already defined in line 1.");

    let err = compile_err("record A\n  x: number\n  x: string\nend");
    assert_eq!(
        err.message,
        "Duplicate field name 'x' in record 'A', see line 2, column 3."
    );

    let err = compile_err("record A\n  x: Foo\nend");
    assert_eq!(err.message, "Unknown type 'Foo' for field 'x' of record 'A'.");

    let err = compile_err("record A\n  x: number\nend\nvar a = A(1)\nvar b = a.z");
    assert_eq!(err.message, "Record 'A' has no field 'z'.");

    let err = compile_err("var n = 1\nvar b = n.z");
    assert_eq!(err.message, "Can not access field 'z' of a value of type 'number'.");
}

#[test]
fn test_record_fields_may_reference_later_records() {
    compile_ok(
        "record Line\n  from: Point\n  to: Point\nend\nrecord Point\n  x: number\nend\nvar l = Line(Point(1), Point(2))\nvar x = l.to.x",
    );
}

// ============================================================================
// Host declarations
// ============================================================================

#[test]
fn test_unknown_types_in_host_declarations_are_reported_at_start() {
    let mut registry = ExternalRegistry::new();
    registry
        .add_sync("spin", vec![Param::new("speed", "velocity")], "nothing", |_| {
            Ok(vm::Value::Nothing)
        })
        .unwrap();
    let err = compile("spin(1)", &registry).unwrap_err();
    assert_eq!(
        err.message,
        "Could not find type 'velocity' for argument 1 of external function 'spin'."
    );
    assert_eq!(err.location.start.line, 1);
    assert_eq!(err.location.start.column, 1);
}

#[test]
fn test_external_types_get_constructors() {
    let mut registry = ExternalRegistry::new();
    registry
        .add_type(
            "Color",
            vec![
                Param::new("red", "number"),
                Param::new("green", "number"),
                Param::new("blue", "number"),
            ],
            true,
        )
        .unwrap();
    registry.add_type("Robot", vec![Param::new("x", "number")], false).unwrap();

    let module = compile("var c = Color(1, 0, 0)\nvar r = c.red", &registry).unwrap();
    assert!(module.types.record(module.types.lookup("Color").unwrap()).unwrap().external);

    let err = compile("var r = Robot(1)", &registry).unwrap_err();
    assert_eq!(err.message, "Can not find function 'Robot(number)'.");

    let err = compile("record Color\n  x: number\nend", &registry).unwrap_err();
    assert_eq!(err.message, "Record 'Color' already defined externally.");
}

// ============================================================================
// Not implemented
// ============================================================================

#[test]
fn test_lists_are_not_implemented() {
    let err = compile_err("var l = [1, 2]");
    assert_eq!(err.message, "List literals are not implemented yet.");
    let err = compile_err("var a = 1\nvar b = a[0]");
    assert_eq!(err.message, "Array access is not implemented yet.");
}

#[test]
fn test_syntax_errors_convert() {
    let err = compile_err("var = 1");
    assert!(err.message.starts_with("Expected an identifier but \"=\" found."));
    assert_eq!(err.location.start.column, 5);
}
