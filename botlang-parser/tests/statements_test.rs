use botlang_parser::ast::{ExprKind, Stmt};
use botlang_parser::parse;

// ======================================================================
// Declarations
// ======================================================================

#[test]
fn function_with_typed_params_and_return() {
    let prog = parse("fun add(a: number, b: number): number\n  return a + b\nend").unwrap();
    match &prog.statements[0] {
        Stmt::Function(decl) => {
            assert_eq!(decl.name.name, "add");
            assert_eq!(decl.params.len(), 2);
            assert_eq!(decl.params[1].type_name.name, "number");
            assert_eq!(decl.return_type.as_ref().map(|t| t.name.as_str()), Some("number"));
            assert!(matches!(decl.body[0], Stmt::Return { value: Some(_), .. }));
            assert_eq!(decl.location.start.line, 1);
            assert_eq!(decl.location.end.line, 3);
        }
        other => panic!("expected Function, got {other:?}"),
    }
}

#[test]
fn record_fields_in_order() {
    let prog = parse("record Point\n  x: number\n  y: number\nend").unwrap();
    match &prog.statements[0] {
        Stmt::Record(decl) => {
            assert_eq!(decl.name.name, "Point");
            let names: Vec<_> = decl.fields.iter().map(|f| f.name.name.as_str()).collect();
            assert_eq!(names, ["x", "y"]);
        }
        other => panic!("expected Record, got {other:?}"),
    }
}

#[test]
fn variable_with_and_without_type() {
    let prog = parse("var a = 1\nvar b: string = \"hi\"").unwrap();
    match (&prog.statements[0], &prog.statements[1]) {
        (Stmt::Variable(a), Stmt::Variable(b)) => {
            assert!(a.type_name.is_none());
            assert_eq!(b.type_name.as_ref().unwrap().name, "string");
            assert!(matches!(&b.value.kind, ExprKind::String(s) if s == "hi"));
        }
        other => panic!("expected two Variables, got {other:?}"),
    }
}

#[test]
fn functions_are_only_allowed_at_top_level() {
    let err = parse("repeat 2 times\n  fun f()\n  end\nend").unwrap_err();
    assert_eq!(err.found, "\"fun\"");
    assert!(!err.expected.contains(&"\"fun\"".to_string()));
    assert!(err.expected.contains(&"\"end\"".to_string()));
}

// ======================================================================
// Control flow
// ======================================================================

#[test]
fn if_elseif_else_chain() {
    let src = "if a then\n  x = 1\nelseif b then\n  x = 2\nelseif c then\n  x = 3\nelse\n  x = 4\nend";
    let prog = parse(src).unwrap();
    match &prog.statements[0] {
        Stmt::If { then_block, else_ifs, else_block, .. } => {
            assert_eq!(then_block.len(), 1);
            assert_eq!(else_ifs.len(), 2);
            assert_eq!(else_block.len(), 1);
            assert!(matches!(else_block[0], Stmt::Assignment { .. }));
        }
        other => panic!("expected If, got {other:?}"),
    }
}

#[test]
fn repeat_and_while_loops() {
    let prog = parse("repeat 3 times\n  forward()\nend\nwhile x < 3 do\n  break\n  continue\nend").unwrap();
    assert!(matches!(prog.statements[0], Stmt::Repeat { .. }));
    match &prog.statements[1] {
        Stmt::While { body, .. } => {
            assert!(matches!(body[0], Stmt::Break { .. }));
            assert!(matches!(body[1], Stmt::Continue { .. }));
        }
        other => panic!("expected While, got {other:?}"),
    }
}

#[test]
fn field_and_index_assignment_targets() {
    let prog = parse("p.x = 1\nlist[0] = 2").unwrap();
    match &prog.statements[0] {
        Stmt::Assignment { target, .. } => assert!(matches!(target.kind, ExprKind::Field { .. })),
        other => panic!("expected Assignment, got {other:?}"),
    }
    match &prog.statements[1] {
        Stmt::Assignment { target, .. } => assert!(matches!(target.kind, ExprKind::Index { .. })),
        other => panic!("expected Assignment, got {other:?}"),
    }
}

// ======================================================================
// Comments
// ======================================================================

#[test]
fn comments_are_statements() {
    let prog = parse("# hello\nvar x = 1 # trailing\nx").unwrap();
    assert_eq!(prog.statements.len(), 4);
    match &prog.statements[0] {
        Stmt::Comment { text, .. } => assert_eq!(text, " hello"),
        other => panic!("expected Comment, got {other:?}"),
    }
    assert!(matches!(prog.statements[2], Stmt::Comment { .. }));
    assert!(matches!(prog.statements[3], Stmt::Expr(_)));
}

#[test]
fn comments_inside_argument_lists_are_ignored() {
    let prog = parse("foo(1, # first\n  2)").unwrap();
    match &prog.statements[0] {
        Stmt::Expr(expr) => match &expr.kind {
            ExprKind::Call { args, .. } => assert_eq!(args.len(), 2),
            other => panic!("expected Call, got {other:?}"),
        },
        other => panic!("expected Expr, got {other:?}"),
    }
}

// ======================================================================
// Errors
// ======================================================================

#[test]
fn keyword_cannot_be_identifier() {
    let err = parse("var end = 1").unwrap_err();
    assert_eq!(err.expected, vec!["an identifier".to_string()]);
    assert_eq!(err.message(), "Expected an identifier but \"end\" found.");
    assert_eq!(err.location.start.column, 5);
}

#[test]
fn missing_end_points_at_end_of_input() {
    let err = parse("repeat 3 times\n  forward()\n").unwrap_err();
    assert_eq!(err.found, "end of input");
    assert!(err.expected.contains(&"\"end\"".to_string()));
    assert!(err.expected.contains(&"\"var\"".to_string()));
}

#[test]
fn unclosed_call_lists_operators_and_delimiters() {
    let err = parse("foo(1, 2").unwrap_err();
    assert_eq!(err.found, "end of input");
    for want in ["\")\"", "\",\"", "\"+\"", "\"and\""] {
        assert!(err.expected.contains(&want.to_string()), "missing {want} in {:?}", err.expected);
    }
}

#[test]
fn unknown_character_is_reported_with_expectations() {
    let err = parse("var a = 1\nvar b = @").unwrap_err();
    assert_eq!(err.found, "\"@\"");
    assert_eq!(err.location.start.line, 2);
    assert_eq!(err.location.start.column, 9);
    assert!(err.expected.contains(&"a number".to_string()));
}

#[test]
fn error_message_is_sorted_and_deduplicated() {
    let err = parse("if x then").unwrap_err();
    let mut sorted = err.expected.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(err.expected, sorted);
    assert!(err.message().starts_with("Expected "));
    assert!(err.message().ends_with(" but end of input found."));
}
