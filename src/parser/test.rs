use super::ast::*;
use super::*; // 导入父模块（parser）的所有公共项，主要是 `parse` 函数
use crate::diagnostics::DiagnosticBag;
use crate::lexer;

/// 辅助函数，用于测试成功解析的场景。
/// 它会执行词法和语法分析，如果出现任何错误就会 panic，否则返回 AST。
fn parse_source_ok(source: &str) -> Program {
    let mut diagnostics = DiagnosticBag::new(source, "<test>");
    let tokens = lexer::lex(source, &mut diagnostics);
    let program = parse(&tokens, &mut diagnostics);
    assert!(
        !diagnostics.has_errors(),
        "Parser failed unexpectedly for source: {}\n{}",
        source,
        diagnostics.format_plain()
    );
    program
}

/// 辅助函数，用于测试解析失败的场景，返回 AST 以及所有诊断信息。
fn parse_source_fail(source: &str) -> (Program, DiagnosticBag) {
    let mut diagnostics = DiagnosticBag::new(source, "<test>");
    let tokens = lexer::lex(source, &mut diagnostics);
    let program = parse(&tokens, &mut diagnostics);
    assert!(diagnostics.has_errors(), "Expected a syntax error for source: {}", source);
    (program, diagnostics)
}

/// 去掉 `dump_program` 的首尾标记，只保留 S 表达式。
fn dump(source: &str) -> String {
    let program = parse_source_ok(source);
    dump_program(&program)
        .trim_start_matches("=== AST ===\n")
        .trim_end_matches("===========\n")
        .trim_end()
        .to_string()
}

fn messages(diagnostics: &DiagnosticBag) -> Vec<String> {
    diagnostics.iter().map(|d| d.message().to_string()).collect()
}

// --- 成功路径测试 (Happy Path) ---

#[test]
fn test_variable_declaration_and_print() {
    let ast = parse_source_ok("fr x = 5\nsay x");
    assert_eq!(ast.statements.len(), 2);

    match &ast.statements[0].kind {
        Statement::VarDeclaration(decl) => {
            assert_eq!(decl.name.name, "x");
            assert_eq!(decl.initializer.kind, Expression::Literal(LiteralValue::Integer(5)));
        }
        other => panic!("Expected a variable declaration, got {:?}", other),
    }
    assert!(matches!(&ast.statements[1].kind, Statement::Print(_)));
}

#[test]
fn test_literals() {
    assert_eq!(dump("say 3.5"), "(say 3.5)");
    assert_eq!(dump("say ongod"), "(say ongod)");
    assert_eq!(dump("say cap"), "(say cap)");
    assert_eq!(dump("say nah"), "(say nah)");
    assert_eq!(dump("say \"hi\""), "(say \"hi\")");
}

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(dump("1 + 2 * 3"), "(expr (+ 1 (* 2 3)))");
    assert_eq!(dump("1 - 2 - 3"), "(expr (- (- 1 2) 3))");
    assert_eq!(dump("(1 + 2) * 3"), "(expr (* (group (+ 1 2)) 3))");
}

#[test]
fn test_bitwise_and_shift_precedence() {
    assert_eq!(dump("a | b ^ c & d"), "(expr (| a (^ b (& c d))))");
    assert_eq!(dump("1 << 2 + 3"), "(expr (<< 1 (+ 2 3)))");
    assert_eq!(dump("a < b == c > d"), "(expr (== (< a b) (> c d)))");
    assert_eq!(dump("a == b & c"), "(expr (& (== a b) c))");
}

#[test]
fn test_logical_precedence() {
    assert_eq!(dump("a || b && c"), "(expr (|| a (&& b c)))");
    assert_eq!(dump("a && b || c"), "(expr (|| (&& a b) c))");
}

#[test]
fn test_unary_operators() {
    assert_eq!(dump("-x + 1"), "(expr (+ (- x) 1))");
    assert_eq!(dump("!ongod"), "(expr (! ongod))");
    assert_eq!(dump("~5"), "(expr (~ 5))");
    assert_eq!(dump("-x++"), "(expr (- (x ++)))");
}

#[test]
fn test_assignment_forms() {
    assert_eq!(dump("a = b = 3"), "(expr (= a (= b 3)))");
    assert_eq!(dump("x += 2 * y"), "(expr (+= x (* 2 y)))");
    assert_eq!(dump("x %= 3"), "(expr (%= x 3))");
    assert_eq!(dump("++i"), "(expr (++ i))");
    assert_eq!(dump("i--"), "(expr (i --))");
}

#[test]
fn test_calls_arrays_and_indexing() {
    assert_eq!(dump("f(1, 2)[0]"), "(expr (index (call f 1 2) 0))");
    assert_eq!(dump("fr a = [1, 2.5, \"s\"]"), "(fr a = [1, 2.5, \"s\"])");
    assert_eq!(dump("fr e = []"), "(fr e = [])");
    assert_eq!(dump("a[1] = 5"), "(expr (index-assign a 1 5))");
    assert_eq!(dump("g()"), "(expr (call g))");
}

#[test]
fn test_if_midkey_highkey_chain() {
    let source = "lowkey x > 1 { say 1 } midkey x > 0 { say 2 } midkey x == 0 { say 3 } highkey { say 4 }";
    let ast = parse_source_ok(source);
    assert_eq!(ast.statements.len(), 1);

    // 沿着 else 链走：If -> If -> If -> Block
    let Statement::If(first) = &ast.statements[0].kind else {
        panic!("Expected an if statement");
    };
    let Statement::If(second) = &first.else_branch.as_ref().unwrap().kind else {
        panic!("Expected midkey to become a nested if");
    };
    let Statement::If(third) = &second.else_branch.as_ref().unwrap().kind else {
        panic!("Expected the second midkey to become a nested if");
    };
    assert!(matches!(&third.else_branch.as_ref().unwrap().kind, Statement::Block(_)));
}

#[test]
fn test_highkey_lowkey_equals_midkey() {
    let with_midkey = dump("lowkey a { say 1 } midkey b { say 2 } highkey { say 3 }");
    let with_nesting = dump("lowkey a { say 1 } highkey lowkey b { say 2 } highkey { say 3 }");
    assert_eq!(with_midkey, with_nesting);
}

#[test]
fn test_parenthesized_conditions() {
    let ast = parse_source_ok("goon (i < 10) { i++ }");
    let Statement::While(w) = &ast.statements[0].kind else {
        panic!("Expected a while statement");
    };
    assert!(matches!(w.condition.kind, Expression::Grouping(_)));
    assert_eq!(w.body.kind.statements.len(), 1);
}

#[test]
fn test_for_loop_clauses() {
    let ast = parse_source_ok("edge (fr i = 0, i < 3, i++) { say i }");
    let Statement::For(f) = &ast.statements[0].kind else {
        panic!("Expected a for statement");
    };
    assert!(matches!(f.initializer.as_deref().map(|s| &s.kind), Some(Statement::VarDeclaration(_))));
    assert!(f.condition.is_some());
    assert!(f.increment.is_some());

    let ast = parse_source_ok("edge (, , ) { mog }");
    let Statement::For(f) = &ast.statements[0].kind else {
        panic!("Expected a for statement");
    };
    assert!(f.initializer.is_none() && f.condition.is_none() && f.increment.is_none());
    assert_eq!(f.body.kind.statements[0].kind, Statement::Break);
}

#[test]
fn test_function_definition_and_return() {
    let source = r#"
        vibe add(a, b) {
            send a + b
        }
        vibe nothing() {
            send
        }
    "#;
    let ast = parse_source_ok(source);
    assert_eq!(ast.statements.len(), 2);

    let Statement::Function(add) = &ast.statements[0].kind else {
        panic!("Expected a function definition");
    };
    let names: Vec<&str> = add.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);

    let Statement::Function(nothing) = &ast.statements[1].kind else {
        panic!("Expected a function definition");
    };
    assert_eq!(
        nothing.body.kind.statements[0].kind,
        Statement::Return(ReturnStatement { value: None })
    );
}

#[test]
fn test_return_without_value_before_statement_keyword() {
    let ast = parse_source_ok("vibe f() {\n send\n say 1\n}");
    let Statement::Function(f) = &ast.statements[0].kind else {
        panic!("Expected a function definition");
    };
    assert_eq!(f.body.kind.statements.len(), 2);
}

#[test]
fn test_switch_statement() {
    let source = r#"
        simp x {
            stan 1:
                say "one"
            ghost:
                say "other"
            stan -2:
                say "minus two"
                mog
        }
    "#;
    let ast = parse_source_ok(source);
    let Statement::Switch(switch) = &ast.statements[0].kind else {
        panic!("Expected a switch statement");
    };
    assert_eq!(switch.cases.len(), 3);
    assert_eq!(switch.cases[0].kind.value.as_ref().unwrap().kind, LiteralValue::Integer(1));
    assert!(switch.cases[1].kind.is_default());
    assert_eq!(switch.cases[2].kind.value.as_ref().unwrap().kind, LiteralValue::Integer(-2));
    assert_eq!(switch.cases[2].kind.body.len(), 2);
}

#[test]
fn test_try_catch() {
    let ast = parse_source_ok("yeet { say 1 } caught { say 2 }");
    let Statement::TryCatch(tc) = &ast.statements[0].kind else {
        panic!("Expected a try/catch statement");
    };
    assert_eq!(tc.try_block.kind.statements.len(), 1);
    assert_eq!(tc.catch_block.kind.statements.len(), 1);
}

#[test]
fn test_interpolated_string() {
    assert_eq!(
        dump("say \"sum {a + b}!\""),
        "(say (interp-string \"sum \" {(+ a b)} \"!\"))"
    );
    assert_eq!(
        dump("say \"{x}{y}\""),
        "(say (interp-string \"\" {x} \"\" {y} \"\"))"
    );
}

#[test]
fn test_interpolation_spans_point_into_source() {
    let source = "say \"hi {name}\"";
    let ast = parse_source_ok(source);
    let Statement::Print(value) = &ast.statements[0].kind else {
        panic!("Expected a print statement");
    };
    let Expression::InterpolatedString(interp) = &value.kind else {
        panic!("Expected an interpolated string");
    };
    assert_eq!(interp.segments, vec!["hi ".to_string(), String::new()]);
    assert_eq!(interp.parts.len(), 1);
    assert_eq!(&source[interp.parts[0].span.into_range()], "name");
}

#[test]
fn test_print_round_trip() {
    let source = r#"
# 综合示例
fr total = 0
fr items = [1, 2.0, -3]
vibe score(a, b) {
    fr s = (a + b) * 2
    lowkey s > 10 && !cap {
        send s
    } midkey s == 0 {
        send
    } highkey {
        s -= - -1
    }
    send s % 3
}
edge (fr i = 0, i < 3, i++) {
    total += score(i, items[i])
    lowkey total >= 100 { mog }
    skip
}
goon total > 0 { total-- }
simp total {
    stan -1:
        say "neg\tone"
    ghost:
        say "brace \{ and quote \" and {total}"
}
yeet { say nah } caught { say ongod }
items[0] = ~total << 2 | 1 ^ 3
{
    say "{total} done"
}
"#;
    let first = parse_source_ok(source);
    let printed = print_program(&first);
    let second = parse_source_ok(&printed);

    assert_eq!(dump_program(&first), dump_program(&second));
    // 打印本身也是稳定的
    assert_eq!(printed, print_program(&second));
}

#[test]
fn test_printer_output_shape() {
    let ast = parse_source_ok("lowkey x { say \"a\\nb\" } highkey { skip }");
    assert_eq!(
        print_program(&ast),
        "lowkey x {\n    say \"a\\nb\"\n} highkey {\n    skip\n}\n"
    );
}

// --- 失败路径测试 (Sad Path) ---

#[test]
fn test_error_message_format() {
    let (_, diagnostics) = parse_source_fail("fr = 5");
    assert_eq!(
        messages(&diagnostics),
        vec!["at '=': Expected variable name after 'fr'.".to_string()]
    );

    let (_, diagnostics) = parse_source_fail("say");
    assert_eq!(messages(&diagnostics), vec!["at end: Expected expression.".to_string()]);
}

#[test]
fn test_error_carries_line_number() {
    let (_, diagnostics) = parse_source_fail("fr a = 1\nsay a\nfr = 3");
    let diag = diagnostics.iter().next().unwrap();
    assert_eq!(diag.line(), 3);
    assert_eq!(diag.code(), "E0100");
}

#[test]
fn test_top_level_recovery() {
    let (ast, diagnostics) = parse_source_fail("fr x = \nsay 1\nfr y = 2");
    assert_eq!(diagnostics.error_count(), 1);
    // 出错的 Token 被跳过，解析从下一个 `fr` 继续
    assert_eq!(ast.statements.len(), 1);
    assert!(matches!(&ast.statements[0].kind, Statement::VarDeclaration(d) if d.name.name == "y"));
}

#[test]
fn test_block_recovery_keeps_later_statements() {
    let (ast, diagnostics) = parse_source_fail("{ fr = 1 say 2 }\nsay 3");
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(ast.statements.len(), 2);
    let Statement::Block(block) = &ast.statements[0].kind else {
        panic!("Expected the block to survive the error");
    };
    assert_eq!(block.statements.len(), 1);
}

#[test]
fn test_invalid_assignment_target() {
    let (ast, diagnostics) = parse_source_fail("1 = 2\nsay 3");
    assert_eq!(
        messages(&diagnostics),
        vec!["at '=': Invalid assignment target.".to_string()]
    );
    assert_eq!(diagnostics.iter().next().unwrap().code(), "E0102");
    // 左边的表达式被保留，解析继续
    assert_eq!(ast.statements.len(), 2);
    assert_eq!(
        ast.statements[0].kind,
        Statement::Expression(Node::new(
            Expression::Literal(LiteralValue::Integer(1)),
            crate::utils::Span::new(0, 1)
        ))
    );
}

#[test]
fn test_invalid_increment_target() {
    let (_, diagnostics) = parse_source_fail("5++");
    assert_eq!(messages(&diagnostics), vec!["at '++': Invalid increment target.".to_string()]);
}

#[test]
fn test_too_many_arguments() {
    let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
    let source = format!("f({})", args.join(", "));
    let (ast, diagnostics) = parse_source_fail(&source);
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(diagnostics.iter().next().unwrap().code(), "E0103");
    // 报告之后仍然得到完整的调用
    assert_eq!(ast.statements.len(), 1);
}

#[test]
fn test_too_many_parameters() {
    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let source = format!("vibe f({}) {{ }}", params.join(", "));
    let (_, diagnostics) = parse_source_fail(&source);
    assert_eq!(messages(&diagnostics), vec!["at 'p255': Cannot have more than 255 parameters.".to_string()]);
}

#[test]
fn test_body_must_be_braced() {
    let (_, diagnostics) = parse_source_fail("lowkey x say 1");
    assert_eq!(
        messages(&diagnostics)[0],
        "at 'say': Expected '{' before 'lowkey' body."
    );
}

#[test]
fn test_missing_closing_brace() {
    let (_, diagnostics) = parse_source_fail("goon x { say 1");
    assert_eq!(messages(&diagnostics), vec!["at end: Expected '}' after block.".to_string()]);
}

#[test]
fn test_duplicate_default() {
    let (_, diagnostics) = parse_source_fail("simp x { ghost: say 1 ghost: say 2 }");
    let diag = diagnostics.iter().next().unwrap();
    assert_eq!(diag.code(), "E0105");
    assert_eq!(diag.labels().len(), 2);
}

#[test]
fn test_malformed_interpolation() {
    let (_, diagnostics) = parse_source_fail("say \"{a} and {b\"");
    assert_eq!(diagnostics.iter().next().unwrap().code(), "E0104");

    let (_, diagnostics) = parse_source_fail("say \"{} {x}\"");
    assert_eq!(diagnostics.iter().next().unwrap().code(), "E0104");

    let (_, diagnostics) = parse_source_fail("say \"{a b}\"");
    assert_eq!(
        messages(&diagnostics),
        vec!["at 'b': Expected '}' after interpolated expression.".to_string()]
    );
}

#[test]
fn test_stray_closing_brace_is_reported_once() {
    let (ast, diagnostics) = parse_source_fail("}\nsay 1");
    assert_eq!(messages(&diagnostics), vec!["at '}': Expected expression.".to_string()]);
    assert_eq!(ast.statements.len(), 1);
}
