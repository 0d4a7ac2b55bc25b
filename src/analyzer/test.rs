// In src/analyzer/test.rs

use super::{Analyzer, SemanticAnalysis};
use crate::diagnostics::{Diagnostic, DiagnosticBag};
use crate::lexer::lex;
use crate::parser::parse;

/// 词法和语法分析必须完全正确，否则测试的前置条件不成立。
fn check(src: &str) -> (bool, DiagnosticBag) {
    let mut bag = DiagnosticBag::new(src, "test.sigma");
    let tokens = lex(src, &mut bag);
    let program = parse(&tokens, &mut bag);
    if bag.has_errors() {
        panic!("Test setup failed (parsing errors):\n{}", bag.format_plain());
    }

    let had_error = Analyzer::new(&mut bag).analyze(&program);
    (had_error, bag)
}

/// 用于应该通过检查的代码。返回诊断（可能包含警告）。
fn analyze_ok(src: &str) -> DiagnosticBag {
    let (had_error, bag) = check(src);
    if had_error {
        panic!("Analysis failed unexpectedly:\n{}", bag.format_plain());
    }
    bag
}

/// 用于应该产生语义错误的代码。只返回错误，不含警告。
fn analyze_err(src: &str) -> Vec<Diagnostic> {
    let (had_error, bag) = check(src);
    assert!(had_error, "Analysis succeeded unexpectedly for source:\n{}", src);
    bag.into_vec().into_iter().filter(|d| d.is_error()).collect()
}

fn codes(diags: &[Diagnostic]) -> Vec<&'static str> {
    diags.iter().map(|d| d.code()).collect()
}

#[cfg(test)]
mod declarations {
    use super::*;

    #[test]
    fn test_declaration_and_use() {
        analyze_ok("fr x = 5\nsay x + 1");
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        let errs = analyze_err("fr x = 1\nfr x = 2");
        assert_eq!(codes(&errs), vec!["E0201"]);
        assert_eq!(errs[0].message(), "Variable 'x' is already declared in this scope");
        assert_eq!(errs[0].line(), 2);
        // 第二个标签指向之前的声明
        assert_eq!(errs[0].labels().len(), 2);
    }

    #[test]
    fn test_shadowing_in_nested_block_is_allowed() {
        analyze_ok("fr x = 1\n{\n  fr x = \"inner\"\n  say x\n}\nsay x");
    }

    #[test]
    fn test_block_scope_ends_at_closing_brace() {
        let errs = analyze_err("{\n  fr inner = 1\n}\nsay inner");
        assert_eq!(codes(&errs), vec!["E0200"]);
        assert_eq!(errs[0].message(), "Undefined variable 'inner'");
        assert_eq!(errs[0].line(), 4);
    }

    #[test]
    fn test_outer_variable_mutable_from_inner_scope() {
        analyze_ok("fr total = 0\ngoon total < 10 {\n  total += 1\n}");
    }

    #[test]
    fn test_initializer_checked_before_declaration() {
        // 右边的 y 在声明之前还不存在
        let errs = analyze_err("fr y = y + 1");
        assert_eq!(codes(&errs), vec!["E0200"]);
    }

    #[test]
    fn test_for_initializer_scoped_to_loop() {
        let errs = analyze_err("edge (fr i = 0, i < 3, i++) {\n  say i\n}\nsay i");
        assert_eq!(codes(&errs), vec!["E0200"]);
        assert_eq!(errs[0].line(), 4);
    }

    #[test]
    fn test_dynamic_retyping_on_assignment() {
        // 赋值后 x 变成字符串，`x * 2` 因此报错
        let errs = analyze_err("fr x = 1\nx = \"text\"\nsay x * 2");
        assert_eq!(codes(&errs), vec!["E0202"]);
        assert_eq!(
            errs[0].message(),
            "Expected numeric type for left operand of '*' (arithmetic operator), got String"
        );
    }

    #[test]
    fn test_assignment_to_undefined_variable() {
        let errs = analyze_err("ghost_var = 3");
        assert_eq!(errs[0].message(), "Undefined variable 'ghost_var' in assignment");
    }
}

#[cfg(test)]
mod control_flow {
    use super::*;

    #[test]
    fn test_top_level_break_is_single_error() {
        let errs = analyze_err("mog");
        assert_eq!(codes(&errs), vec!["E0206"]);
        assert_eq!(errs[0].message(), "'mog' (break) used outside of loop");
    }

    #[test]
    fn test_continue_inside_if_outside_loop() {
        let errs = analyze_err("lowkey ongod {\n  skip\n}");
        assert_eq!(codes(&errs), vec!["E0207"]);
        assert_eq!(errs[0].line(), 2);
    }

    #[test]
    fn test_break_and_continue_inside_loops() {
        analyze_ok(
            "goon ongod {\n  lowkey cap { skip }\n  mog\n}\nedge (, , ) {\n  mog\n}",
        );
    }

    #[test]
    fn test_break_in_switch_outside_loop_is_error() {
        let errs = analyze_err("simp 1 {\n  stan 1:\n    mog\n}");
        assert_eq!(codes(&errs), vec!["E0206"]);
    }

    #[test]
    fn test_return_outside_function() {
        let errs = analyze_err("send 1");
        assert_eq!(codes(&errs), vec!["E0209"]);
        assert_eq!(errs[0].message(), "'send' (return) used outside of function");
    }

    #[test]
    fn test_loop_depth_does_not_leak_into_function() {
        let errs = analyze_err("goon ongod {\n  mog\n}\nvibe f() {\n  mog\n}");
        assert_eq!(codes(&errs), vec!["E0206"]);
        assert_eq!(errs[0].line(), 5);
    }

    #[test]
    fn test_string_condition_is_rejected() {
        let errs = analyze_err("lowkey \"yes\" {\n  say 1\n}");
        assert_eq!(codes(&errs), vec!["E0211"]);
        assert_eq!(
            errs[0].message(),
            "Condition in 'lowkey' must be a boolean or number, got String"
        );

        let errs = analyze_err("goon \"a\" { }");
        assert!(errs[0].message().contains("'goon'"));
    }

    #[test]
    fn test_comparison_and_logical_conditions() {
        analyze_ok("fr a = 1\nlowkey a > 0 && !cap {\n  say a\n} midkey a == 0 {\n  say 0\n}");
    }

    #[test]
    fn test_switch_case_type_mismatch() {
        let errs = analyze_err("fr s = \"x\"\nsimp s {\n  stan 1:\n    say 1\n}");
        assert_eq!(codes(&errs), vec!["E0202"]);
        assert_eq!(
            errs[0].message(),
            "Case type Integer doesn't match switch expression type String"
        );
    }

    #[test]
    fn test_switch_case_bodies_are_scoped() {
        analyze_ok("simp 2 {\n  stan 1:\n    fr v = 1\n  stan 2:\n    fr v = 2\n  ghost:\n    say 0\n}");
        let errs = analyze_err("simp 2 {\n  stan 1:\n    fr v = 1\n}\nsay v");
        assert_eq!(codes(&errs), vec!["E0200"]);
    }

    #[test]
    fn test_try_catch_emits_standing_warning() {
        let bag = analyze_ok("yeet {\n  say 1\n} caught {\n  say 2\n}");
        let warning = bag.iter().find(|d| !d.is_error()).expect("expected a warning");
        assert_eq!(warning.code(), "W0202");
        assert_eq!(bag.warning_count(), 1);
        assert!(!bag.has_errors());
    }

    #[test]
    fn test_try_catch_blocks_are_checked() {
        let errs = analyze_err("yeet {\n  say missing\n} caught { }");
        assert_eq!(codes(&errs), vec!["E0200"]);
    }
}

#[cfg(test)]
mod functions {
    use super::*;

    #[test]
    fn test_forward_reference() {
        analyze_ok("say twice(4)\nvibe twice(n) {\n  send n * 2\n}");
    }

    #[test]
    fn test_mutual_recursion() {
        analyze_ok(
            "vibe even(n) {\n  lowkey n == 0 { send 1 }\n  send odd(n - 1)\n}\n\
             vibe odd(n) {\n  lowkey n == 0 { send 0 }\n  send even(n - 1)\n}\n\
             say even(10)",
        );
    }

    #[test]
    fn test_duplicate_function() {
        let errs = analyze_err("vibe f() { }\nvibe f(a) { }");
        assert_eq!(codes(&errs), vec!["E0210"]);
        assert_eq!(errs[0].message(), "Function 'f' is already declared");
        assert_eq!(errs[0].line(), 2);
    }

    #[test]
    fn test_wrong_argument_count() {
        let errs = analyze_err("vibe add(a, b) {\n  send a + b\n}\nsay add(1)");
        assert_eq!(codes(&errs), vec!["E0205"]);
        assert_eq!(errs[0].message(), "Function 'add' expects 2 arguments, got 1");
    }

    #[test]
    fn test_argument_type_mismatch() {
        let errs = analyze_err("vibe id(a) {\n  send a\n}\nsay id(\"s\")");
        assert_eq!(codes(&errs), vec!["E0202"]);
        assert_eq!(errs[0].message(), "Argument 1 of function 'id' expects Number, got String");
    }

    #[test]
    fn test_undefined_function_and_variable_call() {
        let errs = analyze_err("say nope(1)");
        assert_eq!(codes(&errs), vec!["E0203"]);
        assert_eq!(errs[0].message(), "Undefined function 'nope'");

        let errs = analyze_err("fr v = 1\nsay v(1)");
        assert_eq!(codes(&errs), vec!["E0204"]);
        assert_eq!(errs[0].message(), "'v' is not a function");
    }

    #[test]
    fn test_call_on_non_name_callee() {
        let errs = analyze_err("vibe f() { }\nf()()");
        assert_eq!(codes(&errs), vec!["E0204"]);
        assert_eq!(errs[0].message(), "Expected function name in call");
    }

    #[test]
    fn test_function_body_sees_top_level_variables() {
        // 函数体在全局作用域之上再压一层
        let bag = analyze_ok("fr limit = 10\nvibe f(n) {\n  send n + limit\n}");
        assert!(bag.is_empty());
    }

    #[test]
    fn test_function_locals_do_not_leak() {
        let errs = analyze_err("vibe f(n) {\n  fr local = n\n  send local\n}\nsay local + n");
        assert_eq!(codes(&errs), vec!["E0200", "E0200"]);
    }

    #[test]
    fn test_reserved_function_names() {
        let errs = analyze_err("vibe main() {\n  send 1\n}\nsay 2");
        assert_eq!(codes(&errs), vec!["E0213"]);
        assert_eq!(errs[0].message(), "'main' cannot be used as a function name");

        let errs = analyze_err("vibe printf(x) {\n  send x\n}\nsay 1");
        assert_eq!(codes(&errs), vec!["E0213"]);
        assert_eq!(errs[0].line(), 1);
    }

    #[test]
    fn test_top_level_scope_restored_after_function() {
        analyze_ok("fr limit = 10\nvibe f(n) {\n  fr local = n\n  send local\n}\nsay limit + f(1)");
    }

    #[test]
    fn test_function_name_is_visible_as_value() {
        // 函数名可以作为标识符解析（类型为 Function）
        analyze_ok("vibe f() { }\nfr g = f");
    }

    #[test]
    fn test_duplicate_parameter() {
        let errs = analyze_err("vibe f(a, a) {\n  send a\n}");
        assert_eq!(codes(&errs), vec!["E0201"]);
    }

    #[test]
    fn test_nested_function_is_rejected() {
        let errs = analyze_err("vibe outer() {\n  vibe inner() { }\n}");
        assert_eq!(codes(&errs), vec!["E0212"]);
        assert_eq!(errs[0].line(), 2);

        let errs = analyze_err("{\n  vibe hidden() { }\n}");
        assert_eq!(codes(&errs), vec!["E0212"]);
    }

    #[test]
    fn test_non_numeric_return_is_warning() {
        let bag = analyze_ok("vibe greet() {\n  send \"hi\"\n}");
        let warnings: Vec<_> = bag.iter().filter(|d| !d.is_error()).collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code(), "W0201");
        assert_eq!(warnings[0].message(), "Function returns String, but Number was expected");
    }

    #[test]
    fn test_bare_return_is_fine() {
        let bag = analyze_ok("vibe f() {\n  send\n}");
        assert!(bag.is_empty());
    }
}

#[cfg(test)]
mod expressions {
    use super::*;

    #[test]
    fn test_string_concatenation_with_plus() {
        analyze_ok("fr s = \"n = \" + 3\nsay s");
    }

    #[test]
    fn test_arithmetic_requires_numbers() {
        let errs = analyze_err("say \"a\" - 1");
        assert_eq!(codes(&errs), vec!["E0202"]);
        let errs = analyze_err("say ongod * 2");
        assert_eq!(codes(&errs), vec!["E0202"]);
    }

    #[test]
    fn test_both_operands_reported() {
        let errs = analyze_err("say \"a\" << \"b\"");
        assert_eq!(codes(&errs), vec!["E0202", "E0202"]);
        assert!(errs[1].message().starts_with("Expected numeric type for right operand of '<<'"));
    }

    #[test]
    fn test_error_type_does_not_cascade() {
        // 未定义变量只报一次，后续运算不再报类型错误
        let errs = analyze_err("say missing * 2 + 1");
        assert_eq!(codes(&errs), vec!["E0200"]);
    }

    #[test]
    fn test_comparison_requires_numbers() {
        let errs = analyze_err("say \"a\" < 1");
        assert!(errs[0].message().contains("(comparison)"));
    }

    #[test]
    fn test_equality_of_incompatible_types_warns() {
        let bag = analyze_ok("say 1 == \"one\"");
        let warning = bag.iter().next().expect("expected a warning");
        assert_eq!(warning.code(), "W0200");
        assert_eq!(warning.message(), "Comparing incompatible types: Integer and String");
    }

    #[test]
    fn test_null_is_compatible_with_everything() {
        let bag = analyze_ok("say nah == 1\nsay nah != \"s\"");
        assert!(bag.is_empty());
    }

    #[test]
    fn test_unary_operators() {
        analyze_ok("fr x = 3\nsay -x\nsay ~x\nsay !\"s\"");
        let errs = analyze_err("say -\"s\"");
        assert_eq!(errs[0].message(), "Expected numeric type for operand of unary '-', got String");
    }

    #[test]
    fn test_compound_assignment_and_increment_need_numbers() {
        analyze_ok("fr n = 1\nn += 2\nn++\nsay --n");
        let errs = analyze_err("fr s = \"a\"\ns += 1");
        assert_eq!(codes(&errs), vec!["E0202"]);
        let errs = analyze_err("fr s = \"a\"\ns++");
        assert_eq!(errs[0].message(), "Expected numeric type for variable in '++', got String");
        let errs = analyze_err("k--");
        assert_eq!(errs[0].message(), "Undefined variable 'k' in increment/decrement");
    }

    #[test]
    fn test_arrays_are_not_bounds_checked() {
        analyze_ok("fr a = [1, 2, 3]\nsay a[5]");
    }

    #[test]
    fn test_index_requires_numeric_index() {
        let errs = analyze_err("fr a = [1]\nsay a[\"0\"]");
        assert_eq!(errs[0].message(), "Expected numeric type for array index, got String");
    }

    #[test]
    fn test_index_assignment_and_array_elements() {
        analyze_ok("fr a = [1, \"two\", nah]\na[0] = a[1]\nsay a[0] + 1");
    }

    #[test]
    fn test_interpolation_parts_are_checked() {
        analyze_ok("fr name = \"sigma\"\nsay \"hi {name}, {1 + 2}\"");
        let errs = analyze_err("say \"hi {who}\"");
        assert_eq!(codes(&errs), vec!["E0200"]);
        assert_eq!(errs[0].line(), 1);
    }

    #[test]
    fn test_errors_accumulate_across_program() {
        let errs = analyze_err("mog\nsay a\nskip\nsend 1");
        assert_eq!(codes(&errs), vec!["E0206", "E0200", "E0207", "E0209"]);
    }
}
