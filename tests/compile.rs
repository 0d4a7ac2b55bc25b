// tests/compile.rs

use sigma::diagnostics::Phase;
use sigma::{CompileError, CompileOptions, CompiledUnit, compile};

fn compile_ok(src: &str) -> CompiledUnit {
    match compile(src, &CompileOptions::default()) {
        Ok(unit) => unit,
        Err(err) => {
            let codes: Vec<_> = err.diagnostics().iter().map(|d| d.code()).collect();
            panic!("Compilation failed unexpectedly: {} {:?}", err, codes);
        }
    }
}

fn compile_err(src: &str) -> CompileError {
    match compile(src, &CompileOptions::default()) {
        Ok(unit) => panic!("Compilation succeeded unexpectedly:\n{}", unit.ir),
        Err(err) => err,
    }
}

#[test]
fn test_compiles_simple_program() {
    let unit = compile_ok("fr x = 5\nsay x + 1");
    assert!(unit.ir.contains("define i32 @main()"));
    assert!(unit.ir.contains("declare i32 @printf(ptr, ...)"));
    assert!(unit.warnings.is_empty());
}

#[test]
fn test_semantic_error_stops_before_codegen() {
    let err = compile_err("mog");
    assert_eq!(err.phase(), Phase::Semantic);
    let errors: Vec<_> = err.diagnostics().iter().filter(|d| d.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code(), "E0206");
    assert_eq!(errors[0].line(), 1);
}

#[test]
fn test_syntax_error_reports_syntax_phase() {
    let err = compile_err("fr = 5");
    assert_eq!(err.phase(), Phase::Syntax);
    assert!(err.diagnostics().iter().any(|d| d.code().starts_with("E01")));
    assert!(err.to_string().contains("<input>"));
}

#[test]
fn test_undefined_variable_is_not_lowered() {
    let err = compile_err("say missing");
    assert_eq!(err.phase(), Phase::Semantic);
    assert_eq!(err.diagnostics()[0].code(), "E0200");
}

#[test]
fn test_out_of_range_index_still_compiles() {
    // 下标越界不做检查
    let unit = compile_ok("fr a = [1, 2, 3]\nsay a[5]");
    assert!(unit.ir.contains("[3 x double]"));
}

#[test]
fn test_warnings_are_carried_through() {
    let unit = compile_ok("yeet {\n  say 1\n} caught {\n  say 2\n}");
    assert_eq!(unit.warnings.len(), 1);
    assert_eq!(unit.warnings[0].code(), "W0202");
    assert!(!unit.warnings[0].is_error());
}

#[test]
fn test_custom_module_name() {
    let options = CompileOptions {
        module_name: "hello".to_string(),
        ..CompileOptions::with_unit_name("hello.sigma")
    };
    let unit = compile("say \"hi\"", &options).expect("compile");
    assert!(unit.ir.contains("; ModuleID = 'hello'"));
}

#[test]
fn test_unit_name_appears_in_error() {
    let err = compile("mog", &CompileOptions::with_unit_name("loop.sigma")).unwrap_err();
    assert!(err.to_string().contains("loop.sigma"));
}

#[test]
fn test_top_level_variable_in_function_fails_in_codegen() {
    // 类型检查通过，但函数体拿不到 main 里的存储槽
    let err = compile_err("fr limit = 10\nvibe f(n) {\n  send n + limit\n}\nsay f(1)");
    assert_eq!(err.phase(), Phase::Runtime);
    assert_eq!(err.diagnostics().last().map(|d| d.code()), Some("E0304"));
}

#[test]
fn test_reserved_function_name_is_rejected() {
    let err = compile_err("vibe main() {\n  send 1\n}\nsay 2");
    assert_eq!(err.phase(), Phase::Semantic);
    assert_eq!(err.diagnostics()[0].code(), "E0213");
}

#[test]
fn test_forward_function_reference() {
    let src = "say twice(4)\nvibe twice(n) {\n  send n * 2\n}";
    let unit = compile_ok(src);
    assert!(unit.ir.contains("define double @twice(double"));
    assert!(unit.ir.contains("call double @twice"));
}

#[test]
fn test_full_program() {
    let src = r#"
vibe fib(n) {
  lowkey (n < 2) {
    send n
  }
  send fib(n - 1) + fib(n - 2)
}

fr total = 0
edge (fr i = 0, i < 10, i++) {
  lowkey (i == 3) {
    skip
  }
  total += fib(i)
}

fr name = "sigma"
say "total for {name}: {total}"

simp total {
  stan 0:
    say "none"
  ghost:
    say ongod
}
"#;
    let unit = compile_ok(src);
    assert!(unit.ir.contains("define double @fib(double"));
    assert!(unit.ir.contains("forcond"));
    assert!(unit.ir.contains("switch.end"));
    assert!(unit.ir.contains("total for %s: %g"));
}
