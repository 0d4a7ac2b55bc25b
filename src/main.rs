// src/main.rs

use clap::Parser;
use sigma::diagnostics::codes::ErrorCode;
use sigma::diagnostics::{Diagnostic, DiagnosticBag};
use sigma::{CompileOptions, compile, lexer, parser};
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::{self, Command, ExitCode, ExitStatus};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Sigma 语言编译器：把 `.sigma` 源文件编译成 LLVM IR 或可执行文件
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 需要编译的源文件路径
    #[arg(required_unless_present = "explain")]
    input_file: Option<PathBuf>,

    /// 可执行文件的输出路径。
    /// 如果不提供，将根据输入文件名自动生成 (例如: hello.sigma -> hello)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 把 LLVM IR 打印到标准输出
    #[arg(long)]
    emit_ir: bool,

    /// 只把 LLVM IR 写入 `<output>.ll`，不调用 clang
    #[arg(long, short = 'S')]
    emit_llvm: bool,

    /// 打印词法分析得到的 Token
    #[arg(long)]
    tokens: bool,

    /// 打印语法树
    #[arg(long)]
    ast: bool,

    /// 编译后立即运行，并返回程序的退出码
    #[arg(long)]
    run: bool,

    /// 关闭彩色输出
    #[arg(long)]
    no_color: bool,

    /// 输出调试日志（也可以用 SIGMA_LOG 控制）
    #[arg(short, long)]
    verbose: bool,

    /// 解释一个错误码，例如 `--explain E0200`
    #[arg(long, value_name = "CODE")]
    explain: Option<String>,
}

impl Cli {
    /// 只检查 token / AST，不继续生成。
    fn inspect_only(&self) -> bool {
        (self.tokens || self.ast) && !(self.emit_ir || self.emit_llvm || self.run || self.output.is_some())
    }
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to launch '{tool}': {source}")]
    Launch { tool: String, source: io::Error },

    #[error("clang failed with {0}")]
    Clang(ExitStatus),

    #[error("Unknown error code '{0}'")]
    UnknownCode(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// `SIGMA_LOG` 优先；否则默认 warn，`-v` 提升到 debug。
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SIGMA_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, DriverError> {
    if let Some(code) = &cli.explain {
        return explain(code);
    }
    let Some(input_path) = cli.input_file.as_deref() else {
        return Ok(ExitCode::FAILURE);
    };

    let raw = fs::read_to_string(input_path).map_err(|source| DriverError::Read {
        path: input_path.to_path_buf(),
        source,
    })?;
    let source = strip_shebang(&raw);
    let unit_name = input_path.display().to_string();
    let use_color = !cli.no_color && io::stderr().is_terminal();

    if cli.tokens || cli.ast {
        let ok = inspect(cli, source, &unit_name, use_color)?;
        if cli.inspect_only() || !ok {
            return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
        }
    }

    let options = CompileOptions::with_unit_name(&unit_name);
    let unit = match compile(source, &options) {
        Ok(unit) => unit,
        Err(err) => {
            render(source, &unit_name, err.diagnostics(), use_color)?;
            eprintln!("{}", err);
            return Ok(ExitCode::FAILURE);
        }
    };
    if !unit.warnings.is_empty() {
        render(source, &unit_name, &unit.warnings, use_color)?;
    }

    if cli.emit_ir {
        print!("{}", unit.ir);
        if !(cli.emit_llvm || cli.run || cli.output.is_some()) {
            return Ok(ExitCode::SUCCESS);
        }
    }

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(input_path));

    if cli.emit_llvm {
        let ll_path = output_path.with_extension("ll");
        write_file(&ll_path, &unit.ir)?;
        println!("Successfully generated LLVM IR at '{}'", ll_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    if cli.run {
        return build_and_run(&unit.ir);
    }

    build_executable(&unit.ir, &output_path)?;
    println!("Successfully compiled executable at '{}'", output_path.display());
    Ok(ExitCode::SUCCESS)
}

/// 打印 `--tokens` / `--ast`。返回是否没有错误。
fn inspect(cli: &Cli, source: &str, unit_name: &str, use_color: bool) -> Result<bool, DriverError> {
    let mut diagnostics = DiagnosticBag::new(source, unit_name);
    let tokens = lexer::lex(source, &mut diagnostics);

    if cli.tokens {
        println!("=== TOKENS ===");
        for token in &tokens {
            println!("{}", token);
        }
        println!("Total tokens: {}", tokens.len());
    }
    if cli.ast {
        let program = parser::parse(&tokens, &mut diagnostics);
        print!("{}", parser::dump_program(&program));
    }

    diagnostics.print(use_color)?;
    Ok(!diagnostics.has_errors())
}

fn explain(code: &str) -> Result<ExitCode, DriverError> {
    let error_code = ErrorCode::lookup(code).ok_or_else(|| DriverError::UnknownCode(code.to_string()))?;
    println!("{} [{}]: {}", error_code.code, error_code.phase, error_code.message);
    println!();
    println!("{}", error_code.explanation);
    Ok(ExitCode::SUCCESS)
}

/// 用源代码重新建一个诊断背包，交给 ariadne 渲染。
fn render(source: &str, unit_name: &str, diagnostics: &[Diagnostic], use_color: bool) -> io::Result<()> {
    let mut bag = DiagnosticBag::new(source, unit_name);
    for diag in diagnostics {
        bag.report(diag.clone());
    }
    bag.print(use_color)
}

/// 去掉开头的 `#!` 行，保留换行符，行号不变。
fn strip_shebang(source: &str) -> &str {
    if !source.starts_with("#!") {
        return source;
    }
    match source.find('\n') {
        Some(end) => &source[end..],
        None => "",
    }
}

fn default_output(input_path: &Path) -> PathBuf {
    input_path
        .file_stem()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("a.out"))
}

fn write_file(path: &Path, contents: &str) -> Result<(), DriverError> {
    fs::write(path, contents).map_err(|source| DriverError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn build_executable(ir: &str, output_path: &Path) -> Result<(), DriverError> {
    let ll_path = output_path.with_extension("ll");
    write_file(&ll_path, ir)?;

    info!(output = %output_path.display(), "invoking clang");
    let status = Command::new("clang")
        .arg(&ll_path)
        .arg("-o")
        .arg(output_path)
        .arg("-Wno-override-module")
        .status()
        .map_err(|source| DriverError::Launch {
            tool: "clang".to_string(),
            source,
        })?;
    fs::remove_file(&ll_path)?;

    if !status.success() {
        return Err(DriverError::Clang(status));
    }
    Ok(())
}

/// 编译到临时目录并运行，程序的退出码原样返回。
fn build_and_run(ir: &str) -> Result<ExitCode, DriverError> {
    let temp_dir = std::env::temp_dir().join(format!("sigma-{}", process::id()));
    fs::create_dir_all(&temp_dir)?;
    let exe_path = temp_dir.join("program");

    let result = build_executable(ir, &exe_path).and_then(|()| {
        debug!(exe = %exe_path.display(), "running compiled program");
        Command::new(&exe_path)
            .status()
            .map_err(|source| DriverError::Launch {
                tool: exe_path.display().to_string(),
                source,
            })
    });
    // 清理失败不影响程序的退出码
    let _ = fs::remove_dir_all(&temp_dir);

    let status = result?;
    let code = status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
