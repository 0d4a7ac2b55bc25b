//! Sigma 编译器的库入口。
//!
//! 管道：`lexer` -> `parser` -> `analyzer` -> `codegen`，所有阶段共用一个
//! `DiagnosticBag`。这里的 `compile` 把它们串起来，命令行程序只是它的一层薄包装。

pub mod analyzer;
pub mod codegen;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
mod utils;

use analyzer::{Analyzer, SemanticAnalysis};
use codegen::CodeGen;
use diagnostics::{Diagnostic, DiagnosticBag, Phase};
use inkwell::context::Context;
use thiserror::Error;
use tracing::{debug, info_span};

/// 一次编译的配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// 诊断信息里显示的名字，通常是源文件路径。
    pub unit_name: String,
    /// 生成的 LLVM 模块名。
    pub module_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            unit_name: "<input>".to_string(),
            module_name: codegen::DEFAULT_MODULE_NAME.to_string(),
        }
    }
}

impl CompileOptions {
    pub fn with_unit_name(unit_name: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            ..Self::default()
        }
    }
}

/// 编译成功的结果。警告不会阻止编译。
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    pub ir: String,
    pub warnings: Vec<Diagnostic>,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("compilation of '{unit}' failed ({phase}, {} diagnostics)", .diagnostics.len())]
    Failed {
        unit: String,
        phase: Phase,
        /// 按报告顺序排列，包含警告。
        diagnostics: Vec<Diagnostic>,
    },
}

impl CompileError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Failed { diagnostics, .. } => diagnostics,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            CompileError::Failed { phase, .. } => *phase,
        }
    }

    /// 阶段取第一个错误所在的阶段。
    fn from_bag(bag: DiagnosticBag, fallback: Phase) -> Self {
        let phase = bag
            .iter()
            .find(|d| d.is_error())
            .map(Diagnostic::phase)
            .unwrap_or(fallback);
        let unit = bag.unit_name().to_string();
        CompileError::Failed {
            unit,
            phase,
            diagnostics: bag.into_vec(),
        }
    }
}

/// 编译一段 Sigma 源代码，返回文本形式的 LLVM IR。
///
/// 词法或语法出错时不会进行类型检查，类型检查出错时不会生成代码。
pub fn compile(source: &str, options: &CompileOptions) -> Result<CompiledUnit, CompileError> {
    let mut diagnostics = DiagnosticBag::new(source, &options.unit_name);

    let program = {
        let _span = info_span!("parse", unit = %options.unit_name).entered();
        let tokens = lexer::lex(source, &mut diagnostics);
        parser::parse(&tokens, &mut diagnostics)
    };
    if diagnostics.has_errors() {
        return Err(CompileError::from_bag(diagnostics, Phase::Syntax));
    }

    let had_error = {
        let _span = info_span!("analyze", unit = %options.unit_name).entered();
        Analyzer::new(&mut diagnostics).analyze(&program)
    };
    if had_error {
        return Err(CompileError::from_bag(diagnostics, Phase::Semantic));
    }

    let _span = info_span!("codegen", module = %options.module_name).entered();
    let context = Context::create();
    let module = match CodeGen::new(&context, &options.module_name).run(&program) {
        Ok(module) => module,
        Err(err) => {
            diagnostics.report(err.into_diagnostic());
            return Err(CompileError::from_bag(diagnostics, Phase::Runtime));
        }
    };
    let ir = module.print_to_string().to_string();
    debug!(bytes = ir.len(), warnings = diagnostics.warning_count(), "compiled unit");

    Ok(CompiledUnit {
        ir,
        warnings: diagnostics.into_vec(),
    })
}
