//! src/parser/mod.rs
//!
//! 语法分析阶段的公共接口：接收一个 Token 流，把它转换为抽象语法树 (AST)。
//! 语法错误会被报告到 `DiagnosticBag`，解析器通过同步恢复后继续工作。

pub mod ast;
mod interp;
mod main;
mod printer;

#[cfg(test)]
mod test;

use crate::diagnostics::DiagnosticBag;
use crate::lexer::Token;
use ast::Program;
use tracing::debug;

pub use main::{Parse, Parser};
pub use printer::{dump_program, print_program};

/// 解析整个 Token 流。`tokens` 应当来自 `lexer::lex`，以 `Eof` 结尾。
pub fn parse(tokens: &[Token], diagnostics: &mut DiagnosticBag) -> Program {
    if tokens.is_empty() {
        return Program::default();
    }
    let program = Parser::new(tokens, diagnostics).parse();
    debug!(statements = program.statements.len(), "parsed program");
    program
}
