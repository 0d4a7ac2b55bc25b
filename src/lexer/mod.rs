//! src/lexer/mod.rs
//!
//! 词法分析阶段的公共接口：把源代码文本变成一个平坦的 Token 序列。
//! 出错的字符会被报告到 `DiagnosticBag`，但扫描永远不会中途停止。

mod main;
mod token;

#[cfg(test)]
mod test;

use crate::diagnostics::DiagnosticBag;
use tracing::debug;

pub use main::{unescape, Lexer};
pub use token::*;

/// 扫描整个源文件，返回以 `Eof` 结尾的 Token 列表。
pub fn lex(source: &str, diagnostics: &mut DiagnosticBag) -> Vec<Token> {
    let tokens = Lexer::new(source, diagnostics).scan_all_tokens();
    debug!(count = tokens.len(), "lexed source");
    tokens
}
