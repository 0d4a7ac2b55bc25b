//! 插值字符串 `"a {expr} b"` 的拆分与解析。
//!
//! Lexer 只负责把这类字符串标记为 `InterpString` 并保留未解码的原文；
//! 这里把原文切成静态片段和 `{...}` 表达式，表达式部分重新扫描并解析。

use super::ast::{Expression, InterpolatedString, Node};
use super::main::Parser;
use crate::diagnostics::codes::E0104_MALFORMED_INTERPOLATION;
use crate::diagnostics::{DiagnosticBag, Label};
use crate::lexer::{unescape, Lexer, Token};
use crate::utils::Span;

/// `token` 是 `InterpString` Token，`raw` 是它的原始内容（不含引号）。
/// 生成的 span 与行号都指向整个源文件中的位置。
pub(super) fn parse_interpolated(
    token: &Token,
    raw: &str,
    diagnostics: &mut DiagnosticBag,
) -> Result<InterpolatedString, ()> {
    // 跳过开头的引号
    let base = token.span.start + 1;
    let mut segments = Vec::new();
    let mut parts = Vec::new();
    let mut failed = false;

    let mut segment_start = 0;
    let mut pos = 0;
    while let Some(c) = raw[pos..].chars().next() {
        match c {
            '\\' => {
                pos += 1;
                if let Some(escaped) = raw[pos..].chars().next() {
                    pos += escaped.len_utf8();
                }
            }
            '{' => {
                let body_start = pos + 1;
                let Some(close) = raw[body_start..].find('}').map(|n| body_start + n) else {
                    report(
                        diagnostics,
                        Span::new(base + pos, base + raw.len()),
                        "Unterminated '{' in interpolated string.",
                        "this `{` is never closed",
                    );
                    return Err(());
                };

                segments.push(unescape(&raw[segment_start..pos]));
                let line = token.line + raw[..body_start].matches('\n').count();
                match parse_part(&raw[body_start..close], base + body_start, line, diagnostics) {
                    Ok(expr) => parts.push(expr),
                    Err(()) => failed = true,
                }

                pos = close + 1;
                segment_start = pos;
            }
            _ => pos += c.len_utf8(),
        }
    }
    segments.push(unescape(&raw[segment_start..]));

    if failed {
        return Err(());
    }
    Ok(InterpolatedString { segments, parts })
}

/// 重新扫描并解析一个 `{...}` 内部的表达式。
fn parse_part(
    text: &str,
    offset: usize,
    line: usize,
    diagnostics: &mut DiagnosticBag,
) -> Result<Node<Expression>, ()> {
    if text.trim().is_empty() {
        // 把两侧的花括号也包含进来
        let span = Span::new(offset - 1, offset + text.len() + 1);
        report(diagnostics, span, "Empty interpolation in string.", "put an expression between the braces");
        return Err(());
    }

    let tokens = Lexer::with_origin(text, diagnostics, offset, line).scan_all_tokens();
    Parser::new(&tokens, diagnostics).parse_embedded_expression()
}

fn report(diagnostics: &mut DiagnosticBag, span: Span, message: &str, label: &str) {
    diagnostics.report_error(
        &E0104_MALFORMED_INTERPOLATION,
        format!("at '{{': {}", message),
        Label::new(span, label),
    );
}
