// 主词法分析器模块。
// 包含 Lexer 结构体和负责将源代码转换为 Token 流的所有逻辑。

use super::token::*;
use crate::diagnostics::codes::{
    E0000_UNEXPECTED_CHARACTER, E0001_UNTERMINATED_STRING, E0002_INVALID_ESCAPE, E0003_INVALID_NUMBER,
};
use crate::diagnostics::{DiagnosticBag, Label};
use crate::utils::Span;
use std::iter::Peekable;
use std::str::Chars;

// --- 1. Lexer 定义 ---

/// 词法分析器，负责将源代码转换为 Token 流。
/// The lexer, responsible for turning source code into a stream of tokens.
pub struct Lexer<'a> {
    /// 源代码的引用。
    source: &'a str,
    /// 诊断信息收集器的可变引用，用于报告错误。
    diagnostics: &'a mut DiagnosticBag,
    /// 可窥视（peekable）的字符迭代器，是词法分析的核心。
    chars: Peekable<Chars<'a>>,
    /// 当前正在扫描的 Token 的起始位置（字节索引）。
    start_pos: usize,
    /// 迭代器在源代码中的当前位置（以字节为单位）。
    current_pos: usize,
    /// 当前行号与当前 Token 开始时的行号。
    line: usize,
    start_line: usize,
    /// `source` 在整个编译单元中的起始偏移，扫描插值片段时不为 0。
    base_offset: usize,
}

impl<'a> Lexer<'a> {
    /// 创建一个新的 Lexer 实例。
    /// Creates a new Lexer instance.
    pub fn new(source: &'a str, diagnostics: &'a mut DiagnosticBag) -> Self {
        Self::with_origin(source, diagnostics, 0, 1)
    }

    /// 扫描一段嵌在更大源文件中的文本（例如插值字符串里的 `{...}`），
    /// 生成的 span 与行号都相对于整个编译单元。
    pub fn with_origin(source: &'a str, diagnostics: &'a mut DiagnosticBag, base_offset: usize, line: usize) -> Self {
        Lexer {
            source,
            diagnostics,
            chars: source.chars().peekable(),
            start_pos: 0,
            current_pos: 0,
            line,
            start_line: line,
            base_offset,
        }
    }

    /// 消费 Lexer 并扫描所有 Token 直到文件末尾。
    /// Consumes the Lexer and scans all tokens until the end of the file.
    pub fn scan_all_tokens(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

/// 解码字符串中的转义序列。未知的转义原样保留转义后的字符（错误已由 lexer 报告）。
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped) => out.push(decode_escape(escaped).unwrap_or(escaped)),
            None => out.push('\\'),
        }
    }
    out
}

fn decode_escape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '0' => Some('\0'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '{' => Some('{'),
        '}' => Some('}'),
        _ => None,
    }
}

/// 字符串内容中是否存在一个未转义、且闭合的 `{...}`。
fn has_interpolation(raw: &str) -> bool {
    let mut chars = raw.chars();
    let mut open = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => open = true,
            '}' if open => return true,
            _ => {}
        }
    }
    false
}

// --- 2. Core Character Logic ---
// --- 2. 底层字符操作逻辑 ---

/// 定义了 Lexer 的核心功能：底层字符操作和位置追踪。
trait LexerCore {
    /// 返回当前字符，但不消费它。
    fn current_char(&mut self) -> char;
    /// 返回下一个字符（前瞻），但不消费它。
    fn peek_char(&mut self) -> char;
    /// 消费当前字符并前进一个位置，遇到换行时递增行号。
    fn advance(&mut self) -> char;
    /// 检查是否已到达源代码的末尾。
    fn is_at_end(&mut self) -> bool;
    /// 当前扫描范围对应的 span（已加上 base_offset）。
    fn current_span(&self) -> Span;
    /// 使用给定的类型、字面量和当前的扫描范围创建一个 Token。
    fn make_token(&mut self, kind: TokenKind, literal: Literal) -> Token;
    /// 检查当前字符是否与预期字符匹配。如果匹配，则消费该字符并返回 `true`。
    fn match_char(&mut self, expected: char) -> bool;
}

impl<'a> LexerCore for Lexer<'a> {
    fn current_char(&mut self) -> char {
        self.chars.peek().cloned().unwrap_or('\0')
    }

    fn peek_char(&mut self) -> char {
        let mut it = self.chars.clone();
        it.next(); // Skip current char
        it.next().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        match self.chars.next() {
            Some(c) => {
                self.current_pos += c.len_utf8();
                if c == '\n' {
                    self.line += 1;
                }
                c
            }
            None => '\0',
        }
    }

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn current_span(&self) -> Span {
        Span::new(self.start_pos, self.current_pos).shifted(self.base_offset)
    }

    fn make_token(&mut self, kind: TokenKind, literal: Literal) -> Token {
        Token {
            kind,
            lexeme: self.source[self.start_pos..self.current_pos].to_string(),
            literal,
            line: self.start_line,
            span: self.current_span(),
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.current_char() != expected {
            false
        } else {
            self.advance();
            true
        }
    }
}

// --- 3. Main Token Scanning Logic ---
// --- 3. 主要词法识别逻辑 ---

/// 定义了高级的 Token 识别逻辑。
trait TokenScanner {
    /// 扫描并返回下一个 Token。出错的字符会被报告并跳过，因此总能返回一个 Token。
    fn scan_token(&mut self) -> Token;
    /// 根据已消费的首字符识别一个 Token；出错时返回 `None`。
    fn scan_kind(&mut self, c: char) -> Option<(TokenKind, Literal)>;
    /// 跳过所有空白字符和 `#` 注释。
    fn skip_whitespace_and_comments(&mut self);
    /// 扫描标识符或关键字。
    fn scan_identifier(&mut self) -> TokenKind;
    /// 扫描数字字面量：整数，或 `.` 后紧跟数字的浮点数。
    fn scan_number(&mut self) -> (TokenKind, Literal);
    /// 扫描字符串字面量（可以跨行）。
    fn scan_string(&mut self) -> Option<(TokenKind, Literal)>;
}

impl<'a> TokenScanner for Lexer<'a> {
    fn scan_token(&mut self) -> Token {
        loop {
            self.skip_whitespace_and_comments();
            self.start_pos = self.current_pos;
            self.start_line = self.line;

            if self.is_at_end() {
                return self.make_token(TokenKind::Eof, Literal::None);
            }

            let c = self.advance();
            if let Some((kind, literal)) = self.scan_kind(c) {
                return self.make_token(kind, literal);
            }
            // 错误已经报告，继续扫描下一个 Token
        }
    }

    fn scan_kind(&mut self, c: char) -> Option<(TokenKind, Literal)> {
        use Operator as Op;
        let op = |o: Operator| Some((TokenKind::Operator(o), Literal::None));
        let punct = |p: Punctuation| Some((TokenKind::Punctuation(p), Literal::None));

        match c {
            // 单字符标点 (Single-character punctuation)
            '(' => punct(Punctuation::LParen),
            ')' => punct(Punctuation::RParen),
            '{' => punct(Punctuation::LBrace),
            '}' => punct(Punctuation::RBrace),
            '[' => punct(Punctuation::LBracket),
            ']' => punct(Punctuation::RBracket),
            ',' => punct(Punctuation::Comma),
            ':' => punct(Punctuation::Colon),
            '~' => op(Op::BitNot),
            '^' => op(Op::BitXor),

            // 贪婪地向前看一个字符 (greedy one-character lookahead)
            '+' => {
                if self.match_char('+') { op(Op::PlusPlus) }
                else if self.match_char('=') { op(Op::PlusEq) }
                else { op(Op::Plus) }
            }
            '-' => {
                if self.match_char('-') { op(Op::MinusMinus) }
                else if self.match_char('=') { op(Op::MinusEq) }
                else { op(Op::Minus) }
            }
            '*' => if self.match_char('=') { op(Op::StarEq) } else { op(Op::Star) },
            '/' => if self.match_char('=') { op(Op::SlashEq) } else { op(Op::Slash) },
            '%' => if self.match_char('=') { op(Op::PercentEq) } else { op(Op::Percent) },
            '=' => if self.match_char('=') { op(Op::Eq) } else { op(Op::Assign) },
            '!' => if self.match_char('=') { op(Op::NotEq) } else { op(Op::Not) },
            '<' => {
                if self.match_char('=') { op(Op::LtEq) }
                else if self.match_char('<') { op(Op::Shl) }
                else { op(Op::Lt) }
            }
            '>' => {
                if self.match_char('=') { op(Op::GtEq) }
                else if self.match_char('>') { op(Op::Shr) }
                else { op(Op::Gt) }
            }
            '&' => if self.match_char('&') { op(Op::AndAnd) } else { op(Op::BitAnd) },
            '|' => if self.match_char('|') { op(Op::OrOr) } else { op(Op::BitOr) },

            // 字面量和标识符 (Literals and identifiers)
            '"' => self.scan_string(),
            c if c.is_ascii_digit() => Some(self.scan_number()),
            c if c.is_ascii_alphabetic() || c == '_' => Some((self.scan_identifier(), Literal::None)),

            // 未知字符 (Unknown character)
            _ => {
                let label = Label::new(self.current_span(), "this character is not recognized");
                self.diagnostics.report_error(
                    &E0000_UNEXPECTED_CHARACTER,
                    format!("Unexpected character: {}", c),
                    label,
                );
                None
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current_char() {
                ' ' | '\r' | '\t' | '\n' if !self.is_at_end() => {
                    self.advance();
                }
                '#' => {
                    while self.current_char() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_identifier(&mut self) -> TokenKind {
        while self.current_char().is_ascii_alphanumeric() || self.current_char() == '_' {
            self.advance();
        }
        let text = &self.source[self.start_pos..self.current_pos];
        Keyword::lookup(text)
            .map(TokenKind::Keyword)
            .unwrap_or(TokenKind::Identifier)
    }

    fn scan_number(&mut self) -> (TokenKind, Literal) {
        while self.current_char().is_ascii_digit() {
            self.advance();
        }

        let is_float = self.current_char() == '.' && self.peek_char().is_ascii_digit();
        if is_float {
            self.advance(); // consume '.'
            while self.current_char().is_ascii_digit() {
                self.advance();
            }
        }

        let text = &self.source[self.start_pos..self.current_pos];
        if is_float {
            // 纯数字加一个小数点的文本总能解析为 f64
            let value = text.parse::<f64>().unwrap_or(0.0);
            return (TokenKind::Number, Literal::Float(value));
        }

        match text.parse::<i64>() {
            Ok(value) => (TokenKind::Number, Literal::Integer(value)),
            Err(_) => {
                let label = Label::new(self.current_span(), "this number is too large to fit in a 64-bit integer");
                self.diagnostics.report_error(&E0003_INVALID_NUMBER, "Invalid number format", label);
                (TokenKind::Number, Literal::Integer(0)) // 错误时返回一个虚拟值
            }
        }
    }

    fn scan_string(&mut self) -> Option<(TokenKind, Literal)> {
        let mut value = String::new();
        while self.current_char() != '"' && !self.is_at_end() {
            let c = self.advance();
            if c != '\\' {
                value.push(c);
                continue;
            }
            if self.is_at_end() {
                break;
            }
            let escaped = self.advance();
            match decode_escape(escaped) {
                Some(decoded) => value.push(decoded),
                None => {
                    let end = self.current_pos;
                    let start = end - '\\'.len_utf8() - escaped.len_utf8();
                    let span = Span::new(start, end).shifted(self.base_offset);
                    let label = Label::new(span, format!("`\\{}` is not a valid escape sequence", escaped));
                    self.diagnostics.report_error(&E0002_INVALID_ESCAPE, "Invalid escape sequence", label);
                    value.push(escaped);
                }
            }
        }

        if self.is_at_end() {
            let label = Label::new(self.current_span(), "string starts here but is never closed");
            self.diagnostics.report_error(&E0001_UNTERMINATED_STRING, "Unterminated string", label);
            return None;
        }
        self.advance(); // 消费结束的双引号

        let raw = &self.source[self.start_pos + 1..self.current_pos - 1];
        if has_interpolation(raw) {
            Some((TokenKind::InterpString, Literal::Text(raw.to_string())))
        } else {
            Some((TokenKind::String, Literal::Text(value)))
        }
    }
}
