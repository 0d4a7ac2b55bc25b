use crate::utils::Span;
use std::fmt::{Display, Formatter, Result};

/// 主体 Token 定义：种类、原始文本、字面量值、行号以及在源代码中的位置。
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 源代码中的原始切片。
    pub lexeme: String,
    pub literal: Literal,
    /// 从 1 开始，只在遇到 `\n` 时递增（包括多行字符串内部的换行）。
    pub line: usize,
    pub span: Span,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl Display for Token {
    /// `--tokens` 使用的调试格式，例如 `[NUMBER '5' L1 = 5]`。
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "[{} '{}' L{}", self.kind.label(), self.lexeme, self.line)?;
        match &self.literal {
            Literal::None => {}
            Literal::Text(s) => write!(f, " = \"{}\"", s)?,
            other => write!(f, " = {}", other)?,
        }
        write!(f, "]")
    }
}

/// Sigma 语言中所有可能的词法单元。
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    /// 文件结束标志。
    Eof,
    Identifier,
    /// 数字字面量，值保存在 `Token::literal` 中。
    Number,
    String,
    /// 含有 `{...}` 的字符串，`literal` 中保存未解码的原始内容，由 parser 再次扫描。
    InterpString,
    Keyword(Keyword),
    Operator(Operator),
    Punctuation(Punctuation),
}

impl TokenKind {
    /// 一个用于错误报告的简单字符串表示。
    pub fn to_string_for_error(&self) -> String {
        match self {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Identifier => "an identifier".to_string(),
            TokenKind::Number => "a number literal".to_string(),
            TokenKind::String | TokenKind::InterpString => "a string literal".to_string(),
            TokenKind::Keyword(k) => format!("keyword `{}`", k),
            TokenKind::Operator(o) => format!("operator `{}`", o),
            TokenKind::Punctuation(p) => format!("`{}`", p),
        }
    }

    fn label(&self) -> String {
        match self {
            TokenKind::Eof => "EOF".to_string(),
            TokenKind::Identifier => "IDENTIFIER".to_string(),
            TokenKind::Number => "NUMBER".to_string(),
            TokenKind::String => "STRING".to_string(),
            TokenKind::InterpString => "INTERP_STRING".to_string(),
            TokenKind::Keyword(k) => k.to_string().to_uppercase(),
            TokenKind::Operator(_) => "OPERATOR".to_string(),
            TokenKind::Punctuation(_) => "PUNCTUATION".to_string(),
        }
    }
}

/// Sigma 的关键字。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Keyword {
    Fr,      // 变量声明
    Say,     // print
    Lowkey,  // if
    Midkey,  // else if
    Highkey, // else
    Goon,    // while
    Vibe,    // 函数定义
    Send,    // return
    Ongod,   // true
    Cap,     // false
    Nah,     // null
    Skip,    // continue
    Mog,     // break
    Edge,    // for
    Simp,    // switch
    Stan,    // case
    Ghost,   // default
    Yeet,    // try
    Caught,  // catch
}

impl Keyword {
    /// 尝试将一个字符串切片转换为一个关键字。
    pub fn lookup(s: &str) -> Option<Keyword> {
        let kw = match s {
            "fr" => Keyword::Fr,
            "say" => Keyword::Say,
            "lowkey" => Keyword::Lowkey,
            "midkey" => Keyword::Midkey,
            "highkey" => Keyword::Highkey,
            "goon" => Keyword::Goon,
            "vibe" => Keyword::Vibe,
            "send" => Keyword::Send,
            "ongod" => Keyword::Ongod,
            "cap" => Keyword::Cap,
            "nah" => Keyword::Nah,
            "skip" => Keyword::Skip,
            "mog" => Keyword::Mog,
            "edge" => Keyword::Edge,
            "simp" => Keyword::Simp,
            "stan" => Keyword::Stan,
            "ghost" => Keyword::Ghost,
            "yeet" => Keyword::Yeet,
            "caught" => Keyword::Caught,
            _ => return None,
        };
        Some(kw)
    }

    /// 可以开始一条语句的关键字，panic-mode 恢复时会停在这里。
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            Keyword::Fr
                | Keyword::Say
                | Keyword::Lowkey
                | Keyword::Goon
                | Keyword::Edge
                | Keyword::Vibe
                | Keyword::Send
                | Keyword::Mog
                | Keyword::Skip
                | Keyword::Simp
                | Keyword::Yeet
        )
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let s = match self {
            Keyword::Fr => "fr",
            Keyword::Say => "say",
            Keyword::Lowkey => "lowkey",
            Keyword::Midkey => "midkey",
            Keyword::Highkey => "highkey",
            Keyword::Goon => "goon",
            Keyword::Vibe => "vibe",
            Keyword::Send => "send",
            Keyword::Ongod => "ongod",
            Keyword::Cap => "cap",
            Keyword::Nah => "nah",
            Keyword::Skip => "skip",
            Keyword::Mog => "mog",
            Keyword::Edge => "edge",
            Keyword::Simp => "simp",
            Keyword::Stan => "stan",
            Keyword::Ghost => "ghost",
            Keyword::Yeet => "yeet",
            Keyword::Caught => "caught",
        };
        write!(f, "{}", s)
    }
}

/// 字面量的值。
#[derive(Debug, PartialEq, Clone, Default)]
pub enum Literal {
    #[default]
    None,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Literal::None => write!(f, "none"),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// 运算符。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Operator {
    // Arithmetic
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %

    // Increment / decrement
    PlusPlus,   // ++
    MinusMinus, // --

    // Assignment
    Assign,    // =
    PlusEq,    // +=
    MinusEq,   // -=
    StarEq,    // *=
    SlashEq,   // /=
    PercentEq, // %=

    // Comparison
    Eq,    // ==
    NotEq, // !=
    Lt,    // <
    Gt,    // >
    LtEq,  // <=
    GtEq,  // >=

    // Logical
    AndAnd, // &&
    OrOr,   // ||
    Not,    // !

    // Bitwise
    BitAnd, // &
    BitOr,  // |
    BitXor, // ^
    BitNot, // ~
    Shl,    // <<
    Shr,    // >>
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let s = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Percent => "%",
            Operator::PlusPlus => "++",
            Operator::MinusMinus => "--",
            Operator::Assign => "=",
            Operator::PlusEq => "+=",
            Operator::MinusEq => "-=",
            Operator::StarEq => "*=",
            Operator::SlashEq => "/=",
            Operator::PercentEq => "%=",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::LtEq => "<=",
            Operator::GtEq => ">=",
            Operator::AndAnd => "&&",
            Operator::OrOr => "||",
            Operator::Not => "!",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitNot => "~",
            Operator::Shl => "<<",
            Operator::Shr => ">>",
        };
        write!(f, "{}", s)
    }
}

/// 分隔符与标点。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Punctuation {
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Colon,    // :
}

impl Display for Punctuation {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let s = match self {
            Punctuation::LParen => "(",
            Punctuation::RParen => ")",
            Punctuation::LBrace => "{",
            Punctuation::RBrace => "}",
            Punctuation::LBracket => "[",
            Punctuation::RBracket => "]",
            Punctuation::Comma => ",",
            Punctuation::Colon => ":",
        };
        write!(f, "{}", s)
    }
}
