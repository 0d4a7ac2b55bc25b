// 导入父模块（也就是 lexer 模块）的所有内容
use super::*;
use crate::diagnostics::DiagnosticBag;

/// 一个辅助函数，用于简化测试：返回 Token 列表和收集到的诊断信息。
fn lex_source(source: &str) -> (Vec<Token>, DiagnosticBag) {
    let mut diagnostics = DiagnosticBag::new(source, "<test>");
    let tokens = lex(source, &mut diagnostics);
    (tokens, diagnostics)
}

/// 只关心 Token 的种类和顺序时使用，并断言没有任何错误。
fn lex_kinds(source: &str) -> Vec<TokenKind> {
    let (tokens, diagnostics) = lex_source(source);
    assert!(!diagnostics.has_errors(), "unexpected lexer errors: {}", diagnostics.format_plain());
    tokens.into_iter().map(|t| t.kind).collect()
}

fn op(o: Operator) -> TokenKind {
    TokenKind::Operator(o)
}

fn punct(p: Punctuation) -> TokenKind {
    TokenKind::Punctuation(p)
}

// --- 成功案例 (Happy Path) ---

#[test]
fn test_single_char_punctuation() {
    let kinds = lex_kinds("( ) { } , : ~ ^");
    assert_eq!(
        kinds,
        vec![
            punct(Punctuation::LParen),
            punct(Punctuation::RParen),
            punct(Punctuation::LBrace),
            punct(Punctuation::RBrace),
            punct(Punctuation::Comma),
            punct(Punctuation::Colon),
            op(Operator::BitNot),
            op(Operator::BitXor),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_brackets_and_indexing() {
    let kinds = lex_kinds("[] [1] arr[2]");
    assert_eq!(
        kinds,
        vec![
            punct(Punctuation::LBracket),
            punct(Punctuation::RBracket),
            punct(Punctuation::LBracket),
            TokenKind::Number,
            punct(Punctuation::RBracket),
            TokenKind::Identifier,
            punct(Punctuation::LBracket),
            TokenKind::Number,
            punct(Punctuation::RBracket),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_all_operators() {
    let kinds = lex_kinds("+ - * / % = == != < <= > >= && || ! & |");
    use Operator::*;
    let expected: Vec<TokenKind> = [
        Plus, Minus, Star, Slash, Percent, Assign, Eq, NotEq, Lt, LtEq, Gt, GtEq, AndAnd, OrOr, Not, BitAnd,
        BitOr,
    ]
    .into_iter()
    .map(op)
    .chain(std::iter::once(TokenKind::Eof))
    .collect();
    assert_eq!(kinds, expected);
}

#[test]
fn test_greedy_multi_char_operators() {
    let kinds = lex_kinds("+= -= *= /= %= ++ -- << >>");
    use Operator::*;
    let expected: Vec<TokenKind> = [PlusEq, MinusEq, StarEq, SlashEq, PercentEq, PlusPlus, MinusMinus, Shl, Shr]
        .into_iter()
        .map(op)
        .chain(std::iter::once(TokenKind::Eof))
        .collect();
    assert_eq!(kinds, expected);
}

#[test]
fn test_adjacent_operators_without_spaces() {
    // `x+++y` 贪婪匹配为 `x ++ + y`
    let kinds = lex_kinds("x+++y");
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            op(Operator::PlusPlus),
            op(Operator::Plus),
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_integer_and_float_literals() {
    let (tokens, diagnostics) = lex_source("42 3.14 0 100.5 9223372036854775807");
    assert!(!diagnostics.has_errors());
    assert_eq!(tokens[0].literal, Literal::Integer(42));
    assert_eq!(tokens[1].literal, Literal::Float(3.14));
    assert_eq!(tokens[2].literal, Literal::Integer(0));
    assert_eq!(tokens[3].literal, Literal::Float(100.5));
    assert_eq!(tokens[4].literal, Literal::Integer(i64::MAX));
    assert!(tokens[..5].iter().all(|t| t.kind == TokenKind::Number));
}

#[test]
fn test_dot_without_digit_is_not_a_float() {
    // `.` 后面不是数字：`7` 是整数，`.` 是无法识别的字符
    let (tokens, diagnostics) = lex_source("7.x");
    assert_eq!(tokens[0].literal, Literal::Integer(7));
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(diagnostics.error_count(), 1);
}

#[test]
fn test_keywords() {
    let kinds = lex_kinds(
        "fr say lowkey midkey highkey goon vibe send ongod cap nah skip mog edge simp stan ghost yeet caught",
    );
    use Keyword::*;
    let expected: Vec<TokenKind> = [
        Fr, Say, Lowkey, Midkey, Highkey, Goon, Vibe, Send, Ongod, Cap, Nah, Skip, Mog, Edge, Simp, Stan, Ghost,
        Yeet, Caught,
    ]
    .into_iter()
    .map(TokenKind::Keyword)
    .chain(std::iter::once(TokenKind::Eof))
    .collect();
    assert_eq!(kinds, expected);
}

#[test]
fn test_identifiers_that_contain_keywords() {
    let (tokens, _) = lex_source("frx _tmp say2 my_var");
    assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Identifier));
    assert_eq!(tokens[0].lexeme, "frx");
    assert_eq!(tokens[1].lexeme, "_tmp");
    assert_eq!(tokens[3].lexeme, "my_var");
}

#[test]
fn test_string_literals() {
    let (tokens, diagnostics) = lex_source(r#""hello" "" "two words""#);
    assert!(!diagnostics.has_errors());
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].literal, Literal::Text("hello".to_string()));
    assert_eq!(tokens[0].lexeme, "\"hello\"");
    assert_eq!(tokens[1].literal, Literal::Text(String::new()));
    assert_eq!(tokens[2].literal, Literal::Text("two words".to_string()));
}

#[test]
fn test_escape_sequences_are_decoded() {
    let (tokens, diagnostics) = lex_source(r#""a\tb\n\"q\"\\""#);
    assert!(!diagnostics.has_errors());
    assert_eq!(tokens[0].literal, Literal::Text("a\tb\n\"q\"\\".to_string()));
}

#[test]
fn test_interpolated_string_is_tagged_with_raw_text() {
    let (tokens, diagnostics) = lex_source(r#""hi {name}\n""#);
    assert!(!diagnostics.has_errors());
    assert_eq!(tokens[0].kind, TokenKind::InterpString);
    assert_eq!(tokens[0].literal, Literal::Text("hi {name}\\n".to_string()));
}

#[test]
fn test_unbalanced_or_escaped_braces_stay_plain() {
    let (tokens, _) = lex_source(r#""just { one" "\{x\}""#);
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[1].kind, TokenKind::String);
    assert_eq!(tokens[1].literal, Literal::Text("{x}".to_string()));
}

#[test]
fn test_comments_and_whitespace_are_skipped() {
    let source = "# a comment\nfr x = 1 # trailing\n# end";
    let kinds = lex_kinds(source);
    assert_eq!(
        kinds,
        vec![
            TokenKind::Keyword(Keyword::Fr),
            TokenKind::Identifier,
            op(Operator::Assign),
            TokenKind::Number,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_line_numbers_advance_on_newlines() {
    let (tokens, _) = lex_source("fr a = 1\n\nsay a");
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[4].line, 3); // say
    assert_eq!(tokens[5].line, 3); // a
}

#[test]
fn test_multiline_string_advances_line_counter() {
    let (tokens, diagnostics) = lex_source("say \"one\ntwo\nthree\" x");
    assert!(!diagnostics.has_errors());
    assert_eq!(tokens[1].literal, Literal::Text("one\ntwo\nthree".to_string()));
    assert_eq!(tokens[2].lexeme, "x");
    assert_eq!(tokens[2].line, 3);
}

#[test]
fn test_spans_cover_lexemes() {
    let source = "fr count = 10";
    let (tokens, _) = lex_source(source);
    for token in &tokens[..4] {
        assert_eq!(&source[token.span.into_range()], token.lexeme);
    }
    assert_eq!(tokens[4].span.start, source.len());
}

#[test]
fn test_punctuation_lexemes_round_trip() {
    let source = "(){}[],:~^";
    let (tokens, diagnostics) = lex_source(source);
    assert!(!diagnostics.has_errors());
    let rebuilt: String = tokens.iter().map(|t| t.lexeme.as_str()).collect();
    assert_eq!(rebuilt, source);
    assert_eq!(tokens.len(), source.len() + 1);
}

#[test]
fn test_token_display_format() {
    let (tokens, _) = lex_source("fr x = 5");
    assert_eq!(tokens[0].to_string(), "[FR 'fr' L1]");
    assert_eq!(tokens[3].to_string(), "[NUMBER '5' L1 = 5]");
}

// --- 失败案例 (Sad Path) ---
// 出错后扫描必须继续。

#[test]
fn test_unexpected_character_is_reported_and_skipped() {
    let (tokens, diagnostics) = lex_source("fr @ x $");
    assert_eq!(diagnostics.error_count(), 2);
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TokenKind::Keyword(Keyword::Fr), TokenKind::Identifier, TokenKind::Eof]);

    let first = diagnostics.iter().next().unwrap();
    assert_eq!(first.code(), "E0000");
    assert_eq!(first.message(), "Unexpected character: @");
    assert_eq!(first.line(), 1);
}

#[test]
fn test_unterminated_string() {
    let (tokens, diagnostics) = lex_source("say 1\nsay \"never closed");
    assert_eq!(diagnostics.error_count(), 1);
    let error = diagnostics.iter().next().unwrap();
    assert_eq!(error.code(), "E0001");
    assert_eq!(error.line(), 2);
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
}

#[test]
fn test_invalid_escape_keeps_scanning() {
    let (tokens, diagnostics) = lex_source(r#""bad \q" fr"#);
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(diagnostics.iter().next().unwrap().code(), "E0002");
    assert_eq!(tokens[0].literal, Literal::Text("bad q".to_string()));
    assert_eq!(tokens[1].kind, TokenKind::Keyword(Keyword::Fr));
}

#[test]
fn test_integer_overflow() {
    let (tokens, diagnostics) = lex_source("99999999999999999999");
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(diagnostics.iter().next().unwrap().code(), "E0003");
    assert_eq!(tokens[0].kind, TokenKind::Number);
}

#[test]
fn test_unescape_helper() {
    assert_eq!(unescape(r"a\nb"), "a\nb");
    assert_eq!(unescape(r"\{x\}"), "{x}");
    assert_eq!(unescape(r"keep\q"), "keepq");
}
