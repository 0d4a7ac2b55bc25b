//! Sigma 语言的解析器实现。
//! 语句采用递归下降，表达式采用普拉特解析（binding power），
//! 将 Token 流转换为抽象语法树 (AST)。

use super::ast::*;
use super::interp;
use crate::diagnostics::codes::{
    ErrorCode, E0100_SYNTAX_ERROR, E0101_EXPECTED_EXPRESSION, E0102_INVALID_ASSIGNMENT_TARGET,
    E0103_TOO_MANY_ITEMS, E0104_MALFORMED_INTERPOLATION, E0105_DUPLICATE_DEFAULT,
};
use crate::diagnostics::{Diagnostic, DiagnosticBag, Label};
use crate::lexer::*;
use crate::utils::Span;

/// 参数与实参的数量上限。
const MAX_ITEMS: usize = 255;

// --- 1. 主解析器结构体 ---

/// 解析器结构体，持有解析过程所需的全部状态。
pub struct Parser<'a> {
    /// 从 Lexer 获取的 Token 流的引用，最后一个总是 `Eof`。
    tokens: &'a [Token],
    /// 诊断信息收集器，用于报告所有解析错误。
    diagnostics: &'a mut DiagnosticBag,
    /// 指向当前待处理 Token 的指针（在 tokens 切片中的索引）。
    current: usize,
}

// --- 2. Trait 定义：用于组织解析逻辑 ---

/// `Parse` Trait 是解析器的总入口。
pub trait Parse {
    /// 消耗解析器并启动整个解析过程，最终生成一个 `Program` AST 节点。
    fn parse(self) -> Program;
}

/// `DeclarationParser` Trait 负责解析 `fr` 与 `vibe` 声明。
trait DeclarationParser {
    /// 解析一个声明或普通语句。
    fn parse_declaration(&mut self) -> Result<Node<Statement>, ()>;
    fn parse_variable_declaration(&mut self) -> Result<Node<VarDeclaration>, ()>;
    fn parse_function_definition(&mut self) -> Result<Node<FunctionDefinition>, ()>;
    fn parse_parameter_list(&mut self) -> Result<Vec<Identifier>, ()>;
}

/// `StatementParser` Trait 负责解析各类语句。
trait StatementParser {
    fn parse_statement(&mut self) -> Result<Node<Statement>, ()>;
    fn parse_print_statement(&mut self) -> Result<Node<Statement>, ()>;
    /// `lowkey`，包括后面的 `midkey` 与 `highkey` 分支。
    fn parse_if_statement(&mut self) -> Result<Node<IfStatement>, ()>;
    fn parse_while_statement(&mut self) -> Result<Node<WhileStatement>, ()>;
    fn parse_for_statement(&mut self) -> Result<Node<ForStatement>, ()>;
    fn parse_return_statement(&mut self) -> Result<Node<ReturnStatement>, ()>;
    fn parse_switch_statement(&mut self) -> Result<Node<SwitchStatement>, ()>;
    /// `stan` 后面的字面量，允许带负号的数字。
    fn parse_case_value(&mut self) -> Result<Node<LiteralValue>, ()>;
    fn parse_try_catch_statement(&mut self) -> Result<Node<TryCatchStatement>, ()>;
    /// 解析一个 `{...}` 代码块，`open_message` 是缺少 `{` 时的错误信息。
    fn parse_block_statement(&mut self, open_message: &str) -> Result<Node<BlockStatement>, ()>;
}

/// `ExpressionParser` Trait 负责解析各类表达式（使用普拉特解析）。
trait ExpressionParser {
    /// 解析表达式的主入口（普拉特解析）。
    fn parse_expression(&mut self, min_bp: u8) -> Result<Node<Expression>, ()>;
    /// 解析前缀表达式（例如 `-x`, `!flag`, `++i`）。
    fn parse_prefix_expression(&mut self) -> Result<Node<Expression>, ()>;
    /// 解析中缀表达式（例如 `a + b`, `x += 1`）。
    fn parse_infix_expression(&mut self, left: Node<Expression>, r_bp: u8) -> Result<Node<Expression>, ()>;
    /// 解析后缀表达式（函数调用 `f()`、下标 `a[i]`、`i++`）。
    fn parse_postfix_expression(&mut self, left: Node<Expression>) -> Result<Node<Expression>, ()>;
    /// 把 `=` 的左边变成赋值目标。
    fn finish_assignment(&mut self, target: Node<Expression>, value: Node<Expression>, op_token: &Token) -> Node<Expression>;
    /// 解析原子表达式（字面量、标识符、括号表达式、数组字面量、插值字符串）。
    fn parse_atom(&mut self) -> Result<Node<Expression>, ()>;
    fn parse_array_literal(&mut self) -> Result<Node<Expression>, ()>;
    /// 解析函数调用的参数列表。
    fn parse_call_arguments(&mut self) -> Result<Vec<Node<Expression>>, ()>;
}

/// `Util` Trait 提供了解析过程中常用的一系列辅助函数。
trait Util {
    // --- Token 流操作 ---
    fn peek(&self) -> &Token;
    fn previous(&self) -> &Token;
    fn is_at_end(&self) -> bool;
    fn advance(&mut self) -> &Token;
    fn check(&self, kind: &TokenKind) -> bool;
    fn match_token(&mut self, kind: &TokenKind) -> bool;
    /// 消费一个指定类型的 Token，如果不是预期类型则报告错误。
    fn consume(&mut self, kind: &TokenKind, message: &str) -> Result<&Token, ()>;
    fn consume_identifier(&mut self, message: &str) -> Result<Identifier, ()>;

    // --- 错误报告与恢复 ---
    /// 以 `at 'lexeme': message` 的形式报告一个语法错误。
    fn error_at(&mut self, token: &Token, code: &'static ErrorCode, message: &str, label: &str);
    /// 同步，用于错误恢复：丢弃 Token 直到下一条语句的开头。
    fn synchronize(&mut self);

    // --- 普拉特解析辅助函数 ---
    fn prefix_binding_power(kind: &TokenKind) -> Option<((), u8)>;
    fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)>;
    fn postfix_binding_power(kind: &TokenKind) -> Option<(u8, ())>;
}

fn keyword(k: Keyword) -> TokenKind {
    TokenKind::Keyword(k)
}

fn punct(p: Punctuation) -> TokenKind {
    TokenKind::Punctuation(p)
}

// --- 3. 基础实现 ---

impl<'a> Parser<'a> {
    /// 创建一个新的解析器实例。`tokens` 必须以 `Eof` 结尾。
    pub fn new(tokens: &'a [Token], diagnostics: &'a mut DiagnosticBag) -> Self {
        Parser {
            tokens,
            diagnostics,
            current: 0,
        }
    }

    /// 解析插值字符串中 `{...}` 里的单个表达式，要求表达式之后就是结尾。
    pub(super) fn parse_embedded_expression(&mut self) -> Result<Node<Expression>, ()> {
        let expr = self.parse_expression(0)?;
        if !self.is_at_end() {
            let token = self.peek().clone();
            self.error_at(
                &token,
                &E0104_MALFORMED_INTERPOLATION,
                "Expected '}' after interpolated expression.",
                "only one expression is allowed inside `{...}`",
            );
            return Err(());
        }
        Ok(expr)
    }
}

impl<'a> Parse for Parser<'a> {
    fn parse(mut self) -> Program {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.parse_declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(_) => self.synchronize(),
            }
        }
        Program { statements }
    }
}

impl<'a> DeclarationParser for Parser<'a> {
    fn parse_declaration(&mut self) -> Result<Node<Statement>, ()> {
        match self.peek().kind {
            TokenKind::Keyword(Keyword::Fr) => self
                .parse_variable_declaration()
                .map(|n| n.map(Statement::VarDeclaration)),
            TokenKind::Keyword(Keyword::Vibe) => self
                .parse_function_definition()
                .map(|n| n.map(Statement::Function)),
            _ => self.parse_statement(),
        }
    }

    /// `fr name = expr`，初始化表达式是必须的。
    fn parse_variable_declaration(&mut self) -> Result<Node<VarDeclaration>, ()> {
        let start_span = self.consume(&keyword(Keyword::Fr), "Expected 'fr'.")?.span;
        let name = self.consume_identifier("Expected variable name after 'fr'.")?;
        self.consume(&TokenKind::Operator(Operator::Assign), "Expected '=' after variable name.")?;
        let initializer = self.parse_expression(0)?;
        let span = start_span.to(initializer.span);

        Ok(Node::new(VarDeclaration { name, initializer }, span))
    }

    /// `vibe name(a, b) { ... }`
    fn parse_function_definition(&mut self) -> Result<Node<FunctionDefinition>, ()> {
        let start_span = self.consume(&keyword(Keyword::Vibe), "Expected 'vibe'.")?.span;
        let name = self.consume_identifier("Expected function name after 'vibe'.")?;

        self.consume(&punct(Punctuation::LParen), "Expected '(' after function name.")?;
        let params = self.parse_parameter_list()?;
        self.consume(&punct(Punctuation::RParen), "Expected ')' after parameters.")?;

        let body = self.parse_block_statement("Expected '{' before function body.")?;
        let span = start_span.to(body.span);

        Ok(Node::new(FunctionDefinition { name, params, body }, span))
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<Identifier>, ()> {
        let mut params = Vec::new();
        if self.check(&punct(Punctuation::RParen)) {
            return Ok(params);
        }

        loop {
            if params.len() >= MAX_ITEMS {
                // 只报告，不中断解析
                let token = self.peek().clone();
                self.error_at(
                    &token,
                    &E0103_TOO_MANY_ITEMS,
                    "Cannot have more than 255 parameters.",
                    "parameter limit exceeded here",
                );
            }
            params.push(self.consume_identifier("Expected parameter name.")?);
            if !self.match_token(&punct(Punctuation::Comma)) {
                break;
            }
        }

        Ok(params)
    }
}

impl<'a> StatementParser for Parser<'a> {
    /// 根据第一个 Token 分发到具体的语句解析函数。
    fn parse_statement(&mut self) -> Result<Node<Statement>, ()> {
        match self.peek().kind {
            TokenKind::Keyword(Keyword::Say) => self.parse_print_statement(),
            TokenKind::Keyword(Keyword::Lowkey) => self.parse_if_statement().map(|n| n.map(Statement::If)),
            TokenKind::Keyword(Keyword::Goon) => self.parse_while_statement().map(|n| n.map(Statement::While)),
            TokenKind::Keyword(Keyword::Edge) => self.parse_for_statement().map(|n| n.map(Statement::For)),
            TokenKind::Keyword(Keyword::Send) => self.parse_return_statement().map(|n| n.map(Statement::Return)),
            TokenKind::Keyword(Keyword::Simp) => self.parse_switch_statement().map(|n| n.map(Statement::Switch)),
            TokenKind::Keyword(Keyword::Yeet) => self
                .parse_try_catch_statement()
                .map(|n| n.map(Statement::TryCatch)),
            TokenKind::Keyword(Keyword::Mog) => {
                let span = self.advance().span;
                Ok(Node::new(Statement::Break, span))
            }
            TokenKind::Keyword(Keyword::Skip) => {
                let span = self.advance().span;
                Ok(Node::new(Statement::Continue, span))
            }
            TokenKind::Punctuation(Punctuation::LBrace) => self
                .parse_block_statement("Expected '{' before block.")
                .map(|n| n.map(Statement::Block)),
            // 如果以上都不是，那么它只能是一个表达式语句
            _ => {
                let expr = self.parse_expression(0)?;
                let span = expr.span;
                Ok(Node::new(Statement::Expression(expr), span))
            }
        }
    }

    fn parse_print_statement(&mut self) -> Result<Node<Statement>, ()> {
        let start_span = self.consume(&keyword(Keyword::Say), "Expected 'say'.")?.span;
        let value = self.parse_expression(0)?;
        let span = start_span.to(value.span);
        Ok(Node::new(Statement::Print(value), span))
    }

    fn parse_if_statement(&mut self) -> Result<Node<IfStatement>, ()> {
        let start_span = self.consume(&keyword(Keyword::Lowkey), "Expected 'lowkey'.")?.span;
        let condition = self.parse_expression(0)?;
        let then_branch = self.parse_block_statement("Expected '{' before 'lowkey' body.")?;
        let mut end_span = then_branch.span;
        let mut statement = IfStatement {
            condition,
            then_branch,
            else_branch: None,
        };

        // 任意多个 `midkey`，依次挂到 else 链上第一个空位
        while self.check(&keyword(Keyword::Midkey)) {
            let midkey_span = self.advance().span;
            let condition = self.parse_expression(0)?;
            let then_branch = self.parse_block_statement("Expected '{' before 'midkey' body.")?;
            end_span = then_branch.span;
            let branch = IfStatement {
                condition,
                then_branch,
                else_branch: None,
            };
            statement.attach_else(Node::new(Statement::If(branch), midkey_span.to(end_span)));
        }

        if self.match_token(&keyword(Keyword::Highkey)) {
            // `highkey lowkey ...` 与 `midkey` 等价
            let branch = if self.check(&keyword(Keyword::Lowkey)) {
                self.parse_if_statement()?.map(Statement::If)
            } else {
                self.parse_block_statement("Expected '{' before 'highkey' body.")?
                    .map(Statement::Block)
            };
            end_span = branch.span;
            statement.attach_else(branch);
        }

        Ok(Node::new(statement, start_span.to(end_span)))
    }

    fn parse_while_statement(&mut self) -> Result<Node<WhileStatement>, ()> {
        let start_span = self.consume(&keyword(Keyword::Goon), "Expected 'goon'.")?.span;
        let condition = self.parse_expression(0)?;
        let body = self.parse_block_statement("Expected '{' before 'goon' body.")?;
        let span = start_span.to(body.span);

        Ok(Node::new(WhileStatement { condition, body }, span))
    }

    /// `edge (init, cond, incr) { ... }`，三个子句都可以为空。
    fn parse_for_statement(&mut self) -> Result<Node<ForStatement>, ()> {
        let start_span = self.consume(&keyword(Keyword::Edge), "Expected 'edge'.")?.span;
        self.consume(&punct(Punctuation::LParen), "Expected '(' after 'edge'.")?;

        let initializer = if self.check(&keyword(Keyword::Fr)) {
            let decl = self.parse_variable_declaration()?;
            Some(Box::new(decl.map(Statement::VarDeclaration)))
        } else if !self.check(&punct(Punctuation::Comma)) {
            let expr = self.parse_expression(0)?;
            let span = expr.span;
            Some(Box::new(Node::new(Statement::Expression(expr), span)))
        } else {
            None
        };
        self.consume(&punct(Punctuation::Comma), "Expected ',' after loop initializer.")?;

        let condition = if !self.check(&punct(Punctuation::Comma)) {
            Some(self.parse_expression(0)?)
        } else {
            None
        };
        self.consume(&punct(Punctuation::Comma), "Expected ',' after loop condition.")?;

        let increment = if !self.check(&punct(Punctuation::RParen)) {
            Some(self.parse_expression(0)?)
        } else {
            None
        };
        self.consume(&punct(Punctuation::RParen), "Expected ')' after 'edge' clauses.")?;

        let body = self.parse_block_statement("Expected '{' before 'edge' body.")?;
        let span = start_span.to(body.span);

        Ok(Node::new(
            ForStatement {
                initializer,
                condition,
                increment,
                body,
            },
            span,
        ))
    }

    /// `send` 或 `send expr`。后面紧跟 `}`、文件末尾或新语句的关键字时没有返回值。
    fn parse_return_statement(&mut self) -> Result<Node<ReturnStatement>, ()> {
        let start_span = self.consume(&keyword(Keyword::Send), "Expected 'send'.")?.span;

        let no_value = self.is_at_end()
            || self.check(&punct(Punctuation::RBrace))
            || matches!(self.peek().kind, TokenKind::Keyword(k) if k.starts_statement());
        let value = if no_value { None } else { Some(self.parse_expression(0)?) };

        let end_span = value.as_ref().map_or(start_span, |v| v.span);
        Ok(Node::new(ReturnStatement { value }, start_span.to(end_span)))
    }

    /// `simp expr { stan 1: ... ghost: ... }`
    fn parse_switch_statement(&mut self) -> Result<Node<SwitchStatement>, ()> {
        let start_span = self.consume(&keyword(Keyword::Simp), "Expected 'simp'.")?.span;
        let scrutinee = self.parse_expression(0)?;
        self.consume(&punct(Punctuation::LBrace), "Expected '{' after 'simp' value.")?;

        let mut cases = Vec::new();
        let mut first_default: Option<Span> = None;
        while !self.check(&punct(Punctuation::RBrace)) && !self.is_at_end() {
            let case_token = self.peek().clone();
            let value = if self.match_token(&keyword(Keyword::Stan)) {
                Some(self.parse_case_value()?)
            } else if self.match_token(&keyword(Keyword::Ghost)) {
                match first_default {
                    Some(first) => {
                        let diagnostic = Diagnostic::error(
                            &E0105_DUPLICATE_DEFAULT,
                            Label::new(case_token.span, "second `ghost` here"),
                        )
                        .with_dynamic_message("at 'ghost': A 'simp' can only have one 'ghost' case.")
                        .with_secondary_label(Label::new(first, "first `ghost` here"));
                        self.diagnostics.report(diagnostic);
                    }
                    None => first_default = Some(case_token.span),
                }
                None
            } else {
                self.error_at(
                    &case_token,
                    &E0100_SYNTAX_ERROR,
                    "Expected 'stan' or 'ghost' inside 'simp'.",
                    "every case starts with `stan <value>:` or `ghost:`",
                );
                return Err(());
            };
            self.consume(&punct(Punctuation::Colon), "Expected ':' after case label.")?;

            let mut body = Vec::new();
            while !self.check(&keyword(Keyword::Stan))
                && !self.check(&keyword(Keyword::Ghost))
                && !self.check(&punct(Punctuation::RBrace))
                && !self.is_at_end()
            {
                match self.parse_declaration() {
                    Ok(stmt) => body.push(stmt),
                    Err(_) => {
                        if !self.check(&punct(Punctuation::RBrace)) {
                            self.synchronize();
                        }
                    }
                }
            }

            let end_span = self.previous().span;
            cases.push(Node::new(SwitchCase { value, body }, case_token.span.to(end_span)));
        }

        let end_span = self.consume(&punct(Punctuation::RBrace), "Expected '}' after 'simp' body.")?.span;
        Ok(Node::new(SwitchStatement { scrutinee, cases }, start_span.to(end_span)))
    }

    fn parse_case_value(&mut self) -> Result<Node<LiteralValue>, ()> {
        let negative = self.match_token(&TokenKind::Operator(Operator::Minus));
        let start_span = if negative { self.previous().span } else { self.peek().span };
        let token = self.peek().clone();

        let value = match (token.kind, literal_value(&token)) {
            (TokenKind::Number, LiteralValue::Integer(i)) if negative => LiteralValue::Integer(-i),
            (TokenKind::Number, LiteralValue::Float(x)) if negative => LiteralValue::Float(-x),
            (TokenKind::Number, value) => value,
            (TokenKind::String, value) if !negative => value,
            (TokenKind::Keyword(Keyword::Ongod), _) if !negative => LiteralValue::Bool(true),
            (TokenKind::Keyword(Keyword::Cap), _) if !negative => LiteralValue::Bool(false),
            (TokenKind::Keyword(Keyword::Nah), _) if !negative => LiteralValue::Null,
            _ => {
                self.error_at(
                    &token,
                    &E0100_SYNTAX_ERROR,
                    "Expected a literal after 'stan'.",
                    "case values must be numbers, strings, `ongod`, `cap` or `nah`",
                );
                return Err(());
            }
        };
        self.advance();

        Ok(Node::new(value, start_span.to(token.span)))
    }

    fn parse_try_catch_statement(&mut self) -> Result<Node<TryCatchStatement>, ()> {
        let start_span = self.consume(&keyword(Keyword::Yeet), "Expected 'yeet'.")?.span;
        let try_block = self.parse_block_statement("Expected '{' after 'yeet'.")?;
        self.consume(&keyword(Keyword::Caught), "Expected 'caught' after 'yeet' block.")?;
        let catch_block = self.parse_block_statement("Expected '{' after 'caught'.")?;
        let span = start_span.to(catch_block.span);

        Ok(Node::new(TryCatchStatement { try_block, catch_block }, span))
    }

    fn parse_block_statement(&mut self, open_message: &str) -> Result<Node<BlockStatement>, ()> {
        let start_span = self.consume(&punct(Punctuation::LBrace), open_message)?.span;

        let mut statements = Vec::new();
        while !self.check(&punct(Punctuation::RBrace)) && !self.is_at_end() {
            match self.parse_declaration() {
                Ok(stmt) => statements.push(stmt),
                // 出错的 Token 是 `}` 时留给下面的 consume
                Err(_) => {
                    if !self.check(&punct(Punctuation::RBrace)) {
                        self.synchronize();
                    }
                }
            }
        }

        let end_span = self.consume(&punct(Punctuation::RBrace), "Expected '}' after block.")?.span;
        Ok(Node::new(BlockStatement { statements }, start_span.to(end_span)))
    }
}

impl<'a> ExpressionParser for Parser<'a> {
    /// 解析表达式的主入口函数，实现了普拉特解析的核心循环。
    fn parse_expression(&mut self, min_bp: u8) -> Result<Node<Expression>, ()> {
        // 1. 每个表达式都必须由一个前缀部分开始（原子或前缀运算符）。
        let mut left = self.parse_prefix_expression()?;

        // 2. 循环处理所有优先级高于 min_bp 的中缀和后缀运算符。
        loop {
            let kind = self.peek().kind;

            if let Some((l_bp, ())) = Self::postfix_binding_power(&kind) {
                if l_bp < min_bp {
                    break;
                }
                left = self.parse_postfix_expression(left)?;
                continue;
            }

            if let Some((l_bp, r_bp)) = Self::infix_binding_power(&kind) {
                if l_bp < min_bp {
                    break;
                }
                left = self.parse_infix_expression(left, r_bp)?;
                continue;
            }

            break;
        }

        Ok(left)
    }

    fn parse_prefix_expression(&mut self) -> Result<Node<Expression>, ()> {
        let Some(((), r_bp)) = Self::prefix_binding_power(&self.peek().kind) else {
            return self.parse_atom();
        };

        let op_token = self.advance().clone();
        let op = if let TokenKind::Operator(o) = op_token.kind { o } else { unreachable!() };
        let operand = self.parse_expression(r_bp)?;
        let span = op_token.span.to(operand.span);

        if let Some(operator) = increment_op(op) {
            return match operand.kind {
                Expression::Identifier(target) => Ok(Node::new(
                    Expression::Increment(IncrementExpression {
                        target,
                        operator,
                        is_prefix: true,
                    }),
                    span,
                )),
                other => {
                    self.error_at(
                        &op_token,
                        &E0102_INVALID_ASSIGNMENT_TARGET,
                        "Invalid increment target.",
                        "`++` and `--` need a variable name",
                    );
                    Ok(Node::new(other, operand.span))
                }
            };
        }

        let operator = match op {
            Operator::Minus => UnaryOp::Neg,
            Operator::Not => UnaryOp::Not,
            _ => UnaryOp::BitNot,
        };
        let kind = Expression::Unary(UnaryExpression {
            operator: Node::new(operator, op_token.span),
            operand: Box::new(operand),
        });
        Ok(Node::new(kind, span))
    }

    fn parse_infix_expression(&mut self, left: Node<Expression>, r_bp: u8) -> Result<Node<Expression>, ()> {
        let op_token = self.advance().clone();
        let op = if let TokenKind::Operator(o) = op_token.kind { o } else { unreachable!() };

        // 递归调用来解析右操作数
        let right = self.parse_expression(r_bp)?;
        let span = left.span.to(right.span);

        if op == Operator::Assign {
            return Ok(self.finish_assignment(left, right, &op_token));
        }

        let kind = if let Some(arithmetic) = compound_op(op) {
            match left.kind {
                Expression::Identifier(target) => Expression::CompoundAssignment(CompoundAssignmentExpression {
                    target,
                    operator: Node::new(arithmetic, op_token.span),
                    value: Box::new(right),
                }),
                other => {
                    self.error_at(
                        &op_token,
                        &E0102_INVALID_ASSIGNMENT_TARGET,
                        "Invalid assignment target.",
                        "compound assignment needs a variable name on the left",
                    );
                    return Ok(Node::new(other, left.span));
                }
            }
        } else if let Some(operator) = logical_op(op) {
            Expression::Logical(LogicalExpression {
                left: Box::new(left),
                operator: Node::new(operator, op_token.span),
                right: Box::new(right),
            })
        } else if let Some(operator) = binary_op(op) {
            Expression::Binary(BinaryExpression {
                left: Box::new(left),
                operator: Node::new(operator, op_token.span),
                right: Box::new(right),
            })
        } else {
            unreachable!()
        };

        Ok(Node::new(kind, span))
    }

    fn parse_postfix_expression(&mut self, left: Node<Expression>) -> Result<Node<Expression>, ()> {
        match self.peek().kind {
            TokenKind::Punctuation(Punctuation::LParen) => {
                let arguments = self.parse_call_arguments()?;
                let span = left.span.to(self.previous().span);
                let kind = Expression::Call(CallExpression {
                    callee: Box::new(left),
                    arguments,
                });
                Ok(Node::new(kind, span))
            }
            TokenKind::Punctuation(Punctuation::LBracket) => {
                self.advance();
                let index = self.parse_expression(0)?;
                let end_span = self.consume(&punct(Punctuation::RBracket), "Expected ']' after index.")?.span;
                let span = left.span.to(end_span);
                let kind = Expression::Index(IndexExpression {
                    object: Box::new(left),
                    index: Box::new(index),
                });
                Ok(Node::new(kind, span))
            }
            _ => {
                // `++` / `--` 后缀
                let op_token = self.advance().clone();
                let op = if let TokenKind::Operator(o) = op_token.kind { o } else { unreachable!() };
                let Some(operator) = increment_op(op) else { unreachable!() };
                match left.kind {
                    Expression::Identifier(target) => Ok(Node::new(
                        Expression::Increment(IncrementExpression {
                            target,
                            operator,
                            is_prefix: false,
                        }),
                        left.span.to(op_token.span),
                    )),
                    other => {
                        self.error_at(
                            &op_token,
                            &E0102_INVALID_ASSIGNMENT_TARGET,
                            "Invalid increment target.",
                            "`++` and `--` need a variable name",
                        );
                        Ok(Node::new(other, left.span))
                    }
                }
            }
        }
    }

    /// `name = v` 与 `a[i] = v`；其他目标报告错误并保留左边的表达式。
    fn finish_assignment(&mut self, target: Node<Expression>, value: Node<Expression>, op_token: &Token) -> Node<Expression> {
        let span = target.span.to(value.span);
        match target.kind {
            Expression::Identifier(name) => Node::new(
                Expression::Assignment(AssignmentExpression {
                    target: name,
                    value: Box::new(value),
                }),
                span,
            ),
            Expression::Index(IndexExpression { object, index }) => Node::new(
                Expression::IndexAssignment(IndexAssignmentExpression {
                    object,
                    index,
                    value: Box::new(value),
                }),
                span,
            ),
            other => {
                self.error_at(
                    op_token,
                    &E0102_INVALID_ASSIGNMENT_TARGET,
                    "Invalid assignment target.",
                    "only a variable or an indexed element can be assigned",
                );
                Node::new(other, target.span)
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Node<Expression>, ()> {
        let token = self.peek().clone();
        let kind = match token.kind {
            TokenKind::Number | TokenKind::String => Expression::Literal(literal_value(&token)),
            TokenKind::InterpString => {
                let raw = match &token.literal {
                    Literal::Text(raw) => raw.as_str(),
                    _ => "",
                };
                self.advance();
                let interpolated = interp::parse_interpolated(&token, raw, &mut *self.diagnostics)?;
                return Ok(Node::new(Expression::InterpolatedString(interpolated), token.span));
            }
            TokenKind::Keyword(Keyword::Ongod) => Expression::Literal(LiteralValue::Bool(true)),
            TokenKind::Keyword(Keyword::Cap) => Expression::Literal(LiteralValue::Bool(false)),
            TokenKind::Keyword(Keyword::Nah) => Expression::Literal(LiteralValue::Null),
            TokenKind::Identifier => Expression::Identifier(Identifier {
                name: token.lexeme.clone(),
                span: token.span,
            }),
            // 括号表达式 `(...)`
            TokenKind::Punctuation(Punctuation::LParen) => {
                self.advance();
                let inner = self.parse_expression(0)?;
                let end_span = self
                    .consume(&punct(Punctuation::RParen), "Expected ')' after expression.")?
                    .span;
                return Ok(Node::new(Expression::Grouping(Box::new(inner)), token.span.to(end_span)));
            }
            TokenKind::Punctuation(Punctuation::LBracket) => return self.parse_array_literal(),
            // 其他情况都是非法的表达式开头；这里不消费 Token，交给恢复逻辑处理
            _ => {
                self.error_at(
                    &token,
                    &E0101_EXPECTED_EXPRESSION,
                    "Expected expression.",
                    "this cannot start an expression",
                );
                return Err(());
            }
        };

        self.advance();
        Ok(Node::new(kind, token.span))
    }

    /// `[a, b, c]`，允许空数组。
    fn parse_array_literal(&mut self) -> Result<Node<Expression>, ()> {
        let start_span = self.consume(&punct(Punctuation::LBracket), "Expected '['.")?.span;

        let mut elements = Vec::new();
        if !self.check(&punct(Punctuation::RBracket)) {
            loop {
                elements.push(self.parse_expression(0)?);
                if !self.match_token(&punct(Punctuation::Comma)) {
                    break;
                }
            }
        }

        let end_span = self
            .consume(&punct(Punctuation::RBracket), "Expected ']' after array elements.")?
            .span;
        Ok(Node::new(Expression::Array(elements), start_span.to(end_span)))
    }

    /// 解析函数调用的参数列表 `(arg1, arg2, ...)`。
    fn parse_call_arguments(&mut self) -> Result<Vec<Node<Expression>>, ()> {
        self.consume(&punct(Punctuation::LParen), "Expected '(' for call.")?;

        let mut args = Vec::new();
        if self.match_token(&punct(Punctuation::RParen)) {
            return Ok(args);
        }

        loop {
            if args.len() >= MAX_ITEMS {
                let token = self.peek().clone();
                self.error_at(
                    &token,
                    &E0103_TOO_MANY_ITEMS,
                    "Cannot have more than 255 arguments.",
                    "argument limit exceeded here",
                );
            }
            args.push(self.parse_expression(0)?);
            if !self.match_token(&punct(Punctuation::Comma)) {
                break;
            }
        }

        self.consume(&punct(Punctuation::RParen), "Expected ')' after arguments.")?;
        Ok(args)
    }
}

impl<'a> Util for Parser<'a> {
    // --- Token 流操作 ---

    /// 查看当前的 Token，但并不消费它。
    /// 如果已经到达文件末尾，则稳定地返回 EOF Token，防止越界。
    fn peek(&self) -> &Token {
        self.tokens
            .get(self.current)
            .unwrap_or_else(|| &self.tokens[self.tokens.len() - 1])
    }

    /// 获取前一个刚刚被消费的 Token；还没有消费过时返回当前 Token。
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// 消费当前 Token 并返回它，同时将指针前移一位。
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        &self.peek().kind == kind
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind, message: &str) -> Result<&Token, ()> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        let found = self.peek().clone();
        let label = format!(
            "expected {}, found {}",
            kind.to_string_for_error(),
            found.kind.to_string_for_error()
        );
        self.error_at(&found, &E0100_SYNTAX_ERROR, message, &label);
        Err(())
    }

    fn consume_identifier(&mut self, message: &str) -> Result<Identifier, ()> {
        let token = self.consume(&TokenKind::Identifier, message)?;
        Ok(Identifier {
            name: token.lexeme.clone(),
            span: token.span,
        })
    }

    // --- 错误报告与恢复 ---

    fn error_at(&mut self, token: &Token, code: &'static ErrorCode, message: &str, label: &str) {
        let location = if token.is_eof() {
            "at end".to_string()
        } else {
            format!("at '{}'", token.lexeme)
        };
        self.diagnostics
            .report_error(code, format!("{}: {}", location, message), Label::new(token.span, label));
    }

    /// 跳过导致错误的 Token，然后丢弃 Token 直到一个可以开始语句的关键字、
    /// 一个 `}`、一个 `stan`/`ghost` 或文件末尾。
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::Keyword(kw) if kw.starts_statement() => return,
                TokenKind::Keyword(Keyword::Stan | Keyword::Ghost) => return,
                TokenKind::Punctuation(Punctuation::RBrace) => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // --- 普拉特解析辅助函数 ---

    /// 获取前缀运算符的绑定力。
    fn prefix_binding_power(kind: &TokenKind) -> Option<((), u8)> {
        match kind {
            TokenKind::Operator(
                Operator::Minus | Operator::Not | Operator::BitNot | Operator::PlusPlus | Operator::MinusMinus,
            ) => Some(((), 23)),
            _ => None,
        }
    }

    /// 获取中缀运算符的绑定力，赋值是右结合的。
    fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
        let bp = match kind {
            TokenKind::Operator(op) => match op {
                Operator::Assign
                | Operator::PlusEq
                | Operator::MinusEq
                | Operator::StarEq
                | Operator::SlashEq
                | Operator::PercentEq => (2, 1),
                Operator::OrOr => (3, 4),
                Operator::AndAnd => (5, 6),
                Operator::BitOr => (7, 8),
                Operator::BitXor => (9, 10),
                Operator::BitAnd => (11, 12),
                Operator::Eq | Operator::NotEq => (13, 14),
                Operator::Lt | Operator::Gt | Operator::LtEq | Operator::GtEq => (15, 16),
                Operator::Shl | Operator::Shr => (17, 18),
                Operator::Plus | Operator::Minus => (19, 20),
                Operator::Star | Operator::Slash | Operator::Percent => (21, 22),
                _ => return None,
            },
            _ => return None,
        };
        Some(bp)
    }

    /// 获取后缀运算符的绑定力。
    fn postfix_binding_power(kind: &TokenKind) -> Option<(u8, ())> {
        let bp = match kind {
            TokenKind::Operator(Operator::PlusPlus | Operator::MinusMinus) => 25,
            TokenKind::Punctuation(Punctuation::LParen | Punctuation::LBracket) => 27, // 调用与下标
            _ => return None,
        };
        Some((bp, ()))
    }
}

// --- 4. 运算符映射 ---

fn binary_op(op: Operator) -> Option<BinaryOp> {
    let mapped = match op {
        Operator::Plus => BinaryOp::Add,
        Operator::Minus => BinaryOp::Sub,
        Operator::Star => BinaryOp::Mul,
        Operator::Slash => BinaryOp::Div,
        Operator::Percent => BinaryOp::Mod,
        Operator::Eq => BinaryOp::Eq,
        Operator::NotEq => BinaryOp::NotEq,
        Operator::Lt => BinaryOp::Lt,
        Operator::Gt => BinaryOp::Gt,
        Operator::LtEq => BinaryOp::LtEq,
        Operator::GtEq => BinaryOp::GtEq,
        Operator::BitAnd => BinaryOp::BitAnd,
        Operator::BitOr => BinaryOp::BitOr,
        Operator::BitXor => BinaryOp::BitXor,
        Operator::Shl => BinaryOp::Shl,
        Operator::Shr => BinaryOp::Shr,
        _ => return None,
    };
    Some(mapped)
}

fn logical_op(op: Operator) -> Option<LogicalOp> {
    match op {
        Operator::AndAnd => Some(LogicalOp::And),
        Operator::OrOr => Some(LogicalOp::Or),
        _ => None,
    }
}

/// `+=` 等复合赋值对应的算术运算符。
fn compound_op(op: Operator) -> Option<BinaryOp> {
    match op {
        Operator::PlusEq => Some(BinaryOp::Add),
        Operator::MinusEq => Some(BinaryOp::Sub),
        Operator::StarEq => Some(BinaryOp::Mul),
        Operator::SlashEq => Some(BinaryOp::Div),
        Operator::PercentEq => Some(BinaryOp::Mod),
        _ => None,
    }
}

fn increment_op(op: Operator) -> Option<IncrementOp> {
    match op {
        Operator::PlusPlus => Some(IncrementOp::Increment),
        Operator::MinusMinus => Some(IncrementOp::Decrement),
        _ => None,
    }
}

/// 数字与字符串 Token 的字面量值。
fn literal_value(token: &Token) -> LiteralValue {
    match &token.literal {
        Literal::Integer(i) => LiteralValue::Integer(*i),
        Literal::Float(x) => LiteralValue::Float(*x),
        Literal::Text(s) => LiteralValue::Str(s.clone()),
        Literal::None => LiteralValue::Null,
    }
}
