//! AST 的两种文本形式：
//! - `print_program`：重新生成可以再次解析的 Sigma 源代码；
//! - `dump_program`：`--ast` 使用的 S 表达式调试输出，不包含 span。

use super::ast::*;

const INDENT: &str = "    ";

// --- 1. 源代码形式 ---

/// 把 AST 渲染回 Sigma 源代码，代码块缩进四个空格。
///
/// 括号只出现在 AST 中有 `Grouping` 节点的地方，因此对任何没有语法错误的程序，
/// 重新解析输出得到的 AST 与原来的结构相同（span 除外）。
pub fn print_program(program: &Program) -> String {
    let mut printer = SourcePrinter::default();
    for stmt in &program.statements {
        printer.statement(stmt);
    }
    printer.out
}

#[derive(Default)]
struct SourcePrinter {
    out: String,
    depth: usize,
}

impl SourcePrinter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn nested(&mut self, statements: &[Node<Statement>]) {
        self.depth += 1;
        for stmt in statements {
            self.statement(stmt);
        }
        self.depth -= 1;
    }

    fn statement(&mut self, stmt: &Node<Statement>) {
        match &stmt.kind {
            Statement::VarDeclaration(decl) => self.line(&var_declaration(decl)),
            Statement::Print(value) => self.line(&format!("say {}", expression(value))),
            Statement::Expression(expr) => self.line(&expression(expr)),
            Statement::Block(block) => {
                self.line("{");
                self.nested(&block.statements);
                self.line("}");
            }
            Statement::If(if_stmt) => self.if_chain(if_stmt, ""),
            Statement::While(w) => {
                self.line(&format!("goon {} {{", expression(&w.condition)));
                self.nested(&w.body.kind.statements);
                self.line("}");
            }
            Statement::For(f) => {
                let init = f.initializer.as_deref().map(clause).unwrap_or_default();
                let cond = f.condition.as_ref().map(expression).unwrap_or_default();
                let incr = f.increment.as_ref().map(expression).unwrap_or_default();
                self.line(&format!("edge ({}, {}, {}) {{", init, cond, incr));
                self.nested(&f.body.kind.statements);
                self.line("}");
            }
            Statement::Function(func) => {
                let params: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
                self.line(&format!("vibe {}({}) {{", func.name.name, params.join(", ")));
                self.nested(&func.body.kind.statements);
                self.line("}");
            }
            Statement::Return(ret) => match &ret.value {
                Some(value) => self.line(&format!("send {}", expression(value))),
                None => self.line("send"),
            },
            Statement::Break => self.line("mog"),
            Statement::Continue => self.line("skip"),
            Statement::Switch(switch) => {
                self.line(&format!("simp {} {{", expression(&switch.scrutinee)));
                self.depth += 1;
                for case in &switch.cases {
                    match &case.kind.value {
                        Some(value) => self.line(&format!("stan {}:", literal(&value.kind))),
                        None => self.line("ghost:"),
                    }
                    self.nested(&case.kind.body);
                }
                self.depth -= 1;
                self.line("}");
            }
            Statement::TryCatch(try_catch) => {
                self.line("yeet {");
                self.nested(&try_catch.try_block.kind.statements);
                self.line("} caught {");
                self.nested(&try_catch.catch_block.kind.statements);
                self.line("}");
            }
        }
    }

    /// `midkey` 链统一输出为 `} highkey lowkey ... {`，解析结果相同。
    fn if_chain(&mut self, stmt: &IfStatement, prefix: &str) {
        self.line(&format!("{}lowkey {} {{", prefix, expression(&stmt.condition)));
        self.nested(&stmt.then_branch.kind.statements);
        match stmt.else_branch.as_deref().map(|b| &b.kind) {
            None => self.line("}"),
            Some(Statement::If(nested)) => self.if_chain(nested, "} highkey "),
            Some(Statement::Block(block)) => {
                self.line("} highkey {");
                self.nested(&block.statements);
                self.line("}");
            }
            Some(_) => {
                // 解析器不会产生其他形式的 else 分支
                self.line("}");
            }
        }
    }
}

fn var_declaration(decl: &VarDeclaration) -> String {
    format!("fr {} = {}", decl.name.name, expression(&decl.initializer))
}

/// `edge` 的初始化子句。
fn clause(stmt: &Node<Statement>) -> String {
    match &stmt.kind {
        Statement::VarDeclaration(decl) => var_declaration(decl),
        Statement::Expression(expr) => expression(expr),
        _ => String::new(),
    }
}

fn expression(expr: &Node<Expression>) -> String {
    match &expr.kind {
        Expression::Literal(value) => literal(value),
        Expression::Identifier(ident) => ident.name.clone(),
        Expression::Grouping(inner) => format!("({})", expression(inner)),
        Expression::Unary(unary) => {
            let operand = expression(&unary.operand);
            // `- -x` 不能写成 `--x`
            if unary.operator.kind == UnaryOp::Neg && operand.starts_with('-') {
                format!("- {}", operand)
            } else {
                format!("{}{}", unary.operator.kind, operand)
            }
        }
        Expression::Binary(bin) => format!(
            "{} {} {}",
            expression(&bin.left),
            bin.operator.kind,
            expression(&bin.right)
        ),
        Expression::Logical(logical) => format!(
            "{} {} {}",
            expression(&logical.left),
            logical.operator.kind,
            expression(&logical.right)
        ),
        Expression::Assignment(assign) => format!("{} = {}", assign.target.name, expression(&assign.value)),
        Expression::CompoundAssignment(assign) => format!(
            "{} {}= {}",
            assign.target.name,
            assign.operator.kind,
            expression(&assign.value)
        ),
        Expression::Increment(inc) if inc.is_prefix => format!("{}{}", inc.operator, inc.target.name),
        Expression::Increment(inc) => format!("{}{}", inc.target.name, inc.operator),
        Expression::Call(call) => format!("{}({})", expression(&call.callee), list(&call.arguments)),
        Expression::InterpolatedString(interp) => {
            let mut out = String::from("\"");
            for (i, segment) in interp.segments.iter().enumerate() {
                out.push_str(&escape(segment));
                if let Some(part) = interp.parts.get(i) {
                    out.push('{');
                    out.push_str(&expression(part));
                    out.push('}');
                }
            }
            out.push('"');
            out
        }
        Expression::Array(elements) => format!("[{}]", list(elements)),
        Expression::Index(index) => format!("{}[{}]", expression(&index.object), expression(&index.index)),
        Expression::IndexAssignment(assign) => format!(
            "{}[{}] = {}",
            expression(&assign.object),
            expression(&assign.index),
            expression(&assign.value)
        ),
    }
}

fn list(items: &[Node<Expression>]) -> String {
    items.iter().map(expression).collect::<Vec<_>>().join(", ")
}

fn literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Null => "nah".to_string(),
        LiteralValue::Integer(i) => i.to_string(),
        LiteralValue::Float(x) => float_text(*x),
        LiteralValue::Str(s) => format!("\"{}\"", escape(s)),
        LiteralValue::Bool(true) => "ongod".to_string(),
        LiteralValue::Bool(false) => "cap".to_string(),
    }
}

/// 浮点数总是带小数点，这样重新扫描时仍然是 `Float`。
fn float_text(x: f64) -> String {
    let text = x.to_string();
    if text.contains('.') || !x.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

/// 重新转义字符串内容；花括号也要转义，否则会被当作插值。
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            other => out.push(other),
        }
    }
    out
}

// --- 2. S 表达式调试形式 ---

/// `--ast` 的输出，每层缩进两个空格。
pub fn dump_program(program: &Program) -> String {
    let mut out = String::from("=== AST ===\n");
    for stmt in &program.statements {
        out.push_str(&dump_statement(stmt, 0));
        out.push('\n');
    }
    out.push_str("===========\n");
    out
}

fn pad(level: usize) -> String {
    "  ".repeat(level)
}

fn dump_block(statements: &[Node<Statement>], level: usize) -> String {
    statements
        .iter()
        .map(|s| format!("\n{}", dump_statement(s, level)))
        .collect()
}

fn dump_statement(stmt: &Node<Statement>, level: usize) -> String {
    let p = pad(level);
    match &stmt.kind {
        Statement::VarDeclaration(decl) => format!("{}(fr {} = {})", p, decl.name.name, dump_expr(&decl.initializer)),
        Statement::Print(value) => format!("{}(say {})", p, dump_expr(value)),
        Statement::Expression(expr) => format!("{}(expr {})", p, dump_expr(expr)),
        Statement::Block(block) => format!("{}(block{})", p, dump_block(&block.statements, level + 1)),
        Statement::If(if_stmt) => {
            let mut out = format!(
                "{}(lowkey {}\n{}(block{})",
                p,
                dump_expr(&if_stmt.condition),
                pad(level + 1),
                dump_block(&if_stmt.then_branch.kind.statements, level + 2)
            );
            if let Some(else_branch) = &if_stmt.else_branch {
                out.push_str(&format!("\n{} highkey\n{}", p, dump_statement(else_branch, level + 1)));
            }
            out.push(')');
            out
        }
        Statement::While(w) => format!(
            "{}(goon {}{})",
            p,
            dump_expr(&w.condition),
            dump_block(&w.body.kind.statements, level + 1)
        ),
        Statement::For(f) => {
            let mut out = format!("{}(edge", p);
            if let Some(init) = &f.initializer {
                out.push_str(&format!(" init:{}", dump_statement(init, 0)));
            }
            if let Some(cond) = &f.condition {
                out.push_str(&format!(" cond:{}", dump_expr(cond)));
            }
            if let Some(incr) = &f.increment {
                out.push_str(&format!(" incr:{}", dump_expr(incr)));
            }
            out.push_str(&dump_block(&f.body.kind.statements, level + 1));
            out.push(')');
            out
        }
        Statement::Function(func) => {
            let params: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
            format!(
                "{}(vibe {}({}){})",
                p,
                func.name.name,
                params.join(", "),
                dump_block(&func.body.kind.statements, level + 1)
            )
        }
        Statement::Return(ret) => match &ret.value {
            Some(value) => format!("{}(send {})", p, dump_expr(value)),
            None => format!("{}(send)", p),
        },
        Statement::Break => format!("{}(mog)", p),
        Statement::Continue => format!("{}(skip)", p),
        Statement::Switch(switch) => {
            let mut out = format!("{}(simp {}", p, dump_expr(&switch.scrutinee));
            for case in &switch.cases {
                let label = match &case.kind.value {
                    Some(value) => literal(&value.kind),
                    None => "ghost".to_string(),
                };
                out.push_str(&format!(
                    "\n{}(stan {}{})",
                    pad(level + 1),
                    label,
                    dump_block(&case.kind.body, level + 2)
                ));
            }
            out.push(')');
            out
        }
        Statement::TryCatch(try_catch) => format!(
            "{}(yeet{}\n{} caught{})",
            p,
            dump_block(&try_catch.try_block.kind.statements, level + 1),
            p,
            dump_block(&try_catch.catch_block.kind.statements, level + 1)
        ),
    }
}

fn dump_expr(expr: &Node<Expression>) -> String {
    match &expr.kind {
        Expression::Literal(value) => literal(value),
        Expression::Identifier(ident) => ident.name.clone(),
        Expression::Grouping(inner) => format!("(group {})", dump_expr(inner)),
        Expression::Unary(unary) => format!("({} {})", unary.operator.kind, dump_expr(&unary.operand)),
        Expression::Binary(bin) => format!(
            "({} {} {})",
            bin.operator.kind,
            dump_expr(&bin.left),
            dump_expr(&bin.right)
        ),
        Expression::Logical(logical) => format!(
            "({} {} {})",
            logical.operator.kind,
            dump_expr(&logical.left),
            dump_expr(&logical.right)
        ),
        Expression::Assignment(assign) => format!("(= {} {})", assign.target.name, dump_expr(&assign.value)),
        Expression::CompoundAssignment(assign) => format!(
            "({}= {} {})",
            assign.operator.kind,
            assign.target.name,
            dump_expr(&assign.value)
        ),
        Expression::Increment(inc) if inc.is_prefix => format!("({} {})", inc.operator, inc.target.name),
        Expression::Increment(inc) => format!("({} {})", inc.target.name, inc.operator),
        Expression::Call(call) => {
            let mut out = format!("(call {}", dump_expr(&call.callee));
            for arg in &call.arguments {
                out.push(' ');
                out.push_str(&dump_expr(arg));
            }
            out.push(')');
            out
        }
        Expression::InterpolatedString(interp) => {
            let mut out = String::from("(interp-string");
            for (i, segment) in interp.segments.iter().enumerate() {
                out.push_str(&format!(" \"{}\"", escape(segment)));
                if let Some(part) = interp.parts.get(i) {
                    out.push_str(&format!(" {{{}}}", dump_expr(part)));
                }
            }
            out.push(')');
            out
        }
        Expression::Array(elements) => {
            let items: Vec<String> = elements.iter().map(dump_expr).collect();
            format!("[{}]", items.join(", "))
        }
        Expression::Index(index) => format!("(index {} {})", dump_expr(&index.object), dump_expr(&index.index)),
        Expression::IndexAssignment(assign) => format!(
            "(index-assign {} {} {})",
            dump_expr(&assign.object),
            dump_expr(&assign.index),
            dump_expr(&assign.value)
        ),
    }
}
