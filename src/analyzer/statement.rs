// src/analyzer/statement.rs

use super::symbols::Symbol;
use super::types::Type;
use super::{Analyzer, ExpressionChecker, StatementChecker};
use crate::diagnostics::codes::*;
use crate::diagnostics::{Diagnostic, Label};
use crate::parser::ast::*;
use crate::utils::Span;

impl<'a> StatementChecker for Analyzer<'a> {
    /// 检查语句的总入口，根据语句的类型分发到具体的检查函数。
    fn check_statement(&mut self, stmt: &Node<Statement>) {
        match &stmt.kind {
            Statement::VarDeclaration(decl) => self.check_var_declaration(decl),
            // say 接受任何类型
            Statement::Print(expr) | Statement::Expression(expr) => {
                self.check_expression(expr);
            }
            Statement::Block(block) => {
                self.symbols.enter_scope();
                self.check_block(block);
                self.symbols.leave_scope();
            }
            Statement::If(if_stmt) => self.check_if_statement(if_stmt),
            Statement::While(while_stmt) => self.check_while_statement(while_stmt),
            Statement::For(for_stmt) => self.check_for_statement(for_stmt),
            Statement::Function(func_def) => self.check_function_definition(func_def, stmt.span),
            Statement::Return(ret) => self.check_return_statement(ret, stmt.span),
            Statement::Break => {
                if self.loop_depth == 0 {
                    let label = Label::new(stmt.span, "not inside `goon` or `edge`");
                    self.diagnostics.report_error(
                        &E0206_BREAK_OUTSIDE_LOOP,
                        "'mog' (break) used outside of loop",
                        label,
                    );
                }
            }
            Statement::Continue => {
                if self.loop_depth == 0 {
                    let label = Label::new(stmt.span, "not inside `goon` or `edge`");
                    self.diagnostics.report_error(
                        &E0207_CONTINUE_OUTSIDE_LOOP,
                        "'skip' (continue) used outside of loop",
                        label,
                    );
                }
            }
            Statement::Switch(switch) => self.check_switch_statement(switch),
            Statement::TryCatch(try_catch) => self.check_try_catch(try_catch, stmt.span),
        }
    }

    /// 依次检查块内语句。调用方负责进入和离开作用域。
    fn check_block(&mut self, block: &BlockStatement) {
        for stmt in &block.statements {
            self.check_statement(stmt);
        }
    }

    fn check_var_declaration(&mut self, decl: &VarDeclaration) {
        // 先检查初始化表达式，`fr x = x` 中右边的 x 指向外层
        let init_type = self.check_expression(&decl.initializer);

        if let Some(existing) = self.symbols.resolve_local(&decl.name.name) {
            let previous = Label::new(existing.defined_at, "previous declaration here");
            let diag = Diagnostic::error(
                &E0201_ALREADY_DECLARED,
                Label::new(decl.name.span, "declared again in the same scope"),
            )
            .with_dynamic_message(format!(
                "Variable '{}' is already declared in this scope",
                decl.name.name
            ))
            .with_secondary_label(previous);
            self.diagnostics.report(diag);
            return;
        }

        let depth = self.symbols.depth();
        self.symbols
            .define(Symbol::variable(&decl.name.name, init_type, depth, decl.name.span));
    }

    fn check_if_statement(&mut self, if_stmt: &IfStatement) {
        self.check_condition(&if_stmt.condition, "lowkey");

        self.symbols.enter_scope();
        self.check_block(&if_stmt.then_branch.kind);
        self.symbols.leave_scope();

        // else 分支要么是 Block（自带作用域），要么是下一个 If
        if let Some(else_branch) = &if_stmt.else_branch {
            self.check_statement(else_branch);
        }
    }

    fn check_while_statement(&mut self, while_stmt: &WhileStatement) {
        self.check_condition(&while_stmt.condition, "goon");

        self.loop_depth += 1;
        self.symbols.enter_scope();
        self.check_block(&while_stmt.body.kind);
        self.symbols.leave_scope();
        self.loop_depth -= 1;
    }

    fn check_for_statement(&mut self, for_stmt: &ForStatement) {
        // 初始化子句声明的变量只在循环内可见
        self.symbols.enter_scope();

        if let Some(init) = &for_stmt.initializer {
            self.check_statement(init);
        }
        if let Some(condition) = &for_stmt.condition {
            self.check_condition(condition, "edge");
        }
        if let Some(increment) = &for_stmt.increment {
            self.check_expression(increment);
        }

        self.loop_depth += 1;
        self.symbols.enter_scope();
        self.check_block(&for_stmt.body.kind);
        self.symbols.leave_scope();
        self.loop_depth -= 1;

        self.symbols.leave_scope();
    }

    fn check_function_definition(&mut self, func_def: &FunctionDefinition, span: Span) {
        if self.in_function() || self.symbols.depth() > 0 {
            let label = Label::new(span, "defined here");
            let diag = Diagnostic::error(&E0212_NESTED_FUNCTION, label)
                .with_dynamic_message(format!(
                    "Function '{}' must be defined at the top level",
                    func_def.name.name
                ))
                .with_hint("move this `vibe` out to the top level of the file");
            self.diagnostics.report(diag);
            return;
        }

        let return_type = self
            .functions
            .lookup(&func_def.name.name)
            .map(|info| info.return_type.clone())
            .unwrap_or(Type::Number);

        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let saved_return = self.return_type.replace(return_type);

        self.symbols.enter_scope();
        for param in &func_def.params {
            let depth = self.symbols.depth();
            if !self.symbols.define(Symbol::variable(&param.name, Type::Number, depth, param.span)) {
                let label = Label::new(param.span, "duplicate parameter");
                self.diagnostics.report_error(
                    &E0201_ALREADY_DECLARED,
                    format!("Parameter '{}' is already declared in this function", param.name),
                    label,
                );
            }
        }
        // 函数体的语句和参数在同一个作用域
        self.check_block(&func_def.body.kind);
        self.symbols.leave_scope();

        self.return_type = saved_return;
        self.loop_depth = saved_loop_depth;
    }

    fn check_return_statement(&mut self, ret: &ReturnStatement, span: Span) {
        if !self.in_function() {
            let label = Label::new(span, "not inside a `vibe` body");
            self.diagnostics.report_error(
                &E0209_RETURN_OUTSIDE_FUNCTION,
                "'send' (return) used outside of function",
                label,
            );
            return;
        }

        let Some(value) = &ret.value else {
            return;
        };
        let ty = self.check_expression(value);
        if !ty.is_numeric() && !ty.is_unknown() {
            let label = Label::new(value.span, format!("this is a {}", ty));
            self.diagnostics.report_warning(
                &W0201_NON_NUMERIC_RETURN,
                format!("Function returns {}, but Number was expected", ty),
                label,
            );
        }
    }

    fn check_switch_statement(&mut self, switch: &SwitchStatement) {
        let scrutinee_type = self.check_expression(&switch.scrutinee);

        for case in &switch.cases {
            if let Some(value) = &case.kind.value {
                let case_type = literal_type(&value.kind);
                if !scrutinee_type.is_compatible_with(&case_type) {
                    let label = Label::new(value.span, format!("this case is a {}", case_type));
                    let diag = Diagnostic::error(&E0202_TYPE_MISMATCH, label)
                        .with_dynamic_message(format!(
                            "Case type {} doesn't match switch expression type {}",
                            case_type, scrutinee_type
                        ))
                        .with_secondary_label(Label::new(
                            switch.scrutinee.span,
                            format!("switch expression is a {}", scrutinee_type),
                        ));
                    self.diagnostics.report(diag);
                }
            }

            self.symbols.enter_scope();
            for stmt in &case.kind.body {
                self.check_statement(stmt);
            }
            self.symbols.leave_scope();
        }
    }

    fn check_try_catch(&mut self, try_catch: &TryCatchStatement, span: Span) {
        let label = Label::new(span, "the `caught` block is never entered");
        self.diagnostics.report_warning(
            &W0202_TRY_CATCH_STUB,
            "'yeet/caught' (try-catch) is not fully implemented",
            label,
        );

        self.symbols.enter_scope();
        self.check_block(&try_catch.try_block.kind);
        self.symbols.leave_scope();

        self.symbols.enter_scope();
        self.check_block(&try_catch.catch_block.kind);
        self.symbols.leave_scope();
    }

    fn check_condition(&mut self, condition: &Node<Expression>, keyword: &str) {
        let ty = self.check_expression(condition);
        if !ty.is_condition() {
            let label = Label::new(condition.span, format!("this is a {}", ty));
            self.diagnostics.report_error(
                &E0211_INVALID_CONDITION,
                format!("Condition in '{}' must be a boolean or number, got {}", keyword, ty),
                label,
            );
        }
    }
}

/// 字面量的静态类型。整数字面量是 `Integer`，其余数字是 `Number`。
pub(super) fn literal_type(literal: &LiteralValue) -> Type {
    match literal {
        LiteralValue::Null => Type::Null,
        LiteralValue::Integer(_) => Type::Integer,
        LiteralValue::Float(_) => Type::Number,
        LiteralValue::Str(_) => Type::String,
        LiteralValue::Bool(_) => Type::Boolean,
    }
}
