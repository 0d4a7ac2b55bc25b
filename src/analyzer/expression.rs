// src/analyzer/expression.rs

use super::statement::literal_type;
use super::types::Type;
use super::{Analyzer, ExpressionChecker};
use crate::diagnostics::codes::*;
use crate::diagnostics::{Diagnostic, Label};
use crate::parser::ast::*;
use crate::utils::Span;

impl<'a> ExpressionChecker for Analyzer<'a> {
    /// 检查任意表达式并返回其类型（分发函数）。
    fn check_expression(&mut self, expr: &Node<Expression>) -> Type {
        match &expr.kind {
            Expression::Literal(literal) => literal_type(literal),
            Expression::Identifier(ident) => self.check_identifier(ident),
            Expression::Grouping(inner) => self.check_expression(inner),
            Expression::Unary(unary) => self.check_unary(unary),
            Expression::Binary(binary) => self.check_binary(binary),
            Expression::Logical(logical) => {
                // 任何值都有真假，结果总是 Boolean
                self.check_expression(&logical.left);
                self.check_expression(&logical.right);
                Type::Boolean
            }
            Expression::Assignment(assign) => self.check_assignment(assign),
            Expression::CompoundAssignment(assign) => self.check_compound_assignment(assign),
            Expression::Increment(inc) => self.check_increment(inc, expr.span),
            Expression::Call(call) => self.check_call(call, expr.span),
            Expression::InterpolatedString(interp) => {
                for part in &interp.parts {
                    self.check_expression(part);
                }
                Type::String
            }
            Expression::Array(elements) => {
                for element in elements {
                    self.check_expression(element);
                }
                Type::Any
            }
            Expression::Index(index) => self.check_index(&index.object, &index.index),
            Expression::IndexAssignment(assign) => {
                self.check_index(&assign.object, &assign.index);
                self.check_expression(&assign.value)
            }
        }
    }

    /// 先查变量作用域，再查函数表。
    fn check_identifier(&mut self, ident: &Identifier) -> Type {
        if let Some(symbol) = self.symbols.resolve(&ident.name) {
            return symbol.ty.clone();
        }
        if let Some(info) = self.functions.lookup(&ident.name) {
            return info.as_type();
        }

        let diag = Diagnostic::error(
            &E0200_UNDEFINED_VARIABLE,
            Label::new(ident.span, "not found in this scope"),
        )
        .with_dynamic_message(format!("Undefined variable '{}'", ident.name));
        self.diagnostics.report(diag);
        Type::Error
    }

    fn check_binary(&mut self, binary: &BinaryExpression) -> Type {
        let left = self.check_expression(&binary.left);
        let right = self.check_expression(&binary.right);
        let op = binary.operator.kind;
        let (left_span, right_span) = (binary.left.span, binary.right.span);

        match op {
            // `+` 只要有一边是字符串就是拼接
            BinaryOp::Add if left == Type::String || right == Type::String => Type::String,
            BinaryOp::Eq | BinaryOp::NotEq => {
                if !left.is_compatible_with(&right) {
                    let label = Label::new(
                        binary.operator.span,
                        format!("{} compared with {}", left, right),
                    );
                    self.diagnostics.report_warning(
                        &W0200_INCOMPATIBLE_COMPARISON,
                        format!("Comparing incompatible types: {} and {}", left, right),
                        label,
                    );
                }
                Type::Boolean
            }
            _ => {
                let context = if op.is_comparison() {
                    "comparison"
                } else if op.is_bitwise() {
                    "bitwise operator"
                } else {
                    "arithmetic operator"
                };
                let left_context = format!("left operand of '{}' ({})", op, context);
                let right_context = format!("right operand of '{}' ({})", op, context);
                let left_ok = self.expect_numeric(&left, left_span, &left_context);
                let right_ok = self.expect_numeric(&right, right_span, &right_context);
                if !left_ok || !right_ok {
                    return Type::Error;
                }
                if op.is_comparison() { Type::Boolean } else { Type::Number }
            }
        }
    }

    fn check_unary(&mut self, unary: &UnaryExpression) -> Type {
        let operand = self.check_expression(&unary.operand);
        match unary.operator.kind {
            UnaryOp::Not => Type::Boolean,
            op @ (UnaryOp::Neg | UnaryOp::BitNot) => {
                let context = format!("operand of unary '{}'", op);
                if self.expect_numeric(&operand, unary.operand.span, &context) {
                    Type::Number
                } else {
                    Type::Error
                }
            }
        }
    }

    fn check_call(&mut self, call: &CallExpression, span: Span) -> Type {
        // 参数总是先检查，尽量多报告错误
        let arg_types: Vec<Type> = call
            .arguments
            .iter()
            .map(|arg| self.check_expression(arg))
            .collect();

        let Expression::Identifier(callee) = &call.callee.kind else {
            let label = Label::new(call.callee.span, "this is not a function name");
            self.diagnostics.report_error(&E0204_NOT_A_FUNCTION, "Expected function name in call", label);
            return Type::Error;
        };

        let Some(info) = self.functions.lookup(&callee.name) else {
            if self.symbols.resolve(&callee.name).is_some() {
                let label = Label::new(callee.span, "this is a variable");
                self.diagnostics.report_error(
                    &E0204_NOT_A_FUNCTION,
                    format!("'{}' is not a function", callee.name),
                    label,
                );
            } else {
                let label = Label::new(callee.span, "no `vibe` with this name");
                self.diagnostics.report_error(
                    &E0203_UNDEFINED_FUNCTION,
                    format!("Undefined function '{}'", callee.name),
                    label,
                );
            }
            return Type::Error;
        };

        if arg_types.len() != info.arity() {
            let definition = Label::new(info.defined_at, "function defined here");
            let diag = Diagnostic::error(
                &E0205_WRONG_ARGUMENT_COUNT,
                Label::new(span, format!("{} arguments supplied", arg_types.len())),
            )
            .with_dynamic_message(format!(
                "Function '{}' expects {} arguments, got {}",
                callee.name,
                info.arity(),
                arg_types.len()
            ))
            .with_secondary_label(definition);
            self.diagnostics.report(diag);
            return Type::Error;
        }

        let return_type = info.return_type.clone();
        let mismatches: Vec<(usize, Type, Type)> = arg_types
            .into_iter()
            .zip(info.param_types.iter())
            .enumerate()
            .filter(|(_, (actual, expected))| !actual.is_compatible_with(expected))
            .map(|(i, (actual, expected))| (i, actual, expected.clone()))
            .collect();

        for (i, actual, expected) in mismatches {
            let label = Label::new(call.arguments[i].span, format!("expected {}", expected));
            self.diagnostics.report_error(
                &E0202_TYPE_MISMATCH,
                format!(
                    "Argument {} of function '{}' expects {}, got {}",
                    i + 1,
                    callee.name,
                    expected,
                    actual
                ),
                label,
            );
        }

        return_type
    }

    /// 赋值会重新推断变量的类型（最后一次赋值为准）。
    fn check_assignment(&mut self, assign: &AssignmentExpression) -> Type {
        let value_type = self.check_expression(&assign.value);
        let name = &assign.target.name;

        let Some(symbol) = self.symbols.resolve_mut(name) else {
            let label = Label::new(assign.target.span, "not found in this scope");
            self.diagnostics.report_error(
                &E0200_UNDEFINED_VARIABLE,
                format!("Undefined variable '{}' in assignment", name),
                label,
            );
            return Type::Error;
        };

        if symbol.is_const {
            let label = Label::new(assign.target.span, "cannot be reassigned");
            self.diagnostics.report_error(
                &E0208_ASSIGNMENT_TO_CONST,
                format!("Cannot assign to constant '{}'", name),
                label,
            );
            return Type::Error;
        }

        symbol.ty = value_type.clone();
        symbol.is_initialized = true;
        value_type
    }

    fn check_compound_assignment(&mut self, assign: &CompoundAssignmentExpression) -> Type {
        let name = &assign.target.name;
        let Some(symbol) = self.symbols.resolve(name) else {
            let label = Label::new(assign.target.span, "not found in this scope");
            self.diagnostics.report_error(
                &E0200_UNDEFINED_VARIABLE,
                format!("Undefined variable '{}' in compound assignment", name),
                label,
            );
            return Type::Error;
        };
        let (current, is_const) = (symbol.ty.clone(), symbol.is_const);

        if is_const {
            let label = Label::new(assign.target.span, "cannot be modified");
            self.diagnostics.report_error(
                &E0208_ASSIGNMENT_TO_CONST,
                format!("Cannot modify constant '{}'", name),
                label,
            );
            return Type::Error;
        }

        let value_type = self.check_expression(&assign.value);
        if !self.expect_numeric(&current, assign.target.span, "variable in compound assignment") {
            return Type::Error;
        }
        if !self.expect_numeric(&value_type, assign.value.span, "value in compound assignment") {
            return Type::Error;
        }
        Type::Number
    }

    fn check_increment(&mut self, inc: &IncrementExpression, span: Span) -> Type {
        let name = &inc.target.name;
        let Some(symbol) = self.symbols.resolve(name) else {
            let label = Label::new(inc.target.span, "not found in this scope");
            self.diagnostics.report_error(
                &E0200_UNDEFINED_VARIABLE,
                format!("Undefined variable '{}' in increment/decrement", name),
                label,
            );
            return Type::Error;
        };
        let (current, is_const) = (symbol.ty.clone(), symbol.is_const);

        if is_const {
            let label = Label::new(span, "cannot be modified");
            self.diagnostics.report_error(
                &E0208_ASSIGNMENT_TO_CONST,
                format!("Cannot modify constant '{}'", name),
                label,
            );
            return Type::Error;
        }

        let context = format!("variable in '{}'", inc.operator);
        if self.expect_numeric(&current, inc.target.span, &context) {
            Type::Number
        } else {
            Type::Error
        }
    }

    /// 数组不做静态越界检查，元素类型一律是 `Any`。
    fn check_index(&mut self, object: &Node<Expression>, index: &Node<Expression>) -> Type {
        self.check_expression(object);
        let index_type = self.check_expression(index);
        self.expect_numeric(&index_type, index.span, "array index");
        Type::Any
    }

    fn expect_numeric(&mut self, ty: &Type, span: Span, context: &str) -> bool {
        if ty.is_numeric() || ty.is_unknown() {
            return true;
        }
        let label = Label::new(span, format!("this is a {}", ty));
        self.diagnostics.report_error(
            &E0202_TYPE_MISMATCH,
            format!("Expected numeric type for {}, got {}", context, ty),
            label,
        );
        false
    }
}
