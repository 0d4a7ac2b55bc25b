//! src/analyzer/mod.rs
//!
//! 类型检查器：两遍扫描。
//! 第一遍收集所有顶层函数的签名，使得前向引用和相互递归都能解析；
//! 第二遍带着作用域栈、循环深度和当前函数信息遍历全部语句。

mod expression;
mod statement;
pub mod symbols;
pub mod types;

#[cfg(test)]
mod test;

use crate::codegen::RESERVED_FUNCTION_NAMES;
use crate::diagnostics::codes::{E0210_DUPLICATE_FUNCTION, E0213_RESERVED_FUNCTION_NAME};
use crate::diagnostics::{Diagnostic, DiagnosticBag, Label};
use crate::parser::ast::*;
use crate::utils::Span;
use symbols::{FunctionInfo, FunctionTable, SymbolTable};
use tracing::debug;
use types::Type;

// --- 1. 主结构体 ---

/// 类型检查器，持有分析过程所需的全部状态。
pub struct Analyzer<'a> {
    diagnostics: &'a mut DiagnosticBag,
    symbols: SymbolTable,
    functions: FunctionTable,
    loop_depth: u32,
    /// 当前函数的返回类型；`None` 表示不在函数体内。
    return_type: Option<Type>,
}

// --- 2. Trait 定义：组织分析逻辑 ---

/// `SemanticAnalysis` Trait 是类型检查的总入口。
pub trait SemanticAnalysis {
    /// 检查整个程序，返回是否出现了错误（警告不算）。错误信息已存入 diagnostics。
    fn analyze(&mut self, program: &Program) -> bool;
}

/// 第一遍：注册所有顶层函数。
trait FunctionRegistration {
    fn register_functions(&mut self, program: &Program);
}

/// 语句检查。
trait StatementChecker {
    fn check_statement(&mut self, stmt: &Node<Statement>);
    fn check_block(&mut self, block: &BlockStatement);
    fn check_var_declaration(&mut self, decl: &VarDeclaration);
    fn check_if_statement(&mut self, if_stmt: &IfStatement);
    fn check_while_statement(&mut self, while_stmt: &WhileStatement);
    fn check_for_statement(&mut self, for_stmt: &ForStatement);
    fn check_function_definition(&mut self, func_def: &FunctionDefinition, span: Span);
    fn check_return_statement(&mut self, ret: &ReturnStatement, span: Span);
    fn check_switch_statement(&mut self, switch: &SwitchStatement);
    fn check_try_catch(&mut self, try_catch: &TryCatchStatement, span: Span);
    /// 检查条件表达式：必须是数字、布尔值或未知类型。
    fn check_condition(&mut self, condition: &Node<Expression>, keyword: &str);
}

/// 表达式检查，返回推断出的类型。
trait ExpressionChecker {
    fn check_expression(&mut self, expr: &Node<Expression>) -> Type;
    fn check_identifier(&mut self, ident: &Identifier) -> Type;
    fn check_binary(&mut self, binary: &BinaryExpression) -> Type;
    fn check_unary(&mut self, unary: &UnaryExpression) -> Type;
    fn check_call(&mut self, call: &CallExpression, span: Span) -> Type;
    fn check_assignment(&mut self, assign: &AssignmentExpression) -> Type;
    fn check_compound_assignment(&mut self, assign: &CompoundAssignmentExpression) -> Type;
    fn check_increment(&mut self, inc: &IncrementExpression, span: Span) -> Type;
    fn check_index(&mut self, object: &Node<Expression>, index: &Node<Expression>) -> Type;
    /// `Any` / `Error` 直接放行；不是数字时报告错误并返回 `false`。
    fn expect_numeric(&mut self, ty: &Type, span: Span, context: &str) -> bool;
}

// --- 3. 基础实现：入口点 ---

impl<'a> Analyzer<'a> {
    pub fn new(diagnostics: &'a mut DiagnosticBag) -> Self {
        Self {
            diagnostics,
            symbols: SymbolTable::new(),
            functions: FunctionTable::default(),
            loop_depth: 0,
            return_type: None,
        }
    }

    fn in_function(&self) -> bool {
        self.return_type.is_some()
    }
}

impl<'a> SemanticAnalysis for Analyzer<'a> {
    fn analyze(&mut self, program: &Program) -> bool {
        let errors_before = self.diagnostics.error_count();

        self.register_functions(program);
        debug!(functions = self.functions.len(), "collected function signatures");

        for stmt in &program.statements {
            self.check_statement(stmt);
        }

        let had_error = self.diagnostics.error_count() > errors_before;
        debug!(had_error, warnings = self.diagnostics.warning_count(), "type check finished");
        had_error
    }
}

impl<'a> FunctionRegistration for Analyzer<'a> {
    fn register_functions(&mut self, program: &Program) {
        for stmt in &program.statements {
            let Statement::Function(func_def) = &stmt.kind else {
                continue;
            };

            let info = FunctionInfo {
                name: func_def.name.name.clone(),
                param_names: func_def.params.iter().map(|p| p.name.clone()).collect(),
                param_types: vec![Type::Number; func_def.params.len()],
                return_type: Type::Number,
                defined_at: func_def.name.span,
            };

            if RESERVED_FUNCTION_NAMES.contains(&info.name.as_str()) {
                let diag = Diagnostic::error(
                    &E0213_RESERVED_FUNCTION_NAME,
                    Label::new(func_def.name.span, "reserved name"),
                )
                .with_dynamic_message(format!("'{}' cannot be used as a function name", info.name))
                .with_hint("rename the function");
                self.diagnostics.report(diag);
                continue;
            }

            if let Some(existing) = self.functions.lookup(&info.name) {
                let previous = Label::new(existing.defined_at, "first declared here");
                let diag = Diagnostic::error(
                    &E0210_DUPLICATE_FUNCTION,
                    Label::new(func_def.name.span, "duplicate function"),
                )
                .with_dynamic_message(format!("Function '{}' is already declared", info.name))
                .with_secondary_label(previous);
                self.diagnostics.report(diag);
                continue;
            }
            self.functions.declare(info);
        }
    }
}
