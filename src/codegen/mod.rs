//! src/codegen/mod.rs
//!
//! 把通过类型检查的 AST 降低为 LLVM IR。
//! 所有数值在 IR 层统一是 `double`，字符串是指向私有常量的 `ptr`，
//! 数组是函数入口块里的 `[N x double]` 栈空间。

mod expression;
mod function;
mod globals;
mod statement;
mod utils;


use crate::diagnostics::codes::*;
use crate::diagnostics::{Diagnostic, DiagnosticBag, Label};
use crate::parser::ast::*;
use crate::utils::Span;
use inkwell::basic_block::BasicBlock;
use inkwell::builder::{Builder, BuilderError};
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::{FloatValue, FunctionValue, IntValue, PointerValue};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// 没有显式指定时使用的模块名。
pub const DEFAULT_MODULE_NAME: &str = "sigma_module";

/// 生成的模块自己占用的符号，用户函数不能重名。
pub const RESERVED_FUNCTION_NAMES: &[&str] = &["main", "printf"];

// --- 1. 错误类型 ---

/// 代码生成阶段的错误。一旦出现，整个编译单元的生成立即中止。
#[derive(Debug, Error)]
pub enum CodeGenError {
    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String, span: Span },

    #[error("Function '{name}' expects {expected} arguments, got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("Unknown variable '{name}'")]
    UnknownVariable { name: String, span: Span },

    #[error("'{name}' is not an array")]
    NotAnArray { name: String, span: Span },

    #[error("{message}")]
    Unsupported { message: String, span: Span },

    #[error("Module verification failed: {0}")]
    VerificationFailed(String),

    #[error("Failed to build instruction: {0}")]
    Builder(#[from] BuilderError),

    #[error("Internal code generation error: {0}")]
    Internal(String),
}

impl CodeGenError {
    pub(crate) fn unsupported(message: impl Into<String>, span: Span) -> Self {
        CodeGenError::Unsupported {
            message: message.into(),
            span,
        }
    }

    /// 转换成统一的诊断格式，阶段记为 Runtime。
    pub fn into_diagnostic(self) -> Diagnostic {
        let message = self.to_string();
        let diag = match self {
            CodeGenError::UnknownFunction { span, .. } => {
                Diagnostic::error(&E0302_UNKNOWN_FUNCTION, Label::new(span, "no function with this name"))
            }
            CodeGenError::ArgumentCount { span, .. } => {
                Diagnostic::error(&E0303_ARGUMENT_COUNT, Label::new(span, "in this call"))
            }
            CodeGenError::UnknownVariable { span, .. } => {
                Diagnostic::error(&E0304_UNKNOWN_VARIABLE, Label::new(span, "no storage for this name"))
            }
            CodeGenError::NotAnArray { span, .. } => {
                Diagnostic::error(&E0305_NOT_AN_ARRAY, Label::new(span, "indexed here"))
            }
            CodeGenError::Unsupported { span, .. } => {
                Diagnostic::error(&E0306_UNSUPPORTED_CONSTRUCT, Label::new(span, "cannot be lowered"))
            }
            CodeGenError::VerificationFailed(_) => Diagnostic::unlocated(&E0300_LLVM_VERIFICATION_FAILED),
            CodeGenError::Builder(_) | CodeGenError::Internal(_) => {
                Diagnostic::unlocated(&E0301_INTERNAL_CODEGEN_ERROR)
            }
        };
        diag.with_dynamic_message(message)
    }
}

// --- 2. 运行时值与存储槽 ---

/// 表达式降低后的值。
#[derive(Debug, Clone, Copy)]
pub(crate) enum Value<'ctx> {
    Number(FloatValue<'ctx>),
    Text(PointerValue<'ctx>),
    /// 数组总是按地址传递，`len` 是元素个数。
    Array { pointer: PointerValue<'ctx>, len: u32 },
}

impl<'ctx> Value<'ctx> {
    fn describe(&self) -> &'static str {
        match self {
            Value::Number(_) => "a number",
            Value::Text(_) => "a string",
            Value::Array { .. } => "an array",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotKind {
    Number,
    Text,
    Array(u32),
}

/// 一个变量在栈上的存储位置。
#[derive(Debug, Clone, Copy)]
struct Slot<'ctx> {
    pointer: PointerValue<'ctx>,
    kind: SlotKind,
    /// 声明它的作用域在 `scopes` 里的下标。
    depth: usize,
}

impl<'ctx> Slot<'ctx> {
    /// 值的形状和槽的形状一致时可以直接 store。
    fn holds(&self, value: &Value<'ctx>) -> bool {
        matches!(
            (self.kind, value),
            (SlotKind::Number, Value::Number(_)) | (SlotKind::Text, Value::Text(_))
        )
    }
}

/// `skip` 跳到 `continue_to`，`mog` 跳到 `break_to`。
#[derive(Debug, Clone, Copy)]
struct LoopTargets<'ctx> {
    continue_to: BasicBlock<'ctx>,
    break_to: BasicBlock<'ctx>,
}

// --- 3. 代码生成器 ---

/// 代码生成器，持有一个编译单元降低过程中的全部状态。
pub struct CodeGen<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,

    functions: HashMap<String, FunctionValue<'ctx>>,
    /// 作用域栈，内层在末尾。
    scopes: Vec<HashMap<String, Slot<'ctx>>>,
    loop_stack: Vec<LoopTargets<'ctx>>,
    /// 同一个单元内相同的字符串常量只生成一次。
    strings: HashMap<String, PointerValue<'ctx>>,
    current_function: Option<FunctionValue<'ctx>>,
    /// 正在生成用户函数体（而不是 `main`）。
    in_function: bool,
}

/// 语句生成。
trait StatementCodeGen<'ctx> {
    fn codegen_statement(&mut self, stmt: &Node<Statement>) -> Result<(), CodeGenError>;
    /// 依次生成块内语句，不负责作用域；遇到终结指令后剩余语句不可达，直接跳过。
    fn codegen_block(&mut self, statements: &[Node<Statement>]) -> Result<(), CodeGenError>;
    fn codegen_scoped_block(&mut self, block: &BlockStatement) -> Result<(), CodeGenError>;
    fn codegen_var_declaration(&mut self, decl: &VarDeclaration) -> Result<(), CodeGenError>;
    fn codegen_print(&mut self, expr: &Node<Expression>) -> Result<(), CodeGenError>;
    fn codegen_interpolated_print(&mut self, interp: &InterpolatedString) -> Result<(), CodeGenError>;
    fn codegen_if_statement(&mut self, if_stmt: &IfStatement) -> Result<(), CodeGenError>;
    fn codegen_while_statement(&mut self, while_stmt: &WhileStatement) -> Result<(), CodeGenError>;
    fn codegen_for_statement(&mut self, for_stmt: &ForStatement) -> Result<(), CodeGenError>;
    fn codegen_return_statement(&mut self, ret: &ReturnStatement, span: Span) -> Result<(), CodeGenError>;
    fn codegen_loop_jump(&mut self, is_break: bool, span: Span) -> Result<(), CodeGenError>;
    fn codegen_switch_statement(&mut self, switch: &SwitchStatement) -> Result<(), CodeGenError>;
    fn codegen_try_catch(&mut self, try_catch: &TryCatchStatement) -> Result<(), CodeGenError>;
}

/// 表达式生成，返回降低后的值。
trait ExpressionCodeGen<'ctx> {
    fn codegen_expression(&mut self, expr: &Node<Expression>) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_literal(&mut self, literal: &LiteralValue) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_identifier(&mut self, ident: &Identifier) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_binary(&mut self, binary: &BinaryExpression) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_unary(&mut self, unary: &UnaryExpression) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_logical(&mut self, logical: &LogicalExpression) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_call(&mut self, call: &CallExpression) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_assignment(&mut self, assign: &AssignmentExpression) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_compound_assignment(
        &mut self,
        assign: &CompoundAssignmentExpression,
    ) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_increment(&mut self, inc: &IncrementExpression) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_array(&mut self, elements: &[Node<Expression>]) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_index(&mut self, index: &IndexExpression) -> Result<Value<'ctx>, CodeGenError>;
    fn codegen_index_assignment(
        &mut self,
        assign: &IndexAssignmentExpression,
    ) -> Result<Value<'ctx>, CodeGenError>;
    /// 相等比较，数字用 `fcmp`，字符串比较地址。
    fn codegen_equality(
        &mut self,
        equal: bool,
        left: Value<'ctx>,
        right: Value<'ctx>,
        span: Span,
    ) -> Result<IntValue<'ctx>, CodeGenError>;
    /// 值的真假，结果是 `i1`。
    fn codegen_truthiness(&mut self, value: Value<'ctx>) -> Result<IntValue<'ctx>, CodeGenError>;
    fn expect_number(
        &self,
        value: Value<'ctx>,
        span: Span,
        context: &str,
    ) -> Result<FloatValue<'ctx>, CodeGenError>;
}

impl<'ctx> CodeGen<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        Self {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            functions: HashMap::new(),
            scopes: Vec::new(),
            loop_stack: Vec::new(),
            strings: HashMap::new(),
            current_function: None,
            in_function: false,
        }
    }

    /// 消费生成器，返回校验过的模块。
    pub fn run(mut self, program: &Program) -> Result<Module<'ctx>, CodeGenError> {
        // PASS 1: 声明所有函数，支持前向引用
        self.declare_functions(program)?;
        debug!(functions = self.functions.len(), "declared functions");

        // PASS 2: 顶层语句进入 main，函数体在出现的位置生成
        let main_type = self.context.i32_type().fn_type(&[], false);
        let main_fn = self.module.add_function("main", main_type, None);
        let entry = self.context.append_basic_block(main_fn, "entry");
        self.builder.position_at_end(entry);
        self.current_function = Some(main_fn);

        self.scopes.push(HashMap::new());
        self.codegen_block(&program.statements)?;
        self.scopes.pop();

        if !self.block_terminated() {
            let zero = self.context.i32_type().const_int(0, false);
            self.builder.build_return(Some(&zero))?;
        }

        self.module
            .verify()
            .map_err(|e| CodeGenError::VerificationFailed(e.to_string()))?;
        debug!(strings = self.strings.len(), "module verified");
        Ok(self.module)
    }

    // --- 作用域 ---

    fn lookup_variable(&self, name: &str) -> Option<Slot<'ctx>> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }

    fn declare_variable(&mut self, name: &str, slot: Slot<'ctx>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), slot);
        }
    }

    fn scope_depth(&self) -> usize {
        self.scopes.len().saturating_sub(1)
    }

    /// 让已有的名字指向新的存储槽（赋值改变了值的形状）。新槽留在原来的作用域里。
    fn rebind_variable(&mut self, name: &str, previous: Slot<'ctx>, slot: Slot<'ctx>) {
        let slot = Slot {
            depth: previous.depth,
            ..slot
        };
        if let Some(scope) = self.scopes.get_mut(previous.depth) {
            scope.insert(name.to_string(), slot);
        }
    }

    // --- 基本块 ---

    fn current_function(&self) -> Result<FunctionValue<'ctx>, CodeGenError> {
        self.current_function
            .ok_or_else(|| CodeGenError::Internal("no function is being generated".to_string()))
    }

    fn current_block(&self) -> Result<BasicBlock<'ctx>, CodeGenError> {
        self.builder
            .get_insert_block()
            .ok_or_else(|| CodeGenError::Internal("builder has no insertion block".to_string()))
    }

    fn append_block(&self, name: &str) -> Result<BasicBlock<'ctx>, CodeGenError> {
        let function = self.current_function()?;
        Ok(self.context.append_basic_block(function, name))
    }

    fn block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_terminator())
            .is_some()
    }

    /// 当前块还没有终结指令时才补一条跳转。
    fn branch_if_open(&self, target: BasicBlock<'ctx>) -> Result<(), CodeGenError> {
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(target)?;
        }
        Ok(())
    }
}

// --- 4. 顶层入口 ---

/// 为程序生成 LLVM 模块。失败时错误已写入 `diagnostics`，返回 `None`。
pub fn generate<'ctx>(
    context: &'ctx Context,
    program: &Program,
    diagnostics: &mut DiagnosticBag,
) -> Option<Module<'ctx>> {
    match CodeGen::new(context, DEFAULT_MODULE_NAME).run(program) {
        Ok(module) => Some(module),
        Err(err) => {
            diagnostics.report(err.into_diagnostic());
            None
        }
    }
}

/// 生成文本形式的 LLVM IR。
pub fn codegen(program: &Program, diagnostics: &mut DiagnosticBag) -> Option<String> {
    let context = Context::create();
    let module = generate(&context, program, diagnostics)?;
    Some(module.print_to_string().to_string())
}
