// In src/codegen/statement.rs

use super::utils::{create_entry_block_alloca, escape_format};
use super::{
    CodeGen, CodeGenError, ExpressionCodeGen, LoopTargets, Slot, SlotKind, StatementCodeGen, Value,
};
use crate::parser::ast::*;
use crate::utils::Span;
use inkwell::AddressSpace;
use inkwell::values::BasicMetadataValueEnum;
use std::collections::HashMap;

impl<'ctx> StatementCodeGen<'ctx> for CodeGen<'ctx> {
    /// 语句生成的总入口（分发函数）。
    fn codegen_statement(&mut self, stmt: &Node<Statement>) -> Result<(), CodeGenError> {
        match &stmt.kind {
            Statement::VarDeclaration(decl) => self.codegen_var_declaration(decl),
            Statement::Print(expr) => self.codegen_print(expr),
            Statement::Expression(expr) => self.codegen_expression(expr).map(|_| ()),
            Statement::Block(block) => self.codegen_scoped_block(block),
            Statement::If(if_stmt) => self.codegen_if_statement(if_stmt),
            Statement::While(while_stmt) => self.codegen_while_statement(while_stmt),
            Statement::For(for_stmt) => self.codegen_for_statement(for_stmt),
            Statement::Function(func_def) => self.codegen_function(func_def, stmt.span),
            Statement::Return(ret) => self.codegen_return_statement(ret, stmt.span),
            Statement::Break => self.codegen_loop_jump(true, stmt.span),
            Statement::Continue => self.codegen_loop_jump(false, stmt.span),
            Statement::Switch(switch) => self.codegen_switch_statement(switch),
            Statement::TryCatch(try_catch) => self.codegen_try_catch(try_catch),
        }
    }

    fn codegen_block(&mut self, statements: &[Node<Statement>]) -> Result<(), CodeGenError> {
        for stmt in statements {
            self.codegen_statement(stmt)?;
            if self.block_terminated() {
                break;
            }
        }
        Ok(())
    }

    fn codegen_scoped_block(&mut self, block: &BlockStatement) -> Result<(), CodeGenError> {
        self.scopes.push(HashMap::new());
        let result = self.codegen_block(&block.statements);
        self.scopes.pop();
        result
    }

    fn codegen_var_declaration(&mut self, decl: &VarDeclaration) -> Result<(), CodeGenError> {
        let value = self.codegen_expression(&decl.initializer)?;
        let slot = self.allocate_slot(&decl.name.name, value)?;
        self.declare_variable(&decl.name.name, slot);
        Ok(())
    }

    fn codegen_print(&mut self, expr: &Node<Expression>) -> Result<(), CodeGenError> {
        if let Expression::InterpolatedString(interp) = &expr.kind {
            return self.codegen_interpolated_print(interp);
        }

        let value = self.codegen_expression(expr)?;
        let (format, arg): (_, BasicMetadataValueEnum) = match value {
            Value::Number(number) => (self.number_format()?, number.into()),
            Value::Text(text) => (self.text_format()?, text.into()),
            Value::Array { .. } => {
                return Err(CodeGenError::unsupported(
                    "Arrays cannot be printed directly; print one element at a time",
                    expr.span,
                ));
            }
        };
        let printf = self.printf();
        self.builder.build_call(printf, &[format.into(), arg], "printfcall")?;
        Ok(())
    }

    /// 把所有片段拼成一个 printf 模板，一次调用输出整行。
    fn codegen_interpolated_print(&mut self, interp: &InterpolatedString) -> Result<(), CodeGenError> {
        let mut template = String::new();
        let mut args: Vec<BasicMetadataValueEnum> = Vec::new();

        for (i, segment) in interp.segments.iter().enumerate() {
            template.push_str(&escape_format(segment));
            let Some(part) = interp.parts.get(i) else {
                continue;
            };
            match self.codegen_expression(part)? {
                Value::Number(number) => {
                    template.push_str("%g");
                    args.push(number.into());
                }
                Value::Text(text) => {
                    template.push_str("%s");
                    args.push(text.into());
                }
                Value::Array { .. } => {
                    return Err(CodeGenError::unsupported(
                        "Arrays cannot be interpolated into a string",
                        part.span,
                    ));
                }
            }
        }
        template.push('\n');

        let format = self.string_constant(&template, "interp_fmt")?;
        args.insert(0, format.into());
        let printf = self.printf();
        self.builder.build_call(printf, &args, "printfcall")?;
        Ok(())
    }

    fn codegen_if_statement(&mut self, if_stmt: &IfStatement) -> Result<(), CodeGenError> {
        let condition = self.codegen_expression(&if_stmt.condition)?;
        let condition = self.codegen_truthiness(condition)?;

        let then_block = self.append_block("then")?;
        let else_block = match if_stmt.else_branch {
            Some(_) => Some(self.append_block("else")?),
            None => None,
        };
        let merge_block = self.append_block("ifcont")?;

        self.builder
            .build_conditional_branch(condition, then_block, else_block.unwrap_or(merge_block))?;

        self.builder.position_at_end(then_block);
        self.codegen_scoped_block(&if_stmt.then_branch.kind)?;
        self.branch_if_open(merge_block)?;

        if let (Some(else_block), Some(else_branch)) = (else_block, &if_stmt.else_branch) {
            self.builder.position_at_end(else_block);
            self.codegen_statement(else_branch)?;
            self.branch_if_open(merge_block)?;
        }

        self.builder.position_at_end(merge_block);
        Ok(())
    }

    fn codegen_while_statement(&mut self, while_stmt: &WhileStatement) -> Result<(), CodeGenError> {
        let cond_block = self.append_block("whilecond")?;
        let body_block = self.append_block("whilebody")?;
        let end_block = self.append_block("whileend")?;

        self.builder.build_unconditional_branch(cond_block)?;

        self.builder.position_at_end(cond_block);
        let condition = self.codegen_expression(&while_stmt.condition)?;
        let condition = self.codegen_truthiness(condition)?;
        self.builder
            .build_conditional_branch(condition, body_block, end_block)?;

        self.builder.position_at_end(body_block);
        self.loop_stack.push(LoopTargets {
            continue_to: cond_block,
            break_to: end_block,
        });
        let body = self.codegen_scoped_block(&while_stmt.body.kind);
        self.loop_stack.pop();
        body?;
        self.branch_if_open(cond_block)?;

        self.builder.position_at_end(end_block);
        Ok(())
    }

    fn codegen_for_statement(&mut self, for_stmt: &ForStatement) -> Result<(), CodeGenError> {
        // 初始化子句声明的变量只在循环内可见
        self.scopes.push(HashMap::new());
        let result = self.codegen_for_loop(for_stmt);
        self.scopes.pop();
        result
    }

    fn codegen_return_statement(&mut self, ret: &ReturnStatement, span: Span) -> Result<(), CodeGenError> {
        if !self.in_function {
            return Err(CodeGenError::unsupported("'send' (return) used outside of function", span));
        }
        let value = match &ret.value {
            Some(expr) => {
                let value = self.codegen_expression(expr)?;
                self.expect_number(value, expr.span, "return value")?
            }
            None => self.context.f64_type().const_float(0.0),
        };
        self.builder.build_return(Some(&value))?;
        Ok(())
    }

    fn codegen_loop_jump(&mut self, is_break: bool, span: Span) -> Result<(), CodeGenError> {
        let Some(targets) = self.loop_stack.last().copied() else {
            let message = if is_break {
                "'mog' (break) used outside of loop"
            } else {
                "'skip' (continue) used outside of loop"
            };
            return Err(CodeGenError::unsupported(message, span));
        };
        let target = if is_break { targets.break_to } else { targets.continue_to };
        self.builder.build_unconditional_branch(target)?;
        Ok(())
    }

    /// 浮点数不能用 LLVM 的 switch 指令，这里生成一串 `fcmp oeq` 比较。
    fn codegen_switch_statement(&mut self, switch: &SwitchStatement) -> Result<(), CodeGenError> {
        let scrutinee = self.codegen_expression(&switch.scrutinee)?;

        let has_default = switch.cases.iter().any(|case| case.kind.value.is_none());
        let default_block = if has_default {
            Some(self.append_block("switch.default")?)
        } else {
            None
        };
        let mut case_blocks = Vec::with_capacity(switch.cases.len());
        for case in &switch.cases {
            let block = match case.kind.value {
                Some(_) => self.append_block("switch.case")?,
                None => default_block.ok_or_else(|| {
                    CodeGenError::Internal("default case without a block".to_string())
                })?,
            };
            case_blocks.push(block);
        }
        let end_block = self.append_block("switch.end")?;
        let fallback = default_block.unwrap_or(end_block);

        let tests: Vec<_> = switch
            .cases
            .iter()
            .zip(&case_blocks)
            .filter_map(|(case, block)| case.kind.value.as_ref().map(|value| (value, *block)))
            .collect();

        if tests.is_empty() {
            self.builder.build_unconditional_branch(fallback)?;
        }
        for (i, (value, case_block)) in tests.iter().enumerate() {
            let case_value = self.codegen_literal(&value.kind)?;
            let matched = self.codegen_equality(true, scrutinee, case_value, value.span)?;
            let next_block = if i + 1 < tests.len() {
                self.append_block("switch.next")?
            } else {
                fallback
            };
            self.builder
                .build_conditional_branch(matched, *case_block, next_block)?;
            self.builder.position_at_end(next_block);
        }

        // 每个分支执行完都跳到 switch.end，不会贯穿
        for (case, block) in switch.cases.iter().zip(case_blocks) {
            self.builder.position_at_end(block);
            self.scopes.push(HashMap::new());
            let body = self.codegen_block(&case.kind.body);
            self.scopes.pop();
            body?;
            self.branch_if_open(end_block)?;
        }

        self.builder.position_at_end(end_block);
        Ok(())
    }

    /// 只是骨架：try 块总是执行完，catch 块不可达。
    fn codegen_try_catch(&mut self, try_catch: &TryCatchStatement) -> Result<(), CodeGenError> {
        let try_block = self.append_block("try")?;
        let catch_block = self.append_block("catch")?;
        let end_block = self.append_block("tryend")?;

        self.builder.build_unconditional_branch(try_block)?;

        self.builder.position_at_end(try_block);
        self.codegen_scoped_block(&try_catch.try_block.kind)?;
        self.branch_if_open(end_block)?;

        self.builder.position_at_end(catch_block);
        self.codegen_scoped_block(&try_catch.catch_block.kind)?;
        self.branch_if_open(end_block)?;

        self.builder.position_at_end(end_block);
        Ok(())
    }
}

impl<'ctx> CodeGen<'ctx> {
    fn codegen_for_loop(&mut self, for_stmt: &ForStatement) -> Result<(), CodeGenError> {
        if let Some(init) = &for_stmt.initializer {
            self.codegen_statement(init)?;
        }

        let cond_block = self.append_block("forcond")?;
        let body_block = self.append_block("forbody")?;
        let incr_block = self.append_block("forincr")?;
        let end_block = self.append_block("forend")?;

        self.builder.build_unconditional_branch(cond_block)?;

        // 没有条件时直接进入循环体
        self.builder.position_at_end(cond_block);
        match &for_stmt.condition {
            Some(condition) => {
                let condition = self.codegen_expression(condition)?;
                let condition = self.codegen_truthiness(condition)?;
                self.builder
                    .build_conditional_branch(condition, body_block, end_block)?;
            }
            None => {
                self.builder.build_unconditional_branch(body_block)?;
            }
        }

        self.builder.position_at_end(body_block);
        self.loop_stack.push(LoopTargets {
            continue_to: incr_block,
            break_to: end_block,
        });
        let body = self.codegen_scoped_block(&for_stmt.body.kind);
        self.loop_stack.pop();
        body?;
        self.branch_if_open(incr_block)?;

        self.builder.position_at_end(incr_block);
        if let Some(increment) = &for_stmt.increment {
            self.codegen_expression(increment)?;
        }
        self.builder.build_unconditional_branch(cond_block)?;

        self.builder.position_at_end(end_block);
        Ok(())
    }

    /// 为值分配一个与其形状相符的存储槽并写入。数组本身已经在栈上，直接复用地址。
    pub(super) fn allocate_slot(
        &mut self,
        name: &str,
        value: Value<'ctx>,
    ) -> Result<Slot<'ctx>, CodeGenError> {
        let depth = self.scope_depth();
        let slot = match value {
            Value::Number(number) => {
                let pointer = create_entry_block_alloca(self, name, self.context.f64_type())?;
                self.builder.build_store(pointer, number)?;
                Slot {
                    pointer,
                    kind: SlotKind::Number,
                    depth,
                }
            }
            Value::Text(text) => {
                let ptr_type = self.context.ptr_type(AddressSpace::default());
                let pointer = create_entry_block_alloca(self, name, ptr_type)?;
                self.builder.build_store(pointer, text)?;
                Slot {
                    pointer,
                    kind: SlotKind::Text,
                    depth,
                }
            }
            Value::Array { pointer, len } => Slot {
                pointer,
                kind: SlotKind::Array(len),
                depth,
            },
        };
        Ok(slot)
    }
}
