// In src/codegen/function.rs

use super::utils::create_entry_block_alloca;
use super::{CodeGen, CodeGenError, RESERVED_FUNCTION_NAMES, Slot, SlotKind, StatementCodeGen};
use crate::parser::ast::*;
use crate::utils::Span;
use inkwell::types::BasicMetadataTypeEnum;
use std::collections::HashMap;
use tracing::debug;

impl<'ctx> CodeGen<'ctx> {
    /// Pass 1：所有顶层函数都声明为 `double (double, ...)`。
    pub(super) fn declare_functions(&mut self, program: &Program) -> Result<(), CodeGenError> {
        let f64_type = self.context.f64_type();
        for stmt in &program.statements {
            let Statement::Function(func_def) = &stmt.kind else {
                continue;
            };
            let name = &func_def.name.name;
            if RESERVED_FUNCTION_NAMES.contains(&name.as_str()) {
                return Err(CodeGenError::unsupported(
                    format!("'{}' cannot be used as a function name", name),
                    func_def.name.span,
                ));
            }
            if self.functions.contains_key(name) {
                continue;
            }
            let param_types: Vec<BasicMetadataTypeEnum> =
                vec![f64_type.into(); func_def.params.len()];
            let fn_type = f64_type.fn_type(&param_types, false);
            let function = self.module.add_function(name, fn_type, None);
            self.functions.insert(name.clone(), function);
        }
        Ok(())
    }

    /// 在函数定义出现的位置生成函数体，完成后恢复 `main` 的生成状态。
    pub(super) fn codegen_function(
        &mut self,
        func_def: &FunctionDefinition,
        span: Span,
    ) -> Result<(), CodeGenError> {
        let name = &func_def.name.name;
        if self.in_function || self.scopes.len() > 1 {
            return Err(CodeGenError::unsupported(
                format!("Function '{}' must be defined at the top level", name),
                span,
            ));
        }
        let function = self.functions.get(name).copied().ok_or_else(|| {
            CodeGenError::UnknownFunction {
                name: name.clone(),
                span: func_def.name.span,
            }
        })?;
        debug!(function = %name, params = func_def.params.len(), "generating function body");

        let saved_block = self.builder.get_insert_block();
        let saved_function = self.current_function.replace(function);
        let saved_scopes = std::mem::take(&mut self.scopes);
        let saved_loops = std::mem::take(&mut self.loop_stack);
        self.in_function = true;

        let result = self.codegen_function_body(func_def);

        self.in_function = false;
        self.loop_stack = saved_loops;
        self.scopes = saved_scopes;
        self.current_function = saved_function;
        if let Some(block) = saved_block {
            self.builder.position_at_end(block);
        }
        result
    }

    fn codegen_function_body(&mut self, func_def: &FunctionDefinition) -> Result<(), CodeGenError> {
        let function = self.current_function()?;
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        // 参数和函数体共用一个作用域
        self.scopes.push(HashMap::new());
        for (param, value) in func_def.params.iter().zip(function.get_param_iter()) {
            value.set_name(&param.name);
            let pointer = create_entry_block_alloca(self, &param.name, self.context.f64_type())?;
            self.builder.build_store(pointer, value)?;
            let slot = Slot {
                pointer,
                kind: SlotKind::Number,
                depth: self.scope_depth(),
            };
            self.declare_variable(&param.name, slot);
        }

        self.codegen_block(&func_def.body.kind.statements)?;

        // 没有 `send` 的路径返回 0.0
        if !self.block_terminated() {
            let zero = self.context.f64_type().const_float(0.0);
            self.builder.build_return(Some(&zero))?;
        }
        self.scopes.pop();
        Ok(())
    }
}
