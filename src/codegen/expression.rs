// In src/codegen/expression.rs

use super::utils::{create_entry_block_alloca, float_predicate};
use super::{CodeGen, CodeGenError, ExpressionCodeGen, Slot, SlotKind, Value};
use crate::parser::ast::*;
use crate::utils::Span;
use inkwell::{AddressSpace, IntPredicate};
use inkwell::types::ArrayType;
use inkwell::values::{BasicMetadataValueEnum, FloatValue, IntValue, PointerValue};

impl<'ctx> ExpressionCodeGen<'ctx> for CodeGen<'ctx> {
    /// 表达式生成的总入口（分发函数）。
    fn codegen_expression(&mut self, expr: &Node<Expression>) -> Result<Value<'ctx>, CodeGenError> {
        match &expr.kind {
            Expression::Literal(literal) => self.codegen_literal(literal),
            Expression::Identifier(ident) => self.codegen_identifier(ident),
            Expression::Grouping(inner) => self.codegen_expression(inner),
            Expression::Unary(unary) => self.codegen_unary(unary),
            Expression::Binary(binary) => self.codegen_binary(binary),
            Expression::Logical(logical) => self.codegen_logical(logical),
            Expression::Assignment(assign) => self.codegen_assignment(assign),
            Expression::CompoundAssignment(assign) => self.codegen_compound_assignment(assign),
            Expression::Increment(inc) => self.codegen_increment(inc),
            Expression::Call(call) => self.codegen_call(call),
            Expression::InterpolatedString(interp) => {
                // 没有插值部分时就是普通字符串
                if !interp.parts.is_empty() {
                    return Err(CodeGenError::unsupported(
                        "Interpolated strings can only be printed with 'say'",
                        expr.span,
                    ));
                }
                let text = interp.segments.concat();
                Ok(Value::Text(self.string_constant(&text, "str")?))
            }
            Expression::Array(elements) => self.codegen_array(elements),
            Expression::Index(index) => self.codegen_index(index),
            Expression::IndexAssignment(assign) => self.codegen_index_assignment(assign),
        }
    }

    /// 整数、布尔值和 `nah` 都变成 double。
    fn codegen_literal(&mut self, literal: &LiteralValue) -> Result<Value<'ctx>, CodeGenError> {
        let f64_type = self.context.f64_type();
        let value = match literal {
            LiteralValue::Str(s) => return Ok(Value::Text(self.string_constant(s, "str")?)),
            LiteralValue::Integer(i) => *i as f64,
            LiteralValue::Float(f) => *f,
            LiteralValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            LiteralValue::Null => 0.0,
        };
        Ok(Value::Number(f64_type.const_float(value)))
    }

    fn codegen_identifier(&mut self, ident: &Identifier) -> Result<Value<'ctx>, CodeGenError> {
        let slot = self.slot_of(ident)?;
        let value = match slot.kind {
            SlotKind::Number => {
                let loaded = self
                    .builder
                    .build_load(self.context.f64_type(), slot.pointer, &ident.name)?;
                Value::Number(loaded.into_float_value())
            }
            SlotKind::Text => {
                let ptr_type = self.context.ptr_type(AddressSpace::default());
                let loaded = self.builder.build_load(ptr_type, slot.pointer, &ident.name)?;
                Value::Text(loaded.into_pointer_value())
            }
            // 数组不 load，直接给出地址
            SlotKind::Array(len) => Value::Array {
                pointer: slot.pointer,
                len,
            },
        };
        Ok(value)
    }

    fn codegen_binary(&mut self, binary: &BinaryExpression) -> Result<Value<'ctx>, CodeGenError> {
        let left = self.codegen_expression(&binary.left)?;
        let right = self.codegen_expression(&binary.right)?;
        let op = binary.operator.kind;

        if op.is_equality() {
            let equal = op == BinaryOp::Eq;
            let cmp = self.codegen_equality(equal, left, right, binary.operator.span)?;
            let result = self
                .builder
                .build_unsigned_int_to_float(cmp, self.context.f64_type(), "booltmp")?;
            return Ok(Value::Number(result));
        }

        let context = format!("left operand of '{}'", op);
        let lhs = self.expect_number(left, binary.left.span, &context)?;
        let context = format!("right operand of '{}'", op);
        let rhs = self.expect_number(right, binary.right.span, &context)?;
        Ok(Value::Number(self.build_numeric_binary(op, lhs, rhs)?))
    }

    fn codegen_unary(&mut self, unary: &UnaryExpression) -> Result<Value<'ctx>, CodeGenError> {
        let operand = self.codegen_expression(&unary.operand)?;
        let f64_type = self.context.f64_type();

        let result = match unary.operator.kind {
            UnaryOp::Neg => {
                let value = self.expect_number(operand, unary.operand.span, "operand of unary '-'")?;
                self.builder.build_float_neg(value, "negtmp")?
            }
            UnaryOp::Not => {
                let is_false = match operand {
                    Value::Number(value) => self.builder.build_float_compare(
                        float_predicate(BinaryOp::Eq),
                        value,
                        f64_type.const_zero(),
                        "nottmp",
                    )?,
                    Value::Text(text) => self.builder.build_is_null(text, "nottmp")?,
                    Value::Array { .. } => self.context.bool_type().const_zero(),
                };
                self.builder
                    .build_unsigned_int_to_float(is_false, f64_type, "booltmp")?
            }
            UnaryOp::BitNot => {
                let value = self.expect_number(operand, unary.operand.span, "operand of unary '~'")?;
                let int = self
                    .builder
                    .build_float_to_signed_int(value, self.context.i64_type(), "toint")?;
                let inverted = self.builder.build_not(int, "bitnottmp")?;
                self.builder
                    .build_signed_int_to_float(inverted, f64_type, "bittmp")?
            }
        };
        Ok(Value::Number(result))
    }

    /// 短路求值：右侧只在需要时执行，两条路径在 merge 块用 phi 汇合。
    fn codegen_logical(&mut self, logical: &LogicalExpression) -> Result<Value<'ctx>, CodeGenError> {
        let f64_type = self.context.f64_type();
        let left = self.codegen_expression(&logical.left)?;
        let left_truth = self.codegen_truthiness(left)?;
        let entry_block = self.current_block()?;

        let is_or = logical.operator.kind == LogicalOp::Or;
        let (rhs_name, merge_name, short_circuit) = if is_or {
            ("or.rhs", "or.merge", 1.0)
        } else {
            ("and.rhs", "and.merge", 0.0)
        };
        let rhs_block = self.append_block(rhs_name)?;
        let merge_block = self.append_block(merge_name)?;

        if is_or {
            self.builder
                .build_conditional_branch(left_truth, merge_block, rhs_block)?;
        } else {
            self.builder
                .build_conditional_branch(left_truth, rhs_block, merge_block)?;
        }

        self.builder.position_at_end(rhs_block);
        let right = self.codegen_expression(&logical.right)?;
        let right_truth = self.codegen_truthiness(right)?;
        let right_value = self
            .builder
            .build_unsigned_int_to_float(right_truth, f64_type, "booltmp")?;
        // 右侧可能产生了新的基本块
        let rhs_end = self.current_block()?;
        self.builder.build_unconditional_branch(merge_block)?;

        self.builder.position_at_end(merge_block);
        let phi = self
            .builder
            .build_phi(f64_type, if is_or { "ortmp" } else { "andtmp" })?;
        let short_value = f64_type.const_float(short_circuit);
        phi.add_incoming(&[(&short_value, entry_block)]);
        phi.add_incoming(&[(&right_value, rhs_end)]);
        Ok(Value::Number(phi.as_basic_value().into_float_value()))
    }

    fn codegen_call(&mut self, call: &CallExpression) -> Result<Value<'ctx>, CodeGenError> {
        let Expression::Identifier(callee) = &call.callee.kind else {
            return Err(CodeGenError::unsupported(
                "Only named functions can be called",
                call.callee.span,
            ));
        };
        let function = self.functions.get(&callee.name).copied().ok_or_else(|| {
            CodeGenError::UnknownFunction {
                name: callee.name.clone(),
                span: callee.span,
            }
        })?;

        let expected = function.count_params() as usize;
        if expected != call.arguments.len() {
            return Err(CodeGenError::ArgumentCount {
                name: callee.name.clone(),
                expected,
                found: call.arguments.len(),
                span: call.callee.span,
            });
        }

        let mut args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(call.arguments.len());
        for (i, arg) in call.arguments.iter().enumerate() {
            let value = self.codegen_expression(arg)?;
            let context = format!("argument {} of '{}'", i + 1, callee.name);
            args.push(self.expect_number(value, arg.span, &context)?.into());
        }

        let call_site = self.builder.build_call(function, &args, "calltmp")?;
        let result = call_site.try_as_basic_value().left().ok_or_else(|| {
            CodeGenError::Internal(format!("call to '{}' produced no value", callee.name))
        })?;
        Ok(Value::Number(result.into_float_value()))
    }

    /// 值的形状变了就换一个新的存储槽，名字重新指向它。
    fn codegen_assignment(&mut self, assign: &AssignmentExpression) -> Result<Value<'ctx>, CodeGenError> {
        let value = self.codegen_expression(&assign.value)?;
        let name = &assign.target.name;
        let slot = self.slot_of(&assign.target)?;

        if slot.holds(&value) {
            match value {
                Value::Number(number) => self.builder.build_store(slot.pointer, number)?,
                Value::Text(text) => self.builder.build_store(slot.pointer, text)?,
                Value::Array { .. } => unreachable!("array values never fit an existing slot"),
            };
        } else {
            let new_slot = self.allocate_slot(name, value)?;
            self.rebind_variable(name, slot, new_slot);
        }
        Ok(value)
    }

    fn codegen_compound_assignment(
        &mut self,
        assign: &CompoundAssignmentExpression,
    ) -> Result<Value<'ctx>, CodeGenError> {
        let slot = self.number_slot_of(&assign.target)?;
        let current = self
            .builder
            .build_load(self.context.f64_type(), slot.pointer, &assign.target.name)?
            .into_float_value();
        let value = self.codegen_expression(&assign.value)?;
        let rhs = self.expect_number(value, assign.value.span, "value in compound assignment")?;

        let result = self.build_numeric_binary(assign.operator.kind, current, rhs)?;
        self.builder.build_store(slot.pointer, result)?;
        Ok(Value::Number(result))
    }

    /// 前缀返回新值，后缀返回旧值。
    fn codegen_increment(&mut self, inc: &IncrementExpression) -> Result<Value<'ctx>, CodeGenError> {
        let slot = self.number_slot_of(&inc.target)?;
        let f64_type = self.context.f64_type();
        let old = self
            .builder
            .build_load(f64_type, slot.pointer, &inc.target.name)?
            .into_float_value();
        let one = f64_type.const_float(1.0);
        let new = match inc.operator {
            IncrementOp::Increment => self.builder.build_float_add(old, one, "inctmp")?,
            IncrementOp::Decrement => self.builder.build_float_sub(old, one, "dectmp")?,
        };
        self.builder.build_store(slot.pointer, new)?;
        Ok(Value::Number(if inc.is_prefix { new } else { old }))
    }

    fn codegen_array(&mut self, elements: &[Node<Expression>]) -> Result<Value<'ctx>, CodeGenError> {
        let len = u32::try_from(elements.len())
            .map_err(|_| CodeGenError::Internal("array literal is too large".to_string()))?;
        let array_type = self.context.f64_type().array_type(len);
        let pointer = create_entry_block_alloca(self, "array", array_type)?;

        for (i, element) in elements.iter().enumerate() {
            let value = self.codegen_expression(element)?;
            let value = self.expect_number(value, element.span, "array element")?;
            let index = self.context.i64_type().const_int(i as u64, false);
            let element_ptr = self.element_pointer(array_type, pointer, index)?;
            self.builder.build_store(element_ptr, value)?;
        }
        Ok(Value::Array { pointer, len })
    }

    /// 不做越界检查。
    fn codegen_index(&mut self, index: &IndexExpression) -> Result<Value<'ctx>, CodeGenError> {
        let element_ptr = self.indexed_element(&index.object, &index.index)?;
        let loaded = self
            .builder
            .build_load(self.context.f64_type(), element_ptr, "elemtmp")?;
        Ok(Value::Number(loaded.into_float_value()))
    }

    fn codegen_index_assignment(
        &mut self,
        assign: &IndexAssignmentExpression,
    ) -> Result<Value<'ctx>, CodeGenError> {
        let element_ptr = self.indexed_element(&assign.object, &assign.index)?;
        let value = self.codegen_expression(&assign.value)?;
        let number = self.expect_number(value, assign.value.span, "array element")?;
        self.builder.build_store(element_ptr, number)?;
        Ok(Value::Number(number))
    }

    fn codegen_equality(
        &mut self,
        equal: bool,
        left: Value<'ctx>,
        right: Value<'ctx>,
        span: Span,
    ) -> Result<IntValue<'ctx>, CodeGenError> {
        match (left, right) {
            (Value::Number(lhs), Value::Number(rhs)) => {
                let op = if equal { BinaryOp::Eq } else { BinaryOp::NotEq };
                Ok(self
                    .builder
                    .build_float_compare(float_predicate(op), lhs, rhs, "cmptmp")?)
            }
            // 相同内容的字符串常量只有一份，比较地址即可
            (Value::Text(lhs), Value::Text(rhs)) => {
                let i64_type = self.context.i64_type();
                let lhs = self.builder.build_ptr_to_int(lhs, i64_type, "lhsaddr")?;
                let rhs = self.builder.build_ptr_to_int(rhs, i64_type, "rhsaddr")?;
                let predicate = if equal { IntPredicate::EQ } else { IntPredicate::NE };
                Ok(self.builder.build_int_compare(predicate, lhs, rhs, "cmptmp")?)
            }
            (left, right) => Err(CodeGenError::unsupported(
                format!("Cannot compare {} with {}", left.describe(), right.describe()),
                span,
            )),
        }
    }

    fn codegen_truthiness(&mut self, value: Value<'ctx>) -> Result<IntValue<'ctx>, CodeGenError> {
        let truth = match value {
            Value::Number(number) => self.builder.build_float_compare(
                float_predicate(BinaryOp::NotEq),
                number,
                self.context.f64_type().const_zero(),
                "tobool",
            )?,
            Value::Text(text) => self.builder.build_is_not_null(text, "tobool")?,
            Value::Array { .. } => self.context.bool_type().const_int(1, false),
        };
        Ok(truth)
    }

    fn expect_number(
        &self,
        value: Value<'ctx>,
        span: Span,
        context: &str,
    ) -> Result<FloatValue<'ctx>, CodeGenError> {
        match value {
            Value::Number(number) => Ok(number),
            other => Err(CodeGenError::unsupported(
                format!("Expected a number for {}, found {}", context, other.describe()),
                span,
            )),
        }
    }
}

impl<'ctx> CodeGen<'ctx> {
    /// 算术、比较和位运算，操作数都已经是 double。
    fn build_numeric_binary(
        &self,
        op: BinaryOp,
        lhs: FloatValue<'ctx>,
        rhs: FloatValue<'ctx>,
    ) -> Result<FloatValue<'ctx>, CodeGenError> {
        let f64_type = self.context.f64_type();
        let result = match op {
            BinaryOp::Add => self.builder.build_float_add(lhs, rhs, "addtmp")?,
            BinaryOp::Sub => self.builder.build_float_sub(lhs, rhs, "subtmp")?,
            BinaryOp::Mul => self.builder.build_float_mul(lhs, rhs, "multmp")?,
            BinaryOp::Div => self.builder.build_float_div(lhs, rhs, "divtmp")?,
            BinaryOp::Mod => self.builder.build_float_rem(lhs, rhs, "modtmp")?,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::LtEq
            | BinaryOp::GtEq => {
                let cmp = self
                    .builder
                    .build_float_compare(float_predicate(op), lhs, rhs, "cmptmp")?;
                self.builder
                    .build_unsigned_int_to_float(cmp, f64_type, "booltmp")?
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
                // 位运算在 i64 上进行，`>>` 是算术右移
                let i64_type = self.context.i64_type();
                let lhs = self.builder.build_float_to_signed_int(lhs, i64_type, "lhsint")?;
                let rhs = self.builder.build_float_to_signed_int(rhs, i64_type, "rhsint")?;
                let int = match op {
                    BinaryOp::BitAnd => self.builder.build_and(lhs, rhs, "andtmp")?,
                    BinaryOp::BitOr => self.builder.build_or(lhs, rhs, "ortmp")?,
                    BinaryOp::BitXor => self.builder.build_xor(lhs, rhs, "xortmp")?,
                    BinaryOp::Shl => self.builder.build_left_shift(lhs, rhs, "shltmp")?,
                    _ => self.builder.build_right_shift(lhs, rhs, true, "shrtmp")?,
                };
                self.builder.build_signed_int_to_float(int, f64_type, "bittmp")?
            }
        };
        Ok(result)
    }

    fn slot_of(&self, ident: &Identifier) -> Result<Slot<'ctx>, CodeGenError> {
        self.lookup_variable(&ident.name)
            .ok_or_else(|| CodeGenError::UnknownVariable {
                name: ident.name.clone(),
                span: ident.span,
            })
    }

    /// 复合赋值和自增自减只作用于数字变量。
    fn number_slot_of(&self, ident: &Identifier) -> Result<Slot<'ctx>, CodeGenError> {
        let slot = self.slot_of(ident)?;
        if slot.kind != SlotKind::Number {
            return Err(CodeGenError::unsupported(
                format!("'{}' does not hold a number", ident.name),
                ident.span,
            ));
        }
        Ok(slot)
    }

    /// 下标访问只支持直接绑定到数组的变量名。返回元素地址。
    fn indexed_element(
        &mut self,
        object: &Node<Expression>,
        index: &Node<Expression>,
    ) -> Result<PointerValue<'ctx>, CodeGenError> {
        let Expression::Identifier(ident) = &object.kind else {
            return Err(CodeGenError::unsupported(
                "Only array variables can be indexed",
                object.span,
            ));
        };
        let slot = self.slot_of(ident)?;
        let SlotKind::Array(len) = slot.kind else {
            return Err(CodeGenError::NotAnArray {
                name: ident.name.clone(),
                span: ident.span,
            });
        };

        let value = self.codegen_expression(index)?;
        let value = self.expect_number(value, index.span, "array index")?;
        let index = self
            .builder
            .build_float_to_signed_int(value, self.context.i64_type(), "idxtmp")?;
        let array_type = self.context.f64_type().array_type(len);
        self.element_pointer(array_type, slot.pointer, index)
    }

    fn element_pointer(
        &self,
        array_type: ArrayType<'ctx>,
        pointer: PointerValue<'ctx>,
        index: IntValue<'ctx>,
    ) -> Result<PointerValue<'ctx>, CodeGenError> {
        let zero = self.context.i64_type().const_zero();
        // SAFETY: 下标不做检查，越界访问是语言层面未定义的行为
        let element_ptr =
            unsafe { self.builder.build_gep(array_type, pointer, &[zero, index], "elemptr")? };
        Ok(element_ptr)
    }
}
