// In src/codegen/utils.rs

use super::{CodeGen, CodeGenError};
use crate::parser::ast::BinaryOp;
use inkwell::FloatPredicate;
use inkwell::types::BasicType;
use inkwell::values::PointerValue;

/// 在当前函数入口块的开头创建一个 alloca 指令。
/// 用临时的 builder，不打扰主 builder 的位置。
pub(super) fn create_entry_block_alloca<'ctx, T: BasicType<'ctx>>(
    codegen: &CodeGen<'ctx>,
    name: &str,
    ty: T,
) -> Result<PointerValue<'ctx>, CodeGenError> {
    let builder = codegen.context.create_builder();
    let entry_block = codegen
        .current_function()?
        .get_first_basic_block()
        .ok_or_else(|| CodeGenError::Internal("the current function has no entry block".to_string()))?;

    match entry_block.get_first_instruction() {
        Some(first_instr) => builder.position_before(&first_instr),
        None => builder.position_at_end(entry_block),
    }

    Ok(builder.build_alloca(ty, name)?)
}

/// 比较运算符对应的有序浮点谓词。
pub(super) fn float_predicate(op: BinaryOp) -> FloatPredicate {
    match op {
        BinaryOp::Eq => FloatPredicate::OEQ,
        BinaryOp::NotEq => FloatPredicate::ONE,
        BinaryOp::Gt => FloatPredicate::OGT,
        BinaryOp::GtEq => FloatPredicate::OGE,
        BinaryOp::Lt => FloatPredicate::OLT,
        BinaryOp::LtEq => FloatPredicate::OLE,
        _ => unreachable!("'{}' is not a comparison operator", op),
    }
}

/// printf 模板里的 `%` 需要转义。
pub(super) fn escape_format(text: &str) -> String {
    text.replace('%', "%%")
}
