// In src/codegen/globals.rs

use super::{CodeGen, CodeGenError};
use inkwell::AddressSpace;
use inkwell::module::Linkage;
use inkwell::values::{FunctionValue, PointerValue};

impl<'ctx> CodeGen<'ctx> {
    /// `i32 printf(ptr, ...)`，生成的 IR 唯一依赖的外部符号。
    pub(super) fn printf(&self) -> FunctionValue<'ctx> {
        if let Some(function) = self.module.get_function("printf") {
            return function;
        }
        let ptr_type = self.context.ptr_type(AddressSpace::default());
        let printf_type = self.context.i32_type().fn_type(&[ptr_type.into()], true);
        self.module
            .add_function("printf", printf_type, Some(Linkage::External))
    }

    /// 私有常量字符串，相同内容只生成一次。
    pub(super) fn string_constant(
        &mut self,
        text: &str,
        name: &str,
    ) -> Result<PointerValue<'ctx>, CodeGenError> {
        if let Some(pointer) = self.strings.get(text) {
            return Ok(*pointer);
        }
        let global = self.builder.build_global_string_ptr(text, name)?;
        let pointer = global.as_pointer_value();
        self.strings.insert(text.to_string(), pointer);
        Ok(pointer)
    }

    /// `say` 数字时用的 `%g\n`。
    pub(super) fn number_format(&mut self) -> Result<PointerValue<'ctx>, CodeGenError> {
        self.string_constant("%g\n", "fmt_num")
    }

    /// `say` 字符串时用的 `%s\n`。
    pub(super) fn text_format(&mut self) -> Result<PointerValue<'ctx>, CodeGenError> {
        self.string_constant("%s\n", "fmt_str")
    }
}
