// src/analyzer/types.rs

use std::fmt;

/// 类型检查阶段使用的类型格。
///
/// Sigma 是动态类型语言，这里的类型只是检查器对值的“最近一次”推断，
/// 变量每次赋值后都会被重新推断。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Number,
    Integer,
    String,
    Boolean,
    Null,
    Function {
        params: Vec<Type>,
        ret: Box<Type>,
    },
    /// 无法静态确定的值，例如数组元素。
    Any,
    Void,
    /// 已经报告过错误的表达式，用于阻止连锁错误。
    Error,
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Number | Type::Integer)
    }

    /// `Any` / `Error` 不再触发后续检查。
    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Any | Type::Error)
    }

    /// 能否出现在 `lowkey` / `goon` / `edge` 的条件位置。
    pub fn is_condition(&self) -> bool {
        self.is_numeric() || self.is_unknown() || *self == Type::Boolean
    }

    pub fn is_compatible_with(&self, other: &Type) -> bool {
        let lenient = |t: &Type| matches!(t, Type::Any | Type::Error | Type::Null);
        if lenient(self) || lenient(other) {
            return true;
        }
        if self.is_numeric() && other.is_numeric() {
            return true;
        }
        self == other
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Number => write!(f, "Number"),
            Type::Integer => write!(f, "Integer"),
            Type::String => write!(f, "String"),
            Type::Boolean => write!(f, "Boolean"),
            Type::Null => write!(f, "Null"),
            Type::Function { params, ret } => {
                let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                write!(f, "Function({}) -> {}", params.join(", "), ret)
            }
            Type::Any => write!(f, "Any"),
            Type::Void => write!(f, "Void"),
            Type::Error => write!(f, "Error"),
        }
    }
}
