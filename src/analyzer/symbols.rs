// src/analyzer/symbols.rs

use super::types::Type;
use crate::utils::Span;
use std::collections::HashMap;

// --- 1. Symbol 定义 ---

/// 一个被 `fr` 声明（或作为参数引入）的变量。
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    /// 最近一次推断出的类型，每次赋值都会更新。
    pub ty: Type,
    /// 声明所在的作用域深度，全局作用域为 0。
    pub scope_depth: usize,
    /// 声明的位置，行号由 `DiagnosticBag` 根据它计算。
    pub defined_at: Span,
    pub is_const: bool,
    pub is_initialized: bool,
}

impl Symbol {
    pub fn variable(name: &str, ty: Type, scope_depth: usize, defined_at: Span) -> Self {
        Self {
            name: name.to_string(),
            ty,
            scope_depth,
            defined_at,
            is_const: false,
            is_initialized: true,
        }
    }
}

// --- 2. SymbolTable 定义 ---

/// 符号表，核心是一个作用域栈，每个作用域都是一个从名字到符号的映射。
/// 栈式结构天然支持嵌套作用域和变量遮蔽。
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl SymbolTable {
    /// 创建时自动进入全局作用域（第 0 层）。
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// 离开当前作用域。全局作用域永远不会被弹出。
    pub fn leave_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// 在当前作用域中定义一个新符号。同名符号已存在时返回 `false`。
    pub fn define(&mut self, symbol: Symbol) -> bool {
        let Some(current_scope) = self.scopes.last_mut() else {
            return false;
        };
        if current_scope.contains_key(&symbol.name) {
            return false;
        }
        current_scope.insert(symbol.name.clone(), symbol);
        true
    }

    /// 从栈顶向外逐层查找。
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn resolve_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.get_mut(name))
    }

    /// 只在当前作用域中查找，用于检查重复声明。
    pub fn resolve_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

// --- 3. FunctionTable 定义 ---

/// 第一遍收集到的函数签名。参数和返回值一律是 `Number`。
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub name: String,
    pub param_names: Vec<String>,
    pub param_types: Vec<Type>,
    pub return_type: Type,
    pub defined_at: Span,
}

impl FunctionInfo {
    pub fn arity(&self) -> usize {
        self.param_types.len()
    }

    pub fn as_type(&self) -> Type {
        Type::Function {
            params: self.param_types.clone(),
            ret: Box::new(self.return_type.clone()),
        }
    }
}

/// 函数表是全局唯一的，所有函数体都可以看到它。
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: HashMap<String, FunctionInfo>,
}

impl FunctionTable {
    /// 重复声明时保留第一个定义并返回 `false`。
    pub fn declare(&mut self, info: FunctionInfo) -> bool {
        if self.functions.contains_key(&info.name) {
            return false;
        }
        self.functions.insert(info.name.clone(), info);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
