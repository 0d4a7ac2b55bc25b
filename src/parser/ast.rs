use crate::utils::Span;
use std::fmt;

// --- 1. 核心 AST 节点与标识符 ---

/// 所有 AST 节点的通用包装，包含了节点本身和其在源代码中的位置。
#[derive(Debug, Clone, PartialEq)]
pub struct Node<T> {
    pub kind: T,
    pub span: Span,
}

impl<T> Node<T> {
    pub fn new(kind: T, span: Span) -> Self {
        Node { kind, span }
    }

    /// 将一个节点的内部类型 `T` 映射为类型 `U`，同时保持 `span` 不变。
    ///
    /// 解析时用它把 `Node<IfStatement>` 这样的具体节点包装成 `Node<Statement>`。
    pub fn map<U, F>(self, f: F) -> Node<U>
    where
        F: FnOnce(T) -> U,
    {
        Node {
            kind: f(self.kind),
            span: self.span,
        }
    }
}

/// 一个标识符，例如变量名或函数名。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

// --- 2. 程序顶层结构 ---

/// AST 的根节点，代表一个完整的 Sigma 源文件：按顺序排列的顶层语句。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Node<Statement>>,
}

// --- 3. 语句 ---

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `fr name = expr`
    VarDeclaration(VarDeclaration),
    /// `say expr`
    Print(Node<Expression>),
    /// 仅由表达式构成的语句，例如 `f(1)` 或 `x += 2`。
    Expression(Node<Expression>),
    Block(BlockStatement),
    /// `lowkey` / `midkey` / `highkey`
    If(IfStatement),
    /// `goon`
    While(WhileStatement),
    /// `edge (init, cond, incr) { ... }`
    For(ForStatement),
    /// `vibe name(a, b) { ... }`
    Function(FunctionDefinition),
    /// `send [expr]`
    Return(ReturnStatement),
    /// `mog`
    Break,
    /// `skip`
    Continue,
    /// `simp`
    Switch(SwitchStatement),
    /// `yeet { } caught { }`
    TryCatch(TryCatchStatement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclaration {
    pub name: Identifier,
    pub initializer: Node<Expression>,
}

/// 代码块语句。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStatement {
    pub statements: Vec<Node<Statement>>,
}

/// `else_branch` 要么是一个 `Block`，要么是下一个 `If`（来自 `midkey` 或 `highkey lowkey`）。
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Node<Expression>,
    pub then_branch: Node<BlockStatement>,
    pub else_branch: Option<Box<Node<Statement>>>,
}

impl IfStatement {
    /// 沿着 else 链找到第一个空的 else 位置并挂上 `branch`。
    pub fn attach_else(&mut self, branch: Node<Statement>) {
        if let Some(existing) = &mut self.else_branch {
            // 已经有一个 `highkey` 代码块时链条到此为止
            if let Statement::If(nested) = &mut existing.kind {
                nested.attach_else(branch);
            }
            return;
        }
        self.else_branch = Some(Box::new(branch));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Node<Expression>,
    pub body: Node<BlockStatement>,
}

/// `edge` 循环，三个子句都可以省略。
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub initializer: Option<Box<Node<Statement>>>,
    pub condition: Option<Node<Expression>>,
    pub increment: Option<Node<Expression>>,
    pub body: Node<BlockStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: Identifier,
    pub params: Vec<Identifier>,
    /// 函数体的语句与参数处于同一个作用域。
    pub body: Node<BlockStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<Node<Expression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    pub scrutinee: Node<Expression>,
    pub cases: Vec<Node<SwitchCase>>,
}

/// `stan <literal>:` 或 `ghost:`，后面跟着属于它的语句列表。
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` 表示 `ghost`（default）。
    pub value: Option<Node<LiteralValue>>,
    pub body: Vec<Node<Statement>>,
}

impl SwitchCase {
    pub fn is_default(&self) -> bool {
        self.value.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryCatchStatement {
    pub try_block: Node<BlockStatement>,
    pub catch_block: Node<BlockStatement>,
}

// --- 4. 表达式 ---

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(LiteralValue),
    Identifier(Identifier),
    /// `(expr)`
    Grouping(Box<Node<Expression>>),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    /// `&&` 与 `||`，需要短路求值，所以和 `Binary` 分开。
    Logical(LogicalExpression),
    Assignment(AssignmentExpression),
    CompoundAssignment(CompoundAssignmentExpression),
    Increment(IncrementExpression),
    Call(CallExpression),
    InterpolatedString(InterpolatedString),
    Array(Vec<Node<Expression>>),
    Index(IndexExpression),
    IndexAssignment(IndexAssignmentExpression),
}

/// 字面量的值。
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Integer(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl LiteralValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LiteralValue::Integer(i) => Some(*i as f64),
            LiteralValue::Float(x) => Some(*x),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: Node<UnaryOp>,
    pub operand: Box<Node<Expression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub left: Box<Node<Expression>>,
    pub operator: Node<BinaryOp>,
    pub right: Box<Node<Expression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    pub left: Box<Node<Expression>>,
    pub operator: Node<LogicalOp>,
    pub right: Box<Node<Expression>>,
}

/// `name = value`，左边只能是一个标识符。
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpression {
    pub target: Identifier,
    pub value: Box<Node<Expression>>,
}

/// `name += value` 等，`operator` 是展开后的算术运算符。
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundAssignmentExpression {
    pub target: Identifier,
    pub operator: Node<BinaryOp>,
    pub value: Box<Node<Expression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncrementExpression {
    pub target: Identifier,
    pub operator: IncrementOp,
    pub is_prefix: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: Box<Node<Expression>>,
    pub arguments: Vec<Node<Expression>>,
}

/// `"a {x} b"`：`segments` 总比 `parts` 多一个，两者交替拼接。
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedString {
    pub segments: Vec<String>,
    pub parts: Vec<Node<Expression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    pub object: Box<Node<Expression>>,
    pub index: Box<Node<Expression>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexAssignmentExpression {
    pub object: Box<Node<Expression>>,
    pub index: Box<Node<Expression>>,
    pub value: Box<Node<Expression>>,
}

// --- 5. 运算符 ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::NotEq)
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "&&"),
            LogicalOp::Or => write!(f, "||"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncrementOp {
    Increment,
    Decrement,
}

impl fmt::Display for IncrementOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncrementOp::Increment => write!(f, "++"),
            IncrementOp::Decrement => write!(f, "--"),
        }
    }
}
