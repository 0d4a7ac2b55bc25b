// src/diagnostics/codes.rs

use crate::diagnostics::{DiagnosticLevel, Phase};

/// Represents a specific error code with its associated information.
/// This struct serves as the single source of truth for all compiler diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: &'static str,
    pub level: DiagnosticLevel,
    pub phase: Phase,
    pub message: &'static str,
    pub explanation: &'static str,
}

impl ErrorCode {
    /// 根据错误码字符串查找对应的 ErrorCode（用于 `--explain`）。
    pub fn lookup(code: &str) -> Option<&'static ErrorCode> {
        ALL_CODES.iter().copied().find(|c| c.code.eq_ignore_ascii_case(code))
    }
}

/*
E00xx: 词法分析 (Lexical Analysis) 错误。

E01xx: 语法分析 (Parsing / Syntax) 错误。

E02xx: 语义分析 (Semantic Analysis) 错误，W02xx 为语义警告。

E03xx: 代码生成 (Code Generation) 错误，阶段记为 Runtime。
*/

// --- E00xx: Lexical Analysis Errors ---

pub const E0000_UNEXPECTED_CHARACTER: ErrorCode = ErrorCode {
    code: "E0000",
    level: DiagnosticLevel::Error,
    phase: Phase::Lexer,
    message: "Unexpected character",
    explanation: "The lexer encountered a character that is not part of the Sigma language. \
                  Scanning continues after the character, so later errors are still reported.",
};

pub const E0001_UNTERMINATED_STRING: ErrorCode = ErrorCode {
    code: "E0001",
    level: DiagnosticLevel::Error,
    phase: Phase::Lexer,
    message: "Unterminated string literal",
    explanation: "A string literal was opened with `\"` but the end of the file was reached before the closing quote. \
                  Strings may span several lines, so the missing quote can be far away from the reported line.",
};

pub const E0002_INVALID_ESCAPE: ErrorCode = ErrorCode {
    code: "E0002",
    level: DiagnosticLevel::Error,
    phase: Phase::Lexer,
    message: "Invalid escape sequence",
    explanation: "Only `\\n`, `\\t`, `\\r`, `\\0`, `\\\\`, `\\\"`, `\\{` and `\\}` are valid escapes inside a string literal.",
};

pub const E0003_INVALID_NUMBER: ErrorCode = ErrorCode {
    code: "E0003",
    level: DiagnosticLevel::Error,
    phase: Phase::Lexer,
    message: "Invalid number format",
    explanation: "Integer literals must fit into a 64-bit signed integer. Write a literal with a fractional part, \
                  such as `12345678901234567890.0`, for larger magnitudes.",
};

// --- E01xx: Syntax Analysis (Parsing) Errors ---

pub const E0100_SYNTAX_ERROR: ErrorCode = ErrorCode {
    code: "E0100",
    level: DiagnosticLevel::Error,
    phase: Phase::Syntax,
    message: "Syntax error",
    explanation: "The arrangement of tokens does not match any grammar rule of Sigma. \
                  Check for missing braces, parentheses or commas.",
};

pub const E0101_EXPECTED_EXPRESSION: ErrorCode = ErrorCode {
    code: "E0101",
    level: DiagnosticLevel::Error,
    phase: Phase::Syntax,
    message: "Expected expression",
    explanation: "A value was required here (a literal, a name, a call, a parenthesised expression, ...) \
                  but the parser found something else.",
};

pub const E0102_INVALID_ASSIGNMENT_TARGET: ErrorCode = ErrorCode {
    code: "E0102",
    level: DiagnosticLevel::Error,
    phase: Phase::Syntax,
    message: "Invalid assignment target",
    explanation: "Only a variable name (`x = 1`) or an indexed variable (`xs[0] = 1`) can appear on the left of `=`. \
                  Compound assignments and `++`/`--` only accept a plain variable name.",
};

pub const E0103_TOO_MANY_ITEMS: ErrorCode = ErrorCode {
    code: "E0103",
    level: DiagnosticLevel::Error,
    phase: Phase::Syntax,
    message: "Too many arguments or parameters",
    explanation: "A function can declare at most 255 parameters and a call can pass at most 255 arguments.",
};

pub const E0104_MALFORMED_INTERPOLATION: ErrorCode = ErrorCode {
    code: "E0104",
    level: DiagnosticLevel::Error,
    phase: Phase::Syntax,
    message: "Malformed string interpolation",
    explanation: "Every `{` inside an interpolated string must be closed by `}` and contain an expression, \
                  for example `\"hello {name}\"`. Write `\\{` for a literal brace.",
};

pub const E0105_DUPLICATE_DEFAULT: ErrorCode = ErrorCode {
    code: "E0105",
    level: DiagnosticLevel::Error,
    phase: Phase::Syntax,
    message: "Multiple default cases in switch",
    explanation: "A `simp` statement may contain at most one `ghost:` case.",
};

// --- E02xx: Semantic Analysis Errors ---

pub const E0200_UNDEFINED_VARIABLE: ErrorCode = ErrorCode {
    code: "E0200",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "Undefined variable",
    explanation: "The name is not declared in the current scope or any enclosing scope. \
                  Function bodies only see their own parameters and locals, not top-level variables.",
};

pub const E0201_ALREADY_DECLARED: ErrorCode = ErrorCode {
    code: "E0201",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "Variable already defined in this scope",
    explanation: "A name can be declared with `fr` only once per scope. A nested block may shadow it.",
};

pub const E0202_TYPE_MISMATCH: ErrorCode = ErrorCode {
    code: "E0202",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "Type mismatch",
    explanation: "The operand types do not fit the operator or context, for example `\"a\" * 2` or a string condition.",
};

pub const E0203_UNDEFINED_FUNCTION: ErrorCode = ErrorCode {
    code: "E0203",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "Undefined function",
    explanation: "No function with this name is declared anywhere in the program.",
};

pub const E0204_NOT_A_FUNCTION: ErrorCode = ErrorCode {
    code: "E0204",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "Expected function name in call",
    explanation: "Only a plain function name can be called. Calling the result of another expression is not supported.",
};

pub const E0205_WRONG_ARGUMENT_COUNT: ErrorCode = ErrorCode {
    code: "E0205",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "Wrong number of arguments",
    explanation: "The number of arguments in the call does not match the number of parameters of the function.",
};

pub const E0206_BREAK_OUTSIDE_LOOP: ErrorCode = ErrorCode {
    code: "E0206",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "'mog' used outside of loop",
    explanation: "`mog` (break) can only appear inside a `goon` or `edge` loop body.",
};

pub const E0207_CONTINUE_OUTSIDE_LOOP: ErrorCode = ErrorCode {
    code: "E0207",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "'skip' used outside of loop",
    explanation: "`skip` (continue) can only appear inside a `goon` or `edge` loop body.",
};

pub const E0208_ASSIGNMENT_TO_CONST: ErrorCode = ErrorCode {
    code: "E0208",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "Cannot assign to constant",
    explanation: "The symbol is read-only and cannot be modified after its declaration.",
};

pub const E0209_RETURN_OUTSIDE_FUNCTION: ErrorCode = ErrorCode {
    code: "E0209",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "'send' used outside of function",
    explanation: "`send` (return) is only meaningful inside a `vibe` function body.",
};

pub const E0210_DUPLICATE_FUNCTION: ErrorCode = ErrorCode {
    code: "E0210",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "Function is already declared",
    explanation: "Every function name must be unique across the whole program.",
};

pub const E0211_INVALID_CONDITION: ErrorCode = ErrorCode {
    code: "E0211",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "Invalid condition type",
    explanation: "Conditions of `lowkey`, `midkey`, `goon` and `edge` must be numbers or booleans.",
};

pub const E0212_NESTED_FUNCTION: ErrorCode = ErrorCode {
    code: "E0212",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "Function defined inside another construct",
    explanation: "`vibe` definitions are only allowed at the top level of a program, \
                  not inside blocks, loops or other functions.",
};

pub const E0213_RESERVED_FUNCTION_NAME: ErrorCode = ErrorCode {
    code: "E0213",
    level: DiagnosticLevel::Error,
    phase: Phase::Semantic,
    message: "Function name is reserved",
    explanation: "`main` is the program entry generated from top-level statements and `printf` is \
                  the runtime print routine. A `vibe` cannot use either name.",
};

// --- W02xx: Semantic Warnings ---

pub const W0200_INCOMPATIBLE_COMPARISON: ErrorCode = ErrorCode {
    code: "W0200",
    level: DiagnosticLevel::Warning,
    phase: Phase::Semantic,
    message: "Comparing incompatible types",
    explanation: "`==` and `!=` accept any operands, but comparing values of unrelated types is almost always false.",
};

pub const W0201_NON_NUMERIC_RETURN: ErrorCode = ErrorCode {
    code: "W0201",
    level: DiagnosticLevel::Warning,
    phase: Phase::Semantic,
    message: "Function returns a non-numeric value",
    explanation: "All functions are lowered with a numeric return type; other values are not returned faithfully.",
};

pub const W0202_TRY_CATCH_STUB: ErrorCode = ErrorCode {
    code: "W0202",
    level: DiagnosticLevel::Warning,
    phase: Phase::Semantic,
    message: "'yeet/caught' (try-catch) is not fully implemented",
    explanation: "The try block always runs to completion and the catch block is never entered. \
                  There is no fault detection or unwinding.",
};

// --- E03xx: Code Generation Errors ---

pub const E0300_LLVM_VERIFICATION_FAILED: ErrorCode = ErrorCode {
    code: "E0300",
    level: DiagnosticLevel::Error,
    phase: Phase::Runtime,
    message: "Module verification failed",
    explanation: "The generated IR is invalid. This indicates a bug in the Sigma code generator.",
};

pub const E0301_INTERNAL_CODEGEN_ERROR: ErrorCode = ErrorCode {
    code: "E0301",
    level: DiagnosticLevel::Error,
    phase: Phase::Runtime,
    message: "Internal code generation error",
    explanation: "An instruction could not be built. This indicates a bug in the Sigma code generator.",
};

pub const E0302_UNKNOWN_FUNCTION: ErrorCode = ErrorCode {
    code: "E0302",
    level: DiagnosticLevel::Error,
    phase: Phase::Runtime,
    message: "Unknown function referenced",
    explanation: "A call names a function that was never declared, so it cannot be lowered.",
};

pub const E0303_ARGUMENT_COUNT: ErrorCode = ErrorCode {
    code: "E0303",
    level: DiagnosticLevel::Error,
    phase: Phase::Runtime,
    message: "Incorrect number of arguments passed",
    explanation: "A call passes too few or too many arguments for the declared function.",
};

pub const E0304_UNKNOWN_VARIABLE: ErrorCode = ErrorCode {
    code: "E0304",
    level: DiagnosticLevel::Error,
    phase: Phase::Runtime,
    message: "Unknown variable name",
    explanation: "The variable has no storage slot in the function being generated.",
};

pub const E0305_NOT_AN_ARRAY: ErrorCode = ErrorCode {
    code: "E0305",
    level: DiagnosticLevel::Error,
    phase: Phase::Runtime,
    message: "Variable is not an array",
    explanation: "Indexing is only supported on a variable that was initialised with an array literal.",
};

pub const E0306_UNSUPPORTED_CONSTRUCT: ErrorCode = ErrorCode {
    code: "E0306",
    level: DiagnosticLevel::Error,
    phase: Phase::Runtime,
    message: "Construct cannot be lowered",
    explanation: "The construct passed the checker but has no lowering, for example a call on a non-name callee.",
};

pub const ALL_CODES: &[&ErrorCode] = &[
    &E0000_UNEXPECTED_CHARACTER,
    &E0001_UNTERMINATED_STRING,
    &E0002_INVALID_ESCAPE,
    &E0003_INVALID_NUMBER,
    &E0100_SYNTAX_ERROR,
    &E0101_EXPECTED_EXPRESSION,
    &E0102_INVALID_ASSIGNMENT_TARGET,
    &E0103_TOO_MANY_ITEMS,
    &E0104_MALFORMED_INTERPOLATION,
    &E0105_DUPLICATE_DEFAULT,
    &E0200_UNDEFINED_VARIABLE,
    &E0201_ALREADY_DECLARED,
    &E0202_TYPE_MISMATCH,
    &E0203_UNDEFINED_FUNCTION,
    &E0204_NOT_A_FUNCTION,
    &E0205_WRONG_ARGUMENT_COUNT,
    &E0206_BREAK_OUTSIDE_LOOP,
    &E0207_CONTINUE_OUTSIDE_LOOP,
    &E0208_ASSIGNMENT_TO_CONST,
    &E0209_RETURN_OUTSIDE_FUNCTION,
    &E0210_DUPLICATE_FUNCTION,
    &E0211_INVALID_CONDITION,
    &E0212_NESTED_FUNCTION,
    &E0213_RESERVED_FUNCTION_NAME,
    &W0200_INCOMPATIBLE_COMPARISON,
    &W0201_NON_NUMERIC_RETURN,
    &W0202_TRY_CATCH_STUB,
    &E0300_LLVM_VERIFICATION_FAILED,
    &E0301_INTERNAL_CODEGEN_ERROR,
    &E0302_UNKNOWN_FUNCTION,
    &E0303_ARGUMENT_COUNT,
    &E0304_UNKNOWN_VARIABLE,
    &E0305_NOT_AN_ARRAY,
    &E0306_UNSUPPORTED_CONSTRUCT,
];
