pub mod codes;


use ariadne::{Color, Config, Label as AriadneLabel, Report, ReportKind, Source};
use codes::ErrorCode;
use std::fmt;
use std::io;

pub use crate::utils::Span;

// --- 1. 诊断的级别与阶段 ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// 诊断来自编译管道的哪个阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Lexer,
    Syntax,
    Semantic,
    /// 代码生成阶段。
    Runtime,
}

impl Phase {
    pub fn title(self) -> &'static str {
        match self {
            Phase::Lexer => "Lexer Error",
            Phase::Syntax => "Syntax Error",
            Phase::Semantic => "Semantic Error",
            Phase::Runtime => "Runtime Error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: impl Into<Span>, message: impl Into<String>) -> Self {
        Self {
            span: span.into(),
            message: message.into(),
        }
    }
}

// --- 2. Diagnostic ---

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    code: &'static str,
    level: DiagnosticLevel,
    phase: Phase,
    // 默认来自 ErrorCode，可以被 with_dynamic_message 覆盖
    message: String,
    // 由 DiagnosticBag::report 根据主标签计算；没有位置信息时为 0
    line: usize,
    labels: Vec<Label>,
    notes: Vec<String>,
    hint: Option<String>,
}

impl Diagnostic {
    pub fn new(error_code: &'static ErrorCode, primary_label: Label) -> Self {
        Self {
            labels: vec![primary_label],
            ..Self::unlocated(error_code)
        }
    }

    /// 没有源码位置的诊断，例如模块校验失败。
    pub fn unlocated(error_code: &'static ErrorCode) -> Self {
        Self {
            code: error_code.code,
            level: error_code.level,
            phase: error_code.phase,
            message: error_code.message.to_string(),
            line: 0,
            labels: Vec::new(),
            notes: Vec::new(),
            hint: None,
        }
    }

    pub fn error(error_code: &'static ErrorCode, primary_label: Label) -> Self {
        debug_assert!(
            matches!(error_code.level, DiagnosticLevel::Error),
            "Tried to create an error diagnostic with a non-error code."
        );
        Self::new(error_code, primary_label)
    }

    pub fn warning(error_code: &'static ErrorCode, primary_label: Label) -> Self {
        debug_assert!(
            matches!(error_code.level, DiagnosticLevel::Warning),
            "Tried to create a warning diagnostic with a non-warning code."
        );
        Self::new(error_code, primary_label)
    }

    #[must_use]
    pub fn with_dynamic_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_secondary_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn level(&self) -> DiagnosticLevel {
        self.level
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }

    fn title(&self) -> String {
        match self.level {
            DiagnosticLevel::Error => self.phase.to_string(),
            DiagnosticLevel::Warning => "Warning".to_string(),
        }
    }

    /// `[Semantic Error] [Line 3]: message (Hint: ...)`
    pub fn format_plain(&self) -> String {
        let mut out = format!("[{}] [Line {}]: {}", self.title(), self.line, self.message);
        if let Some(hint) = &self.hint {
            out.push_str(&format!(" (Hint: {})", hint));
        }
        out
    }

    /// 带 ANSI 颜色的格式，错误用红色，警告用黄色，提示用青色。
    pub fn format_colored(&self) -> String {
        let color = match self.level {
            DiagnosticLevel::Error => "\x1b[1;31m",
            DiagnosticLevel::Warning => "\x1b[1;33m",
        };
        let mut out = format!(
            "{}{}\x1b[0m [Line {}]: {}",
            color,
            self.title(),
            self.line,
            self.message
        );
        if let Some(hint) = &self.hint {
            out.push_str(&format!("\n  \x1b[1;36mHint:\x1b[0m {}", hint));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_plain())
    }
}

// --- 3. DiagnosticBag: 每个编译单元独立的收集器 ---

#[derive(Debug, Default)]
pub struct DiagnosticBag {
    source: String,
    unit_name: String,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new(source: &str, unit_name: &str) -> Self {
        Self {
            source: source.to_string(),
            unit_name: unit_name.to_string(),
            diagnostics: Vec::new(),
        }
    }

    /// 为下一个编译单元清空所有状态。
    pub fn reset(&mut self, source: &str, unit_name: &str) {
        self.source = source.to_string();
        self.unit_name = unit_name.to_string();
        self.diagnostics.clear();
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Reports a generic diagnostic, resolving its line from the primary label.
    pub fn report(&mut self, mut diagnostic: Diagnostic) {
        if let Some(primary) = diagnostic.labels.first() {
            diagnostic.line = self.line_of(primary.span.start);
        }
        self.diagnostics.push(diagnostic);
    }

    /// Reports an error with a specific error code.
    pub fn report_error(&mut self, code: &'static ErrorCode, message: impl Into<String>, label: Label) {
        self.report(Diagnostic::error(code, label).with_dynamic_message(message));
    }

    pub fn report_warning(&mut self, code: &'static ErrorCode, message: impl Into<String>, label: Label) {
        self.report(Diagnostic::warning(code, label).with_dynamic_message(message));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn format_plain(&self) -> String {
        self.diagnostics
            .iter()
            .map(Diagnostic::format_plain)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn format_colored(&self) -> String {
        self.diagnostics
            .iter()
            .map(Diagnostic::format_colored)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 用 ariadne 把所有诊断渲染到 stderr。
    pub fn print(&self, use_color: bool) -> io::Result<()> {
        print_all(&self.unit_name, &self.source, &self.diagnostics, use_color)
    }

    fn line_of(&self, offset: usize) -> usize {
        let end = offset.min(self.source.len());
        1 + self.source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count()
    }
}

// --- 4. Printer ---

fn print_all(unit_name: &str, source_code: &str, diagnostics: &[Diagnostic], use_color: bool) -> io::Result<()> {
    let cache = (unit_name, Source::from(source_code));

    for diag in diagnostics {
        let Some((primary, secondary)) = diag.labels.split_first() else {
            // 没有位置信息的诊断无法交给 ariadne，直接输出文本格式
            let text = if use_color { diag.format_colored() } else { diag.format_plain() };
            eprintln!("{}", text);
            continue;
        };

        let kind = match diag.level {
            DiagnosticLevel::Error => ReportKind::Custom(diag.phase.title(), Color::Red),
            DiagnosticLevel::Warning => ReportKind::Warning,
        };
        let color = match diag.level {
            DiagnosticLevel::Error => Color::Red,
            DiagnosticLevel::Warning => Color::Yellow,
        };

        let mut report = Report::build(kind, (unit_name, primary.span.into_range()))
            .with_config(Config::default().with_color(use_color))
            .with_code(diag.code)
            .with_message(&diag.message);

        report.add_label(
            AriadneLabel::new((unit_name, primary.span.into_range()))
                .with_message(&primary.message)
                .with_color(color),
        );
        for label in secondary {
            report.add_label(
                AriadneLabel::new((unit_name, label.span.into_range()))
                    .with_message(&label.message)
                    .with_color(Color::Blue),
            );
        }
        for note in &diag.notes {
            report = report.with_note(note);
        }
        if let Some(hint) = &diag.hint {
            report = report.with_help(hint);
        }

        report.finish().eprint(cache.clone())?;
    }
    Ok(())
}
