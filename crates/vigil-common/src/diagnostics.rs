//! Diagnostic model: issue templates, severities, and the reporting sink.
//!
//! The analysis passes never format human-readable strings themselves; they
//! pick a template and supply positional arguments. Rendering is left to
//! whatever consumes the sink (CLI printer, LSP layer, test assertions).

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Normal,
    Critical,
}

/// A statically registered issue kind: stable numeric code, name used by
/// suppression/config surfaces, default severity, and a `{0}`-style
/// positional message template.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IssueTemplate {
    pub code: u32,
    pub name: &'static str,
    pub severity: Severity,
    pub message: &'static str,
}

macro_rules! issue_templates {
    ($($const_name:ident = ($code:expr, $name:expr, $severity:expr, $message:expr);)*) => {
        pub mod issue {
            use super::{IssueTemplate, Severity};
            $(pub const $const_name: IssueTemplate = IssueTemplate {
                code: $code,
                name: $name,
                severity: $severity,
                message: $message,
            };)*
        }

        /// Every registered issue template, ordered by code.
        pub static ISSUE_TEMPLATES: &[IssueTemplate] = &[$(issue::$const_name),*];
    };
}

issue_templates! {
    UNDECLARED_CLASS = (1000, "UndeclaredClass", Severity::Critical,
        "Reference to undeclared class `{0}`");
    UNDECLARED_FUNCTION = (1001, "UndeclaredFunction", Severity::Critical,
        "Call to undeclared function `{0}`");
    UNDECLARED_METHOD = (1002, "UndeclaredMethod", Severity::Critical,
        "Call to undeclared method `{0}::{1}`");
    UNDECLARED_PROPERTY = (1003, "UndeclaredProperty", Severity::Normal,
        "Reference to undeclared property `{0}->{1}`");
    UNDECLARED_STATIC_PROPERTY = (1004, "UndeclaredStaticProperty", Severity::Critical,
        "Reference to undeclared static property `{0}::${1}`");
    UNDECLARED_CONSTANT = (1005, "UndeclaredConstant", Severity::Normal,
        "Reference to undeclared constant `{0}`");
    UNDECLARED_CLASS_CONSTANT = (1006, "UndeclaredClassConstant", Severity::Normal,
        "Reference to undeclared class constant `{0}::{1}`");
    TYPE_ARRAY_OPERATOR = (2000, "TypeArrayOperator", Severity::Normal,
        "Invalid array operand provided to operator `{0}` between `{1}` and `{2}`");
    TYPE_COMPARISON_TO_ARRAY = (2001, "TypeComparisonToArray", Severity::Low,
        "Array type `{0}` compared against non-array type `{1}` using `{2}`");
    TYPE_MISMATCH_RETURN = (2002, "TypeMismatchReturn", Severity::Normal,
        "Returning type `{0}` but `{1}` is declared to return `{2}`");
    TYPE_INSTANTIATE_ABSTRACT = (2003, "TypeInstantiateAbstract", Severity::Critical,
        "Instantiation of abstract class `{0}`");
    TYPE_INSTANTIATE_INTERFACE = (2004, "TypeInstantiateInterface", Severity::Critical,
        "Instantiation of interface `{0}`");
    REDEFINED_CLASS = (3000, "RedefinedClass", Severity::Low,
        "Class `{0}` defined at line {1} was previously defined");
    REDEFINED_FUNCTION = (3001, "RedefinedFunction", Severity::Low,
        "Function `{0}` defined at line {1} was previously defined");
    REDEFINED_CLASS_MEMBER = (3002, "RedefinedClassMember", Severity::Low,
        "Member `{0}` of class `{1}` was previously defined");
}

/// Look up a template by its numeric code.
pub fn template_for(code: u32) -> Option<&'static IssueTemplate> {
    ISSUE_TEMPLATES.iter().find(|t| t.code == code)
}

/// Substitute positional `{N}` placeholders in a message template.
pub fn format_message(message: &str, args: &[String]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// One reported problem: `(code, severity, file, line, args)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: u32,
    pub name: &'static str,
    pub severity: Severity,
    pub file: String,
    pub line: u32,
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn new(
        template: &'static IssueTemplate,
        file: impl Into<String>,
        line: u32,
        args: Vec<String>,
    ) -> Self {
        Self {
            code: template.code,
            name: template.name,
            severity: template.severity,
            file: file.into(),
            line,
            args,
        }
    }

    /// Render the message template with this diagnostic's arguments.
    pub fn rendered(&self) -> String {
        match template_for(self.code) {
            Some(template) => format_message(template.message, &self.args),
            None => format!("unknown issue {}", self.code),
        }
    }
}

/// Abstract destination for diagnostics produced by the analysis passes.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Vec-backed sink, the default collector used by the CLI and tests.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Count of diagnostics at or above the given severity.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity >= severity)
            .count()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_message_substitutes_positionally() {
        let rendered = format_message("`{0}` vs `{1}` and `{0}` again", &[
            "int".to_string(),
            "string".to_string(),
        ]);
        assert_eq!(rendered, "`int` vs `string` and `int` again");
    }

    #[test]
    fn codes_are_unique() {
        for (i, a) in ISSUE_TEMPLATES.iter().enumerate() {
            for b in &ISSUE_TEMPLATES[i + 1..] {
                assert_ne!(a.code, b.code, "{} and {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn collector_orders_and_filters() {
        let mut sink = DiagnosticCollector::new();
        sink.report(Diagnostic::new(&issue::REDEFINED_CLASS, "a.php", 3, vec![
            "A".to_string(),
            "3".to_string(),
        ]));
        sink.report(Diagnostic::new(
            &issue::UNDECLARED_CLASS,
            "a.php",
            9,
            vec!["B".to_string()],
        ));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.count_at_least(Severity::Normal), 1);
        assert_eq!(sink.diagnostics()[0].line, 3);
    }
}
