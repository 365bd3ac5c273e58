use std::ops::{Deref, DerefMut};

use crate::span::Span;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A related source location providing additional context for a diagnostic.
#[derive(Debug, Clone)]
pub struct RelatedSpan {
    pub span: Span,
    pub message: String,
}

/// A schema diagnostic (error or warning).
///
/// `scope` is the path of analysis scopes (type name, field name, ...) that
/// were active when the diagnostic was reported to a [`DiagnosticBag`].
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
    pub scope: Vec<String>,
    pub related: Vec<RelatedSpan>,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            span: None,
            scope: Vec::new(),
            related: Vec::new(),
            suggestion: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related.push(RelatedSpan {
            span,
            message: message.into(),
        });
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Dotted scope path, e.g. `Monster.hp`.
    pub fn scope_path(&self) -> String {
        self.scope.join(".")
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        if self.scope.is_empty() {
            write!(f, "{}: {}", prefix, self.message)?;
        } else {
            write!(f, "{}[{}]: {}", prefix, self.scope_path(), self.message)?;
        }
        if let Some(ref span) = self.span {
            write!(f, "\n  --> {}", span)?;
        }
        Ok(())
    }
}

/// Ordered, append-only collector for diagnostics.
///
/// The bag keeps a stack of named scopes. Every reported diagnostic is
/// tagged with the scopes active at the time it was reported. Scopes are
/// entered with [`DiagnosticBag::scope`], which returns a guard that leaves
/// the scope when dropped, or with [`DiagnosticBag::with_scope`].
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    scopes: Vec<String>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic, prefixing its scope path with the active scopes.
    pub fn report(&mut self, mut diagnostic: Diagnostic) {
        if !self.scopes.is_empty() {
            let mut scope = self.scopes.clone();
            scope.append(&mut diagnostic.scope);
            diagnostic.scope = scope;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>, span: Span) {
        self.report(Diagnostic::error(message).with_span(span));
    }

    pub fn warning(&mut self, message: impl Into<String>, span: Span) {
        self.report(Diagnostic::warning(message).with_span(span));
    }

    /// Report every diagnostic of `other` under the scopes active here.
    pub fn absorb(&mut self, other: DiagnosticBag) {
        for diag in other.into_diagnostics() {
            self.report(diag);
        }
    }

    /// Enter a named scope. The scope is left when the guard is dropped.
    pub fn scope(&mut self, name: impl Into<String>) -> ScopeGuard<'_> {
        self.scopes.push(name.into());
        ScopeGuard { bag: self }
    }

    /// Run `work` inside a named scope. The scope is left on every exit path,
    /// including unwinding.
    pub fn with_scope<R>(
        &mut self,
        name: impl Into<String>,
        work: impl FnOnce(&mut DiagnosticBag) -> R,
    ) -> R {
        let mut guard = self.scope(name);
        work(&mut guard)
    }

    /// Active scopes, outermost first.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Innermost active scope name.
    pub fn current_scope(&self) -> Option<&str> {
        self.scopes.last().map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| !d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Guard returned by [`DiagnosticBag::scope`]; pops its scope on drop.
///
/// Dereferences to the bag so diagnostics can be reported through it.
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    bag: &'a mut DiagnosticBag,
}

impl Deref for ScopeGuard<'_> {
    type Target = DiagnosticBag;

    fn deref(&self) -> &DiagnosticBag {
        self.bag
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut DiagnosticBag {
        self.bag
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.bag.scopes.pop();
    }
}
