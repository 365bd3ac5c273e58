pub mod errors;
pub mod manifest;
pub mod span;

pub use errors::{Diagnostic, DiagnosticBag, ScopeGuard, Severity};
pub use manifest::{FbscManifest, ManifestError};
pub use span::{Position, Span};
