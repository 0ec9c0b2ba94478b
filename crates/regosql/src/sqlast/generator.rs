//! Call-scoped SQL generation context.

use thiserror::Error;

/// A problem found while rendering; recorded instead of aborting the render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unsupported equality: {left} {op} {right}")]
    UnsupportedEquality {
        left: String,
        op: &'static str,
        right: String,
    },
    #[error("unsupported containment: {element} in {collection}")]
    UnsupportedContains { collection: String, element: String },
    #[error("array {rego}: unsupported element {element}")]
    UnsupportedArrayElement { rego: String, element: String },
}

/// Collects [`RenderError`]s while a node tree renders itself.
///
/// Unrenderable subtrees emit a sentinel token (`EqualityError`, ...) so the
/// rest of the tree still renders; callers decide whether any diagnostic is
/// fatal. Never share one generator between concurrent renders.
#[derive(Debug, Default)]
pub struct SqlGenerator {
    errors: Vec<RenderError>,
}

impl SqlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, err: RenderError) {
        tracing::trace!(error = %err, "sql render diagnostic");
        self.errors.push(err);
    }

    pub fn errors(&self) -> &[RenderError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<RenderError> {
        self.errors
    }
}
