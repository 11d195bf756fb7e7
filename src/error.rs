use thiserror::Error;

pub type Result<T> = std::result::Result<T, CurveletError>;

/// Errors raised while building or applying a curvelet system.
#[derive(Debug, Error)]
pub enum CurveletError {
    /// The construction engine rejected the request (bad settings, image too
    /// small for the requested scales, malformed coefficient nesting).
    #[error("curvelet construction failed: {0}")]
    Construction(String),

    #[error("shape mismatch for {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("expected {expected} coefficient maps, got {actual}")]
    WedgeCountMismatch { expected: usize, actual: usize },

    /// The requested array backend was compiled out of this build.
    #[error("backend '{0}' is not available in this build")]
    BackendUnavailable(String),

    #[error("invalid settings document: {0}")]
    Config(#[from] serde_json::Error),
}

impl CurveletError {
    pub(crate) fn construction(msg: impl Into<String>) -> Self {
        CurveletError::Construction(msg.into())
    }

    pub(crate) fn check_shape(
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(CurveletError::ShapeMismatch {
                context,
                expected,
                actual,
            })
        }
    }
}
