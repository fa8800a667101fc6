/// Convenience result alias used across the crate.
pub type CollatzResult<T> = Result<T, CollatzError>;

/// Top-level error type.
#[derive(thiserror::Error, Debug)]
pub enum CollatzError {
    /// Invalid run parameters or inconsistent inputs.
    #[error("validation error: {0}")]
    Validation(String),

    /// Angle text that could not be parsed or evaluated.
    #[error("expression error: {0}")]
    Expression(String),

    /// Unreadable or malformed configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Rasterization failure.
    #[error("render error: {0}")]
    Render(String),

    /// Video encoding failure (ffmpeg missing, pipe closed, non-zero exit).
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CollatzError {
    /// Build a [`CollatzError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CollatzError::Expression`].
    pub fn expression(msg: impl Into<String>) -> Self {
        Self::Expression(msg.into())
    }

    /// Build a [`CollatzError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CollatzError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CollatzError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            CollatzError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            CollatzError::expression("x")
                .to_string()
                .contains("expression error:")
        );
        assert!(CollatzError::config("x").to_string().contains("config error:"));
        assert!(CollatzError::render("x").to_string().contains("render error:"));
        assert!(CollatzError::encode("x").to_string().contains("encode error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = CollatzError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
