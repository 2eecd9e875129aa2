pub type FormResult<T> = Result<T, FormError>;

#[derive(thiserror::Error, Debug)]
pub enum FormError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("import error: {0}")]
    Import(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FormError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    pub fn import(msg: impl Into<String>) -> Self {
        Self::Import(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(FormError::schema("x").to_string().contains("schema error:"));
        assert!(FormError::layout("x").to_string().contains("layout error:"));
        assert!(FormError::export("x").to_string().contains("export error:"));
        assert!(FormError::import("x").to_string().contains("import error:"));
        assert!(FormError::serde("x").to_string().contains("serialization error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = FormError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
