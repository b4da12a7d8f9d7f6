pub type TerrainResult<T> = Result<T, TerrainError>;

/// Errors raised while resolving a selection or producing a terrain map.
#[derive(thiserror::Error, Debug)]
pub enum TerrainError {
    #[error("unknown descriptor: {0}")]
    UnknownDescriptor(String),

    #[error("duplicate descriptor in catalog: {0}")]
    DuplicateDescriptor(String),

    #[error("invalid terrain parameters: {0}")]
    InvalidParams(String),

    #[error("viewer error: {0}")]
    Viewer(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl TerrainError {
    pub fn unknown_descriptor(name: impl Into<String>) -> Self {
        Self::UnknownDescriptor(name.into())
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    pub fn viewer(msg: impl Into<String>) -> Self {
        Self::Viewer(msg.into())
    }
}
