use thiserror::Error;

pub type CastResult<T> = Result<T, CastError>;

#[derive(Error, Debug)]
pub enum CastError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mapping file error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Projection error: {0}")]
    Project(String),

    #[error("Circular struct embedding detected: {0}")]
    CircularStruct(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
