use std::path::PathBuf;
use thiserror::Error;

use crate::payment::PaymentError;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("configuration file not found in '{0}'")]
    NotFound(PathBuf),
    #[error("required secret '{0}' is not set")]
    MissingSecret(&'static str),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    // External errors
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error(transparent)]
    BsonDe(#[from] bson::de::Error),
    #[error(transparent)]
    BsonSer(#[from] bson::ser::Error),
    #[error("invalid object id: {0}")]
    InvalidObjectId(#[from] bson::oid::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Cors(#[from] rocket_cors::Error),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}
