use a2a_rs::errors::A2aServerError;
use serde::Serialize;
use thiserror::Error;

/// Errors shared by the binaries in this workspace.
#[derive(Error, Debug, Serialize)]
pub enum CommonError {
    #[error("unknown error: {0}")]
    Unknown(
        #[serde(skip)]
        #[from]
        anyhow::Error,
    ),
    #[error("invalid configuration: {msg}")]
    InvalidConfiguration {
        msg: String,
        #[serde(skip)]
        #[source]
        source: Option<anyhow::Error>,
    },
    #[error("io error")]
    IoError {
        #[serde(skip)]
        #[from]
        #[source]
        source: std::io::Error,
    },
    #[error("serde yaml error")]
    SerdeYamlError {
        #[serde(skip)]
        #[from]
        #[source]
        source: serde_yaml::Error,
    },
}

impl CommonError {
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        CommonError::InvalidConfiguration {
            msg: msg.into(),
            source: None,
        }
    }
}

impl From<CommonError> for A2aServerError {
    fn from(e: CommonError) -> Self {
        let message = e.to_string();
        A2aServerError::InternalError(a2a_rs::errors::Error::new(message).with_source(e))
    }
}
