//! Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Config error: {message}")]
    Config { message: String },

    #[error("Error opening {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to initialise the {role}")]
    Allocation { role: &'static str },

    #[error("Bitstream error: {message}")]
    Bitstream { message: String },

    #[error("Audio error: {message}")]
    Audio { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub fn config<S: Into<String>>(msg: S) -> Self { Self::Config { message: msg.into() } }
    pub fn bitstream<S: Into<String>>(msg: S) -> Self { Self::Bitstream { message: msg.into() } }
    pub fn audio<S: Into<String>>(msg: S) -> Self { Self::Audio { message: msg.into() } }

    pub fn open<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Open { path: path.into(), source }
    }

    /// Process exit status for a fatal error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Allocation { .. } => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

impl From<hound::Error> for HarnessError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => Self::Io(e),
            other => Self::audio(other.to_string()),
        }
    }
}
