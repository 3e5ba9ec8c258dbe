//! Granite provider error types

use bareflow_cloud::RpcError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraniteError {
    #[error("remote call failed: {0}")]
    Rpc(#[from] RpcError),

    #[error("unable to open image source {source_path}: {source}")]
    SourceOpen {
        source_path: String,
        source: std::io::Error,
    },

    #[error("unable to download image source: {0}")]
    SourceDownload(reqwest::Error),

    #[error("image upload failed: {0}")]
    Upload(reqwest::Error),

    #[error("image upload rejected with status {0}")]
    UploadStatus(reqwest::StatusCode),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GraniteError>;
