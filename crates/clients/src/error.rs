use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed api response: {0}")]
    Malformed(String),
    #[error("warehouse enumeration failed: {0}")]
    Warehouse(String),
}
