use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{sink} rejected the report with status {status}: {body}")]
    Rejected {
        sink: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}
