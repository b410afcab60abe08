use thiserror::Error;

/// Failures while obtaining and decoding raw tabular bytes from a source.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("source unreachable: {url}: {detail}")]
    Unreachable { url: String, detail: String },

    #[error("payload could not be decoded as delimited text (tried {})", .attempted.join(", "))]
    UndecodableEncoding { attempted: Vec<String> },

    #[error("all sources failed: {0}")]
    AllSourcesFailed(String),
}

/// Failures while normalizing raw rows into the canonical dataset.
///
/// Row-level problems are not errors: bad rows are excluded and counted in
/// `Dataset::skipped_count`.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("required column missing from source: {0}")]
    MissingRequiredColumn(String),
}
