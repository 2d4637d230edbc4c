use thiserror::Error;

#[derive(Debug, Error)]
pub enum EavIndexError {
    #[error("connection error: {0}")]
    ConnectionError(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("query error: {0}")]
    QueryError(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("indexer {indexer} failed: {message}")]
    IndexerError {
        indexer: String,
        message: String,
        #[source]
        source: Box<EavIndexError>,
    },
}

impl EavIndexError {
    pub fn connection<T: Into<String>>(msg: T) -> Self {
        EavIndexError::ConnectionError(msg.into())
    }

    pub fn schema<T: Into<String>>(msg: T) -> Self {
        EavIndexError::SchemaError(msg.into())
    }

    pub fn query<T: Into<String>>(msg: T) -> Self {
        EavIndexError::QueryError(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        EavIndexError::InvalidInput(msg.into())
    }

    /// Wraps a failure from one indexer's run, preserving the original
    /// message and chaining the cause.
    pub fn indexer<T: Into<String>>(indexer: T, source: EavIndexError) -> Self {
        EavIndexError::IndexerError {
            indexer: indexer.into(),
            message: source.to_string(),
            source: Box::new(source),
        }
    }
}
