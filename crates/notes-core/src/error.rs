/// Core error types for the notes server.
#[derive(Debug, thiserror::Error)]
pub enum NotesError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "Invalid DynamoDB connection string format. Expected format: dynamodb://<access_key>:<secret_key>@<region>/<table>"
    )]
    InvalidConnectionString(String),

    #[error(
        "AWS credentials must be provided either in connection string or via environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY)"
    )]
    MissingCredentials,

    #[error("Region is required in the DynamoDB connection string")]
    MissingRegion,

    #[error("Table name is required in the DynamoDB connection string")]
    MissingTable,

    #[error("Storage backend '{0}' is not compiled into this build")]
    BackendUnavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("invalid input: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("malformed item '{id}': {reason}")]
    Malformed { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, NotesError>;
