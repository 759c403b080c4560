pub mod connection;

use std::time::Duration;

use crate::error::ConfigError;

pub use connection::ConnectionString;

/// Connection string used when none is given.
pub const DEFAULT_CONNECTION_STRING: &str = "dynamodb://us-east-1/mcp-notes";

/// Default port of the web front end.
pub const DEFAULT_WEB_PORT: u16 = 3100;

/// Number of resources per `resources/list` page.
pub const PAGE_SIZE: usize = 20;

/// Interval between subscription update broadcasts.
pub const NOTIFY_INTERVAL: Duration = Duration::from_secs(5);

/// Server identity reported in `initialize`.
pub const SERVER_NAME: &str = "MCP Notes";

/// Static AWS credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Everything needed to reach the DynamoDB notes table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoConfig {
    pub region: String,
    pub table_name: String,
    pub credentials: Credentials,
    /// Overrides the regional endpoint (e.g. DynamoDB Local).
    pub endpoint_url: Option<String>,
}

/// Which persistence backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Dynamo(DynamoConfig),
    Memory,
}

/// Resolve a connection string against the process environment.
///
/// Credentials missing from the string are taken from `AWS_ACCESS_KEY_ID` /
/// `AWS_SECRET_ACCESS_KEY` (plus `AWS_SESSION_TOKEN` if set).
pub fn load_store_config(connection_string: &str) -> Result<StoreConfig, ConfigError> {
    resolve_store_config(connection_string, |name| {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    })
}

/// Same as [`load_store_config`] with an explicit environment lookup.
pub fn resolve_store_config<F>(connection_string: &str, env: F) -> Result<StoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match ConnectionString::parse(connection_string)? {
        ConnectionString::Memory => Ok(StoreConfig::Memory),
        ConnectionString::Dynamo {
            access_key,
            secret_key,
            region,
            table_name,
        } => {
            let credentials = match (access_key, secret_key) {
                (Some(access_key_id), Some(secret_access_key)) => Credentials {
                    access_key_id,
                    secret_access_key,
                    session_token: None,
                },
                _ => Credentials {
                    access_key_id: env("AWS_ACCESS_KEY_ID").ok_or(ConfigError::MissingCredentials)?,
                    secret_access_key: env("AWS_SECRET_ACCESS_KEY")
                        .ok_or(ConfigError::MissingCredentials)?,
                    session_token: env("AWS_SESSION_TOKEN"),
                },
            };

            Ok(StoreConfig::Dynamo(DynamoConfig {
                region,
                table_name,
                credentials,
                endpoint_url: env("DYNAMODB_ENDPOINT"),
            }))
        }
    }
}

/// Web port: explicit value, then `PORT`, then the default.
pub fn resolve_web_port(explicit: Option<u16>) -> u16 {
    explicit
        .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(DEFAULT_WEB_PORT)
}
