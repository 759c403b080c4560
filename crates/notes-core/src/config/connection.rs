use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;

/// `dynamodb://[<access_key>:<secret_key>@]<region>/<table>`
///
/// Region and table are matched leniently here so that a missing part is
/// reported by name instead of as a generic format error.
static DYNAMODB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^dynamodb://(?:([^:@/]+):([^@]+)@)?([a-z0-9-]*)(?:/([a-zA-Z0-9_-]*))?$")
        .expect("static regex")
});

/// Parts of a parsed connection string, before credential resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionString {
    Dynamo {
        access_key: Option<String>,
        secret_key: Option<String>,
        region: String,
        table_name: String,
    },
    Memory,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();

        if raw.starts_with("memory://") {
            return Ok(Self::Memory);
        }

        let caps = DYNAMODB_RE
            .captures(raw)
            .ok_or_else(|| ConfigError::InvalidConnectionString(raw.to_string()))?;

        let part = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
        let region = part(3).unwrap_or_default();
        let table_name = part(4).unwrap_or_default();

        if region.is_empty() {
            return Err(ConfigError::MissingRegion);
        }
        if table_name.is_empty() {
            return Err(ConfigError::MissingTable);
        }

        Ok(Self::Dynamo {
            access_key: part(1),
            secret_key: part(2),
            region,
            table_name,
        })
    }
}
