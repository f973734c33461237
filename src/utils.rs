use chrono::DateTime;

use crate::client::error::Error;

const REMOTE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Parses a remote ISO-8601 timestamp with offset into unix seconds
pub fn unix(modified: &str) -> Result<i64, Error> {
    DateTime::parse_from_str(modified, REMOTE_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(modified))
        .map(|time| time.timestamp())
        .map_err(|e| Error::Decode(format!("invalid timestamp \"{modified}\": {e}")))
}
