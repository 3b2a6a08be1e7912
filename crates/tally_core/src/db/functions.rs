//! Custom SQL functions registered on every connection.
//!
//! Tags are persisted as a JSON array of strings; SQLite has no native
//! set type, so membership goes through `tags_contain(tags, tag)`.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// Name of the tag membership predicate.
pub const TAGS_CONTAIN_FN: &str = "tags_contain";

/// Registers all scalar functions required by entry queries.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        TAGS_CONTAIN_FN,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let tags = ctx.get::<Option<String>>(0)?;
            let needle = ctx.get::<String>(1)?;
            let Some(tags) = tags else {
                return Ok(false);
            };
            let parsed: Vec<String> = serde_json::from_str(&tags)
                .map_err(|err| rusqlite::Error::UserFunctionError(Box::new(err)))?;
            Ok(parsed.iter().any(|tag| *tag == needle))
        },
    )
}
