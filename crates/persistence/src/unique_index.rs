//! Recognition of unique-index violations reported by the database.
//!
//! Detection relies on the vendor error code. The offending column and
//! value are only available inside the human-readable error text, so they
//! are extracted by parsing that text. The parsing depends on the exact
//! wording of each vendor's message and is the fragile part of this module:
//! when the text does not match, the error is left as a plain database error.

use crate::error::DatabaseError;

/// PostgreSQL SQLSTATE `unique_violation`.
pub const POSTGRES_UNIQUE_VIOLATION: &str = "23505";

/// SQL Server "Cannot insert duplicate key row ... with unique index".
pub const SQL_SERVER_DUPLICATE_KEY_ROW: &str = "2601";

/// SQL Server "Violation of UNIQUE KEY constraint".
pub const SQL_SERVER_UNIQUE_CONSTRAINT: &str = "2627";

/// A write that collided with an existing row on a unique index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueViolation {
    pub table: Option<String>,
    pub field: String,
    pub value: String,
}

impl UniqueViolation {
    /// Message shown to API callers.
    pub fn message(&self) -> String {
        format!(
            "Duplicate entry. An item already exists that has a '{}' with the value of: '{}'.",
            self.field, self.value
        )
    }
}

/// Returns true if the error code marks a unique-index violation.
pub fn is_unique_violation(err: &DatabaseError) -> bool {
    matches!(
        err.code.as_deref(),
        Some(POSTGRES_UNIQUE_VIOLATION | SQL_SERVER_DUPLICATE_KEY_ROW | SQL_SERVER_UNIQUE_CONSTRAINT)
    )
}

/// Interprets a database error as a unique-index violation.
///
/// Returns `None` when the code is not a unique violation or when the
/// field and value cannot be recovered from the error text.
pub fn interpret(err: &DatabaseError) -> Option<UniqueViolation> {
    match err.code.as_deref()? {
        POSTGRES_UNIQUE_VIOLATION => {
            let detail = err.detail.as_deref().unwrap_or(&err.message);
            let (field, value) = parse_postgres_detail(detail)?;
            Some(UniqueViolation {
                table: err.table.clone(),
                field,
                value,
            })
        }
        SQL_SERVER_DUPLICATE_KEY_ROW | SQL_SERVER_UNIQUE_CONSTRAINT => {
            parse_sql_server_message(&err.message)
        }
        _ => None,
    }
}

/// Parses `Key (title)=(Shopping) already exists.`
fn parse_postgres_detail(detail: &str) -> Option<(String, String)> {
    let rest = detail.trim().strip_prefix("Key (")?;
    let (field, rest) = rest.split_once(")=(")?;
    let (value, _) = rest.rsplit_once(") already exists")?;

    if field.is_empty() {
        return None;
    }
    Some((field.to_string(), value.to_string()))
}

/// Parses the SQL Server duplicate key messages, e.g.
/// `Cannot insert duplicate key row in object 'dbo.TodoLists' with unique index
/// 'IX_TodoLists_Title'. The duplicate key value is (Shopping).`
fn parse_sql_server_message(message: &str) -> Option<UniqueViolation> {
    let table = quoted_after(message, "object '");
    let index = quoted_after(message, "unique index '")
        .or_else(|| quoted_after(message, "constraint '"))?;

    // Index names follow the IX_<Table>_<Field> convention.
    let field = index.rsplit('_').next().filter(|f| !f.is_empty())?;

    let (_, rest) = message.split_once("The duplicate key value is (")?;
    let (value, _) = rest.rsplit_once(')')?;

    Some(UniqueViolation {
        table: table.map(str::to_string),
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn quoted_after<'a>(message: &'a str, marker: &str) -> Option<&'a str> {
    let (_, rest) = message.split_once(marker)?;
    rest.split_once('\'').map(|(quoted, _)| quoted)
}
