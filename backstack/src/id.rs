//! Stack entry identifiers.

use uuid::Uuid;

/// Identifier for a stack entry.
///
/// Callers may supply their own text or numeric ids when pushing; entries
/// pushed without one get a generated id. Generated ids live in their own
/// variant, so they can never collide with caller-supplied ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryId {
    /// Caller-supplied text id.
    Text(String),
    /// Caller-supplied numeric id.
    Num(i64),
    /// Generated id.
    Generated(Uuid),
}

impl EntryId {
    /// Create a new generated id.
    ///
    /// Collision-resistant against every prior generated and
    /// caller-supplied id for the life of the stack.
    pub fn generate() -> Self {
        Self::Generated(Uuid::new_v4())
    }

    /// Whether this id was generated rather than caller-supplied.
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for EntryId {
    fn from(value: i64) -> Self {
        Self::Num(value)
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}", text),
            Self::Num(num) => write!(f, "{}", num),
            Self::Generated(uuid) => write!(f, "{}", uuid),
        }
    }
}
