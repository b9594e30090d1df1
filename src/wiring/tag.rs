//! Injection annotation grammar.
//!
//! ```text
//! annotation := directive (";" directive)*
//! directive  := ident (":" ident)?
//! ```
//!
//! `ident` is a non-empty run of ASCII alphanumerics, `_`, `-` or `.`.
//! Whitespace around tokens is ignored. Two directive keys are recognized:
//! [`TYPE_DIRECTIVE`] (inject by type, unnamed) and [`ALIAS_DIRECTIVE`]
//! (`alias:<name>`, inject by type under `<name>`). Other keys are accepted
//! and ignored. When a key repeats, the last occurrence wins.

use std::fmt;

/// Presence directive: inject by declared type, unnamed.
pub const TYPE_DIRECTIVE: &str = "type";

/// `alias:<name>` directive: inject by declared type under `<name>`.
pub const ALIAS_DIRECTIVE: &str = "alias";

/// Malformed annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The annotation is empty or only whitespace.
    Empty,
    /// Directive at this index is empty (e.g. `type;;alias:x`).
    EmptyDirective(usize),
    /// Directive at this index has more than one `:`.
    TooManySeparators(usize),
    /// A key or value is not a valid identifier.
    InvalidIdent { directive: usize, token: String },
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagError::Empty => write!(f, "empty annotation"),
            TagError::EmptyDirective(i) => write!(f, "directive {} is empty", i),
            TagError::TooManySeparators(i) => write!(f, "directive {} has more than one ':'", i),
            TagError::InvalidIdent { directive, token } => {
                write!(f, "directive {} has invalid identifier '{}'", directive, token)
            }
        }
    }
}

impl std::error::Error for TagError {}

/// Parsed directive set, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives<'a> {
    entries: Vec<(&'a str, Option<&'a str>)>,
}

impl<'a> Directives<'a> {
    /// Value of the last `key` directive: `Some(None)` for a bare key.
    pub fn get(&self, key: &str) -> Option<Option<&'a str>> {
        self.entries.iter().rev().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    /// Alias name from the `alias:<name>` directive, if any.
    pub fn alias(&self) -> Option<&'a str> {
        self.get(ALIAS_DIRECTIVE).flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Option<&'a str>)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_ident(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Parses an injection annotation.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::tag::{parse, TagError};
///
/// let directives = parse("type; alias:spare").unwrap();
/// assert!(directives.contains("type"));
/// assert_eq!(directives.alias(), Some("spare"));
///
/// assert_eq!(parse("type;;alias:x"), Err(TagError::EmptyDirective(1)));
/// ```
pub fn parse(tag: &str) -> Result<Directives<'_>, TagError> {
    if tag.trim().is_empty() {
        return Err(TagError::Empty);
    }

    let mut entries = Vec::new();
    for (index, part) in tag.split(';').enumerate() {
        let part = part.trim();
        if part.is_empty() {
            return Err(TagError::EmptyDirective(index));
        }

        let mut pieces = part.split(':');
        let key = pieces.next().unwrap_or_default().trim();
        let value = pieces.next().map(str::trim);
        if pieces.next().is_some() {
            return Err(TagError::TooManySeparators(index));
        }

        for token in std::iter::once(key).chain(value) {
            if !is_ident(token) {
                return Err(TagError::InvalidIdent {
                    directive: index,
                    token: token.to_string(),
                });
            }
        }
        entries.push((key, value));
    }

    Ok(Directives { entries })
}
