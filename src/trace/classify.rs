//! Column type classification.
//!
//! Maps a raw database type string such as `varchar(45)` or `bigint(20) unsigned` to the
//! representation type, value encoder and comparability tag used in the output files.
//! Rules are tried in a fixed order and the first one matching the start of the base type
//! wins, so a new vendor spelling only needs a new rule.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::encode::Encoder;

/// Representation type of a declared variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RepType {
    String,
    Int,
    Double,
    IntArray,
    StringArray,
    /// Opaque identity, used for integer primary keys so they are not treated as numbers.
    HashCode,
}

impl RepType {
    /// Name of the representation type as written in declarations.
    pub fn name(&self) -> &'static str {
        match self {
            RepType::String => "java.lang.String",
            RepType::Int => "int",
            RepType::Double => "double",
            RepType::IntArray => "int[]",
            RepType::StringArray => "java.lang.String[]",
            RepType::HashCode => "hashcode",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, RepType::IntArray | RepType::StringArray)
    }
}

impl fmt::Display for RepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of classifying a raw column type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub rep_type: RepType,
    pub encoder: Encoder,
    pub comparability: &'static str,
}

impl Classification {
    const fn new(rep_type: RepType, encoder: Encoder, comparability: &'static str) -> Self {
        Self {
            rep_type,
            encoder,
            comparability,
        }
    }
}

/// Classification used for types no rule recognizes.
pub const FALLBACK: Classification = Classification::new(RepType::String, Encoder::Quoted, "1");

struct TypeRule {
    pattern: Regex,
    class: Classification,
}

static TYPE_RULES: LazyLock<Vec<TypeRule>> = LazyLock::new(|| {
    [
        (
            r"enum|(var)?char|(big|small|medium)?text",
            Classification::new(RepType::String, Encoder::Quoted, "1"),
        ),
        (
            r"(big|small|medium|tiny)?int(eger)?",
            Classification::new(RepType::Int, Encoder::Plain, "2"),
        ),
        (
            r"bit",
            Classification::new(RepType::Int, Encoder::Bit, "2"),
        ),
        (
            r"float|decimal|double",
            Classification::new(RepType::Double, Encoder::Plain, "3"),
        ),
        (
            r"(big|medium|small)?blob",
            Classification::new(RepType::IntArray, Encoder::Bytes, "4[2]"),
        ),
        (
            r"set",
            Classification::new(RepType::StringArray, Encoder::Set, "5[1]"),
        ),
        (
            r"datetime|timestamp",
            Classification::new(RepType::String, Encoder::Quoted, "6"),
        ),
        (
            r"date",
            Classification::new(RepType::String, Encoder::Quoted, "7"),
        ),
    ]
    .into_iter()
    .map(|(pattern, class)| TypeRule {
        pattern: Regex::new(&format!("(?i)^(?:{pattern})"))
            .expect("Invalid column type pattern"),
        class,
    })
    .collect()
});

/// Returns the type with any parenthesized length or precision removed.
pub fn base_type(raw_type: &str) -> &str {
    let base = match raw_type.find('(') {
        Some(idx) => &raw_type[..idx],
        None => raw_type,
    };
    base.trim()
}

/// Classifies `raw_type`, returning `None` when no rule matches.
pub fn try_classify(raw_type: &str) -> Option<Classification> {
    let base = base_type(raw_type);
    TYPE_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(base))
        .map(|rule| rule.class)
}

/// Classifies `raw_type`, falling back to a quoted string for unknown types.
pub fn classify(raw_type: &str) -> Classification {
    try_classify(raw_type).unwrap_or_else(|| {
        tracing::warn!("Unhandled base type: {}", base_type(raw_type));
        FALLBACK
    })
}
