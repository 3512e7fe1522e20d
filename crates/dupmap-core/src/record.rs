use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DupError, DupResult};

// ---------------------------------------------------------------------------
// Label
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Duplicate,
    NotDuplicate,
}

impl Label {
    pub fn is_duplicate(self) -> bool {
        matches!(self, Self::Duplicate)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate"),
            Self::NotDuplicate => write!(f, "not_duplicate"),
        }
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "true" | "duplicate" | "dup" => Ok(Self::Duplicate),
            "0" | "false" | "not_duplicate" | "not_dup" => Ok(Self::NotDuplicate),
            _ => Err(format!("invalid label: {s:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// RelationRecord
// ---------------------------------------------------------------------------

/// One labelled pair from the input stream. The texts are only carried
/// through to contradiction reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord<K> {
    pub id_a: K,
    pub id_b: K,
    pub label: Label,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_b: Option<String>,
}

impl<K> RelationRecord<K> {
    pub fn new(id_a: K, id_b: K, label: Label) -> Self {
        Self {
            id_a,
            id_b,
            label,
            text_a: None,
            text_b: None,
        }
    }

    pub fn duplicate(id_a: K, id_b: K) -> Self {
        Self::new(id_a, id_b, Label::Duplicate)
    }

    pub fn not_duplicate(id_a: K, id_b: K) -> Self {
        Self::new(id_a, id_b, Label::NotDuplicate)
    }

    pub fn with_texts(mut self, text_a: impl Into<String>, text_b: impl Into<String>) -> Self {
        self.text_a = Some(text_a.into());
        self.text_b = Some(text_b.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// Header names used to locate the record fields in a delimited file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub id_a: String,
    pub id_b: String,
    pub label: String,
    pub text_a: Option<String>,
    pub text_b: Option<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            id_a: "qid1".into(),
            id_b: "qid2".into(),
            label: "is_duplicate".into(),
            text_a: Some("question1".into()),
            text_b: Some("question2".into()),
        }
    }
}

/// Positional indices of the record fields within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub id_a: usize,
    pub id_b: usize,
    pub label: usize,
    pub text_a: Option<usize>,
    pub text_b: Option<usize>,
}

impl Default for ColumnMap {
    /// `id, qid1, qid2, question1, question2, is_duplicate`
    fn default() -> Self {
        Self {
            id_a: 1,
            id_b: 2,
            label: 5,
            text_a: Some(3),
            text_b: Some(4),
        }
    }
}

impl ColumnMap {
    /// Resolve column positions from a header row. Required columns must be
    /// present; a missing text column simply drops that payload.
    pub fn from_header(header: &[String], names: &ColumnNames) -> DupResult<Self> {
        let position = |name: &str| header.iter().position(|h| h.trim() == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| {
                DupError::Config(format!(
                    "column {name:?} not found in header [{}]",
                    header.join(", ")
                ))
            })
        };

        Ok(Self {
            id_a: required(&names.id_a)?,
            id_b: required(&names.id_b)?,
            label: required(&names.label)?,
            text_a: names.text_a.as_deref().and_then(position),
            text_b: names.text_b.as_deref().and_then(position),
        })
    }
}

// ---------------------------------------------------------------------------
// RawRecord
// ---------------------------------------------------------------------------

/// One input row before typing. `row` is the 1-based data row index
/// (header excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub row: usize,
    pub fields: Vec<String>,
}

impl RawRecord {
    pub fn new(row: usize, fields: Vec<String>) -> Self {
        Self { row, fields }
    }

    /// Type the row. Either every required field parses or the whole row is
    /// rejected.
    pub fn parse<K: FromStr>(&self, columns: &ColumnMap) -> DupResult<RelationRecord<K>> {
        let id_a = self.parse_id(columns.id_a, "id_a")?;
        let id_b = self.parse_id(columns.id_b, "id_b")?;

        let raw_label = self.field(columns.label, "label")?;
        let label = raw_label
            .parse::<Label>()
            .map_err(|e| DupError::malformed(self.row, e, &self.fields))?;

        Ok(RelationRecord {
            id_a,
            id_b,
            label,
            text_a: self.text(columns.text_a),
            text_b: self.text(columns.text_b),
        })
    }

    fn field(&self, index: usize, name: &str) -> DupResult<&str> {
        self.fields.get(index).map(String::as_str).ok_or_else(|| {
            DupError::malformed(
                self.row,
                format!(
                    "missing {name} (column {index}, row has {} fields)",
                    self.fields.len()
                ),
                &self.fields,
            )
        })
    }

    fn parse_id<K: FromStr>(&self, index: usize, name: &str) -> DupResult<K> {
        let raw = self.field(index, name)?;
        raw.trim().parse().map_err(|_| {
            DupError::malformed(self.row, format!("invalid {name}: {raw:?}"), &self.fields)
        })
    }

    fn text(&self, index: Option<usize>) -> Option<String> {
        index
            .and_then(|i| self.fields.get(i))
            .filter(|s| !s.is_empty())
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// Contradiction
// ---------------------------------------------------------------------------

/// A `not_duplicate` record whose ids were already in the same cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contradiction<K> {
    /// 1-based position of the triggering record in the processed stream.
    pub position: usize,
    pub id_a: K,
    pub id_b: K,
    pub text_a: Option<String>,
    pub text_b: Option<String>,
}

impl<K: fmt::Display> fmt::Display for Contradiction<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "qid1={}, qid2={}, question1={}, question2={}",
            self.id_a,
            self.id_b,
            self.text_a.as_deref().unwrap_or(""),
            self.text_b.as_deref().unwrap_or("")
        )
    }
}
