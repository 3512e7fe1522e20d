use thiserror::Error;

#[derive(Debug, Error)]
pub enum DupError {
    #[error("malformed record at row {row}: {reason} (fields: {})", .fields.join(" | "))]
    MalformedRecord {
        row: usize,
        reason: String,
        fields: Vec<String>,
    },

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl DupError {
    pub fn malformed(row: usize, reason: impl Into<String>, fields: &[String]) -> Self {
        Self::MalformedRecord {
            row,
            reason: reason.into(),
            fields: fields.to_vec(),
        }
    }
}

pub type DupResult<T> = Result<T, DupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_names_row_and_fields() {
        let fields = vec!["7".to_string(), "x".to_string(), "2".to_string()];
        let err = DupError::malformed(3, "invalid id_b: x", &fields);
        assert_eq!(
            err.to_string(),
            "malformed record at row 3: invalid id_b: x (fields: 7 | x | 2)"
        );
    }
}
