use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuantFinanceError {
    #[error("Invalid bond specification: {field} — {reason}")]
    InvalidBondSpec { field: String, reason: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Computation error in {context}")]
    ComputationError { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl QuantFinanceError {
    pub(crate) fn bond_spec(field: &str, reason: impl Into<String>) -> Self {
        QuantFinanceError::InvalidBondSpec {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn input(field: &str, reason: impl Into<String>) -> Self {
        QuantFinanceError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn computation(context: impl Into<String>) -> Self {
        QuantFinanceError::ComputationError {
            context: context.into(),
        }
    }
}

impl From<serde_json::Error> for QuantFinanceError {
    fn from(e: serde_json::Error) -> Self {
        QuantFinanceError::SerializationError(e.to_string())
    }
}
