//! Low-level parse/arithmetic errors from the primitive data-model layer.
//!
//! `fractalwonder-engine::EngineError` wraps these via `#[from]` for the
//! two failure kinds that can originate down here: a malformed decimal
//! string reaching `BigFloat::from_string`, or the HPFloat precision
//! budget being exceeded while constructing a viewport or reference orbit.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A decimal string could not be parsed into a `BigFloat`.
    #[error("invalid decimal literal {value:?}: {reason}")]
    InvalidDecimalLiteral { value: String, reason: String },

    /// The requested precision exceeds the configured HPFloat maximum.
    #[error("precision budget exceeded: requested {requested} bits, maximum {maximum} bits")]
    PrecisionBudgetExceeded { requested: usize, maximum: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_decimal_literal_message_includes_value() {
        let err = Error::InvalidDecimalLiteral {
            value: "not_a_number".to_string(),
            reason: "Failed to parse DBig".to_string(),
        };
        assert!(err.to_string().contains("not_a_number"));
    }

    #[test]
    fn precision_budget_exceeded_message_includes_both_bounds() {
        let err = Error::PrecisionBudgetExceeded {
            requested: 8192,
            maximum: 4096,
        };
        let message = err.to_string();
        assert!(message.contains("8192"));
        assert!(message.contains("4096"));
    }
}
