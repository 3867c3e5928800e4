use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonacError>;

/// Errors surfaced by the second-order query stack.
///
/// Every failure is tagged so callers (and an eventual RPC layer) can
/// distinguish plan validation problems from storage faults and resource
/// limits.
#[derive(Debug, Error)]
pub enum MonacError {
    /// The query builder rejected the plan before execution.
    #[error("invalid query plan: {0}")]
    PlanInvalid(&'static str),
    /// A filter subexpression failed to parse or evaluate.
    #[error("expression '{expr}' failed: {reason}")]
    Expression { expr: String, reason: String },
    /// The storage engine reported a fault; partial results are discarded.
    #[error("storage error: {0}")]
    Storage(String),
    /// A candidate family exceeded a configured cap.
    #[error("power-set family over {vertices} vertices exceeds the limit of {max}")]
    OverLimit { vertices: usize, max: usize },
    /// Collection mode accumulated more subsets than allowed.
    #[error("collection exceeded the limit of {max} result subsets")]
    TooLargeResult { max: usize },
    /// Cooperative cancellation was observed.
    #[error("query cancelled")]
    Cancelled,
}

impl MonacError {
    /// Builds an [`MonacError::Expression`] from an offending subexpression.
    pub fn expression(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        MonacError::Expression {
            expr: expr.into(),
            reason: reason.into(),
        }
    }

    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            MonacError::PlanInvalid(_) => "PlanInvalid",
            MonacError::Expression { .. } => "Expression",
            MonacError::Storage(_) => "Storage",
            MonacError::OverLimit { .. } => "OverLimit",
            MonacError::TooLargeResult { .. } => "TooLargeResult",
            MonacError::Cancelled => "Cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_variants() {
        assert_eq!(MonacError::PlanInvalid("x").code(), "PlanInvalid");
        assert_eq!(MonacError::Cancelled.code(), "Cancelled");
        assert_eq!(
            MonacError::expression("g.V(x)", "unknown step").code(),
            "Expression"
        );
    }

    #[test]
    fn display_includes_subexpression() {
        let err = MonacError::expression("g.V(x).frobnicate()", "unknown step 'frobnicate'");
        let msg = err.to_string();
        assert!(msg.contains("frobnicate"), "message was: {msg}");
    }
}
