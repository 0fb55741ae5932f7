//! Error types for the fieldflow crate.
//!
//! Every failure here is a precondition violation surfaced to the caller at
//! construction or append time. Nothing is transient and nothing is retried.

use thiserror::Error;

/// Errors raised while building fields, predicates, operations or pipelines.
#[derive(Debug, Error)]
pub enum FieldflowError {
    /// A required argument was missing or malformed.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: &'static str,
    },

    /// A textual tag did not name any variant of a closed enumeration.
    #[error("unknown {kind} tag: '{tag}'")]
    UnknownTag { kind: &'static str, tag: String },

    /// Invalid regular expression pattern.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// A stage's declared input type does not match the pipeline's current output type.
    #[error("type mismatch at stage {position}: stage expects {expected}, pipeline produces {actual}")]
    TypeMismatch {
        position: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// The pipeline already carries a terminal operation.
    #[error("pipeline is sealed by terminal operation '{terminal}'")]
    PipelineSealed { terminal: &'static str },

    /// A terminal operation's kind and its function value disagree on shape.
    #[error("terminal operation '{operation}' requires a {expected} function, got {actual}")]
    FunctionalShapeMismatch {
        operation: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// A stream element could not be viewed as the type a stage declared.
    #[error("stream element is not a {expected}")]
    ElementType { expected: &'static str },
}

/// Result type for fieldflow operations.
pub type Result<T> = std::result::Result<T, FieldflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_parts() {
        let err = FieldflowError::TypeMismatch {
            position: 2,
            expected: "u32",
            actual: "alloc::string::String",
        };
        assert_eq!(
            err.to_string(),
            "type mismatch at stage 2: stage expects u32, pipeline produces alloc::string::String"
        );

        let err = FieldflowError::UnknownTag {
            kind: "inclusion",
            tag: "sideways".to_string(),
        };
        assert_eq!(err.to_string(), "unknown inclusion tag: 'sideways'");
    }

    #[test]
    fn regex_errors_convert() {
        let err: FieldflowError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, FieldflowError::InvalidRegex(_)));
    }
}
