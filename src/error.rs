// Error handling for annotation-capable function values

use std::any::TypeId;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised while building or using annotated function values.
///
/// Every variant is a programmer-usage error detected at the call site,
/// at decoration time where possible. Nothing here is retried or
/// recovered from; an empty query result is `Ok`, not an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("cannot make {actual} annotable: expected a function, classmethod, or staticmethod")]
    NotAnnotable { actual: String },

    #[error("invalid annotation type: {type_id:?} is not a registered annotation kind")]
    InvalidAnnotationType { type_id: TypeId },

    #[error("invalid decorator: expected a function, got {actual}")]
    InvalidDecorator { actual: String },

    #[error("{actual} is not callable")]
    NotCallable { actual: String },

    #[error("arity mismatch in '{function}': expected {expected} arguments, got {actual}")]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("'{function}' is a {kind} and must be resolved through its owning class")]
    UnboundMethod {
        function: String,
        kind: &'static str,
    },

    #[error("unknown attribute '{attribute}' on {target}")]
    UnknownAttribute { target: String, attribute: String },

    #[error("type error in {operation}: expected {expected}, got {actual}")]
    TypeError {
        expected: String,
        actual: String,
        operation: String,
    },
}
