//! Error types for directive compilation and argument preprocessing.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by user resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors while loading schema text.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        3
    }
}

/// Build-time errors. Any of these aborts schema construction.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid schema: {source}")]
    Parse {
        #[source]
        source: async_graphql_parser::Error,
    },

    #[error("invalid argument `{argument}` for @{annotation} at {path}: expected {expected}")]
    InvalidAnnotationArgument {
        annotation: String,
        argument: String,
        expected: &'static str,
        path: String,
    },

    #[error("unknown annotation @{annotation} at {path}")]
    UnknownAnnotation { annotation: String, path: String },

    #[error("input {record} declares field `{field}` more than once")]
    DuplicateField { record: String, field: String },

    #[error("input {record} uses unregistered class `{class}`")]
    UnregisteredClass { record: String, class: String },

    #[error("resolver {type_name}.{field} is unhandled")]
    MissingResolver { type_name: String, field: String },
}

impl CompileError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Load(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Request-time errors raised by transformers and class constructors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// A transformer rejected the value.
    #[error("{message}")]
    Invalid { message: String },

    #[error("@{annotation} requires argument `{argument}`")]
    MissingArgument {
        annotation: String,
        argument: String,
    },

    #[error("expected {expected} for {target}, got {actual}")]
    UnexpectedType {
        target: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("cannot construct {class}: {message}")]
    Construct { class: String, message: String },
}

impl TransformError {
    pub fn invalid(message: impl Into<String>) -> Self {
        TransformError::Invalid {
            message: message.into(),
        }
    }

    pub fn missing_argument(annotation: &str, argument: &str) -> Self {
        TransformError::MissingArgument {
            annotation: annotation.to_string(),
            argument: argument.to_string(),
        }
    }
}

/// Errors while running a wrapped resolver.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// An incoming argument had no preprocessor. Preprocessors are built for
    /// every declared argument, so this means the executor and the compiled
    /// schema disagree.
    #[error("missing argument handler for {type_name}.{field}({argument})")]
    UnhandledArgument {
        type_name: String,
        field: String,
        argument: String,
    },

    #[error("no resolver bound for {type_name}.{field}")]
    UnknownField { type_name: String, field: String },

    #[error(transparent)]
    Resolver(BoxError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_exit_codes() {
        let err = CompileError::Load(LoadError::FileNotFound {
            path: PathBuf::from("schema.graphql"),
        });
        assert_eq!(err.exit_code(), 3);

        let err = CompileError::MissingResolver {
            type_name: "Mutation".into(),
            field: "test".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn invalid_displays_bare_message() {
        let err = TransformError::invalid("value is less than 3");
        assert_eq!(err.to_string(), "value is less than 3");
    }

    #[test]
    fn execution_error_is_transparent() {
        let err = ExecutionError::from(TransformError::invalid("nope"));
        assert_eq!(err.to_string(), "nope");
    }
}
