use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SelectionError {
    #[error("Argument mismatch. Either remove or alias field: `{field}`")]
    ArgumentMismatch { field: String },

    #[error("Invalid dependsOn selection set `{selection}`: {message}")]
    InvalidDependsOn { selection: String, message: String },
}
