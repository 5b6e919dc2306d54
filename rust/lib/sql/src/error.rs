use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),

    /// A row with the same PRIMARY KEY or UNIQUE value already exists.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// Any other constraint: FOREIGN KEY, CHECK, NOT NULL, trigger abort.
    #[error("constraint violation: {0}")]
    Constraint(String),
}
