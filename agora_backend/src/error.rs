use thiserror::Error;

/// Domain failures raised by the services. They travel inside
/// `anyhow::Error` and the HTTP layer downcasts them to pick a status code.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{actor} may not modify {resource}")]
    Unauthorized { actor: String, resource: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }

    pub fn unauthorized(actor: impl Into<String>, resource: impl Into<String>) -> Self {
        ServiceError::Unauthorized {
            actor: actor.into(),
            resource: resource.into(),
        }
    }
}
