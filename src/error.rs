use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Callback already registered for {0}")]
    DuplicateCallback(String),

    #[error("Callback manager is unavailable")]
    ManagerUnavailable,

    #[error("Callbacks have already been bound to the app")]
    AlreadyBound,

    #[error("Malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Component {id} has no property '{property}'")]
    UnknownProperty { id: String, property: String },

    #[error("Invalid value for '{property}': {reason}")]
    InvalidValue { property: String, reason: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Errors that mean the callback graph is inconsistent; the app must not start.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::DuplicateCallback(_) | Error::ManagerUnavailable | Error::AlreadyBound
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(Error::DuplicateCallback("x.active_cell".into()).is_configuration());
        assert!(Error::ManagerUnavailable.is_configuration());
        assert!(Error::AlreadyBound.is_configuration());
        assert!(!Error::MalformedDataset("empty".into()).is_configuration());
        assert!(!Error::ComponentNotFound("x".into()).is_configuration());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::UnknownProperty {
            id: "tables-container".into(),
            property: "value".into(),
        };
        assert_eq!(
            err.to_string(),
            "Component tables-container has no property 'value'"
        );
    }
}
