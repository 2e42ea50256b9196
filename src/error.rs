use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type JournalResult<T> = std::result::Result<T, JournalError>;

/// Errors surfaced by the journal core.
///
/// Mutations that target a missing id are not errors; they report that
/// nothing was affected instead.
#[derive(Debug, Error)]
pub enum JournalError {
    /// The backing store could not be reached, written or read back.
    #[error("store unavailable: {context}")]
    StoreUnavailable {
        context: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl JournalError {
    pub fn unavailable(context: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            context: context.into(),
            source: None,
        }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Store failures can be retried or worked around with an empty working set.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

/// Attaches store context to backend errors, in the spirit of `anyhow::Context`.
pub trait StoreContext<T> {
    fn store_context(self, context: &str) -> JournalResult<T>;

    fn with_store_context<F>(self, f: F) -> JournalResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> StoreContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn store_context(self, context: &str) -> JournalResult<T> {
        self.map_err(|err| JournalError::StoreUnavailable {
            context: context.to_string(),
            source: Some(Box::new(err)),
        })
    }

    fn with_store_context<F>(self, f: F) -> JournalResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| JournalError::StoreUnavailable {
            context: f(),
            source: Some(Box::new(err)),
        })
    }
}
