use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// the requested key has no entry in the store. This is the only
    /// miss condition; everything else coming out of a backend is a
    /// hard failure.
    #[error("key not found")]
    KeyNotFound,

    #[error("storage backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend(Box::new(error))
    }
}
