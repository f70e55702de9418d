use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The content table could not be loaded; nothing is sent.
    #[error(transparent)]
    Content(#[from] roster_content::Error),

    /// The platform rejected or failed the reply. Not retried.
    #[error(transparent)]
    Channel(#[from] roster_channels::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
