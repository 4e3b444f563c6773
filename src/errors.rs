use snafu::prelude::*;

use crate::modules::store::StoreError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// malformed input, rejected before anything reaches the store
    #[snafu(display("invalid {field}: {message}"))]
    ValidationError { field: &'static str, message: String },

    #[snafu(display("storage error: {source}"))]
    StorageError { source: StoreError },

    #[snafu(display("lap record {id} not found"))]
    NotFoundError { id: String },

    #[snafu(display("lap record {id} does not belong to {competitor}"))]
    NotOwnerError { id: String, competitor: String },

    /// a direct edit would create a second record for the same configuration
    #[snafu(display("{owner} already has a record on {track_id} with {vehicle_id}"))]
    ConfigurationTakenError {
        owner: String,
        track_id: String,
        vehicle_id: String,
    },

    #[snafu(display("extraction failed: {message}"))]
    ExtractionError { message: String },

    #[snafu(display("missing configuration value {key}"))]
    ConfigError { key: &'static str },
}

impl From<StoreError> for Error {
    fn from(source: StoreError) -> Self {
        Error::StorageError { source }
    }
}

pub type CustomResult<T> = Result<T, Error>;
