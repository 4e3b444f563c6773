use log::{error, warn};
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{catch, Request};
use serde::Serialize;

use crate::errors::Error;
use crate::modules::store::StoreError;

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// # api error
/// an error with the status it is answered with
#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Status, message: &str) -> ApiError {
        ApiError {
            status,
            message: message.to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = match &error {
            Error::ValidationError { .. } => Status::UnprocessableEntity,
            Error::NotOwnerError { .. } => Status::Forbidden,
            Error::NotFoundError { .. } => Status::NotFound,
            Error::ConfigurationTakenError { .. } => Status::Conflict,
            Error::StorageError { .. } | Error::ExtractionError { .. } => Status::BadGateway,
            Error::ConfigError { .. } => Status::ServiceUnavailable,
        };

        if status.code >= 500 {
            error!(target: "routes/responses:from", "{}", error);
        } else {
            warn!(target: "routes/responses:from", "{}", error);
        }

        ApiError {
            status,
            message: error.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::from(Error::from(error))
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let mut response = Json(ErrorBody { error: self.message }).respond_to(request)?;
        response.set_status(self.status);
        Ok(response)
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[catch(401)]
pub fn unauthorized() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "sign in to do this".to_string(),
    })
}

#[catch(404)]
pub fn not_found(request: &Request) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: format!("nothing at {}", request.uri()),
    })
}

#[catch(422)]
pub fn unprocessable() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "the request body could not be read".to_string(),
    })
}
