/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use okapi::openapi3::Responses;
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use rocket_okapi::{gen::OpenApiGenerator, response::OpenApiResponderInner, OpenApiError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP Error {source:?}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },
    #[error("SerdeJson Error {source:?}")]
    SerdeJson {
        #[from]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Diesel {
        #[from]
        source: diesel::result::Error,
    },
    #[error("Connection Error {source:?}")]
    Connection {
        #[from]
        source: diesel::ConnectionError,
    },
    #[error("Token Error {source:?}")]
    Token {
        #[from]
        source: jsonwebtoken::errors::Error,
    },
    /// The request was well-formed but broke a rule; `message` names the rule.
    #[error("Validation Error: {message}")]
    Validation { message: String },

    #[error("NotFound Error")]
    NotFound {},

    #[error("Unauthorized Error")]
    Unauthorized {},

    #[error("Bad Request")]
    BadRequest {},

    #[error("Internal Server Error")]
    InternalServerError {},
}

pub type Result<T> = std::result::Result<T, crate::Error>;

pub trait MapRre<T> {
    fn map_rre(self) -> Result<T>;
}

impl<T, E> MapRre<T> for std::result::Result<T, E>
where
    Error: From<E>,
{
    fn map_rre(self) -> Result<T> {
        self.map_err(crate::Error::from)
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct ErrorBody {
    pub(crate) status: u16,
    pub(crate) error: String,
}

impl Error {
    pub fn status(&self) -> Status {
        match self {
            Error::Validation { .. } => Status::UnprocessableEntity,
            Error::Unauthorized {} | Error::Token { .. } => Status::Unauthorized,
            Error::NotFound {} => Status::NotFound,
            Error::Diesel {
                source: diesel::result::Error::NotFound,
            } => Status::NotFound,
            Error::BadRequest {} => Status::BadRequest,
            _ => Status::InternalServerError,
        }
    }

    pub fn validation<T>(message: impl Into<String>) -> std::result::Result<T, Error> {
        std::result::Result::Err(Error::Validation {
            message: message.into(),
        })
    }

    pub fn not_found<T>() -> std::result::Result<T, Error> {
        std::result::Result::Err(Error::NotFound {})
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        let error = match &self {
            Error::Validation { message } => message.clone(),
            Error::NotFound {} | Error::Diesel { .. } if status == Status::NotFound => {
                String::from("not found")
            }
            _ if status == Status::InternalServerError => {
                tracing::error!(error = %self, path = %req.uri(), "request failed");
                String::from("internal server error")
            }
            _ => self.to_string(),
        };
        response::Response::build_from(
            Json(ErrorBody {
                status: status.code,
                error,
            })
            .respond_to(req)?,
        )
        .status(status)
        .ok()
    }
}

impl OpenApiResponderInner for Error {
    fn responses(
        _generator: &mut OpenApiGenerator,
    ) -> std::result::Result<Responses, OpenApiError> {
        Ok(Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_unprocessable() {
        let err = Error::validation::<()>("bad sort key").unwrap_err();
        assert_eq!(err.status(), Status::UnprocessableEntity);
        assert_eq!(err.to_string(), "Validation Error: bad sort key");
    }

    #[test]
    fn test_diesel_not_found_maps_to_404() {
        let err = Error::from(diesel::result::Error::NotFound);
        assert_eq!(err.status(), Status::NotFound);
        assert_eq!(Error::NotFound {}.status(), Status::NotFound);
    }

    #[test]
    fn test_other_errors_are_internal() {
        assert_eq!(
            Error::InternalServerError {}.status(),
            Status::InternalServerError
        );
        assert_eq!(Error::Unauthorized {}.status(), Status::Unauthorized);
    }
}
