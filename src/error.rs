use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use serde::Serialize;

use crate::{route, token::AuthError};

/// Error type for the application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] rejection::JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("auth error: {0}")]
	Auth(#[from] AuthError),
	#[error("login error: {0}")]
	Login(#[from] route::auth::Error),
	#[error("user error: {0}")]
	User(#[from] route::users::Error),
	#[error("post error: {0}")]
	Post(#[from] route::posts::Error),
	#[error("vote error: {0}")]
	Vote(#[from] route::votes::Error),
	#[error("password hashing error: {0}")]
	Password(#[from] argon2::password_hash::Error),
	#[error("token signing error: {0}")]
	Token(#[from] jsonwebtoken::errors::Error),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<String>,
}

fn reply(status: StatusCode, message: String) -> Response<Body> {
	(
		status,
		Json(ErrorResponse {
			errors: vec![message],
			success: false,
		}),
	)
		.into_response()
}

impl IntoResponse for Error {
	fn into_response(self) -> Response<Body> {
		match self {
			Error::Validation(errors) => (
				StatusCode::BAD_REQUEST,
				Json(ErrorResponse {
					errors: errors
						.field_errors()
						.into_iter()
						.map(move |(field, errors)| {
							errors
								.into_iter()
								.map(move |error| format!("{}: {}", field, error))
						})
						.flatten()
						.collect(),
					success: false,
				}),
			)
				.into_response(),
			Error::Json(error) => reply(StatusCode::BAD_REQUEST, error.to_string()),
			Error::Query(error) => reply(StatusCode::BAD_REQUEST, error.to_string()),
			Error::Auth(error) => reply(error.status(), error.to_string()),
			Error::Login(error) => reply(error.status(), error.to_string()),
			Error::User(error) => reply(error.status(), error.to_string()),
			Error::Post(error) => reply(error.status(), error.to_string()),
			Error::Vote(error) => reply(error.status(), error.to_string()),
			_ => {
				tracing::error!(error = %self, "request failed");

				(
					StatusCode::INTERNAL_SERVER_ERROR,
					Json(ErrorResponse {
						errors: Vec::new(),
						success: false,
					}),
				)
					.into_response()
			}
		}
	}
}
