use axum::{extract::State, http::StatusCode, routing::post, Form};
use serde::{Deserialize, Serialize};

use crate::{extract::Json, model, password, AppState};

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new().route("/login", post(login))
}

/// An error that can occur during login.
///
/// Note that the message is presented to the client, so it should not
/// reveal which part of the credential check failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid credentials")]
	InvalidCredentials,
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::InvalidCredentials => StatusCode::FORBIDDEN,
		}
	}
}

/// The form's `username` field carries the email address.
#[derive(Deserialize)]
pub struct LoginInput {
	pub username: String,
	pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
	pub access_token: String,
	pub token_type: String,
}

/// Returns a bearer token, assuming the credentials are valid.
async fn login(
	State(state): State<AppState>,
	Form(credentials): Form<LoginInput>,
) -> Result<Json<TokenResponse>, crate::Error> {
	let user = sqlx::query_as::<_, model::User>(r#"SELECT * FROM "user" WHERE email = $1"#)
		.bind(&credentials.username)
		.fetch_optional(&state.database)
		.await?;

	// A lookup miss and a password mismatch are answered identically so the
	// response does not reveal whether the email is registered.
	let Some(user) = user else {
		return Err(Error::InvalidCredentials.into());
	};

	if !password::verify(&state.hasher, &credentials.password, &user.password) {
		return Err(Error::InvalidCredentials.into());
	}

	let access_token = state.tokens.issue(user.id)?;

	Ok(Json(TokenResponse {
		access_token,
		token_type: "bearer".into(),
	}))
}
