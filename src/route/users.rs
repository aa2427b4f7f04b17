use axum::{
	extract::{Path, State},
	http::StatusCode,
	routing::{get, post},
};
use serde::Deserialize;
use validator::Validate;

use crate::{extract::Json, model, password, AppState, Database};

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new()
		.route("/", post(register))
		.route("/:id", get(get_user))
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("email already registered")]
	EmailTaken,
	#[error("user {0} not found")]
	UnknownUser(i32),
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::EmailTaken => StatusCode::CONFLICT,
			Self::UnknownUser(..) => StatusCode::NOT_FOUND,
		}
	}
}

#[derive(Deserialize, Validate)]
pub struct RegisterInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
}

/// Registers a new account. The password digest is never echoed back.
async fn register(
	State(state): State<AppState>,
	Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<model::User>), crate::Error> {
	let digest = password::hash(&state.hasher, &input.password)?;

	let user = sqlx::query_as::<_, model::User>(
		r#"INSERT INTO "user" (email, password) VALUES ($1, $2) RETURNING *"#,
	)
	.bind(&input.email)
	.bind(&digest)
	.fetch_one(&state.database)
	.await
	.map_err(|e| match e {
		sqlx::Error::Database(ref d) if d.constraint() == Some("user_email_key") => {
			Error::EmailTaken.into()
		}
		e => crate::Error::from(e),
	})?;

	Ok((StatusCode::CREATED, Json(user)))
}

/// Returns a single user by its unique id.
async fn get_user(
	State(database): State<Database>,
	Path(user_id): Path<i32>,
) -> Result<Json<model::User>, crate::Error> {
	let user = sqlx::query_as::<_, model::User>(r#"SELECT * FROM "user" WHERE id = $1"#)
		.bind(user_id)
		.fetch_optional(&database)
		.await?;

	Ok(Json(user.ok_or(Error::UnknownUser(user_id))?))
}
