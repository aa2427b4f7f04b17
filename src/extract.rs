use axum::{
	body::Body,
	extract::{FromRef, FromRequest, FromRequestParts, Request},
	http::{header, request, Response},
	response::IntoResponse,
};
use serde::de;

use crate::{
	error::Error,
	model,
	token::{AuthError, TokenService},
	Database,
};

/// Extractor that deserializes a JSON body and validates it.
pub struct Json<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: de::DeserializeOwned + validator::Validate,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Json::<T>::from_request(req, state).await?.0;

		result.validate().map_err(Error::Validation)?;
		Ok(Self(result))
	}
}

impl<T> IntoResponse for Json<T>
where
	T: serde::Serialize,
{
	fn into_response(self) -> Response<Body> {
		axum::extract::Json(self.0).into_response()
	}
}

/// Extractor that deserializes a query string and validates it.
pub struct Query<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
	T: de::DeserializeOwned + validator::Validate,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Query::<T>::from_request_parts(parts, state)
			.await?
			.0;

		result.validate().map_err(Error::Validation)?;
		Ok(Self(result))
	}
}

/// Extracts the acting user from the request's bearer token.
///
/// If the `Authorization` header is absent or not a bearer credential, an
/// [`AuthError::Missing`] is returned. A token that fails verification is
/// rejected with the corresponding [`AuthError`], and a token whose user no
/// longer exists is rejected with [`AuthError::UnknownUser`] rather than
/// handing an absent identity to the handler.
#[derive(Debug)]
pub struct CurrentUser(pub model::User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
	Database: FromRef<S>,
	TokenService: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let token = parts
			.headers
			.get(header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix("Bearer "))
			.ok_or(AuthError::Missing)?;

		let user_id = TokenService::from_ref(state).verify(token)?;

		let database = Database::from_ref(state);
		let user = sqlx::query_as::<_, model::User>(r#"SELECT * FROM "user" WHERE id = $1"#)
			.bind(user_id)
			.fetch_optional(&database)
			.await?;

		let Some(user) = user else {
			return Err(AuthError::UnknownUser.into());
		};

		Ok(Self(user))
	}
}
