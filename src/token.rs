use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// An error that can occur while authenticating a request.
///
/// The variants are distinct so callers can tell an expired token from a
/// forged one, even though most of them render the same way to the client.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("authentication required")]
	Missing,
	#[error("could not validate credentials")]
	Invalid,
	#[error("token expired, please log in again")]
	Expired,
	#[error("could not validate credentials")]
	UnknownUser,
}

impl AuthError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Missing | Self::Invalid | Self::Expired | Self::UnknownUser => {
				StatusCode::UNAUTHORIZED
			}
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
	#[serde(skip_serializing_if = "Option::is_none")]
	user_id: Option<i32>,
	exp: i64,
}

/// Issues and verifies signed, time-limited bearer tokens.
///
/// A token is self-contained: its validity is computable from the signature
/// and expiry alone, so nothing is persisted and there is no revocation
/// short of rotating the secret key.
#[derive(Clone)]
pub struct TokenService {
	encoding: EncodingKey,
	decoding: DecodingKey,
	header: Header,
	validation: Validation,
	ttl: Duration,
}

impl TokenService {
	pub fn new(secret: &str, algorithm: jsonwebtoken::Algorithm, ttl_minutes: i64) -> Self {
		let mut validation = Validation::new(algorithm);

		// Expiry is checked in `verify_at` against the caller's clock.
		validation.validate_exp = false;
		validation.leeway = 0;

		Self {
			encoding: EncodingKey::from_secret(secret.as_bytes()),
			decoding: DecodingKey::from_secret(secret.as_bytes()),
			header: Header::new(algorithm),
			validation,
			ttl: Duration::minutes(ttl_minutes),
		}
	}

	pub fn issue(&self, user_id: i32) -> Result<String, jsonwebtoken::errors::Error> {
		self.issue_at(user_id, Utc::now())
	}

	/// Issues a token expiring one TTL after the given instant.
	pub fn issue_at(
		&self,
		user_id: i32,
		now: DateTime<Utc>,
	) -> Result<String, jsonwebtoken::errors::Error> {
		let claims = Claims {
			user_id: Some(user_id),
			exp: (now + self.ttl).timestamp(),
		};

		jsonwebtoken::encode(&self.header, &claims, &self.encoding)
	}

	pub fn verify(&self, token: &str) -> Result<i32, AuthError> {
		self.verify_at(token, Utc::now())
	}

	/// Verifies a token against the given instant, returning the user id it
	/// was issued for.
	pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<i32, AuthError> {
		let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
			.map_err(|_| AuthError::Invalid)?;

		if now.timestamp() >= data.claims.exp {
			return Err(AuthError::Expired);
		}

		data.claims.user_id.ok_or(AuthError::Invalid)
	}
}

#[cfg(test)]
mod test {
	use chrono::{Duration, Utc};
	use jsonwebtoken::Algorithm;

	use super::{AuthError, Claims, TokenService};

	fn service(secret: &str) -> TokenService {
		TokenService::new(secret, Algorithm::HS256, 30)
	}

	#[test]
	fn test_issue_verify_roundtrip() {
		let tokens = service("test-secret");
		let token = tokens.issue(7).unwrap();

		assert_eq!(tokens.verify(&token).unwrap(), 7);
	}

	#[test]
	fn test_expiry_boundary() {
		let tokens = service("test-secret");
		let now = Utc::now();
		let token = tokens.issue_at(7, now).unwrap();

		assert_eq!(
			tokens
				.verify_at(&token, now + Duration::minutes(29))
				.unwrap(),
			7
		);
		assert!(matches!(
			tokens.verify_at(&token, now + Duration::minutes(30)),
			Err(AuthError::Expired)
		));
		assert!(matches!(
			tokens.verify_at(&token, now + Duration::minutes(31)),
			Err(AuthError::Expired)
		));
	}

	#[test]
	fn test_tampered_payload() {
		let tokens = service("test-secret");
		let token = tokens.issue(7).unwrap();

		let parts: Vec<&str> = token.split('.').collect();
		let payload = if parts[1].starts_with('A') {
			format!("B{}", &parts[1][1..])
		} else {
			format!("A{}", &parts[1][1..])
		};
		let tampered = format!("{}.{}.{}", parts[0], payload, parts[2]);

		assert!(matches!(
			tokens.verify(&tampered),
			Err(AuthError::Invalid)
		));
	}

	#[test]
	fn test_foreign_secret() {
		let token = service("test-secret").issue(7).unwrap();

		assert!(matches!(
			service("other-secret").verify(&token),
			Err(AuthError::Invalid)
		));
	}

	#[test]
	fn test_garbage_token() {
		let tokens = service("test-secret");

		assert!(matches!(tokens.verify(""), Err(AuthError::Invalid)));
		assert!(matches!(
			tokens.verify("not.a.token"),
			Err(AuthError::Invalid)
		));
	}

	#[test]
	fn test_missing_user_id_claim() {
		let tokens = service("test-secret");
		let claims = Claims {
			user_id: None,
			exp: (Utc::now() + Duration::minutes(30)).timestamp(),
		};
		let token = jsonwebtoken::encode(
			&jsonwebtoken::Header::new(Algorithm::HS256),
			&claims,
			&jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
		)
		.unwrap();

		assert!(matches!(tokens.verify(&token), Err(AuthError::Invalid)));
	}
}
