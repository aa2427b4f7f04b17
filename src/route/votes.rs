use axum::{extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
	extract::{CurrentUser, Json},
	AppState, Database,
};

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new().route("/", post(vote))
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("post {0} not found")]
	UnknownPost(i32),
	#[error("already voted on post {0}")]
	AlreadyVoted(i32),
	#[error("no existing vote on post {0} to remove")]
	NoVote(i32),
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
			Self::AlreadyVoted(..) | Self::NoVote(..) => StatusCode::CONFLICT,
		}
	}
}

#[derive(Deserialize, Validate)]
pub struct VoteInput {
	pub post_id: i32,
	/// 1 casts a vote, 0 retracts one.
	#[validate(range(min = 0, max = 1))]
	pub dir: i16,
}

#[derive(Clone, Copy, Debug)]
enum Direction {
	Retract,
	Cast,
}

impl From<i16> for Direction {
	fn from(dir: i16) -> Self {
		if dir == 1 {
			Self::Cast
		} else {
			Self::Retract
		}
	}
}

#[derive(Clone, Copy, Debug)]
enum Action {
	Insert,
	Delete,
}

/// Translates a directional request into a store mutation, holding the
/// invariant that a user has at most one vote per post. Casting over an
/// existing vote and retracting a missing one are both conflicts, each with
/// its own message.
fn decide(direction: Direction, existing: bool, post_id: i32) -> Result<Action, Error> {
	match (direction, existing) {
		(Direction::Cast, true) => Err(Error::AlreadyVoted(post_id)),
		(Direction::Cast, false) => Ok(Action::Insert),
		(Direction::Retract, true) => Ok(Action::Delete),
		(Direction::Retract, false) => Err(Error::NoVote(post_id)),
	}
}

#[derive(Serialize)]
pub struct VoteResponse {
	pub message: &'static str,
}

async fn vote(
	State(database): State<Database>,
	CurrentUser(user): CurrentUser,
	Json(input): Json<VoteInput>,
) -> Result<(StatusCode, Json<VoteResponse>), crate::Error> {
	let post = sqlx::query_scalar::<_, i32>("SELECT id FROM post WHERE id = $1")
		.bind(input.post_id)
		.fetch_optional(&database)
		.await?;

	if post.is_none() {
		return Err(Error::UnknownPost(input.post_id).into());
	}

	let existing = sqlx::query_scalar::<_, i32>(
		"SELECT 1 FROM vote WHERE post_id = $1 AND user_id = $2",
	)
	.bind(input.post_id)
	.bind(user.id)
	.fetch_optional(&database)
	.await?;

	let message = match decide(input.dir.into(), existing.is_some(), input.post_id)? {
		Action::Insert => {
			sqlx::query("INSERT INTO vote (post_id, user_id) VALUES ($1, $2)")
				.bind(input.post_id)
				.bind(user.id)
				.execute(&database)
				.await
				.map_err(|e| match e {
					// A concurrent insert that won the race is the same
					// conflict as a vote found by the existence check.
					sqlx::Error::Database(ref d) if d.constraint() == Some("vote_pkey") => {
						Error::AlreadyVoted(input.post_id).into()
					}
					e => crate::Error::from(e),
				})?;

			"vote added"
		}
		Action::Delete => {
			sqlx::query("DELETE FROM vote WHERE post_id = $1 AND user_id = $2")
				.bind(input.post_id)
				.bind(user.id)
				.execute(&database)
				.await?;

			"vote removed"
		}
	};

	Ok((StatusCode::CREATED, Json(VoteResponse { message })))
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::{decide, Action, Direction, Error, VoteInput};

	#[test]
	fn test_cast_without_existing_vote() {
		assert!(matches!(
			decide(Direction::Cast, false, 1),
			Ok(Action::Insert)
		));
	}

	#[test]
	fn test_cast_over_existing_vote() {
		assert!(matches!(
			decide(Direction::Cast, true, 1),
			Err(Error::AlreadyVoted(1))
		));
	}

	#[test]
	fn test_retract_existing_vote() {
		assert!(matches!(
			decide(Direction::Retract, true, 1),
			Ok(Action::Delete)
		));
	}

	#[test]
	fn test_retract_without_existing_vote() {
		assert!(matches!(
			decide(Direction::Retract, false, 1),
			Err(Error::NoVote(1))
		));
	}

	#[test]
	fn test_vote_input_bounds() {
		let cast = VoteInput { post_id: 1, dir: 1 };
		let retract = VoteInput { post_id: 1, dir: 0 };
		let high = VoteInput { post_id: 1, dir: 2 };
		let negative = VoteInput {
			post_id: 1,
			dir: -1,
		};

		assert!(cast.validate().is_ok());
		assert!(retract.validate().is_ok());
		assert!(high.validate().is_err());
		assert!(negative.validate().is_err());
	}
}
