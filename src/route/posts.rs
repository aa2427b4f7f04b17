use axum::{
	extract::{Path, State},
	http::StatusCode,
	routing::get,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
	extract::{CurrentUser, Json, Query},
	model, AppState, Database,
};

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new()
		.route("/", get(get_posts).post(create_post))
		.route("/:id", get(get_post).put(update_post).delete(delete_post))
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("post {0} not found")]
	UnknownPost(i32),
	#[error("not authorized to perform this action")]
	NotOwner,
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
			Self::NotOwner => StatusCode::FORBIDDEN,
		}
	}
}

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
fn ten() -> i64 {
	10
}

fn default_published() -> bool {
	true
}

#[derive(Deserialize, Validate)]
pub struct ListInput {
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "ten")]
	pub limit: i64,
	#[validate(range(min = 0))]
	#[serde(default)]
	pub skip: i64,
	/// Case-insensitive title substring filter.
	#[serde(default)]
	pub search: String,
}

#[derive(Deserialize, Validate)]
pub struct PostInput {
	#[validate(length(min = 1, max = 200))]
	pub title: String,
	pub content: String,
	#[serde(default = "default_published")]
	pub published: bool,
}

/// A post together with how many votes it has received.
#[derive(Debug, Serialize)]
pub struct PostWithVotes {
	pub post: model::Post,
	pub votes: i64,
}

#[derive(sqlx::FromRow)]
struct PostVotesRow {
	id: i32,
	title: String,
	content: String,
	published: bool,
	owner_id: i32,
	created_at: chrono::DateTime<chrono::Utc>,
	votes: i64,
}

impl From<PostVotesRow> for PostWithVotes {
	fn from(row: PostVotesRow) -> Self {
		Self {
			post: model::Post {
				id: row.id,
				title: row.title,
				content: row.content,
				published: row.published,
				owner_id: row.owner_id,
				created_at: row.created_at,
			},
			votes: row.votes,
		}
	}
}

async fn fetch(database: &Database, post_id: i32) -> Result<Option<model::Post>, sqlx::Error> {
	sqlx::query_as::<_, model::Post>("SELECT * FROM post WHERE id = $1")
		.bind(post_id)
		.fetch_optional(database)
		.await
}

/// Resolves a fetched post for a mutating request. Existence is decided
/// before ownership: a missing post is a not-found for every caller, and no
/// field of an unconfirmed post is ever inspected.
fn find_owned(
	post: Option<model::Post>,
	post_id: i32,
	user: &model::User,
) -> Result<model::Post, Error> {
	let Some(post) = post else {
		return Err(Error::UnknownPost(post_id));
	};

	if post.owner_id != user.id {
		return Err(Error::NotOwner);
	}

	Ok(post)
}

/// Returns a paginated response of posts and their vote counts, optionally
/// filtered by title.
async fn get_posts(
	State(database): State<Database>,
	_user: CurrentUser,
	Query(query): Query<ListInput>,
) -> Result<Json<Vec<PostWithVotes>>, crate::Error> {
	let posts = sqlx::query_as::<_, PostVotesRow>(
		r#"
			SELECT p.id, p.title, p.content, p.published, p.owner_id, p.created_at,
				COUNT(v.post_id) AS votes
			FROM post p
			LEFT JOIN vote v ON v.post_id = p.id
			WHERE p.title ILIKE '%' || $1 || '%'
			GROUP BY p.id
			ORDER BY p.id
			LIMIT $2 OFFSET $3
		"#,
	)
	.bind(&query.search)
	.bind(query.limit)
	.bind(query.skip)
	.fetch_all(&database)
	.await?;

	Ok(Json(posts.into_iter().map(PostWithVotes::from).collect()))
}

/// Creates a new post owned by the acting user.
async fn create_post(
	State(database): State<Database>,
	CurrentUser(user): CurrentUser,
	Json(input): Json<PostInput>,
) -> Result<(StatusCode, Json<model::Post>), crate::Error> {
	let post = sqlx::query_as::<_, model::Post>(
		"INSERT INTO post (title, content, published, owner_id) VALUES ($1, $2, $3, $4) RETURNING *",
	)
	.bind(&input.title)
	.bind(&input.content)
	.bind(input.published)
	.bind(user.id)
	.fetch_one(&database)
	.await?;

	Ok((StatusCode::CREATED, Json(post)))
}

/// Returns a single post by its unique id.
async fn get_post(
	State(database): State<Database>,
	_user: CurrentUser,
	Path(post_id): Path<i32>,
) -> Result<Json<model::Post>, crate::Error> {
	let post = fetch(&database, post_id).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(post_id))?))
}

/// Replaces an existing post. Only its owner may do so.
async fn update_post(
	State(database): State<Database>,
	CurrentUser(user): CurrentUser,
	Path(post_id): Path<i32>,
	Json(input): Json<PostInput>,
) -> Result<Json<model::Post>, crate::Error> {
	let post = fetch(&database, post_id).await?;

	find_owned(post, post_id, &user)?;

	let post = sqlx::query_as::<_, model::Post>(
		"UPDATE post SET title = $1, content = $2, published = $3 WHERE id = $4 RETURNING *",
	)
	.bind(&input.title)
	.bind(&input.content)
	.bind(input.published)
	.bind(post_id)
	.fetch_one(&database)
	.await?;

	Ok(Json(post))
}

/// Deletes an existing post. Only its owner may do so.
async fn delete_post(
	State(database): State<Database>,
	CurrentUser(user): CurrentUser,
	Path(post_id): Path<i32>,
) -> Result<StatusCode, crate::Error> {
	let post = fetch(&database, post_id).await?;

	find_owned(post, post_id, &user)?;

	sqlx::query("DELETE FROM post WHERE id = $1")
		.bind(post_id)
		.execute(&database)
		.await?;

	Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::{find_owned, Error, ListInput};
	use crate::model;

	fn post(id: i32, owner_id: i32) -> model::Post {
		model::Post {
			id,
			title: "t".into(),
			content: "c".into(),
			published: true,
			owner_id,
			created_at: chrono::Utc::now(),
		}
	}

	fn user(id: i32) -> model::User {
		model::User {
			id,
			email: "a@x.com".into(),
			password: String::new(),
			created_at: chrono::Utc::now(),
		}
	}

	#[test]
	fn test_find_owned_missing_post() {
		// A missing post is not-found for everyone, owner or not.
		assert!(matches!(
			find_owned(None, 3, &user(1)),
			Err(Error::UnknownPost(3))
		));
	}

	#[test]
	fn test_find_owned_not_owner() {
		assert!(matches!(
			find_owned(Some(post(3, 2)), 3, &user(1)),
			Err(Error::NotOwner)
		));
	}

	#[test]
	fn test_find_owned_owner() {
		let post = find_owned(Some(post(3, 1)), 3, &user(1)).unwrap();

		assert_eq!(post.id, 3);
	}

	#[test]
	fn test_list_input_defaults() {
		let input: ListInput = serde_json::from_str("{}").unwrap();

		assert_eq!(input.limit, 10);
		assert_eq!(input.skip, 0);
		assert_eq!(input.search, "");
		assert!(input.validate().is_ok());
	}

	#[test]
	fn test_list_input_bounds() {
		let zero = ListInput {
			limit: 0,
			skip: 0,
			search: String::new(),
		};
		let large = ListInput {
			limit: 101,
			skip: 0,
			search: String::new(),
		};
		let negative = ListInput {
			limit: 10,
			skip: -1,
			search: String::new(),
		};

		assert!(zero.validate().is_err());
		assert!(large.validate().is_err());
		assert!(negative.validate().is_err());
	}
}
