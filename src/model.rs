use serde::Serialize;

/// A model representing a single user.
///
/// Use this when fetching from the database and returning to the client.
/// The `password` field holds the argon2 digest and is never serialized.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct User {
	pub id: i32,
	pub email: String,
	#[serde(skip_serializing)]
	pub password: String,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A model representing a single post.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Post {
	pub id: i32,
	pub title: String,
	pub content: String,
	pub published: bool,
	/// The user that created the post. Only they may update or delete it.
	pub owner_id: i32,
	pub created_at: chrono::DateTime<chrono::Utc>,
}
