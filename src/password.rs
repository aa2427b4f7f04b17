use argon2::{
	password_hash::{rand_core::OsRng, SaltString},
	Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

/// Hashes a password with argon2id and a freshly generated salt, returning
/// the digest in PHC string format. Hashing the same password twice produces
/// different digests; both verify.
pub fn hash(
	hasher: &Argon2,
	password: &str,
) -> Result<String, argon2::password_hash::Error> {
	let salt = SaltString::generate(&mut OsRng);

	Ok(hasher
		.hash_password(password.as_bytes(), &salt)?
		.to_string())
}

/// Checks a password against a PHC digest. A malformed digest is treated as
/// a failed verification rather than an error.
pub fn verify(hasher: &Argon2, password: &str, digest: &str) -> bool {
	let Ok(parsed) = PasswordHash::new(digest) else {
		return false;
	};

	hasher
		.verify_password(password.as_bytes(), &parsed)
		.is_ok()
}

#[cfg(test)]
mod test {
	use argon2::Argon2;

	#[test]
	fn test_hash_roundtrip() {
		let hasher = Argon2::default();
		let digest = super::hash(&hasher, "hunter2hunter").unwrap();

		assert!(super::verify(&hasher, "hunter2hunter", &digest));
		assert!(!super::verify(&hasher, "hunter2hunter3", &digest));
	}

	#[test]
	fn test_hash_is_salted() {
		let hasher = Argon2::default();
		let first = super::hash(&hasher, "hunter2hunter").unwrap();
		let second = super::hash(&hasher, "hunter2hunter").unwrap();

		assert_ne!(first, second);
		assert!(super::verify(&hasher, "hunter2hunter", &first));
		assert!(super::verify(&hasher, "hunter2hunter", &second));
	}

	#[test]
	fn test_verify_malformed_digest() {
		let hasher = Argon2::default();

		assert!(!super::verify(&hasher, "hunter2hunter", "not a digest"));
		assert!(!super::verify(&hasher, "hunter2hunter", ""));
	}
}
