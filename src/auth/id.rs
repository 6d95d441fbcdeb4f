//! Application user identifier used to key tokens, guards, and cache entries.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const USER_ID_MAX_LEN: usize = 128;
const CACHE_KEY_SEPARATOR: char = ':';

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("User identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("User identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier contains the cache key separator.
	#[error("User identifier cannot contain `{separator}`.")]
	ContainsSeparator {
		/// Reserved separator character.
		separator: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("User identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Opaque application user identifier (not the Spotify account id).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);
impl UserId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Borrows the identifier as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Deref for UserId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for UserId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for UserId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<UserId> for String {
	fn from(value: UserId) -> Self {
		value.0
	}
}
impl TryFrom<String> for UserId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for UserId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "UserId({})", self.0)
	}
}
impl Display for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if view.contains(CACHE_KEY_SEPARATOR) {
		return Err(IdentifierError::ContainsSeparator { separator: CACHE_KEY_SEPARATOR });
	}
	if view.chars().count() > USER_ID_MAX_LEN {
		return Err(IdentifierError::TooLong { max: USER_ID_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn user_ids_validate_input() {
		assert!(UserId::new("clx0abc123").is_ok());
		assert_eq!(UserId::new(""), Err(IdentifierError::Empty));
		assert_eq!(UserId::new("user 1"), Err(IdentifierError::ContainsWhitespace));
		assert_eq!(
			UserId::new("user:1"),
			Err(IdentifierError::ContainsSeparator { separator: ':' })
		);
		assert_eq!(
			UserId::new("u".repeat(USER_ID_MAX_LEN + 1)),
			Err(IdentifierError::TooLong { max: USER_ID_MAX_LEN })
		);
	}

	#[test]
	fn user_ids_deserialize_through_validation() {
		let id: UserId =
			serde_json::from_str("\"user-1\"").expect("Valid identifier should deserialize.");

		assert_eq!(id.as_str(), "user-1");
		assert!(serde_json::from_str::<UserId>("\"\"").is_err());
		assert_eq!(format!("{id:?}"), "UserId(user-1)");
	}
}
