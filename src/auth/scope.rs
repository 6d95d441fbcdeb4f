//! Granted-scope modeling for Spotify tokens.

// std
use std::collections::BTreeSet;
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Normalized, deduplicated set of OAuth scopes.
///
/// Spotify reports granted scopes as one space-delimited string; [`ScopeSet::parse`] turns that
/// string into a set so membership checks ignore ordering and duplicates.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeSet(BTreeSet<String>);
impl ScopeSet {
	/// Creates a set from individual scopes, rejecting empty or padded entries.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = BTreeSet::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
			}

			set.insert(owned);
		}

		Ok(Self(set))
	}

	/// Parses a space-delimited scope string as granted by the token endpoint.
	pub fn parse(granted: &str) -> Self {
		Self(granted.split_whitespace().map(str::to_owned).collect())
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.contains(scope)
	}

	/// Returns true if every `required` scope is present.
	pub fn contains_all<I, S>(&self, required: I) -> bool
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		required.into_iter().all(|scope| self.contains(scope.as_ref()))
	}

	/// Iterator over scopes in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Space-delimited, sorted representation.
	pub fn normalized(&self) -> String {
		self.iter().collect::<Vec<_>>().join(" ")
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.0).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if !s.is_empty() && s.chars().all(char::is_whitespace) {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_normalize_and_compare_unordered() {
		let lhs = ScopeSet::new(["user-top-read", "user-read-email", "user-read-email"])
			.expect("Left-hand scope set should be valid.");
		let rhs = ScopeSet::parse("user-read-email user-top-read");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.len(), 2);
		assert_eq!(lhs.normalized(), "user-read-email user-top-read");
	}

	#[test]
	fn contains_all_checks_every_required_scope() {
		let granted = ScopeSet::parse("user-read-email user-top-read playlist-read-private");

		assert!(granted.contains_all(["user-top-read", "user-read-email"]));
		assert!(!granted.contains_all(["user-top-read", "user-library-read"]));
		assert!(granted.contains_all(Vec::<&str>::new()));
	}

	#[test]
	fn padded_or_blank_scopes_are_rejected() {
		let err = ScopeSet::new([" user-top-read "]).expect_err("Padded scopes must be rejected.");

		assert!(matches!(err, ScopeValidationError::ContainsWhitespace { .. }));
		assert!(ScopeSet::new([""]).is_err());
		assert!(ScopeSet::from_str("").is_ok(), "Empty string represents an empty scope set.");
		assert!(ScopeSet::from_str("   ").is_err(), "Whitespace-only input must be rejected.");
	}
}
