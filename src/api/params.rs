//! Caller-supplied query parameters for Web API reads.

// self
use crate::{_prelude::*, http::QueryParams};

/// Default page size of list endpoints.
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest page size Spotify accepts.
pub const MAX_LIMIT: u32 = 50;

/// Affinity window for top items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
	/// About four weeks.
	ShortTerm,
	/// About six months.
	#[default]
	MediumTerm,
	/// About one year.
	LongTerm,
}
impl TimeRange {
	/// Wire form.
	pub const fn as_str(self) -> &'static str {
		match self {
			TimeRange::ShortTerm => "short_term",
			TimeRange::MediumTerm => "medium_term",
			TimeRange::LongTerm => "long_term",
		}
	}
}
impl Display for TimeRange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for TimeRange {
	type Err = UnknownTimeRange;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"short_term" => Ok(TimeRange::ShortTerm),
			"medium_term" => Ok(TimeRange::MediumTerm),
			"long_term" => Ok(TimeRange::LongTerm),
			other => Err(UnknownTimeRange(other.to_owned())),
		}
	}
}

/// Unrecognized time range string.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown time range `{0}`; expected short_term, medium_term, or long_term.")]
pub struct UnknownTimeRange(pub String);

/// Optional paging and filtering parameters shared by list endpoints.
///
/// Unset fields are omitted from the query; endpoint defaults apply underneath.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiParams {
	/// Page size.
	pub limit: Option<u32>,
	/// Index of the first item.
	pub offset: Option<u32>,
	/// ISO 3166-1 alpha-2 market.
	pub market: Option<String>,
	/// Affinity window for top items.
	pub time_range: Option<TimeRange>,
	/// Unix-millisecond cursor for newer plays.
	pub after: Option<String>,
	/// Unix-millisecond cursor for older plays.
	pub before: Option<String>,
	/// Album groups for artist albums, e.g. `album,single`.
	pub include_groups: Option<String>,
	/// Field filter for playlist reads.
	pub fields: Option<String>,
}
impl ApiParams {
	/// Sets the page size.
	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = Some(limit);

		self
	}

	/// Sets the offset.
	pub fn offset(mut self, offset: u32) -> Self {
		self.offset = Some(offset);

		self
	}

	/// Sets the market.
	pub fn market(mut self, market: impl Into<String>) -> Self {
		self.market = Some(market.into());

		self
	}

	/// Sets the time range.
	pub fn time_range(mut self, range: TimeRange) -> Self {
		self.time_range = Some(range);

		self
	}

	/// Sets the `after` cursor.
	pub fn after(mut self, cursor: impl Into<String>) -> Self {
		self.after = Some(cursor.into());

		self
	}

	/// Sets the `before` cursor.
	pub fn before(mut self, cursor: impl Into<String>) -> Self {
		self.before = Some(cursor.into());

		self
	}

	/// Sets the album groups.
	pub fn include_groups(mut self, groups: impl Into<String>) -> Self {
		self.include_groups = Some(groups.into());

		self
	}

	/// Sets the field filter.
	pub fn fields(mut self, fields: impl Into<String>) -> Self {
		self.fields = Some(fields.into());

		self
	}

	/// Query parameters for the fields that are set.
	pub fn to_query(&self) -> QueryParams {
		let mut query = QueryParams::new();

		query.set_opt("limit", self.limit);
		query.set_opt("offset", self.offset);
		query.set_opt("market", self.market.clone());
		query.set_opt("time_range", self.time_range.map(TimeRange::as_str));
		query.set_opt("after", self.after.clone());
		query.set_opt("before", self.before.clone());
		query.set_opt("include_groups", self.include_groups.clone());
		query.set_opt("fields", self.fields.clone());

		query
	}
}

/// Catalog object kinds a search may return.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
	/// Albums.
	Album,
	/// Artists.
	Artist,
	/// Playlists.
	Playlist,
	/// Tracks.
	Track,
}
impl SearchType {
	/// Wire form.
	pub const fn as_str(self) -> &'static str {
		match self {
			SearchType::Album => "album",
			SearchType::Artist => "artist",
			SearchType::Playlist => "playlist",
			SearchType::Track => "track",
		}
	}
}

/// Catalog search request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchParams {
	/// Query string, e.g. `genre:indie year:2020`.
	pub query: String,
	/// Kinds to search for, sent comma-joined.
	pub types: Vec<SearchType>,
	/// `audio` to include externally hosted audio.
	pub include_external: Option<String>,
	/// Paging and market.
	pub paging: ApiParams,
}
impl SearchParams {
	/// Search for `query` across `types`.
	pub fn new(query: impl Into<String>, types: impl IntoIterator<Item = SearchType>) -> Self {
		Self {
			query: query.into(),
			types: types.into_iter().collect(),
			include_external: None,
			paging: ApiParams::default(),
		}
	}

	/// Replaces the paging parameters.
	pub fn with_paging(mut self, paging: ApiParams) -> Self {
		self.paging = paging;

		self
	}

	/// Includes externally hosted audio.
	pub fn include_external_audio(mut self) -> Self {
		self.include_external = Some("audio".into());

		self
	}

	/// Query parameters in wire form.
	pub fn to_query(&self) -> QueryParams {
		let types: Vec<String> = self.types.iter().map(|kind| kind.as_str().to_owned()).collect();
		let mut query = QueryParams::new().with("q", self.query.as_str()).with("type", types);

		query.set_opt("include_external", self.include_external.clone());

		query.merge(self.paging.to_query())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::http::QueryValue;

	#[test]
	fn unset_fields_are_omitted() {
		let query = ApiParams::default().limit(5).time_range(TimeRange::LongTerm).to_query();

		assert_eq!(query.len(), 2);
		assert_eq!(query.canonical(), "limit=5&time_range=long_term");
	}

	#[test]
	fn search_types_render_comma_joined() {
		let query = SearchParams::new("daft punk", [SearchType::Artist, SearchType::Track])
			.with_paging(ApiParams::default().limit(3))
			.to_query();

		assert_eq!(query.get("type").map(QueryValue::render).as_deref(), Some("artist,track"));
		assert_eq!(query.get("q"), Some(&QueryValue::from("daft punk")));
		assert_eq!(query.get("limit"), Some(&QueryValue::Integer(3)));
	}

	#[test]
	fn time_ranges_parse_wire_form() {
		assert_eq!("short_term".parse::<TimeRange>(), Ok(TimeRange::ShortTerm));
		assert_eq!(TimeRange::default().to_string(), "medium_term");
		assert!("forever".parse::<TimeRange>().is_err());
	}
}
