//! Condensed user listening data for game generation.

// std
use std::collections::BTreeSet;
// self
use crate::{
	_prelude::*,
	api::{ApiParams, Artist, Image, MAX_LIMIT, Paging, SpotifyClient, TimeRange, Track},
	auth::UserId,
};

/// Top items inspected by [`UserDataService::validate_user_data_for_games`].
pub const VALIDATION_SAMPLE: u32 = 10;
/// Minimum top artists and top tracks a user needs for games.
pub const MIN_TOP_ITEMS: usize = 5;
/// Genre count below which more diverse listening is recommended.
pub const MIN_GENRES: usize = 3;

const ARTIST_DETAIL_TRACKS: usize = 10;

/// Condensed profile of the current user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
	/// Spotify user id.
	pub id: String,
	/// Display name.
	pub display_name: Option<String>,
	/// Email.
	pub email: Option<String>,
	/// Country.
	pub country: Option<String>,
	/// Subscription level.
	pub product: Option<String>,
	/// Profile images.
	pub images: Vec<Image>,
	/// Follower count.
	pub followers: u64,
}

/// One page of top items with the window it covers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItems<T> {
	/// Items, highest affinity first.
	pub items: Vec<T>,
	/// Total items available.
	pub total: u32,
	/// Window the ranking covers.
	pub time_range: TimeRange,
	/// Page size.
	pub limit: u32,
	/// Offset of the first item.
	pub offset: u32,
}
impl<T> TopItems<T> {
	fn from_page(page: Paging<T>, time_range: TimeRange) -> Self {
		Self { items: page.items, total: page.total, time_range, limit: page.limit, offset: page.offset }
	}
}

/// Artist name reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
	/// Spotify artist id.
	pub id: String,
	/// Name.
	pub name: String,
}

/// Album reference with artwork.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
	/// Spotify album id.
	pub id: String,
	/// Name.
	pub name: String,
	/// Cover art.
	pub images: Vec<Image>,
}
impl AlbumSummary {
	fn of(track: &Track) -> Self {
		track
			.album
			.as_ref()
			.map(|album| Self {
				id: album.id.clone(),
				name: album.name.clone(),
				images: album.images.clone(),
			})
			.unwrap_or_default()
	}
}

/// Playable track summary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
	/// Spotify track id.
	pub id: String,
	/// Name.
	pub name: String,
	/// Performing artists.
	pub artists: Vec<ArtistRef>,
	/// Album.
	pub album: AlbumSummary,
	/// 30-second preview.
	pub preview_url: Option<String>,
	/// Duration in milliseconds.
	pub duration_ms: u64,
}
impl From<Track> for TrackSummary {
	fn from(track: Track) -> Self {
		let album = AlbumSummary::of(&track);
		let artists = track
			.artists
			.into_iter()
			.map(|artist| ArtistRef { id: artist.id, name: artist.name })
			.collect();

		Self {
			id: track.id,
			name: track.name,
			artists,
			album,
			preview_url: track.preview_url,
			duration_ms: track.duration_ms,
		}
	}
}

/// One play.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTrack {
	/// Track played.
	pub track: TrackSummary,
	/// ISO 8601 play timestamp.
	pub played_at: String,
}

/// Recently played tracks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTracks {
	/// Plays, newest first.
	pub tracks: Vec<RecentTrack>,
	/// Older plays are available.
	pub has_more: bool,
	/// Cursor for newer plays.
	pub after: Option<String>,
	/// Cursor for older plays.
	pub before: Option<String>,
}

/// Artist top track summary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTrackSummary {
	/// Spotify track id.
	pub id: String,
	/// Name.
	pub name: String,
	/// Popularity between 0 and 100.
	pub popularity: u32,
	/// 30-second preview.
	pub preview_url: Option<String>,
	/// Album.
	pub album: AlbumSummary,
}

/// Artist with its most popular tracks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistDetails {
	/// Spotify artist id.
	pub id: String,
	/// Name.
	pub name: String,
	/// Genres.
	pub genres: Vec<String>,
	/// Popularity between 0 and 100.
	pub popularity: u32,
	/// Follower count.
	pub followers: u64,
	/// Artist images.
	pub images: Vec<Image>,
	/// Up to ten top tracks.
	pub top_tracks: Vec<TopTrackSummary>,
}

/// Whether a user's listening history can feed a game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDataValidation {
	/// No blocking issues were found.
	pub is_valid: bool,
	/// Blocking issues.
	pub issues: Vec<String>,
	/// Non-blocking suggestions.
	pub recommendations: Vec<String>,
}
impl GameDataValidation {
	/// Assesses a sample of top artists and tracks.
	pub fn assess(artists: &[Artist], tracks: &[Track]) -> Self {
		let mut issues = Vec::new();
		let mut recommendations = Vec::new();

		if artists.len() < MIN_TOP_ITEMS {
			issues.push("Insufficient artist data".to_owned());
			recommendations
				.push("Listen to more music to build up your artist preferences".to_owned());
		}
		if tracks.len() < MIN_TOP_ITEMS {
			issues.push("Insufficient track data".to_owned());
			recommendations.push("Listen to more songs to build up your music library".to_owned());
		}

		let genres: BTreeSet<&str> =
			artists.iter().flat_map(|artist| artist.genres.iter().map(String::as_str)).collect();

		if genres.len() < MIN_GENRES {
			recommendations.push("Try listening to different genres for more diverse games".to_owned());
		}

		Self { is_valid: issues.is_empty(), issues, recommendations }
	}

	fn unavailable() -> Self {
		Self {
			is_valid: false,
			issues: vec!["Unable to access Spotify data".to_owned()],
			recommendations: vec![
				"Please ensure your Spotify account is properly connected".to_owned(),
			],
		}
	}
}

/// Reads and condenses a user's Spotify data.
#[derive(Clone, Debug)]
pub struct UserDataService {
	client: SpotifyClient,
}
impl UserDataService {
	/// Wraps `client`.
	pub fn new(client: SpotifyClient) -> Self {
		Self { client }
	}

	/// Underlying client.
	pub fn client(&self) -> &SpotifyClient {
		&self.client
	}

	/// Profile of `user`.
	pub async fn user_profile(&self, user: &UserId) -> Result<UserProfile> {
		let profile = self.client.get_current_user(user).await?;

		Ok(UserProfile {
			id: profile.id,
			display_name: profile.display_name,
			email: profile.email,
			country: profile.country,
			product: profile.product,
			images: profile.images,
			followers: profile.followers.map(|f| f.total).unwrap_or_default(),
		})
	}

	/// Top artists over `time_range`; `limit` is clamped to 50.
	pub async fn top_artists(
		&self,
		user: &UserId,
		time_range: TimeRange,
		limit: u32,
	) -> Result<TopItems<Artist>> {
		let params = ApiParams::default().time_range(time_range).limit(limit.min(MAX_LIMIT));
		let page = self.client.get_top_artists(user, &params).await?;

		Ok(TopItems::from_page(page, time_range))
	}

	/// Top tracks over `time_range`; `limit` is clamped to 50.
	pub async fn top_tracks(
		&self,
		user: &UserId,
		time_range: TimeRange,
		limit: u32,
	) -> Result<TopItems<Track>> {
		let params = ApiParams::default().time_range(time_range).limit(limit.min(MAX_LIMIT));
		let page = self.client.get_top_tracks(user, &params).await?;

		Ok(TopItems::from_page(page, time_range))
	}

	/// Recently played tracks; `limit` is clamped to 50.
	pub async fn recent_tracks(&self, user: &UserId, limit: u32) -> Result<RecentTracks> {
		let params = ApiParams::default().limit(limit.min(MAX_LIMIT));
		let page = self.client.get_recently_played(user, &params).await?;
		let cursors = page.cursors.unwrap_or_default();

		Ok(RecentTracks {
			tracks: page
				.items
				.into_iter()
				.map(|play| RecentTrack { track: play.track.into(), played_at: play.played_at })
				.collect(),
			has_more: page.next.is_some(),
			after: cursors.after,
			before: cursors.before,
		})
	}

	/// Artist metadata and its first ten top tracks, fetched concurrently.
	pub async fn artist_details(&self, user: &UserId, artist_id: &str) -> Result<ArtistDetails> {
		let (artist, top_tracks) = tokio::join!(
			self.client.get_artist(user, artist_id),
			self.client.get_artist_top_tracks(user, artist_id, None),
		);
		let artist = artist?;
		let top_tracks = top_tracks?
			.tracks
			.into_iter()
			.take(ARTIST_DETAIL_TRACKS)
			.map(|track| TopTrackSummary {
				album: AlbumSummary::of(&track),
				id: track.id,
				name: track.name,
				popularity: track.popularity.unwrap_or_default(),
				preview_url: track.preview_url,
			})
			.collect();

		Ok(ArtistDetails {
			id: artist.id,
			name: artist.name,
			genres: artist.genres,
			popularity: artist.popularity.unwrap_or_default(),
			followers: artist.followers.map(|f| f.total).unwrap_or_default(),
			images: artist.images,
			top_tracks,
		})
	}

	/// Checks whether `user` has enough listening history for games.
	///
	/// Upstream failures never propagate; they yield an invalid result with a generic issue.
	pub async fn validate_user_data_for_games(&self, user: &UserId) -> GameDataValidation {
		let (artists, tracks) = tokio::join!(
			self.top_artists(user, TimeRange::MediumTerm, VALIDATION_SAMPLE),
			self.top_tracks(user, TimeRange::MediumTerm, VALIDATION_SAMPLE),
		);

		match (artists, tracks) {
			(Ok(artists), Ok(tracks)) => GameDataValidation::assess(&artists.items, &tracks.items),
			(Err(e), _) | (_, Err(e)) => {
				tracing::debug!(user = %user, error = %e, "Could not read top items for validation.");

				GameDataValidation::unavailable()
			},
		}
	}
}
