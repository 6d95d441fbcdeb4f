//! Typed Spotify Web API payloads.
//!
//! Fields Spotify may omit default instead of failing, so partially populated objects (simplified
//! albums inside tracks, playlist summaries inside search results) decode into the same types.

// crates.io
use serde::Deserializer;
// self
use crate::_prelude::*;

/// Image rendition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
	/// Source URL.
	pub url: String,
	/// Height in pixels, when known.
	pub height: Option<u32>,
	/// Width in pixels, when known.
	pub width: Option<u32>,
}

/// Links to the Spotify web player.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalUrls {
	/// Open-Spotify URL.
	pub spotify: Option<String>,
}

/// Industry identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalIds {
	/// International Standard Recording Code.
	pub isrc: Option<String>,
	/// International Article Number.
	pub ean: Option<String>,
	/// Universal Product Code.
	pub upc: Option<String>,
}

/// Follower count.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Followers {
	/// Always `null` in current API versions.
	pub href: Option<String>,
	/// Total followers.
	pub total: u64,
}

/// Content restriction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Restrictions {
	/// `market`, `product`, or `explicit`.
	pub reason: String,
}

/// Explicit-content settings of a user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplicitContent {
	/// Explicit content is filtered.
	pub filter_enabled: bool,
	/// The filter cannot be changed by the user.
	pub filter_locked: bool,
}

/// Spotify user profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
	/// Spotify user id.
	pub id: String,
	/// Display name.
	pub display_name: Option<String>,
	/// Email, with `user-read-email`.
	pub email: Option<String>,
	/// Web links.
	pub external_urls: ExternalUrls,
	/// Followers.
	pub followers: Option<Followers>,
	/// API link.
	pub href: String,
	/// Profile images.
	pub images: Vec<Image>,
	/// Spotify URI.
	pub uri: String,
	/// ISO 3166-1 alpha-2 country, with `user-read-private`.
	pub country: Option<String>,
	/// Explicit-content settings, with `user-read-private`.
	pub explicit_content: Option<ExplicitContent>,
	/// `premium`, `free`, or `open`.
	pub product: Option<String>,
}

/// Full artist object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Artist {
	/// Spotify artist id.
	pub id: String,
	/// Name.
	pub name: String,
	/// Web links.
	pub external_urls: ExternalUrls,
	/// Followers.
	pub followers: Option<Followers>,
	/// Associated genres.
	pub genres: Vec<String>,
	/// API link.
	pub href: String,
	/// Artist images.
	pub images: Vec<Image>,
	/// Popularity between 0 and 100.
	pub popularity: Option<u32>,
	/// Spotify URI.
	pub uri: String,
}

/// Artist reference embedded in tracks and albums.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifiedArtist {
	/// Spotify artist id.
	#[serde(deserialize_with = "null_as_default")]
	pub id: String,
	/// Name.
	pub name: String,
	/// Web links.
	pub external_urls: ExternalUrls,
	/// API link.
	#[serde(deserialize_with = "null_as_default")]
	pub href: String,
	/// Spotify URI.
	#[serde(deserialize_with = "null_as_default")]
	pub uri: String,
}

/// Copyright statement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Copyright {
	/// Statement text.
	pub text: String,
	/// `C` for copyright, `P` for performance copyright.
	#[serde(rename = "type")]
	pub kind: String,
}

/// Album object; simplified albums leave the full-only fields empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Album {
	/// Spotify album id.
	#[serde(deserialize_with = "null_as_default")]
	pub id: String,
	/// Name.
	pub name: String,
	/// `album`, `single`, or `compilation`.
	pub album_type: String,
	/// Number of tracks.
	pub total_tracks: u32,
	/// Markets the album is available in.
	pub available_markets: Vec<String>,
	/// Web links.
	pub external_urls: ExternalUrls,
	/// API link.
	#[serde(deserialize_with = "null_as_default")]
	pub href: String,
	/// Cover art.
	pub images: Vec<Image>,
	/// Release date at `release_date_precision`.
	#[serde(deserialize_with = "null_as_default")]
	pub release_date: String,
	/// `year`, `month`, or `day`.
	#[serde(deserialize_with = "null_as_default")]
	pub release_date_precision: String,
	/// Content restriction.
	pub restrictions: Option<Restrictions>,
	/// Spotify URI.
	#[serde(deserialize_with = "null_as_default")]
	pub uri: String,
	/// Album artists.
	pub artists: Vec<SimplifiedArtist>,
	/// Relationship to the artist, on artist-album listings.
	pub album_group: Option<String>,
	/// First page of tracks.
	pub tracks: Option<Paging<Track>>,
	/// Copyright statements.
	pub copyrights: Vec<Copyright>,
	/// Industry identifiers.
	pub external_ids: Option<ExternalIds>,
	/// Label.
	pub label: Option<String>,
	/// Popularity between 0 and 100.
	pub popularity: Option<u32>,
}

/// Original track a relinked track points at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackLink {
	/// Web links.
	pub external_urls: ExternalUrls,
	/// API link.
	pub href: String,
	/// Spotify track id.
	pub id: String,
	/// Spotify URI.
	pub uri: String,
}

/// Track object; simplified tracks leave `album`, `popularity`, and `external_ids` empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
	/// Spotify track id; empty for local files.
	#[serde(deserialize_with = "null_as_default")]
	pub id: String,
	/// Name.
	pub name: String,
	/// Album the track belongs to.
	pub album: Option<Album>,
	/// Performing artists.
	pub artists: Vec<SimplifiedArtist>,
	/// Markets the track is available in.
	pub available_markets: Vec<String>,
	/// Disc number.
	pub disc_number: u32,
	/// Duration in milliseconds.
	pub duration_ms: u64,
	/// Explicit lyrics.
	pub explicit: bool,
	/// Industry identifiers.
	pub external_ids: Option<ExternalIds>,
	/// Web links.
	pub external_urls: ExternalUrls,
	/// API link.
	#[serde(deserialize_with = "null_as_default")]
	pub href: String,
	/// Playable in the requested market.
	pub is_playable: Option<bool>,
	/// Original track when relinked.
	pub linked_from: Option<TrackLink>,
	/// Content restriction.
	pub restrictions: Option<Restrictions>,
	/// Popularity between 0 and 100.
	pub popularity: Option<u32>,
	/// 30-second preview.
	pub preview_url: Option<String>,
	/// Position on its disc.
	pub track_number: u32,
	/// Spotify URI.
	#[serde(deserialize_with = "null_as_default")]
	pub uri: String,
	/// Local file.
	pub is_local: bool,
}

/// Podcast episode reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Episode {
	/// Spotify episode id.
	pub id: String,
	/// Name.
	pub name: String,
	/// Spotify URI.
	pub uri: String,
}

/// Track or episode stored in a playlist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlayableItem {
	/// Music track.
	Track(Track),
	/// Podcast episode.
	Episode(Episode),
}

/// Playlist entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistItem {
	/// ISO 8601 timestamp; `null` for very old playlists.
	pub added_at: Option<String>,
	/// User who added the item.
	pub added_by: Option<User>,
	/// Local file.
	pub is_local: bool,
	/// Item; `null` when unavailable.
	pub track: Option<PlayableItem>,
}

/// Playlist object.
///
/// Listings carry only `href` and `total` in `tracks`; full playlists carry the first page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Playlist {
	/// Spotify playlist id.
	pub id: String,
	/// Name.
	pub name: String,
	/// Collaborative playlist.
	pub collaborative: bool,
	/// Description.
	pub description: Option<String>,
	/// Web links.
	pub external_urls: ExternalUrls,
	/// Followers.
	pub followers: Option<Followers>,
	/// API link.
	pub href: String,
	/// Cover images.
	#[serde(deserialize_with = "null_as_default")]
	pub images: Vec<Image>,
	/// Owner.
	pub owner: User,
	/// Public status; `null` when not relevant.
	pub public: Option<bool>,
	/// Version identifier.
	pub snapshot_id: String,
	/// Item page or summary.
	pub tracks: Paging<PlaylistItem>,
	/// Spotify URI.
	pub uri: String,
}

/// Offset-based page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paging<T> {
	/// API link to this page.
	pub href: String,
	/// Page size.
	pub limit: u32,
	/// Next page link.
	pub next: Option<String>,
	/// Offset of the first item.
	pub offset: u32,
	/// Previous page link.
	pub previous: Option<String>,
	/// Total items available.
	pub total: u32,
	/// Items on this page.
	pub items: Vec<T>,
}
impl<T> Paging<T> {
	/// Returns `true` when a further page exists.
	pub fn has_next(&self) -> bool {
		self.next.is_some()
	}
}
impl<T> Default for Paging<T> {
	fn default() -> Self {
		Self {
			href: String::new(),
			limit: 0,
			next: None,
			offset: 0,
			previous: None,
			total: 0,
			items: Vec::new(),
		}
	}
}

/// Search results per requested type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResults {
	/// Matching tracks.
	pub tracks: Option<Paging<Track>>,
	/// Matching artists.
	pub artists: Option<Paging<Artist>>,
	/// Matching albums.
	pub albums: Option<Paging<Album>>,
	/// Matching playlists; unavailable playlists are `None`.
	pub playlists: Option<Paging<Option<Playlist>>>,
}

/// Audio analysis summary of a track.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFeatures {
	/// Spotify track id.
	pub id: String,
	/// Acoustic confidence, 0.0 to 1.0.
	pub acousticness: f64,
	/// Full analysis link.
	pub analysis_url: String,
	/// Danceability, 0.0 to 1.0.
	pub danceability: f64,
	/// Duration in milliseconds.
	pub duration_ms: u64,
	/// Energy, 0.0 to 1.0.
	pub energy: f64,
	/// Instrumental confidence, 0.0 to 1.0.
	pub instrumentalness: f64,
	/// Pitch class; `-1` when undetected.
	pub key: i32,
	/// Live-audience confidence, 0.0 to 1.0.
	pub liveness: f64,
	/// Loudness in dB.
	pub loudness: f64,
	/// `1` major, `0` minor.
	pub mode: i32,
	/// Spoken-word presence, 0.0 to 1.0.
	pub speechiness: f64,
	/// Tempo in BPM.
	pub tempo: f64,
	/// Beats per bar.
	pub time_signature: i32,
	/// Track API link.
	pub track_href: String,
	/// Spotify URI.
	pub uri: String,
	/// Musical positiveness, 0.0 to 1.0.
	pub valence: f64,
}

/// Playback context of a recently played track.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayContext {
	/// `artist`, `playlist`, `album`, or `show`.
	#[serde(rename = "type")]
	pub kind: String,
	/// API link.
	pub href: Option<String>,
	/// Web links.
	pub external_urls: ExternalUrls,
	/// Spotify URI.
	pub uri: String,
}

/// One recently played track.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayHistory {
	/// Track.
	pub track: Track,
	/// ISO 8601 play timestamp.
	pub played_at: String,
	/// Playback context.
	pub context: Option<PlayContext>,
}

/// Cursor pair of a cursor-based page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cursors {
	/// Cursor for newer items.
	pub after: Option<String>,
	/// Cursor for older items.
	pub before: Option<String>,
}

/// Recently played page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentlyPlayed {
	/// Plays, newest first.
	pub items: Vec<PlayHistory>,
	/// Next page link.
	pub next: Option<String>,
	/// Paging cursors.
	pub cursors: Option<Cursors>,
	/// Page size.
	pub limit: u32,
	/// API link.
	pub href: String,
}

/// `{ "artists": [...] }` envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Artists {
	/// Artists in request order.
	pub artists: Vec<Artist>,
}

/// `{ "tracks": [...] }` envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tracks {
	/// Tracks in request order.
	pub tracks: Vec<Track>,
}

/// `{ "audio_features": [...] }` envelope; unknown ids yield `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFeaturesList {
	/// Features in request order.
	pub audio_features: Vec<Option<AudioFeatures>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn local_tracks_with_null_ids_decode() {
		let track: Track = serde_json::from_str(
			r#"{"id":null,"name":"Demo","uri":"spotify:local:::Demo:1","is_local":true,"artists":[{"id":null,"name":"Me"}]}"#,
		)
		.expect("Local track fixture should decode.");

		assert!(track.id.is_empty());
		assert!(track.is_local);
		assert_eq!(track.artists[0].name, "Me");
		assert!(track.album.is_none());
	}

	#[test]
	fn playlist_items_distinguish_tracks_and_episodes() {
		let page: Paging<PlaylistItem> = serde_json::from_str(
			r#"{"total":3,"items":[
				{"track":{"type":"track","id":"t1","name":"Song","popularity":40}},
				{"track":{"type":"episode","id":"e1","name":"Show"}},
				{"track":null}
			]}"#,
		)
		.expect("Playlist page fixture should decode.");

		assert_eq!(page.total, 3);
		assert!(matches!(&page.items[0].track, Some(PlayableItem::Track(t)) if t.popularity == Some(40)));
		assert!(matches!(&page.items[1].track, Some(PlayableItem::Episode(e)) if e.id == "e1"));
		assert!(page.items[2].track.is_none());
		assert!(!page.has_next());
	}

	#[test]
	fn playlist_summaries_reuse_the_paging_shape() {
		let playlist: Playlist = serde_json::from_str(
			r#"{"id":"p","name":"Mix","images":null,"public":null,"tracks":{"href":"h","total":12}}"#,
		)
		.expect("Playlist summary fixture should decode.");

		assert_eq!(playlist.tracks.total, 12);
		assert!(playlist.tracks.items.is_empty());
		assert!(playlist.images.is_empty());
		assert_eq!(playlist.public, None);
	}
}
