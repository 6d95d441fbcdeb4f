//! Builds a Spotify authorize URL with a fresh `state` and checks the value echoed back to the
//! callback.

// std
use std::{collections::HashMap, sync::Arc};
// crates.io
use color_eyre::Result;
// self
use spotifyle_client::{
	api::SpotifyClient,
	config::{ApiOptions, ClientConfig},
	store::{MemoryStore, TokenStore},
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ClientConfig::builder("demo-client", "demo-secret")
		.redirect_uri("http://localhost:3000/api/auth/callback/spotify")
		.scopes(["user-read-email", "user-top-read", "user-read-recently-played"])
		.build()?;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let client = SpotifyClient::new(config, store, ApiOptions::default());
	let request = client.authorization_request();

	println!("Send your user to {}.", &request.url);

	let mut pending: HashMap<String, _> = HashMap::new();

	pending.insert(request.state.clone(), request.clone());

	// Simulate the callback handler receiving `state` back from Spotify.
	let returned_state = request.state.clone();

	if let Some(stashed) = pending.remove(&returned_state) {
		stashed.validate_state(&returned_state)?;
		println!("Validated state; exchange the `code` query parameter next.");
	} else {
		eprintln!("State `{returned_state}` was not recognized.");
	}

	Ok(())
}
