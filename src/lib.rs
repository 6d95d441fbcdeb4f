//! Authenticated Spotify Web API client for Spotifyle: OAuth token lifecycle with single-flight
//! refresh, a retrying rate-limit-aware transport, and a TTL response cache keyed per user.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

#[cfg(test)] use spotifyle_client as _;

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod services;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// self
	use crate::{
		api::SpotifyClient,
		auth::{SpotifyTokens, UserId},
		config::{ApiOptions, ClientConfig, RetryPolicy, SpotifyEndpoints},
		error::TransportError,
		flows::TokenManager,
		http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportFuture},
		store::{MemoryStore, TokenStore},
	};

	/// Client identifier used by test configurations.
	pub const TEST_CLIENT_ID: &str = "test-client-id";
	/// Client secret used by test configurations.
	pub const TEST_CLIENT_SECRET: &str = "test-client-secret";
	/// Redirect URI used by test configurations.
	pub const TEST_REDIRECT_URI: &str = "http://localhost:3000/api/auth/callback/spotify";

	/// Builds a configuration whose accounts and resource endpoints live under `server_base`.
	pub fn mock_config(server_base: &str) -> ClientConfig {
		let accounts = Url::parse(server_base).expect("Mock server base URL should parse.");

		ClientConfig::builder(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
			.redirect_uri(TEST_REDIRECT_URI)
			.scopes(["user-read-email", "user-top-read"])
			.base_url(format!("{}/v1", server_base.trim_end_matches('/')))
			.endpoints(
				SpotifyEndpoints::under(&accounts)
					.expect("Mock accounts endpoints should join onto the server URL."),
			)
			.build()
			.expect("Mock client configuration should build.")
	}

	/// API options with millisecond backoff so retry tests finish quickly.
	pub fn fast_options(retries: u32) -> ApiOptions {
		ApiOptions::default().with_retries(retries).with_retry_policy(RetryPolicy {
			base_delay: StdDuration::from_millis(1),
			max_delay: StdDuration::from_millis(5),
			default_retry_after: StdDuration::ZERO,
		})
	}

	/// Parses a user identifier fixture.
	pub fn user(id: &str) -> UserId {
		UserId::new(id).expect("User identifier fixture should be valid.")
	}

	/// Token fixture that expires `expires_in_secs` from now.
	pub fn tokens_expiring_in(access: &str, refresh: Option<&str>, expires_in_secs: i64) -> SpotifyTokens {
		SpotifyTokens::new(
			access,
			refresh,
			OffsetDateTime::now_utc().unix_timestamp() + expires_in_secs,
			"user-read-email user-top-read",
		)
	}

	/// Builds a [`TokenManager`] backed by an in-memory store and the reqwest transport.
	pub fn build_test_token_manager(server_base: &str) -> (TokenManager, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::default());
		let manager = TokenManager::with_transport(mock_config(server_base), store, transport);

		(manager, store_backend)
	}

	/// Builds a [`SpotifyClient`] backed by an in-memory store and the reqwest transport.
	pub fn build_test_client(
		server_base: &str,
		options: ApiOptions,
	) -> (SpotifyClient, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::default());
		let client =
			SpotifyClient::with_transport(mock_config(server_base), store, options, transport);

		(client, store_backend)
	}

	/// Transport double that replays scripted outcomes and records every request.
	///
	/// Once the script runs dry the final outcome keeps repeating.
	#[derive(Default)]
	pub struct ScriptedTransport {
		script: Mutex<VecDeque<ScriptedOutcome>>,
		last: Mutex<Option<ScriptedOutcome>>,
		requests: Mutex<Vec<HttpRequest>>,
		calls: AtomicUsize,
	}
	impl ScriptedTransport {
		/// Creates a transport that replays `outcomes` in order.
		pub fn new(outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
			Self { script: Mutex::new(outcomes.into_iter().collect()), ..Default::default() }
		}

		/// Number of requests executed so far.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}

		/// Requests executed so far, oldest first.
		pub fn requests(&self) -> Vec<HttpRequest> {
			self.requests.lock().clone()
		}

		fn next_outcome(&self) -> ScriptedOutcome {
			let next = self.script.lock().pop_front();

			match next {
				Some(outcome) => {
					*self.last.lock() = Some(outcome.clone());

					outcome
				},
				None => self.last.lock().clone().unwrap_or(ScriptedOutcome::NetworkFailure),
			}
		}
	}
	impl HttpTransport for ScriptedTransport {
		fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.requests.lock().push(request);

			let outcome = self.next_outcome();

			Box::pin(async move {
				match outcome {
					ScriptedOutcome::Respond(response) => Ok(response),
					ScriptedOutcome::NetworkFailure =>
						Err(TransportError::network(std::io::Error::other("connection refused"))),
					ScriptedOutcome::Timeout => Err(TransportError::Timeout { timeout_ms: 10 }),
				}
			})
		}
	}

	/// One scripted transport outcome.
	#[derive(Clone, Debug)]
	pub enum ScriptedOutcome {
		/// Return the response as-is.
		Respond(HttpResponse),
		/// Fail with a network error.
		NetworkFailure,
		/// Fail with a timeout.
		Timeout,
	}
	impl ScriptedOutcome {
		/// JSON response with the given status.
		pub fn json(status: u16, body: &str) -> Self {
			Self::Respond(
				HttpResponse::from_status(status)
					.with_header("content-type", "application/json")
					.with_body(body),
			)
		}

		/// Plain-text response with the given status.
		pub fn text(status: u16, body: &str) -> Self {
			Self::Respond(
				HttpResponse::from_status(status)
					.with_header("content-type", "text/plain")
					.with_body(body),
			)
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
