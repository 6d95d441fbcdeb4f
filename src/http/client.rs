//! Retrying, rate-limit-aware Web API client.
//!
//! One [`SpotifyHttpClient::request`] makes at most `1 + retries` transport calls:
//!
//! - `429` waits for `Retry-After` (or the policy default) and retries; exhaustion yields
//!   [`RateLimitError`].
//! - `5xx` and transport failures back off exponentially and retry; exhaustion yields the last
//!   [`ApiError`] (`NETWORK_ERROR` with status `0` for transport failures).
//! - Any other non-2xx status fails immediately.

// crates.io
use reqwest::{
	StatusCode,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	config::ApiOptions,
	error::{ApiError, ConfigError, RateLimitError, TransportError},
	http::{
		ApiResponse, HttpMethod, HttpRequest, HttpResponse, HttpTransport, RateLimitState,
		RateLimitTracker, RequestContext, ResponseBody,
	},
	obs::{self, Operation, OperationSpan, Outcome},
};

/// Web API client owning the transport, request policy, and rate-limit state.
pub struct SpotifyHttpClient {
	transport: Arc<dyn HttpTransport>,
	base_url: String,
	options: ApiOptions,
	rate_limit: RateLimitTracker,
}
impl SpotifyHttpClient {
	/// Creates a client rooted at `base_url` (trailing slashes are ignored).
	pub fn new(
		base_url: impl Into<String>,
		options: ApiOptions,
		transport: Arc<dyn HttpTransport>,
	) -> Self {
		let base_url = base_url.into().trim_end_matches('/').to_owned();

		Self { transport, base_url, options, rate_limit: RateLimitTracker::default() }
	}

	/// Base URL without a trailing slash.
	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Request policy.
	pub fn options(&self) -> &ApiOptions {
		&self.options
	}

	/// Copy of the last observed rate-limit window.
	pub fn rate_limit_state(&self) -> RateLimitState {
		self.rate_limit.snapshot()
	}

	/// Absolute URL for `context`; query parameters are appended for `GET` only.
	pub fn build_url(&self, context: &RequestContext) -> Result<Url, ConfigError> {
		let raw = format!("{}/{}", self.base_url, context.endpoint.trim_start_matches('/'));
		let mut url = Url::parse(&raw).map_err(|source| ConfigError::InvalidEndpoint {
			endpoint: context.endpoint.clone(),
			source,
		})?;

		if context.method == HttpMethod::Get && !context.params.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in context.params.iter() {
				pairs.append_pair(key, &value.render());
			}

			drop(pairs);
		}

		Ok(url)
	}

	/// Sends `context` with retries and returns the decoded body.
	pub async fn request(&self, context: RequestContext) -> Result<ApiResponse<ResponseBody>> {
		const KIND: Operation = Operation::ApiRequest;

		let span = OperationSpan::new(KIND, "request");

		obs::record_outcome(KIND, Outcome::Attempt);

		let result = span.instrument(self.send_with_retries(context)).await;

		obs::record_outcome(KIND, Outcome::of(&result));

		result
	}

	/// Sends `context` and deserializes the body into `T`.
	///
	/// A 2xx body that does not match `T` fails with a `PARSE_ERROR` [`ApiError`] and is not
	/// retried.
	pub async fn request_json<T>(&self, context: RequestContext) -> Result<ApiResponse<T>>
	where
		T: DeserializeOwned,
	{
		let response = self.request(context.clone()).await?;
		let status = response.status;
		let ApiResponse { data, headers, rate_limit, .. } = response;
		let data = data.decode::<T>().map_err(|e| {
			ApiError::new(
				format!("Response body does not match the expected shape at `{}`: {}", e.path(), e.inner()),
				status,
				Some(ApiError::PARSE_ERROR.into()),
				Some(context),
			)
		})?;

		Ok(ApiResponse { data, status, headers, rate_limit })
	}

	async fn send_with_retries(&self, context: RequestContext) -> Result<ApiResponse<ResponseBody>> {
		let url = self.build_url(&context)?;
		let request = self.build_request(&context, url)?;

		if self.options.rate_limit {
			self.wait_for_rate_limit().await;
		}

		let policy = self.options.retry_policy;
		let mut attempt: u32 = 1;

		loop {
			let failure = match self.attempt(request.clone(), &context).await {
				Ok(response) => return Ok(response),
				Err(failure) => failure,
			};
			let can_retry = attempt <= self.options.retries;
			let delay = match failure {
				AttemptFailure::RateLimited { retry_after } => {
					if !can_retry {
						return Err(RateLimitError { retry_after: retry_after.as_secs() }.into());
					}

					retry_after
				},
				AttemptFailure::Status(error) => {
					if !(can_retry && error.is_server_error()) {
						return Err(error.into());
					}

					policy.backoff_delay(attempt)
				},
				AttemptFailure::Transport(error) => {
					if !can_retry {
						return Err(ApiError::network(error.to_string(), Some(context)).into());
					}

					policy.backoff_delay(attempt)
				},
			};

			tracing::debug!(
				endpoint = %context.endpoint,
				attempt,
				delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
				"Retrying Spotify request."
			);
			tokio::time::sleep(delay).await;

			attempt += 1;
		}
	}

	async fn attempt(
		&self,
		request: HttpRequest,
		context: &RequestContext,
	) -> Result<ApiResponse<ResponseBody>, AttemptFailure> {
		let response = self.transport.execute(request).await.map_err(AttemptFailure::Transport)?;
		let rate_limit = self.rate_limit.observe(&response.headers);

		if response.status == StatusCode::TOO_MANY_REQUESTS {
			let retry_after =
				response.retry_after().unwrap_or(self.options.retry_policy.default_retry_after);

			tracing::warn!(
				endpoint = %context.endpoint,
				retry_after_secs = retry_after.as_secs(),
				"Spotify rate limit hit."
			);

			return Err(AttemptFailure::RateLimited { retry_after });
		}
		if !response.status.is_success() {
			return Err(AttemptFailure::Status(error_from_response(&response, context)));
		}

		let data = decode_body(&response).map_err(|e| {
			AttemptFailure::Status(ApiError::new(
				format!("Response body is not valid JSON: {e}"),
				response.status.as_u16(),
				Some(ApiError::PARSE_ERROR.into()),
				Some(context.clone()),
			))
		})?;
		let headers = response
			.headers
			.iter()
			.filter_map(|(name, value)| {
				value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
			})
			.collect();

		Ok(ApiResponse { data, status: response.status.as_u16(), headers, rate_limit })
	}

	fn build_request(&self, context: &RequestContext, url: Url) -> Result<HttpRequest, ConfigError> {
		let mut request = HttpRequest::new(context.method.to_method(), url)
			.with_timeout(self.options.timeout)
			.with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
			.with_header(ACCEPT, HeaderValue::from_static("application/json"));

		if let Some(token) = &context.bearer_token {
			let mut value = HeaderValue::from_str(&token.bearer())
				.map_err(|_| ConfigError::InvalidHeader { name: AUTHORIZATION.to_string() })?;

			value.set_sensitive(true);
			request.headers.insert(AUTHORIZATION, value);
		}

		for (name, value) in &context.headers {
			let invalid = || ConfigError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			request.headers.insert(header_name, header_value);
		}

		match &context.body {
			Some(body) if context.method != HttpMethod::Get => {
				let bytes = match body {
					Value::String(raw) => raw.clone().into_bytes(),
					other =>
						serde_json::to_vec(other).map_err(|source| ConfigError::Body { source })?,
				};

				request.body = Some(bytes);
			},
			_ => (),
		}

		Ok(request)
	}

	async fn wait_for_rate_limit(&self) {
		if let Some(wait) = self.rate_limit.pending_wait(OffsetDateTime::now_utc()) {
			tracing::info!(
				wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
				"Rate-limit window exhausted; waiting for reset."
			);
			tokio::time::sleep(wait).await;
		}
	}
}
impl Debug for SpotifyHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SpotifyHttpClient")
			.field("base_url", &self.base_url)
			.field("options", &self.options)
			.field("rate_limit", &self.rate_limit.snapshot())
			.finish()
	}
}

enum AttemptFailure {
	RateLimited { retry_after: StdDuration },
	Status(ApiError),
	Transport(TransportError),
}

fn decode_body(response: &HttpResponse) -> Result<ResponseBody, serde_json::Error> {
	if !response.is_json() {
		return Ok(ResponseBody::Text(String::from_utf8_lossy(&response.body).into_owned()));
	}
	if response.body.iter().all(u8::is_ascii_whitespace) {
		return Ok(ResponseBody::Json(Value::Null));
	}

	serde_json::from_slice(&response.body).map(ResponseBody::Json)
}

/// Builds the [`ApiError`] for a non-2xx, non-429 response.
///
/// JSON bodies are read as Spotify's `{"error": {"status", "message"}}` envelope first, then as a
/// flat `{"message", "code"}` object. Anything else falls back to the body text or status text.
fn error_from_response(response: &HttpResponse, context: &RequestContext) -> ApiError {
	let status = response.status.as_u16();
	let (message, code) = if response.is_json() {
		match serde_json::from_slice::<Value>(&response.body) {
			Ok(body) => error_fields(&body, status),
			Err(_) => (response.status_text().to_owned(), Some(status.to_string())),
		}
	} else {
		let text = String::from_utf8_lossy(&response.body).trim().to_owned();
		let message = if text.is_empty() { response.status_text().to_owned() } else { text };

		(message, Some(status.to_string()))
	};
	let message = if message.is_empty() {
		format!("HTTP {status}: {}", response.status_text())
	} else {
		message
	};

	ApiError::new(message, status, code, Some(context.clone()))
}

fn error_fields(body: &Value, status: u16) -> (String, Option<String>) {
	match body.get("error") {
		Some(Value::Object(error)) => (
			error
				.get("message")
				.and_then(Value::as_str)
				.unwrap_or("Unknown API error")
				.to_owned(),
			error.get("status").and_then(scalar_string).or_else(|| Some(status.to_string())),
		),
		Some(Value::String(error)) => (
			body.get("error_description")
				.and_then(Value::as_str)
				.unwrap_or(error)
				.to_owned(),
			Some(error.clone()),
		),
		_ => (
			body.get("message").and_then(Value::as_str).unwrap_or("Unknown error").to_owned(),
			body.get("code").and_then(scalar_string),
		),
	}
}

fn scalar_string(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}
