//! HTTP plumbing shared by the token lifecycle and the Web API client.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. [`ReqwestTransport`] is the
//! production implementation; tests substitute scripted transports. Dropping a returned future
//! cancels the in-flight request.

pub mod client;
pub mod rate_limit;
pub mod request;

pub use client::*;
pub use rate_limit::*;
pub use request::*;

// std
use std::ops::Deref;
// crates.io
use reqwest::{
	Method, StatusCode,
	header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Executes one HTTP exchange. Implementations never retry; callers own the retry policy.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with whatever status the server answered.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Fully assembled outbound request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL including the query string.
	pub url: Url,
	/// Request headers; credentials are marked sensitive.
	pub headers: HeaderMap,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
	/// Per-request timeout.
	pub timeout: Option<StdDuration>,
}
impl HttpRequest {
	/// Creates a request with no headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None, timeout: None }
	}

	/// Inserts a header, replacing any previous value.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets the raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Sets the per-request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Header value as text, if present and printable.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Body decoded as UTF-8, lossy.
	pub fn body_text(&self) -> String {
		self.body.as_deref().map(String::from_utf8_lossy).unwrap_or_default().into_owned()
	}
}

/// Buffered HTTP response.
#[derive(Clone, Debug)]
pub struct HttpResponse {
	/// Response status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Creates an empty response with `status`.
	pub fn new(status: StatusCode) -> Self {
		Self { status, headers: HeaderMap::new(), body: Vec::new() }
	}

	/// Creates an empty response from a numeric status; unknown codes become 500.
	pub fn from_status(status: u16) -> Self {
		Self::new(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
	}

	/// Appends a header; invalid names or values are skipped.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) =
			(HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value))
		{
			self.headers.append(name, value);
		}

		self
	}

	/// Sets the body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}

	/// Header value as text, if present and printable.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Returns `true` when the content type mentions `application/json`.
	pub fn is_json(&self) -> bool {
		self.headers
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.is_some_and(|value| value.contains("application/json"))
	}

	/// `Retry-After` hint as delay-seconds or an HTTP date.
	pub fn retry_after(&self) -> Option<StdDuration> {
		parse_retry_after(&self.headers)
	}

	/// Canonical reason phrase for the status.
	pub fn status_text(&self) -> &'static str {
		self.status.canonical_reason().unwrap_or("Unknown error")
	}
}

/// [`HttpTransport`] backed by a shared [`ReqwestClient`].
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
impl ReqwestTransport {
	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let HttpRequest { method, url, headers, body, timeout } = request;
			let mut builder = client.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}
			if let Some(timeout) = timeout {
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await.map_err(|e| map_reqwest_error(e, timeout))?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(|e| map_reqwest_error(e, timeout))?.to_vec();

			Ok(HttpResponse { status, headers, body })
		})
	}
}

fn map_reqwest_error(error: ReqwestError, timeout: Option<StdDuration>) -> TransportError {
	if error.is_timeout() {
		let timeout_ms =
			timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)).unwrap_or_default();

		return TransportError::Timeout { timeout_ms };
	}

	TransportError::network(error)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<StdDuration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(StdDuration::from_secs(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		return Some(StdDuration::try_from(delta).unwrap_or(StdDuration::ZERO));
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn retry_after_accepts_seconds_and_ignores_garbage() {
		let seconds = HttpResponse::from_status(429).with_header("Retry-After", "7");
		let garbage = HttpResponse::from_status(429).with_header("Retry-After", "soon");
		let missing = HttpResponse::from_status(429);

		assert_eq!(seconds.retry_after(), Some(StdDuration::from_secs(7)));
		assert_eq!(garbage.retry_after(), None);
		assert_eq!(missing.retry_after(), None);
	}

	#[test]
	fn retry_after_past_http_date_means_no_wait() {
		let response = HttpResponse::from_status(429)
			.with_header("Retry-After", "Wed, 21 Oct 2015 07:28:00 +0000");

		assert_eq!(response.retry_after(), Some(StdDuration::ZERO));
	}

	#[test]
	fn json_detection_uses_content_type_substring() {
		let json = HttpResponse::from_status(200)
			.with_header("content-type", "application/json; charset=utf-8");
		let text = HttpResponse::from_status(200).with_header("content-type", "text/plain");

		assert!(json.is_json());
		assert!(!text.is_json());
		assert_eq!(text.status_text(), "OK");
	}
}
