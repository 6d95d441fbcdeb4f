//! Request descriptions and decoded responses for the Web API client.

// crates.io
use reqwest::Method;
use url::form_urlencoded::Serializer;
// self
use crate::{_prelude::*, auth::TokenSecret, http::RateLimitState};

/// Methods the Web API client issues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	/// `GET`; the only method that carries query parameters.
	#[default]
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `DELETE`.
	Delete,
}
impl HttpMethod {
	/// Uppercase method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Delete => "DELETE",
		}
	}

	/// Equivalent reqwest method.
	pub fn to_method(self) -> Method {
		match self {
			HttpMethod::Get => Method::GET,
			HttpMethod::Post => Method::POST,
			HttpMethod::Put => Method::PUT,
			HttpMethod::Delete => Method::DELETE,
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One query-string value. Lists render comma-joined.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
	/// Free text.
	Text(String),
	/// Integer.
	Integer(i64),
	/// Boolean, rendered `true`/`false`.
	Bool(bool),
	/// List, rendered comma-joined.
	List(Vec<String>),
}
impl QueryValue {
	/// Query-string form of the value.
	pub fn render(&self) -> String {
		match self {
			QueryValue::Text(text) => text.clone(),
			QueryValue::Integer(n) => n.to_string(),
			QueryValue::Bool(b) => b.to_string(),
			QueryValue::List(items) => items.join(","),
		}
	}
}
impl From<&str> for QueryValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}
impl From<String> for QueryValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<u32> for QueryValue {
	fn from(value: u32) -> Self {
		Self::Integer(value.into())
	}
}
impl From<i64> for QueryValue {
	fn from(value: i64) -> Self {
		Self::Integer(value)
	}
}
impl From<bool> for QueryValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<Vec<String>> for QueryValue {
	fn from(value: Vec<String>) -> Self {
		Self::List(value)
	}
}
impl From<&[&str]> for QueryValue {
	fn from(value: &[&str]) -> Self {
		Self::List(value.iter().map(|item| (*item).to_owned()).collect())
	}
}

/// Ordered query parameters; setting an existing key replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, QueryValue)>);
impl QueryParams {
	/// Empty parameter list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets `key`, replacing any previous value.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
		let key = key.into();
		let value = value.into();

		match self.0.iter_mut().find(|(existing, _)| *existing == key) {
			Some((_, slot)) => *slot = value,
			None => self.0.push((key, value)),
		}
	}

	/// Sets `key` only when `value` is present.
	pub fn set_opt<V>(&mut self, key: impl Into<String>, value: Option<V>)
	where
		V: Into<QueryValue>,
	{
		if let Some(value) = value {
			self.set(key, value);
		}
	}

	/// Builder form of [`QueryParams::set`].
	pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
		self.set(key, value);

		self
	}

	/// Applies every entry of `overrides` on top of `self`.
	pub fn merge(mut self, overrides: QueryParams) -> Self {
		for (key, value) in overrides.0 {
			self.set(key, value);
		}

		self
	}

	/// Value for `key`.
	pub fn get(&self, key: &str) -> Option<&QueryValue> {
		self.0.iter().find(|(existing, _)| existing == key).map(|(_, value)| value)
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no entries are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
		self.0.iter().map(|(key, value)| (key.as_str(), value))
	}

	/// Form-encoded pairs sorted by key, independent of insertion order.
	///
	/// Keys and values are percent-encoded, so distinct parameter sets never share a form.
	pub fn canonical(&self) -> String {
		let mut pairs: Vec<_> = self.iter().map(|(k, v)| (k, v.render())).collect();

		pairs.sort();

		Serializer::new(String::new()).extend_pairs(pairs).finish()
	}
}

/// Description of one Web API call.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestContext {
	/// Path relative to the API base URL, e.g. `/me/top/artists`.
	pub endpoint: String,
	/// HTTP method.
	pub method: HttpMethod,
	/// Query parameters; only sent for `GET`.
	pub params: QueryParams,
	/// JSON body for non-`GET` methods; a JSON string is sent verbatim.
	pub body: Option<Value>,
	/// Extra headers applied after the defaults.
	pub headers: Vec<(String, String)>,
	/// Bearer credential; present when the call requires authentication.
	pub bearer_token: Option<TokenSecret>,
}
impl RequestContext {
	/// Creates a context for `method` on `endpoint`.
	pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			method,
			params: QueryParams::default(),
			body: None,
			headers: Vec::new(),
			bearer_token: None,
		}
	}

	/// `GET` shorthand.
	pub fn get(endpoint: impl Into<String>) -> Self {
		Self::new(HttpMethod::Get, endpoint)
	}

	/// Replaces the query parameters.
	pub fn with_params(mut self, params: QueryParams) -> Self {
		self.params = params;

		self
	}

	/// Sets one query parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
		self.params.set(key, value);

		self
	}

	/// Sets the JSON body.
	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Adds an extra header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Attaches the bearer credential.
	pub fn with_bearer(mut self, token: TokenSecret) -> Self {
		self.bearer_token = Some(token);

		self
	}

	/// Returns `true` when a bearer credential is attached.
	pub fn requires_auth(&self) -> bool {
		self.bearer_token.is_some()
	}

	/// Copy with the bearer credential removed, for error reporting.
	pub fn redacted(mut self) -> Self {
		self.bearer_token = None;

		self
	}
}

/// Decoded response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
	/// Body of an `application/json` response; empty bodies decode as `null`.
	Json(Value),
	/// Any other body as text.
	Text(String),
}
impl ResponseBody {
	/// JSON payload, if any.
	pub fn as_json(&self) -> Option<&Value> {
		match self {
			ResponseBody::Json(value) => Some(value),
			ResponseBody::Text(_) => None,
		}
	}

	/// Text payload, if any.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			ResponseBody::Json(_) => None,
			ResponseBody::Text(text) => Some(text),
		}
	}

	/// Deserializes the body into `T`; text bodies are treated as JSON strings.
	pub fn decode<T>(self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let value = match self {
			ResponseBody::Json(value) => value,
			ResponseBody::Text(text) => Value::String(text),
		};

		serde_path_to_error::deserialize(value)
	}
}

/// Successful Web API response.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse<T> {
	/// Decoded payload.
	pub data: T,
	/// HTTP status code.
	pub status: u16,
	/// Response headers with printable values.
	pub headers: BTreeMap<String, String>,
	/// Rate-limit snapshot taken after this response.
	pub rate_limit: RateLimitState,
}
impl<T> ApiResponse<T> {
	/// Maps the payload while keeping the metadata.
	pub fn map<U, F>(self, f: F) -> ApiResponse<U>
	where
		F: FnOnce(T) -> U,
	{
		ApiResponse {
			data: f(self.data),
			status: self.status,
			headers: self.headers,
			rate_limit: self.rate_limit,
		}
	}
}
