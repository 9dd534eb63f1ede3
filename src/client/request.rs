//! Replayable request descriptions and buffered responses.

// crates.io
use ::http::{
	HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::ConfigError,
	http::{HttpRequest, HttpResponse},
	token::TokenSecret,
};

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Request payload, kept in memory so the request can be re-issued after a refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// Serialized JSON document.
	Json(Vec<u8>),
	/// `application/x-www-form-urlencoded` pairs.
	Form(String),
	/// Arbitrary bytes with an explicit content type.
	Raw {
		/// Value of the `Content-Type` header.
		content_type: HeaderValue,
		/// Payload.
		bytes: Vec<u8>,
	},
}
impl RequestBody {
	fn content_type(&self) -> Option<HeaderValue> {
		match self {
			RequestBody::Empty => None,
			RequestBody::Json(_) => Some(HeaderValue::from_static(JSON)),
			RequestBody::Form(_) => Some(HeaderValue::from_static(FORM)),
			RequestBody::Raw { content_type, .. } => Some(content_type.clone()),
		}
	}

	fn to_bytes(&self) -> Vec<u8> {
		match self {
			RequestBody::Empty => Vec::new(),
			RequestBody::Json(bytes) | RequestBody::Raw { bytes, .. } => bytes.clone(),
			RequestBody::Form(encoded) => encoded.as_bytes().to_vec(),
		}
	}
}

/// Description of an API call relative to [`ClientConfig::base_url`].
#[derive(Clone, Debug)]
pub struct ApiRequest {
	method: Method,
	path: String,
	query: Vec<(String, String)>,
	headers: HeaderMap,
	body: RequestBody,
	refresh_on_unauthorized: bool,
}
impl ApiRequest {
	/// Creates a request for `path` using `method`.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: RequestBody::Empty,
			refresh_on_unauthorized: true,
		}
	}

	/// `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Sets a request header. `Authorization` is overwritten when a bearer token is attached.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn json<B>(mut self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		let bytes =
			serde_json::to_vec(body).map_err(|source| ConfigError::InvalidBody { source })?;

		self.body = RequestBody::Json(bytes);

		Ok(self)
	}

	/// Encodes `pairs` as a form payload.
	pub fn form<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let mut serializer = url::form_urlencoded::Serializer::new(String::new());

		for (key, value) in pairs {
			serializer.append_pair(key.as_ref(), value.as_ref());
		}

		self.body = RequestBody::Form(serializer.finish());

		self
	}

	/// Uses raw bytes as the payload.
	pub fn bytes(mut self, content_type: HeaderValue, bytes: impl Into<Vec<u8>>) -> Self {
		self.body = RequestBody::Raw { content_type, bytes: bytes.into() };

		self
	}

	/// Opts out of refresh-and-retry: a 401 is returned to the caller as is.
	pub fn without_refresh(mut self) -> Self {
		self.refresh_on_unauthorized = false;

		self
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Path relative to the base URL.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Request payload.
	pub fn body(&self) -> &RequestBody {
		&self.body
	}

	/// Whether a 401 triggers refresh-and-retry.
	pub fn refreshes_on_unauthorized(&self) -> bool {
		self.refresh_on_unauthorized
	}

	pub(crate) fn to_http(
		&self,
		config: &ClientConfig,
		credential: Option<&TokenSecret>,
	) -> Result<HttpRequest, ConfigError> {
		let mut url = config.endpoint(&self.path)?;

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(self.query.iter());
		}

		let mut headers = self.headers.clone();

		headers.entry(ACCEPT).or_insert_with(|| HeaderValue::from_static(JSON));

		if let Some(content_type) = self.body.content_type() {
			headers.insert(CONTENT_TYPE, content_type);
		}
		if let Some(credential) = credential.filter(|credential| !credential.is_empty()) {
			headers.insert(AUTHORIZATION, bearer_header(credential)?);
		}

		let mut request = HttpRequest::new(self.body.to_bytes());

		*request.method_mut() = self.method.clone();
		*request.uri_mut() = url.as_str().parse().map_err(::http::Error::from)?;
		*request.headers_mut() = headers;

		Ok(request)
	}
}

/// Successful response handed back to callers unchanged.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl ApiResponse {
	/// HTTP status.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw body bytes.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Consumes the response and returns the body bytes.
	pub fn into_body(self) -> Vec<u8> {
		self.body
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON, reporting the failing field path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::Decode { source, status: self.status.as_u16() })
	}
}
impl From<HttpResponse> for ApiResponse {
	fn from(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status, headers: parts.headers, body }
	}
}

/// `Authorization: Bearer ...` value, marked sensitive so it stays out of debug output.
fn bearer_header(credential: &TokenSecret) -> Result<HeaderValue, ::http::Error> {
	let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))?;

	value.set_sensitive(true);

	Ok(value)
}
