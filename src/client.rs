//! Bearer-authenticated API client with transparent refresh-and-retry.

pub mod request;

pub use request::{ApiRequest, ApiResponse, RequestBody};

// crates.io
use ::http::StatusCode;
use serde::de::DeserializeOwned;
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::{ApiError, ConfigError, TransportError},
	http::{ApiTransport, HttpResponse},
	nav::Navigator,
	obs::{self, FlowKind},
	refresh::{RefreshCoordinator, RefreshMetrics},
	store::TokenStore,
	token::{TokenKind, TokenSecret},
};

/// Client backed by the default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestAuthenticatedClient = AuthenticatedClient<ReqwestTransport>;

/// Sends API calls with the stored access token and recovers from expired credentials.
///
/// Every call reads the access token from the [`TokenStore`] right before dispatch. A `401`
/// triggers at most one refresh-and-retry cycle per call; concurrent calls share one refresh
/// through the [`RefreshCoordinator`]. Transport failures and non-401 error statuses are returned
/// without retrying. Clones share the store, the transport, and the coordinator.
pub struct AuthenticatedClient<T>
where
	T: ?Sized + ApiTransport,
{
	transport: Arc<T>,
	store: Arc<dyn TokenStore>,
	config: Arc<ClientConfig>,
	coordinator: Arc<RefreshCoordinator<T>>,
}
impl<T> AuthenticatedClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client that sends requests through `transport`.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn TokenStore>,
		navigator: Arc<dyn Navigator>,
		transport: impl Into<Arc<T>>,
	) -> Result<Self, ConfigError> {
		let transport = transport.into();
		let coordinator =
			RefreshCoordinator::new(&config, transport.clone(), store.clone(), navigator)?;

		Ok(Self {
			transport,
			store,
			config: Arc::new(config),
			coordinator: Arc::new(coordinator),
		})
	}

	/// Token store shared with the coordinator.
	pub fn store(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}

	/// Validated configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Refresh coordinator used by this client.
	pub fn coordinator(&self) -> &RefreshCoordinator<T> {
		&self.coordinator
	}

	/// Refresh counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		self.coordinator.metrics()
	}

	/// Sends `request` and classifies the response.
	///
	/// - `2xx` responses are returned unchanged.
	/// - A `401` on a request that allows refresh is retried once with a fresh credential. If
	///   another call already replaced the token that was sent, the stored token is reused
	///   without a refresh.
	/// - A `401` after that retry yields [`Error::Unauthorized`].
	/// - A failed refresh yields [`Error::RefreshFailed`]; tokens are already cleared and the
	///   login redirect has been requested.
	/// - Other error statuses yield [`Error::Server`] with the normalized envelope.
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		obs::observe(FlowKind::Request, "execute", self.execute_with_retry(&request)).await
	}

	/// `GET` `path` and decode the JSON body.
	pub async fn get_json<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.execute(ApiRequest::get(path)).await?.json()
	}

	/// `POST` `body` as JSON to `path` and decode the JSON response.
	pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.execute(ApiRequest::post(path).json(body)?).await?.json()
	}

	/// `PUT` `body` as JSON to `path` and decode the JSON response.
	pub async fn put_json<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.execute(ApiRequest::put(path).json(body)?).await?.json()
	}

	/// `DELETE` `path`.
	pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
		self.execute(ApiRequest::delete(path)).await
	}

	async fn execute_with_retry(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let sent_with = self.access_token();
		let response = self.dispatch(request, sent_with.as_ref()).await?;

		if response.status() != StatusCode::UNAUTHORIZED || !request.refreshes_on_unauthorized() {
			return classify(response);
		}

		let credential = match self.access_token() {
			Some(current) if sent_with.as_ref() != Some(&current) => current,
			_ => self.coordinator.obtain_fresh_token().await?,
		};
		let retried = self.dispatch(request, Some(&credential)).await?;

		classify(retried)
	}

	async fn dispatch(
		&self,
		request: &ApiRequest,
		credential: Option<&TokenSecret>,
	) -> Result<HttpResponse> {
		let outbound = request.to_http(&self.config, credential)?;

		self.transport
			.execute(outbound)
			.await
			.map_err(|e| Error::Transport(TransportError::network(e)))
	}

	fn access_token(&self) -> Option<TokenSecret> {
		self.store.get(TokenKind::Access).filter(|token| !token.is_empty())
	}
}
#[cfg(feature = "reqwest")]
impl AuthenticatedClient<ReqwestTransport> {
	/// Creates a client backed by a reqwest transport honoring the configured timeout.
	pub fn new(
		config: ClientConfig,
		store: Arc<dyn TokenStore>,
		navigator: Arc<dyn Navigator>,
	) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::from_config(&config)?;

		Self::with_transport(config, store, navigator, transport)
	}
}
impl<T> Clone for AuthenticatedClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			coordinator: self.coordinator.clone(),
		}
	}
}
impl<T> Debug for AuthenticatedClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticatedClient")
			.field("config", &self.config)
			.field("coordinator", &self.coordinator)
			.finish_non_exhaustive()
	}
}

fn classify(response: HttpResponse) -> Result<ApiResponse> {
	let status = response.status();

	if status.is_success() {
		return Ok(response.into());
	}

	let envelope = ApiError::from_response(status.as_u16(), response.body());

	if status == StatusCode::UNAUTHORIZED {
		Err(Error::Unauthorized(envelope))
	} else {
		Err(Error::Server(envelope))
	}
}
