//! Single-flight refresh coordination.
//!
//! [`RefreshCoordinator::obtain_fresh_token`] is the only entry point. The first caller that
//! finds the coordinator idle becomes the leader: it flips the state to refreshing under a
//! synchronous lock (no `.await` between reading and writing the flag), performs the
//! `POST {base_url}/auth/refresh` exchange, persists the result, and settles every caller that
//! queued behind it with the same outcome. Failures clear both tokens and emit exactly one
//! redirect to the login page per refresh cycle.

mod metrics;

pub use metrics::{RefreshMetrics, RefreshStats};

// crates.io
use ::http::{
	Method,
	header::{ACCEPT, CONTENT_TYPE},
};
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::{ApiError, ConfigError, RefreshError},
	http::ApiTransport,
	nav::Navigator,
	obs::{self, FlowKind, RedirectTarget},
	store::TokenStore,
	token::{TokenKind, TokenSecret},
};

type RefreshOutcome = Result<TokenSecret, RefreshError>;
type PendingWaiter = oneshot::Sender<RefreshOutcome>;

#[derive(Debug, Default)]
enum RefreshState {
	#[default]
	Idle,
	Refreshing {
		waiters: Vec<PendingWaiter>,
	},
}

enum Ticket {
	Leader,
	Waiter(oneshot::Receiver<RefreshOutcome>),
}

#[derive(Deserialize)]
struct RefreshResponseBody {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
}

/// Guarantees at most one outstanding refresh-token exchange.
pub struct RefreshCoordinator<T>
where
	T: ?Sized + ApiTransport,
{
	transport: Arc<T>,
	store: Arc<dyn TokenStore>,
	navigator: Arc<dyn Navigator>,
	refresh_url: Url,
	login_page: String,
	timeout: Option<Duration>,
	metrics: Arc<RefreshMetrics>,
	state: Mutex<RefreshState>,
}
impl<T> RefreshCoordinator<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates an idle coordinator.
	pub fn new(
		config: &ClientConfig,
		transport: impl Into<Arc<T>>,
		store: Arc<dyn TokenStore>,
		navigator: Arc<dyn Navigator>,
	) -> Result<Self, ConfigError> {
		Ok(Self {
			transport: transport.into(),
			store,
			navigator,
			refresh_url: config.refresh_url()?,
			login_page: config.login_page.clone(),
			timeout: config.refresh_timeout,
			metrics: Default::default(),
			state: Default::default(),
		})
	}

	/// Counters describing the refresh cycles handled so far.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Returns a fresh access token, joining the in-flight refresh if one exists.
	///
	/// Every caller that queued during a refresh observes that refresh's outcome: the same new
	/// token or the same failure. On failure both tokens have been cleared and one login
	/// redirect has been requested before this returns. With no refresh token stored the call
	/// fails with [`RefreshError::MissingRefreshToken`] without contacting the network.
	pub async fn obtain_fresh_token(&self) -> Result<TokenSecret, RefreshError> {
		match self.take_ticket() {
			Ticket::Leader => self.lead().await,
			Ticket::Waiter(receiver) => {
				self.metrics.record_coalesced();

				receiver.await.unwrap_or(Err(RefreshError::Cancelled))
			},
		}
	}

	fn take_ticket(&self) -> Ticket {
		let mut state = self.state.lock();

		if let RefreshState::Refreshing { waiters } = &mut *state {
			let (sender, receiver) = oneshot::channel();

			waiters.push(sender);

			return Ticket::Waiter(receiver);
		}

		*state = RefreshState::Refreshing { waiters: Vec::new() };

		Ticket::Leader
	}

	async fn lead(&self) -> RefreshOutcome {
		let mut settle = Settle { state: &self.state, settled: false };

		self.metrics.record_attempt();

		let outcome = obs::observe(FlowKind::Refresh, "obtain_fresh_token", self.exchange()).await;

		match &outcome {
			Ok(_) => self.metrics.record_success(),
			Err(err) => {
				self.metrics.record_failure();
				self.end_session(err);
			},
		}

		settle.settle(&outcome);

		if outcome.is_err() {
			obs::record_redirect(FlowKind::Refresh, RedirectTarget::Login);
			self.navigator.redirect(&self.login_page);
		}

		outcome
	}

	async fn exchange(&self) -> RefreshOutcome {
		let refresh_token = self
			.store
			.get(TokenKind::Refresh)
			.filter(|token| !token.is_empty())
			.ok_or(RefreshError::MissingRefreshToken)?;
		let body =
			serde_json::json!({ "refresh_token": refresh_token.expose() }).to_string().into_bytes();
		let request = ::http::Request::builder()
			.method(Method::POST)
			.uri(self.refresh_url.as_str())
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json")
			.body(body)
			.map_err(RefreshError::transport)?;
		let call = self.transport.execute(request);
		let response = match self.timeout {
			Some(timeout) => tokio::time::timeout(timeout, call)
				.await
				.map_err(|_| RefreshError::Timeout { timeout })?,
			None => call.await,
		}
		.map_err(RefreshError::transport)?;
		let status = response.status();

		if !status.is_success() {
			return Err(RefreshError::Rejected(ApiError::from_response(
				status.as_u16(),
				response.body(),
			)));
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());
		let parsed: RefreshResponseBody = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| RefreshError::MalformedResponse { source: Arc::new(source) })?;

		if parsed.access_token.is_empty() {
			return Err(RefreshError::EmptyAccessToken);
		}

		let access = TokenSecret::new(parsed.access_token);

		self.store.set(TokenKind::Access, access.clone()).map_err(RefreshError::Storage)?;

		if let Some(rotated) = parsed.refresh_token.filter(|token| !token.is_empty()) {
			self.store
				.set(TokenKind::Refresh, TokenSecret::new(rotated))
				.map_err(RefreshError::Storage)?;
		}

		Ok(access)
	}

	fn end_session(&self, cause: &RefreshError) {
		obs::warn(FlowKind::Refresh, &format!("Refresh failed, ending session: {cause}"));

		if let Err(e) = self.store.clear_all() {
			obs::warn(FlowKind::Refresh, &format!("Failed to clear tokens: {e}"));
		}
	}
}
impl<T> Debug for RefreshCoordinator<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("refresh_url", &self.refresh_url.as_str())
			.field("login_page", &self.login_page)
			.field("timeout", &self.timeout)
			.field("metrics", &self.metrics)
			.finish_non_exhaustive()
	}
}

// Drains the waiter queue exactly once, even if the leader's future is dropped mid-refresh.
struct Settle<'a> {
	state: &'a Mutex<RefreshState>,
	settled: bool,
}
impl Settle<'_> {
	fn settle(&mut self, outcome: &RefreshOutcome) {
		self.settled = true;

		let waiters = match std::mem::take(&mut *self.state.lock()) {
			RefreshState::Refreshing { waiters } => waiters,
			RefreshState::Idle => Vec::new(),
		};

		for waiter in waiters {
			let _ = waiter.send(outcome.clone());
		}
	}
}
impl Drop for Settle<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.settle(&Err(RefreshError::Cancelled));
		}
	}
}
