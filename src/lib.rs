//! Bearer-token API client with single-flight credential refresh, paired with a role-aware
//! route guard that decides whether a navigation is allowed or must be redirected.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod account;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod nav;
pub mod obs;
pub mod refresh;
pub mod session;
pub mod store;
pub mod token;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::AuthenticatedClient,
		config::ClientConfig,
		http::{ApiTransport, HttpRequest, HttpResponse, TransportFuture},
		nav::{Navigator, RecordingNavigator},
		store::{MemoryStore, TokenStore},
		token::{TokenPair, TokenSecret},
	};

	/// Error emitted by [`FnTransport`] when a scripted call simulates a network failure.
	#[derive(Debug, ThisError)]
	#[error("Scripted transport failure: {0}.")]
	pub struct FakeTransportError(pub String);

	/// Transport that answers every request through a closure, used to script backend behavior.
	pub struct FnTransport<F>(pub F);
	impl<F, Fut> ApiTransport for FnTransport<F>
	where
		F: 'static + Send + Sync + Fn(HttpRequest) -> Fut,
		Fut: 'static + Send + Future<Output = Result<HttpResponse, FakeTransportError>>,
	{
		type Error = FakeTransportError;

		fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::Error> {
			Box::pin((self.0)(request))
		}
	}

	/// Client type alias used by scripted-transport tests.
	pub type ScriptedClient<F> = AuthenticatedClient<FnTransport<F>>;

	/// Builds a JSON response with the provided status code.
	pub fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
		::http::Response::builder()
			.status(status)
			.header(::http::header::CONTENT_TYPE, "application/json")
			.body(body.to_string().into_bytes())
			.expect("Failed to build scripted JSON response.")
	}

	/// Returns the bearer token attached to a request, if any.
	pub fn bearer_of(request: &HttpRequest) -> Option<String> {
		request
			.headers()
			.get(::http::header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix("Bearer "))
			.map(str::to_owned)
	}

	/// Seeds a memory store with the provided access and refresh tokens.
	pub fn seeded_store(access: &str, refresh: &str) -> Arc<MemoryStore> {
		Arc::new(MemoryStore::with_pair(TokenPair {
			access_token: TokenSecret::new(access),
			refresh_token: TokenSecret::new(refresh),
		}))
	}

	/// Default configuration pointed at a non-routable test host.
	pub fn test_config() -> ClientConfig {
		ClientConfig::builder(
			Url::parse("http://backend.test/api/v1").expect("Failed to parse test base URL."),
		)
		.build()
		.expect("Failed to build test client configuration.")
	}

	/// Constructs a scripted client sharing the provided store and a recording navigator.
	pub fn build_scripted_client<F, Fut>(
		store: Arc<dyn TokenStore>,
		handler: F,
	) -> (ScriptedClient<F>, RecordingNavigator)
	where
		F: 'static + Send + Sync + Fn(HttpRequest) -> Fut,
		Fut: 'static + Send + Future<Output = Result<HttpResponse, FakeTransportError>>,
	{
		let navigator = RecordingNavigator::default();
		let nav: Arc<dyn Navigator> = Arc::new(navigator.clone());
		let client =
			AuthenticatedClient::with_transport(test_config(), store, nav, FnTransport(handler))
				.expect("Failed to build scripted client.");

		(client, navigator)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
