//! Demonstrates plugging an in-memory transport into the client.
//!
//! 1. Implement [`ApiTransport`] so every request is answered locally.
//! 2. Seed a [`MemoryStore`] with an expired access token.
//! 3. Watch the client refresh once and replay the original request.

// std
use std::{
	convert::Infallible,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use authgate::{
	client::{ApiRequest, AuthenticatedClient},
	config::ClientConfig,
	http::{ApiTransport, HttpRequest, HttpResponse, TransportFuture},
	nav::Navigator,
	store::MemoryStore,
	token::TokenPair,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store = Arc::new(MemoryStore::with_pair(TokenPair::new("expired", "refresh-demo")));
	let navigator: Arc<dyn Navigator> =
		Arc::new(|location: &str| println!("Shell asked to navigate to {location}."));
	let config = ClientConfig::builder(Url::parse("https://api.example.com/api/v1")?).build()?;
	let client: AuthenticatedClient<LocalBackend> = AuthenticatedClient::with_transport(
		config,
		store.clone(),
		navigator,
		LocalBackend::default(),
	)?;
	let response = client.execute(ApiRequest::get("detections").query("page", "1")).await?;

	println!("Backend answered {} with {}.", response.status(), response.text());
	println!(
		"Refresh attempts: {}; coalesced callers: {}.",
		client.refresh_metrics().attempts(),
		client.refresh_metrics().coalesced()
	);

	client.logout().await?;

	println!("Tokens cleared after logout: {}.", store.is_empty());

	Ok(())
}

#[derive(Debug, Default)]
struct LocalBackend {
	calls: AtomicUsize,
}
impl ApiTransport for LocalBackend {
	type Error = Infallible;

	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::Error> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
		let authorization = request
			.headers()
			.get("authorization")
			.and_then(|value| value.to_str().ok())
			.map(str::to_owned);

		Box::pin(async move {
			println!("#{call} {} {}", request.method(), request.uri());

			let (status, body): (u16, &str) = match (request.uri().path(), authorization.as_deref()) {
				("/api/v1/auth/refresh", _) => (200, r#"{"access_token":"fresh"}"#),
				("/api/v1/auth/logout", _) => (204, ""),
				(_, Some("Bearer fresh")) => (200, r#"{"items":[{"id":1,"label":"leaf rust"}]}"#),
				_ => (401, r#"{"detail":"Token expired"}"#),
			};
			let mut response = HttpResponse::new(body.as_bytes().to_vec());

			*response.status_mut() = http::StatusCode::from_u16(status)
				.unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

			Ok(response)
		})
	}
}
