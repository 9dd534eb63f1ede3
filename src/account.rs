//! Account helpers: password login, registration, logout, and the current-user profile.
//!
//! Login and logout opt out of refresh-and-retry, so bad credentials surface as
//! [`Error::Unauthorized`] instead of starting a refresh cycle.

// crates.io
use serde::{Deserializer, de};
// self
use crate::{
	_prelude::*,
	client::{ApiRequest, ApiResponse, AuthenticatedClient},
	http::ApiTransport,
	obs::{self, FlowKind},
	store::TokenStore,
	token::{TokenKind, TokenSecret},
};

/// Username/password credentials submitted to the login endpoint as a form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Username (the backend also accepts the email address here).
	pub username: String,
	/// Plain-text password; redacted from `Debug` output.
	pub password: String,
}
impl Credentials {
	/// Creates a credential pair.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: password.into() }
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Payload for account registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
	/// Email address.
	pub email: String,
	/// Username.
	pub username: String,
	/// Plain-text password; redacted from `Debug` output.
	pub password: String,
	/// Optional display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub full_name: Option<String>,
}
impl Debug for RegisterRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegisterRequest")
			.field("email", &self.email)
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("full_name", &self.full_name)
			.finish()
	}
}

/// User profile returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// Identifier; numeric identifiers are rendered as strings.
	#[serde(deserialize_with = "string_or_number")]
	pub id: String,
	/// Email address.
	pub email: String,
	/// Username.
	pub username: String,
	/// Display name.
	#[serde(default)]
	pub full_name: Option<String>,
	/// Whether the account is enabled.
	#[serde(default = "enabled")]
	pub is_active: bool,
	/// Whether the account has the admin role.
	#[serde(default)]
	pub is_admin: bool,
	/// Creation timestamp as sent by the backend.
	#[serde(default)]
	pub created_at: Option<String>,
	/// Last update timestamp as sent by the backend.
	#[serde(default)]
	pub updated_at: Option<String>,
	/// Last login timestamp as sent by the backend.
	#[serde(default)]
	pub last_login: Option<String>,
}

/// Tokens (and optionally the profile) issued on login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
	/// New access token.
	pub access_token: TokenSecret,
	/// New refresh token, when the backend issues one.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Token type, normally `bearer`.
	#[serde(default = "bearer")]
	pub token_type: String,
	/// Profile of the logged-in user.
	#[serde(default)]
	pub user: Option<User>,
	/// Access-token lifetime in seconds.
	#[serde(default)]
	pub expires_in: Option<u64>,
}

/// Partial profile update; unset fields are left out of the payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
	/// New email address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// New username.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	/// New display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub full_name: Option<String>,
}

/// Password change for the logged-in user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChange {
	/// Password currently in use.
	pub current_password: String,
	/// Replacement password.
	pub new_password: String,
}
impl PasswordChange {
	/// Creates a password change.
	pub fn new(current: impl Into<String>, new: impl Into<String>) -> Self {
		Self { current_password: current.into(), new_password: new.into() }
	}
}
impl Debug for PasswordChange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PasswordChange")
			.field("current_password", &"<redacted>")
			.field("new_password", &"<redacted>")
			.finish()
	}
}

/// Body-less success envelope returned by password and verification endpoints.
///
/// An empty response body counts as success.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
	/// Backend success flag.
	#[serde(default = "enabled")]
	pub success: bool,
	/// Human-readable message.
	#[serde(default)]
	pub message: Option<String>,
	/// Server timestamp as sent by the backend.
	#[serde(default)]
	pub timestamp: Option<String>,
}
impl Acknowledgement {
	fn from_response(response: &ApiResponse) -> Result<Self> {
		if response.body().iter().all(u8::is_ascii_whitespace) {
			return Ok(Self { success: true, message: None, timestamp: None });
		}

		response.json()
	}
}

/// Registration outcome: some backends log the new user in, others only return the profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Registration {
	/// The account was created and a session was issued; tokens have been stored.
	Session(AuthResponse),
	/// The account was created without a session.
	Account(User),
}

impl<T> AuthenticatedClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Logs in with a username and password and stores the issued tokens.
	pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
		obs::observe(FlowKind::Account, "login", async {
			let request = ApiRequest::post(self.config().endpoints.login.as_str())
				.form([
					("username", credentials.username.as_str()),
					("password", credentials.password.as_str()),
				])
				.without_refresh();
			let session: AuthResponse = self.execute(request).await?.json()?;

			store_session(self.store().as_ref(), &session)?;

			Ok::<_, Error>(session)
		})
		.await
	}

	/// Registers a new account, storing tokens when the backend issues them.
	pub async fn register(&self, payload: &RegisterRequest) -> Result<Registration> {
		obs::observe(FlowKind::Account, "register", async {
			let request = ApiRequest::post(self.config().endpoints.register.as_str())
				.json(payload)?
				.without_refresh();
			let registration: Registration = self.execute(request).await?.json()?;

			if let Registration::Session(session) = &registration {
				store_session(self.store().as_ref(), session)?;
			}

			Ok::<_, Error>(registration)
		})
		.await
	}

	/// Ends the session on the backend and clears both tokens.
	///
	/// Tokens are cleared even when the logout call fails; the call's error is still returned.
	pub async fn logout(&self) -> Result<()> {
		obs::observe(FlowKind::Account, "logout", async {
			let request =
				ApiRequest::post(self.config().endpoints.logout.as_str()).without_refresh();
			let outcome = self.execute(request).await.map(|_| ());
			let cleared = self.store().clear_all();

			outcome?;

			cleared.map_err(Error::from)
		})
		.await
	}

	/// Fetches the profile of the logged-in user.
	pub async fn current_user(&self) -> Result<User> {
		let path = self.config().endpoints.me.as_str();

		obs::observe(FlowKind::Account, "current_user", self.get_json(path)).await
	}

	/// Updates the logged-in user's profile and returns the stored result.
	pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
		let path = self.config().endpoints.profile.as_str();

		obs::observe(FlowKind::Account, "update_profile", self.put_json(path, update)).await
	}

	/// Changes the logged-in user's password.
	pub async fn change_password(&self, change: &PasswordChange) -> Result<Acknowledgement> {
		let request =
			ApiRequest::post(self.config().endpoints.change_password.as_str()).json(change)?;

		self.acknowledged("change_password", request).await
	}

	/// Asks the backend to email a password-reset link to `email`.
	///
	/// Password-reset and verification calls are made by visitors without a session, so they
	/// never start a refresh cycle.
	pub async fn request_password_reset(&self, email: &str) -> Result<Acknowledgement> {
		let request = ApiRequest::post(self.config().endpoints.password_reset.as_str())
			.json(&serde_json::json!({ "email": email }))?
			.without_refresh();

		self.acknowledged("request_password_reset", request).await
	}

	/// Sets a new password using the token from a reset email.
	pub async fn confirm_password_reset(
		&self,
		token: &str,
		new_password: &str,
	) -> Result<Acknowledgement> {
		let request = ApiRequest::post(self.config().endpoints.password_reset_confirm.as_str())
			.json(&serde_json::json!({ "token": token, "new_password": new_password }))?
			.without_refresh();

		self.acknowledged("confirm_password_reset", request).await
	}

	/// Confirms an email address using the token from a verification email.
	pub async fn verify_email(&self, token: &str) -> Result<Acknowledgement> {
		let request = ApiRequest::post(self.config().endpoints.verify_email.as_str())
			.json(&serde_json::json!({ "token": token }))?
			.without_refresh();

		self.acknowledged("verify_email", request).await
	}

	async fn acknowledged(
		&self,
		stage: &'static str,
		request: ApiRequest,
	) -> Result<Acknowledgement> {
		obs::observe(FlowKind::Account, stage, async {
			let response = self.execute(request).await?;

			Acknowledgement::from_response(&response)
		})
		.await
	}
}

fn store_session(store: &dyn TokenStore, session: &AuthResponse) -> Result<()> {
	store.set(TokenKind::Access, session.access_token.clone())?;

	if let Some(refresh) = session.refresh_token.as_ref().filter(|token| !token.is_empty()) {
		store.set(TokenKind::Refresh, refresh.clone())?;
	}

	Ok(())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Id {
		Text(String),
		Number(i64),
	}

	match Id::deserialize(deserializer) {
		Ok(Id::Text(id)) => Ok(id),
		Ok(Id::Number(id)) => Ok(id.to_string()),
		Err(_) => Err(de::Error::custom("expected a string or integer identifier")),
	}
}

fn enabled() -> bool {
	true
}

fn bearer() -> String {
	"bearer".into()
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicBool, Ordering};
	// crates.io
	use ::http::StatusCode;
	// self
	use super::*;
	use crate::{_preludet::*, http::HttpResponse, store::MemoryStore};

	fn user_json() -> serde_json::Value {
		serde_json::json!({
			"id": 7,
			"email": "ana@example.com",
			"username": "ana",
			"is_active": true,
			"is_admin": false,
			"created_at": "2025-01-01T00:00:00"
		})
	}

	#[tokio::test]
	async fn login_posts_form_and_stores_tokens() {
		let store = Arc::new(MemoryStore::default());
		let (client, _) = build_scripted_client(store.clone(), |request| {
			let body = String::from_utf8_lossy(request.body()).into_owned();
			let path = request.uri().path().to_owned();

			async move {
				assert_eq!(path, "/api/v1/auth/login");
				assert_eq!(body, "username=ana&password=s3cret");

				Ok(json_response(
					200,
					serde_json::json!({
						"access_token": "access-1",
						"refresh_token": "refresh-1",
						"token_type": "bearer",
						"user": user_json(),
					}),
				))
			}
		});
		let session = client
			.login(&Credentials::new("ana", "s3cret"))
			.await
			.expect("Login should succeed.");
		let pair = store.pair().expect("Login should store both tokens.");

		assert_eq!(session.user.map(|user| user.id), Some("7".to_owned()));
		assert_eq!(pair.access_token.expose(), "access-1");
		assert_eq!(pair.refresh_token.expose(), "refresh-1");
	}

	#[tokio::test]
	async fn rejected_login_does_not_refresh() {
		let store = Arc::new(MemoryStore::default());
		let (client, navigator) = build_scripted_client(store.clone(), |_| async {
			Ok(json_response(401, serde_json::json!({ "detail": "Incorrect username or password" })))
		});
		let err = client
			.login(&Credentials::new("ana", "wrong"))
			.await
			.expect_err("Bad credentials should fail.");

		assert!(matches!(err, Error::Unauthorized(_)));
		assert!(store.is_empty());
		assert_eq!(client.refresh_metrics().attempts(), 0);
		assert_eq!(navigator.count(), 0);
	}

	#[tokio::test]
	async fn register_accepts_profile_only_responses() {
		let store = Arc::new(MemoryStore::default());
		let (client, _) =
			build_scripted_client(store.clone(), |_| async { Ok(json_response(201, user_json())) });
		let registration = client
			.register(&RegisterRequest {
				email: "ana@example.com".into(),
				username: "ana".into(),
				password: "s3cret".into(),
				full_name: None,
			})
			.await
			.expect("Registration should succeed.");

		assert!(matches!(registration, Registration::Account(User { ref username, .. }) if username == "ana"));
		assert!(store.is_empty());
	}

	#[tokio::test]
	async fn logout_clears_tokens_even_when_the_call_fails() {
		let store = seeded_store("access", "refresh");
		let called = Arc::new(AtomicBool::new(false));
		let flag = called.clone();
		let (client, _) = build_scripted_client(store.clone(), move |request| {
			flag.store(true, Ordering::SeqCst);

			let bearer = bearer_of(&request);

			async move {
				assert_eq!(bearer.as_deref(), Some("access"));

				Ok(json_response(503, serde_json::json!({ "detail": "Maintenance" })))
			}
		});
		let err = client.logout().await.expect_err("Logout failures are reported.");

		assert!(matches!(err, Error::Server(_)));
		assert!(called.load(Ordering::SeqCst));
		assert!(store.is_empty());
	}

	#[tokio::test]
	async fn password_reset_rejections_do_not_end_the_session() {
		let store = seeded_store("access", "refresh");
		let (client, navigator) = build_scripted_client(store.clone(), |request| {
			let body = String::from_utf8_lossy(request.body()).into_owned();

			async move {
				assert_eq!(body, r#"{"new_password":"n3w","token":"expired-link"}"#);

				Ok(json_response(401, serde_json::json!({ "detail": "Reset token expired" })))
			}
		});
		let err = client
			.confirm_password_reset("expired-link", "n3w")
			.await
			.expect_err("Expired reset tokens should fail.");

		assert!(matches!(err, Error::Unauthorized(_)));
		assert_eq!(client.refresh_metrics().attempts(), 0);
		assert_eq!(navigator.count(), 0);
		assert!(store.pair().is_some());
	}

	#[tokio::test]
	async fn empty_acknowledgements_count_as_success() {
		let (client, _) = build_scripted_client(seeded_store("access", "refresh"), |request| {
			let path = request.uri().path().to_owned();

			async move {
				assert_eq!(path, "/api/v1/auth/verify-email");

				let mut response = HttpResponse::new(Vec::new());

				*response.status_mut() = StatusCode::NO_CONTENT;

				Ok(response)
			}
		});
		let ack = client.verify_email("mail-token").await.expect("Verification should succeed.");

		assert!(ack.success);
		assert_eq!(ack.message, None);
	}

	#[test]
	fn password_change_debug_is_redacted() {
		let rendered = format!("{:?}", PasswordChange::new("old-secret", "new-secret"));

		assert!(!rendered.contains("old-secret"));
		assert!(!rendered.contains("new-secret"));
	}

	#[test]
	fn credentials_debug_is_redacted() {
		let rendered = format!("{:?}", Credentials::new("ana", "s3cret"));

		assert!(rendered.contains("ana"));
		assert!(!rendered.contains("s3cret"));
	}
}
