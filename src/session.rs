//! Per-request session state and access-token verification.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
// self
use crate::_prelude::*;

/// Role granted by the access token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Regular account.
	#[default]
	User,
	/// Administrator.
	Admin,
}

/// Authentication facts used for a single routing decision; never cached across requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionState {
	/// Whether a valid access token accompanied the request.
	pub authenticated: bool,
	/// Role claimed by the token; [`Role::User`] for anonymous sessions.
	pub role: Role,
}
impl SessionState {
	/// Session without a valid token.
	pub const fn anonymous() -> Self {
		Self { authenticated: false, role: Role::User }
	}

	/// Authenticated session with the provided role.
	pub const fn authenticated(role: Role) -> Self {
		Self { authenticated: true, role }
	}

	/// Authenticated regular user.
	pub const fn user() -> Self {
		Self::authenticated(Role::User)
	}

	/// Authenticated administrator.
	pub const fn admin() -> Self {
		Self::authenticated(Role::Admin)
	}

	/// Returns `true` for authenticated administrators only.
	pub fn is_admin(&self) -> bool {
		self.authenticated && self.role == Role::Admin
	}
}

/// Claims carried by access tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
	/// Subject (username).
	pub sub: String,
	/// Expiry as a Unix timestamp.
	pub exp: i64,
	/// Issue time as a Unix timestamp.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iat: Option<i64>,
	/// Email address, when embedded.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Administrator flag.
	#[serde(default)]
	pub is_admin: bool,
}
impl AccessClaims {
	/// Role derived from the administrator flag.
	pub fn role(&self) -> Role {
		if self.is_admin { Role::Admin } else { Role::User }
	}
}

/// Verifies access tokens and derives the [`SessionState`] for a routing decision.
#[derive(Clone)]
pub struct SessionVerifier {
	key: DecodingKey,
	validation: Validation,
}
impl SessionVerifier {
	/// Verifier for HS256 tokens signed with `secret`.
	pub fn hs256(secret: impl AsRef<[u8]>) -> Self {
		Self::new(DecodingKey::from_secret(secret.as_ref()), Algorithm::HS256)
	}

	/// Verifier for tokens signed with `algorithm`; expiry is always validated.
	pub fn new(key: DecodingKey, algorithm: Algorithm) -> Self {
		let mut validation = Validation::new(algorithm);

		validation.validate_exp = true;

		Self { key, validation }
	}

	/// Overrides the clock-skew allowance applied to `exp`, in seconds.
	pub fn with_leeway(mut self, seconds: u64) -> Self {
		self.validation.leeway = seconds;

		self
	}

	/// Decodes and validates `token`.
	pub fn claims(&self, token: &str) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
		jsonwebtoken::decode::<AccessClaims>(token, &self.key, &self.validation)
			.map(|data| data.claims)
	}

	/// Session for an optional token; missing, malformed, or expired tokens are anonymous.
	pub fn session(&self, token: Option<&str>) -> SessionState {
		token
			.filter(|token| !token.is_empty())
			.and_then(|token| self.claims(token).ok())
			.map(|claims| SessionState::authenticated(claims.role()))
			.unwrap_or_else(SessionState::anonymous)
	}
}
impl Debug for SessionVerifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionVerifier")
			.field("algorithms", &self.validation.algorithms)
			.field("leeway", &self.validation.leeway)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use jsonwebtoken::{EncodingKey, Header};
	// self
	use super::*;

	const SECRET: &[u8] = b"unit-test-secret";

	fn sign(is_admin: bool, exp_offset: i64) -> String {
		let claims = AccessClaims {
			sub: "ana".into(),
			exp: OffsetDateTime::now_utc().unix_timestamp() + exp_offset,
			iat: None,
			email: Some("ana@example.com".into()),
			is_admin,
		};

		jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET))
			.expect("Failed to sign test token.")
	}

	#[test]
	fn valid_tokens_map_admin_claim_to_role() {
		let verifier = SessionVerifier::hs256(SECRET);

		assert_eq!(verifier.session(Some(&sign(false, 3600))), SessionState::user());
		assert_eq!(verifier.session(Some(&sign(true, 3600))), SessionState::admin());
		assert_eq!(
			verifier.claims(&sign(true, 3600)).expect("Token should verify.").sub,
			"ana"
		);
	}

	#[test]
	fn unusable_tokens_are_anonymous() {
		let verifier = SessionVerifier::hs256(SECRET).with_leeway(0);
		let foreign = SessionVerifier::hs256(b"another-secret");

		assert_eq!(verifier.session(None), SessionState::anonymous());
		assert_eq!(verifier.session(Some("")), SessionState::anonymous());
		assert_eq!(verifier.session(Some("not.a.jwt")), SessionState::anonymous());
		assert_eq!(verifier.session(Some(&sign(true, -120))), SessionState::anonymous());
		assert_eq!(foreign.session(Some(&sign(true, 3600))), SessionState::anonymous());
	}

	#[test]
	fn only_authenticated_admins_are_admins() {
		assert!(SessionState::admin().is_admin());
		assert!(!SessionState::user().is_admin());
		assert!(!SessionState { authenticated: false, role: Role::Admin }.is_admin());
	}
}
