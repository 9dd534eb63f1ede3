//! Static route partition consulted by the guard.

// self
use crate::_prelude::*;

/// Enumerated route lists; fixed once the guard is constructed.
///
/// Prefixes match whole path segments: `/admin` covers `/admin` and `/admin/users` but not
/// `/administrator`. The root entry `/` only matches the root itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
	/// Prefixes that require an authenticated session.
	pub protected: Vec<String>,
	/// Prefixes that require an administrator.
	pub admin: Vec<String>,
	/// Prefixes reachable without a session.
	pub public: Vec<String>,
	/// Login/registration pages; authenticated sessions are sent home instead.
	pub auth_entry: Vec<String>,
	/// Prefixes the guard never redirects (API routes, build assets).
	pub bypass: Vec<String>,
	/// Login entry point.
	pub login_page: String,
	/// Landing page for authenticated sessions.
	pub home_page: String,
	/// Query parameter carrying the originally requested path.
	pub return_param: String,
}
impl RouteTable {
	/// Returns `true` if `path` falls under a protected prefix.
	pub fn is_protected(&self, path: &str) -> bool {
		any_prefix(&self.protected, path)
	}

	/// Returns `true` if `path` falls under an admin prefix.
	pub fn is_admin(&self, path: &str) -> bool {
		any_prefix(&self.admin, path)
	}

	/// Returns `true` if `path` falls under a public prefix.
	pub fn is_public(&self, path: &str) -> bool {
		any_prefix(&self.public, path)
	}

	/// Returns `true` if `path` is exactly one of the auth-entry pages.
	pub fn is_auth_entry(&self, path: &str) -> bool {
		let path = trim_trailing_slash(path);

		self.auth_entry.iter().any(|entry| trim_trailing_slash(entry) == path)
	}

	/// Returns `true` for API routes, build assets, and file-like paths.
	pub fn is_bypassed(&self, path: &str) -> bool {
		any_prefix(&self.bypass, path)
			|| path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
	}

	/// Login page URL carrying `return_path` in [`RouteTable::return_param`].
	pub fn login_location(&self, return_path: &str) -> String {
		let query = url::form_urlencoded::Serializer::new(String::new())
			.append_pair(&self.return_param, return_path)
			.finish();

		format!("{}?{query}", self.login_page)
	}
}
impl Default for RouteTable {
	fn default() -> Self {
		Self {
			protected: owned(&["/dashboard", "/detection", "/history", "/profile", "/settings"]),
			admin: owned(&["/admin"]),
			public: owned(&[
				"/login",
				"/register",
				"/auth/login",
				"/auth/register",
				"/auth/forgot-password",
				"/auth/reset-password",
				"/forgot-password",
				"/reset-password",
				"/",
			]),
			auth_entry: owned(&["/login", "/register", "/auth/login", "/auth/register"]),
			bypass: owned(&["/api", "/_next/static", "/_next/image", "/favicon.ico", "/public"]),
			login_page: "/login".into(),
			home_page: "/dashboard".into(),
			return_param: "callbackUrl".into(),
		}
	}
}

/// Strips the query string and fragment from a request target.
pub(crate) fn route_path(target: &str) -> &str {
	let end = target.find(['?', '#']).unwrap_or(target.len());

	&target[..end]
}

fn any_prefix(prefixes: &[String], path: &str) -> bool {
	prefixes.iter().any(|prefix| matches_prefix(prefix, path))
}

fn matches_prefix(prefix: &str, path: &str) -> bool {
	if prefix == "/" {
		return path == "/";
	}

	let prefix = trim_trailing_slash(prefix);

	path.strip_prefix(prefix).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn trim_trailing_slash(path: &str) -> &str {
	match path.strip_suffix('/') {
		Some(trimmed) if !trimmed.is_empty() => trimmed,
		_ => path,
	}
}

fn owned(values: &[&str]) -> Vec<String> {
	values.iter().map(|value| (*value).to_owned()).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn prefixes_match_whole_segments() {
		let table = RouteTable::default();

		assert!(table.is_admin("/admin"));
		assert!(table.is_admin("/admin/users"));
		assert!(!table.is_admin("/administrator"));
		assert!(table.is_protected("/detection/42/result"));
		assert!(table.is_public("/"));
		assert!(!table.is_public("/dashboard"));
		assert!(table.is_public("/auth/reset-password/abc"));
	}

	#[test]
	fn auth_entry_pages_match_exactly() {
		let table = RouteTable::default();

		assert!(table.is_auth_entry("/login"));
		assert!(table.is_auth_entry("/auth/register/"));
		assert!(!table.is_auth_entry("/login/help"));
		assert!(!table.is_auth_entry("/forgot-password"));
	}

	#[test]
	fn assets_and_api_routes_are_bypassed() {
		let table = RouteTable::default();

		assert!(table.is_bypassed("/api/v1/detections"));
		assert!(table.is_bypassed("/_next/static/chunk.js"));
		assert!(table.is_bypassed("/favicon.ico"));
		assert!(table.is_bypassed("/dashboard/report.pdf"));
		assert!(!table.is_bypassed("/apiary"));
		assert!(!table.is_bypassed("/dashboard"));
	}

	#[test]
	fn login_location_encodes_return_path() {
		let table = RouteTable::default();

		assert_eq!(table.login_location("/dashboard"), "/login?callbackUrl=%2Fdashboard");
		assert_eq!(route_path("/history?page=2#top"), "/history");
	}
}
