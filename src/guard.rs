//! Role-aware navigation guard.
//!
//! [`RouteGuard::decide`] is pure: identical inputs always yield the same [`Decision`], and the
//! session it receives is never mutated or cached. [`RouteGuard::enforce`] additionally forwards
//! redirects to the injected [`Navigator`].

pub mod table;

pub use table::RouteTable;

// self
use crate::{
	_prelude::*,
	guard::table::route_path,
	nav::Navigator,
	obs::{self, FlowKind, FlowOutcome, FlowSpan, RedirectTarget},
	session::SessionState,
};

/// Outcome of a routing decision.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Decision {
	/// Let the navigation proceed.
	Allow,
	/// Send the visitor to the login page, carrying the requested path.
	RedirectLogin(String),
	/// Send the visitor to the home page.
	RedirectHome,
}
impl Decision {
	/// Redirect target for this decision, or `None` for [`Decision::Allow`].
	pub fn location(&self, table: &RouteTable) -> Option<String> {
		match self {
			Decision::Allow => None,
			Decision::RedirectLogin(return_path) => Some(table.login_location(return_path)),
			Decision::RedirectHome => Some(table.home_page.clone()),
		}
	}

	/// Returns `true` for [`Decision::Allow`].
	pub fn is_allow(&self) -> bool {
		matches!(self, Decision::Allow)
	}
}

/// Independent classification flags for a path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RouteClass {
	/// Under a protected prefix.
	pub protected: bool,
	/// Under an admin prefix.
	pub admin: bool,
	/// Under a public prefix.
	pub public: bool,
	/// One of the login/registration pages.
	pub auth_entry: bool,
	/// Never redirected (API routes, build assets, files).
	pub bypassed: bool,
}

/// Decides whether a navigation is allowed or redirected.
#[derive(Clone)]
pub struct RouteGuard {
	table: RouteTable,
	navigator: Arc<dyn Navigator>,
}
impl RouteGuard {
	/// Creates a guard over `table` that forwards redirects to `navigator`.
	pub fn new(table: RouteTable, navigator: Arc<dyn Navigator>) -> Self {
		Self { table, navigator }
	}

	/// Route table in use.
	pub fn table(&self) -> &RouteTable {
		&self.table
	}

	/// Classifies `path` without looking at any session.
	pub fn classify(&self, path: &str) -> RouteClass {
		let path = route_path(path);

		RouteClass {
			protected: self.table.is_protected(path),
			admin: self.table.is_admin(path),
			public: self.table.is_public(path),
			auth_entry: self.table.is_auth_entry(path),
			bypassed: self.table.is_bypassed(path),
		}
	}

	/// Decides the navigation to `path` for `session`.
	///
	/// Admin routes are checked before plain protected routes so that an authenticated
	/// non-admin is sent home rather than allowed. Public status only matters through the
	/// auth-entry rule; it never exempts a path from the protected or admin checks.
	pub fn decide(&self, path: &str, session: &SessionState) -> Decision {
		let class = self.classify(path);
		let path = route_path(path);

		if class.bypassed {
			return Decision::Allow;
		}
		if session.authenticated && class.auth_entry {
			return Decision::RedirectHome;
		}
		if class.admin {
			return match (session.authenticated, session.is_admin()) {
				(false, _) => Decision::RedirectLogin(path.to_owned()),
				(true, false) => Decision::RedirectHome,
				(true, true) => Decision::Allow,
			};
		}
		if class.protected && !session.authenticated {
			return Decision::RedirectLogin(path.to_owned());
		}

		Decision::Allow
	}

	/// Decides the navigation and forwards any redirect to the navigator.
	pub fn enforce(&self, path: &str, session: &SessionState) -> Decision {
		const KIND: FlowKind = FlowKind::Navigation;

		let span = FlowSpan::new(KIND, "enforce");
		let _entered = span.entered();
		let decision = self.decide(path, session);
		let target = match &decision {
			Decision::Allow => None,
			Decision::RedirectLogin(_) => Some(RedirectTarget::Login),
			Decision::RedirectHome => Some(RedirectTarget::Home),
		};

		if let (Some(target), Some(location)) = (target, decision.location(&self.table)) {
			obs::record_redirect(KIND, target);
			self.navigator.redirect(&location);
		}

		obs::record_flow_outcome(KIND, FlowOutcome::Success);
		span.record(FlowOutcome::Success);

		decision
	}
}
impl Debug for RouteGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RouteGuard").field("table", &self.table).finish_non_exhaustive()
	}
}
