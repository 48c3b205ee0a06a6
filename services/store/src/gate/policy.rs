//! Path-based access policy, evaluated before any page or handler logic.

use vitrin_session_types::context::SessionUser;

/// Admin area root; the path itself is the admin login page.
pub const ADMIN_ROOT: &str = "/admin";

/// Customer account area root.
pub const ACCOUNT_ROOT: &str = "/account";

/// Registration lives under the account root but must stay reachable
/// without a session.
pub const REGISTER_PATH: &str = "/account/register";

/// Customer login page.
pub const LOGIN_PATH: &str = "/login";

const STATIC_PREFIXES: &[&str] = &["/static/", "/assets/"];

const INTERNAL_PATHS: &[&str] = &["/healthz", "/readyz"];

const ASSET_EXTENSIONS: &[&str] = &[
    ".js", ".css", ".map", ".ico", ".png", ".jpg", ".jpeg", ".svg", ".webp", ".woff", ".woff2",
    ".txt",
];

/// Outcome of evaluating the policy table for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// 307 to the given location. Temporary on purpose: authorization state
    /// changes within a session, so the client must re-check.
    Redirect(String),
}

/// True for paths the gate passes through without any identity resolution.
pub fn is_bypassed(path: &str) -> bool {
    if STATIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    if INTERNAL_PATHS.contains(&path) {
        return true;
    }
    ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Evaluate the policy table. Most-specific rule wins; rules are checked in
/// specificity order.
///
/// `original` is the path plus query string of the incoming request, used
/// as the post-login return target.
pub fn authorize(path: &str, user: Option<&SessionUser>, original: &str) -> Decision {
    // Admin root is the admin login page — reachable by anyone.
    if path == ADMIN_ROOT {
        return Decision::Allow;
    }
    if let Some(rest) = path.strip_prefix(ADMIN_ROOT) {
        if rest.starts_with('/') {
            return match user {
                Some(u) if u.role.is_admin() => Decision::Allow,
                _ => Decision::Redirect(ADMIN_ROOT.to_owned()),
            };
        }
    }

    if path == REGISTER_PATH || path.starts_with("/account/register/") {
        return Decision::Allow;
    }
    if path == ACCOUNT_ROOT || path.starts_with("/account/") {
        return match user {
            Some(_) => Decision::Allow,
            None => Decision::Redirect(login_redirect(original)),
        };
    }

    if path == LOGIN_PATH {
        // A signed-in customer has no business on the login form. Admins are
        // exempt: they may sign into a separate customer account.
        return match user {
            Some(u) if !u.role.is_admin() => Decision::Redirect(ACCOUNT_ROOT.to_owned()),
            _ => Decision::Allow,
        };
    }

    Decision::Allow
}

/// Build the login redirect, carrying the original destination URL-encoded
/// so the login page can send the user back after authentication.
fn login_redirect(original: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(original.as_bytes()).collect();
    format!("{LOGIN_PATH}?return_url={encoded}")
}
