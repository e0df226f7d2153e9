// Build identity, reported on GET /version and sent upstream as the User-Agent

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// "name/version", e.g. "aquapercent/0.3.0".
pub fn user_agent() -> String {
    format!("{}/{}", NAME, VERSION)
}
