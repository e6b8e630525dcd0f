//! Centralised logging metadata (event names, shared keys, etc.).

/// Canonical event names used across the service.
pub mod events {
    /// HTTP request lifecycle.
    pub const REQUEST_START: &str = "request.start";
    pub const REQUEST_COMPLETE: &str = "request.complete";
    pub const REQUEST_ERROR: &str = "request.error";
    pub const REQUEST_SLOW: &str = "request.slow";

    /// Authentication flow.
    pub const AUTH_CHECK: &str = "auth.check";
    pub const AUTH_SUCCESS: &str = "auth.success";
    pub const AUTH_FAILURE: &str = "auth.failure";
    pub const AUTH_ERROR: &str = "auth.error";

    /// Account lifecycle.
    pub const ACCOUNT_REGISTERED: &str = "account.registered";
    pub const ACCOUNT_REGISTER_REJECTED: &str = "account.register_rejected";

    /// Document analysis.
    pub const ANALYSIS_RECEIVED: &str = "analysis.received";
    pub const ANALYSIS_REJECTED: &str = "analysis.rejected";
    pub const ANALYSIS_COMPLETE: &str = "analysis.complete";
    pub const ANALYSIS_ERROR: &str = "analysis.error";
    pub const REPORT_PERSIST_FAILED: &str = "analysis.report_persist_failed";
}

/// Shared tracing targets.
pub mod targets {
    pub const HTTP_SERVER: &str = "http.server";
    pub const SECURITY: &str = "security";
}
