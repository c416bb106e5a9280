//! Security audit logging
//!
//! Structured records for token issuance, rejected credentials, denied
//! access and privileged mutations (role changes, deletions, listing
//! approval).
//!
//! All audit events are logged at INFO level with the "audit" target so they
//! can be filtered and routed separately from application logs, e.g.
//! `RUST_LOG=audit=info`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Access token issued
    TokenIssued {
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Missing, malformed, expired or tampered token
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },

    /// Verified identity lacked the required role or ownership
    AccessDenied {
        email: Option<String>,
        resource: String,
        required_role: Option<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// New user record created
    UserRegistered {
        user_id: String,
        email: String,
        ip_address: Option<String>,
    },

    /// Role assigned to a user
    RoleChanged {
        user_id: String,
        role: String,
        changed_by: String,
        modified: bool,
    },

    /// User record removed
    UserDeleted {
        user_id: String,
        deleted_by: String,
        deleted: bool,
    },

    /// Listing approved
    PropertyAccepted {
        property_id: String,
        accepted_by: String,
    },
}

impl AuditEvent {
    fn summary(&self) -> &'static str {
        match self {
            AuditEvent::TokenIssued { .. } => "Token issued",
            AuditEvent::InvalidToken { .. } => "Invalid token",
            AuditEvent::AccessDenied { .. } => "Access denied",
            AuditEvent::UserRegistered { .. } => "User registered",
            AuditEvent::RoleChanged { .. } => "Role changed",
            AuditEvent::UserDeleted { .. } => "User deleted",
            AuditEvent::PropertyAccepted { .. } => "Property accepted",
        }
    }
}

/// Log a security audit event with structured fields
///
/// The event is serialized to JSON in the `event` field. Example output:
///
/// ```json
/// {
///   "event_type": "access_denied",
///   "email": "user@example.com",
///   "resource": "DELETE /users/42",
///   "required_role": "admin",
///   "ip_address": "192.168.1.1",
///   "user_agent": "Mozilla/5.0..."
/// }
/// ```
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::TokenIssued { email, ip_address, .. } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = %email,
                ip_address = ?ip_address,
                "{}", event.summary()
            );
        }
        AuditEvent::InvalidToken {
            ip_address, reason, ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                ip_address = ?ip_address,
                reason = %reason,
                "{}", event.summary()
            );
        }
        AuditEvent::AccessDenied {
            email,
            resource,
            required_role,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                email = ?email,
                resource = %resource,
                required_role = ?required_role,
                ip_address = ?ip_address,
                "{}", event.summary()
            );
        }
        _ => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                "{}", event.summary()
            );
        }
    }
}

/// Extract the client IP address from proxy headers
///
/// Checks X-Forwarded-For, then X-Real-IP.
pub fn extract_ip_address(headers: &axum::http::HeaderMap) -> Option<String> {
    // Take the first IP in the chain (client IP)
    if let Some(first_ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
    {
        return Some(first_ip.trim().to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract user agent from request headers
pub fn extract_user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
