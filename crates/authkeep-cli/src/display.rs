//! Plain-text rendering of session identities for the terminal.

use authkeep_core::SessionIdentity;
use chrono::{DateTime, Utc};

/// Placeholder for absent fields
const NONE: &str = "-";

pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| NONE.to_string())
}

/// Describe how long until `expires_at`, e.g. "expires in 1h 5m" or "expired".
pub fn format_remaining(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(expires_at) = expires_at else {
        return "no expiry".to_string();
    };

    let minutes = (expires_at - now).num_minutes();
    if expires_at <= now {
        "expired".to_string()
    } else if minutes < 1 {
        "expires in under a minute".to_string()
    } else if minutes < 60 {
        format!("expires in {}m", minutes)
    } else if minutes < 1440 {
        format!("expires in {}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("expires in {}d", minutes / 1440)
    }
}

pub fn format_permissions(permissions: Option<&[i64]>) -> String {
    match permissions {
        Some(p) if !p.is_empty() => p
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Some(_) => "(none)".to_string(),
        None => NONE.to_string(),
    }
}

pub fn format_identity(identity: &SessionIdentity, now: DateTime<Utc>) -> String {
    let role = match (identity.role.as_deref(), identity.id) {
        (Some(role), Some(id)) => format!("{} (group {})", role, id),
        (Some(role), None) => role.to_string(),
        (None, Some(id)) => format!("group {}", id),
        (None, None) => NONE.to_string(),
    };

    [
        format!("Username:    {}", identity.username.as_deref().unwrap_or(NONE)),
        format!("Role:        {}", role),
        format!("Description: {}", identity.description.as_deref().unwrap_or(NONE)),
        format!("Permissions: {}", format_permissions(identity.permissions.as_deref())),
        format!("Issued:      {}", format_timestamp(identity.issued_at())),
        format!(
            "Expires:     {} ({})",
            format_timestamp(identity.expires_at()),
            format_remaining(identity.expires_at(), now)
        ),
    ]
    .join("\n")
}
