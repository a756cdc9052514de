//! Push payload → user notification mapping. Pure, no state.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_BODY: &str = "New update available";
pub const ICON: &str = "/icon-192x192.png";
pub const BADGE: &str = "/badge-72x72.png";
pub const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

pub const ACTION_EXPLORE: &str = "explore";
pub const ACTION_CLOSE: &str = "close";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: u64,
    pub primary_key: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationDescriptor {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// What the host should do after a notification click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    OpenWindow(String),
    Dismiss,
}

/// Build the notification for an inbound push. A missing or empty payload
/// gets a generic body.
pub fn notification_for_push(
    title: &str,
    payload: Option<&str>,
    arrived_at: SystemTime,
) -> NotificationDescriptor {
    let body = payload
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_BODY)
        .to_string();
    let date_of_arrival = arrived_at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    NotificationDescriptor {
        title: title.to_string(),
        body,
        icon: ICON.to_string(),
        badge: BADGE.to_string(),
        vibrate: VIBRATE_PATTERN.to_vec(),
        data: NotificationData {
            date_of_arrival,
            primary_key: 1,
        },
        actions: vec![
            NotificationAction {
                action: ACTION_EXPLORE.to_string(),
                title: "Go to App".to_string(),
                icon: "/icon-explore.png".to_string(),
            },
            NotificationAction {
                action: ACTION_CLOSE.to_string(),
                title: "Close".to_string(),
                icon: "/icon-close.png".to_string(),
            },
        ],
    }
}

/// `explore` opens the application root; anything else just closes.
pub fn on_notification_click(action: Option<&str>) -> ClickOutcome {
    match action {
        Some(ACTION_EXPLORE) => ClickOutcome::OpenWindow("/".to_string()),
        _ => ClickOutcome::Dismiss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_payload_becomes_body() {
        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_000);
        let n = notification_for_push("Update", Some("Version 2 is out"), at);
        assert_eq!(n.title, "Update");
        assert_eq!(n.body, "Version 2 is out");
        assert_eq!(n.data.date_of_arrival, 1_700_000_000_000);
        let actions: Vec<_> = n.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, vec!["explore", "close"]);
    }

    #[test]
    fn test_missing_payload_uses_default_body() {
        assert_eq!(notification_for_push("t", None, UNIX_EPOCH).body, DEFAULT_BODY);
        assert_eq!(notification_for_push("t", Some(""), UNIX_EPOCH).body, DEFAULT_BODY);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let at = SystemTime::now();
        assert_eq!(
            notification_for_push("t", Some("x"), at),
            notification_for_push("t", Some("x"), at)
        );
    }

    #[test]
    fn test_click_actions() {
        assert_eq!(
            on_notification_click(Some("explore")),
            ClickOutcome::OpenWindow("/".into())
        );
        assert_eq!(on_notification_click(Some("close")), ClickOutcome::Dismiss);
        assert_eq!(on_notification_click(None), ClickOutcome::Dismiss);
    }

    #[test]
    fn test_serializes_for_host() {
        let n = notification_for_push("t", Some("b"), UNIX_EPOCH);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["vibrate"], serde_json::json!([100, 50, 100]));
        assert_eq!(json["actions"][0]["icon"], "/icon-explore.png");
    }
}
