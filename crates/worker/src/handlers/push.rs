//! Push: forward the payload to the host notification surface.

use shellcache_core::{AppConfig, Error};

use crate::host::{Host, NotificationData, NotificationOptions};

/// Implementation of the push operation.
///
/// Builds the notification from configuration, using the push payload as the
/// body when one is present. No store interaction.
pub async fn push_impl(config: &AppConfig, host: &dyn Host, data: Option<String>) -> Result<(), Error> {
    let n = &config.notification;

    let options = NotificationOptions {
        body: data.unwrap_or_else(|| n.default_body.clone()),
        icon: n.icon.clone(),
        badge: n.badge.clone(),
        vibrate: n.vibrate.clone(),
        data: NotificationData {
            date_of_arrival: chrono::Utc::now().timestamp_millis(),
            primary_key: n.primary_key,
        },
    };

    host.show_notification(&n.title, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{RecordingHost, test_config};

    #[tokio::test]
    async fn test_push_without_payload_uses_defaults() {
        let config = test_config();
        let host = RecordingHost::default();

        push_impl(&config, &host, None).await.unwrap();

        let (title, options) = host.last_notification().unwrap();
        assert_eq!(title, "Retirement Calculator");
        assert_eq!(options.body, "New update available");
        assert_eq!(options.icon, "./icon-192.png");
        assert_eq!(options.badge, "./icon-192.png");
        assert_eq!(options.vibrate, vec![100, 50, 100]);
        assert_eq!(options.data.primary_key, 1);
        assert!(options.data.date_of_arrival > 0);
    }

    #[tokio::test]
    async fn test_push_with_payload_becomes_body() {
        let config = test_config();
        let host = RecordingHost::default();

        push_impl(&config, &host, Some("Rates updated".into())).await.unwrap();

        let (_, options) = host.last_notification().unwrap();
        assert_eq!(options.body, "Rates updated");
    }
}
