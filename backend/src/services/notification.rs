//! Outbound domain event delivery
//!
//! Events are fire-and-forget: delivery happens on a detached task after the
//! owning transaction has committed, and a delivery failure is logged but
//! never rolls back or fails the data mutation that produced the event.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use shared::models::StocktakeLine;

use crate::config::Config;

/// Domain events emitted by the reconciliation core
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A stocktake line was recomputed after a ledger or count change
    LineRecomputed {
        line_id: Uuid,
        old: Box<StocktakeLine>,
        new: Box<StocktakeLine>,
    },
    /// A stocktake was approved and its period closed
    StocktakeApproved {
        stocktake_id: Uuid,
        period_id: Uuid,
        total_variance_value: Decimal,
    },
}

/// Notification service delivering domain events to a configured webhook
#[derive(Clone)]
pub struct NotificationService {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl NotificationService {
    pub fn from_config(config: &Config) -> Self {
        let webhook_url = if config.notification.enabled {
            config.notification.webhook_url.clone()
        } else {
            None
        };
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    /// Emit an event without waiting for delivery
    pub fn emit(&self, event: DomainEvent) {
        let Some(url) = self.webhook_url.clone() else {
            tracing::debug!("Notification delivery disabled, dropping event: {:?}", event);
            return;
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&event).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!("Delivered domain event to {}", url);
                }
                Ok(response) => {
                    tracing::warn!(
                        "Webhook at {} rejected domain event: {}",
                        url,
                        response.status()
                    );
                }
                Err(err) => {
                    tracing::warn!("Failed to deliver domain event to {}: {}", url, err);
                }
            }
        });
    }
}
