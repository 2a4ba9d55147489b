//! Storefront analytics events.
//!
//! Events are logged under the `analytics` tracing target and published on a
//! broadcast channel. Subscribers (a forwarder to an analytics backend, or a
//! test) receive every event emitted after they subscribe; with no
//! subscribers an event is only logged.

use serde::Serialize;
use tokio::sync::broadcast;

use beyond_wellness_core::CartSnapshot;

/// Buffered events per subscriber before the slowest one starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// Shop context attached to every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopContext {
    /// Shopify shop GID, when configured.
    pub shop_id: Option<String>,
    pub accepted_language: String,
    pub currency: String,
}

/// A product as reported in `product_viewed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductViewPayload {
    pub id: String,
    pub title: String,
    pub price: String,
    pub vendor: String,
    pub variant_id: String,
    pub variant_title: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    /// A product page was rendered with a selected variant.
    ProductViewed {
        products: Vec<ProductViewPayload>,
        shop: ShopContext,
        url: String,
    },
    /// The cart panel was opened.
    #[serde(rename_all = "camelCase")]
    CartViewed {
        cart: Option<CartSnapshot>,
        prev_cart: Option<CartSnapshot>,
        shop: ShopContext,
        url: String,
    },
}

impl AnalyticsEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProductViewed { .. } => "product_viewed",
            Self::CartViewed { .. } => "cart_viewed",
        }
    }
}

/// Analytics event emitter.
#[derive(Clone)]
pub struct Analytics {
    sender: broadcast::Sender<AnalyticsEvent>,
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}

impl Analytics {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Receive events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AnalyticsEvent> {
        self.sender.subscribe()
    }

    /// Log and publish an event.
    pub fn publish(&self, event: AnalyticsEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => {
                tracing::info!(
                    target: "analytics",
                    event = event.name(),
                    %payload,
                    "analytics event"
                );
            }
            Err(e) => {
                tracing::warn!(
                    target: "analytics",
                    event = event.name(),
                    error = %e,
                    "failed to serialize analytics event"
                );
            }
        }

        // No receivers is not an error
        let _ = self.sender.send(event);
    }
}
