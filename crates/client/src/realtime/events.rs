//! Named realtime events and what they mean for the client.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use shopfront_core::{NewNotification, NotificationKind, OrderId, ProductId};

use super::sse::SseFrame;

/// Event names pushed by the realtime service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Notification,
    OrderStatusChanged,
    StockUpdated,
    PriceChanged,
    WishlistItemAvailable,
    LowStockAlert,
}

impl EventName {
    pub const ALL: [Self; 6] = [
        Self::Notification,
        Self::OrderStatusChanged,
        Self::StockUpdated,
        Self::PriceChanged,
        Self::WishlistItemAvailable,
        Self::LowStockAlert,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::OrderStatusChanged => "order-status-changed",
            Self::StockUpdated => "stock-updated",
            Self::PriceChanged => "price-changed",
            Self::WishlistItemAvailable => "wishlist-item-available",
            Self::LowStockAlert => "low-stock-alert",
        }
    }

    const fn default_kind(self) -> NotificationKind {
        match self {
            Self::Notification => NotificationKind::Info,
            Self::OrderStatusChanged => NotificationKind::Order,
            Self::StockUpdated => NotificationKind::Stock,
            Self::PriceChanged => NotificationKind::Price,
            Self::WishlistItemAvailable => NotificationKind::Wishlist,
            Self::LowStockAlert => NotificationKind::Warning,
        }
    }

    const fn default_title(self) -> &'static str {
        match self {
            Self::Notification => "Notification",
            Self::OrderStatusChanged => "Order updated",
            Self::StockUpdated => "Stock updated",
            Self::PriceChanged => "Price changed",
            Self::WishlistItemAvailable => "Wishlist item available",
            Self::LowStockAlert => "Low stock",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an event name is not one the client understands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown realtime event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventName {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_owned()))
    }
}

/// Fields the client reads from an event body. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(rename = "type")]
    pub kind: Option<NotificationKind>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub order_id: Option<OrderId>,
    pub product_id: Option<ProductId>,
    pub status: Option<String>,
}

/// A decoded realtime event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeEvent {
    pub name: EventName,
    pub payload: EventPayload,
}

/// Store a realtime event makes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    Orders(Option<OrderId>),
    /// The product the event concerns; `None` means the current product.
    Product(Option<ProductId>),
    Wishlist,
}

/// Why a frame could not become a [`RealtimeEvent`].
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error(transparent)]
    UnknownName(#[from] UnknownEvent),
    #[error("malformed {name} payload: {source}")]
    Payload {
        name: EventName,
        #[source]
        source: serde_json::Error,
    },
}

impl RealtimeEvent {
    /// Decode a frame. Frames without an `event:` name are treated as
    /// generic notifications.
    ///
    /// # Errors
    ///
    /// Fails on an unknown event name or a body that is not a JSON object
    /// of the expected shape.
    pub fn from_frame(frame: &SseFrame) -> Result<Self, EventError> {
        let name = frame
            .event
            .as_deref()
            .map_or(Ok(EventName::Notification), str::parse::<EventName>)?;
        let payload = if frame.data.trim().is_empty() {
            EventPayload::default()
        } else {
            serde_json::from_str(&frame.data).map_err(|source| EventError::Payload { name, source })?
        };
        Ok(Self { name, payload })
    }

    /// Feed entry for this event. Title and message from the payload are
    /// used as-is; missing ones fall back to per-event defaults.
    #[must_use]
    pub fn to_notification(&self) -> NewNotification {
        let p = &self.payload;
        let kind = p.kind.unwrap_or_else(|| self.name.default_kind());
        let title = p
            .title
            .clone()
            .unwrap_or_else(|| self.name.default_title().to_owned());
        let message = p.message.clone().unwrap_or_else(|| self.default_message());
        NewNotification::new(kind, title, message)
    }

    /// Store that should be re-fetched after this event, if any.
    #[must_use]
    pub fn invalidates(&self) -> Option<Invalidation> {
        match self.name {
            EventName::Notification => None,
            EventName::OrderStatusChanged => {
                Some(Invalidation::Orders(self.payload.order_id.clone()))
            }
            EventName::StockUpdated | EventName::PriceChanged | EventName::LowStockAlert => {
                Some(Invalidation::Product(self.payload.product_id.clone()))
            }
            EventName::WishlistItemAvailable => Some(Invalidation::Wishlist),
        }
    }

    fn default_message(&self) -> String {
        let p = &self.payload;
        match (self.name, &p.order_id, &p.status, &p.product_id) {
            (EventName::OrderStatusChanged, Some(order), Some(status), _) => {
                format!("Order {order} is now {status}")
            }
            (EventName::OrderStatusChanged, Some(order), None, _) => {
                format!("Order {order} was updated")
            }
            (_, _, _, Some(product)) => format!("{} for product {product}", self.name.default_title()),
            _ => String::new(),
        }
    }
}
