//! Status enums for orders, users, and notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order status as reported by the backend.
///
/// The client never computes transitions; it reflects whatever string the
/// backend returns. Strings outside the known set are kept verbatim in
/// [`OrderStatus::Unknown`] instead of failing the whole order payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Unknown(String),
}

impl OrderStatus {
    /// Fulfilment sequence rendered by the step indicator.
    pub const STEPS: [Self; 5] = [
        Self::Pending,
        Self::Paid,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
    ];

    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Unknown(raw) => raw,
        }
    }

    /// Whether the customer may still cancel an order in this status.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Step indicator for this status.
    #[must_use]
    pub fn progress(&self) -> OrderProgress {
        match self {
            Self::Cancelled => OrderProgress::Cancelled,
            Self::Unknown(raw) => OrderProgress::Unknown(raw.clone()),
            known => Self::STEPS
                .iter()
                .position(|step| step == known)
                .map_or(OrderProgress::Unknown(known.as_str().to_owned()), |index| {
                    OrderProgress::Step {
                        index,
                        total: Self::STEPS.len(),
                    }
                }),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => Self::Pending,
            "paid" => Self::Paid,
            "processing" => Self::Processing,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" => Self::Cancelled,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Unknown(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an order step indicator should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderProgress {
    /// Zero-based position within [`OrderStatus::STEPS`].
    Step { index: usize, total: usize },
    /// Terminal cancelled state; no steps are highlighted.
    Cancelled,
    /// Unrecognized status string; rendered as a single generic step.
    Unknown(String),
}

impl OrderProgress {
    /// Number of steps to highlight as reached.
    #[must_use]
    pub const fn completed_steps(&self) -> usize {
        match self {
            Self::Step { index, .. } => *index + 1,
            Self::Cancelled | Self::Unknown(_) => 0,
        }
    }
}

/// Role attached to a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    #[serde(rename = "user", alias = "customer")]
    Customer,
    Admin,
    #[serde(other)]
    Other,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Category of a notification feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    Order,
    Stock,
    Price,
    Wishlist,
    #[default]
    #[serde(other)]
    Info,
}
