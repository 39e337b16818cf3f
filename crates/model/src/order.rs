use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The delivery vehicle carrying a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Robot,
    Drone,
}

/// Order state as reported by the backend.
///
/// The backend has been observed to emit `"in_transit"`, `"in transit"`
/// and `"dispatching"` for orders on the way. There is no authoritative
/// schema, so parsing folds whitespace into underscores and anything
/// still unrecognized is preserved verbatim instead of being guessed
/// into a known state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Dispatching,
    InTransit,
    Complete,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    pub fn parse(raw: &str) -> Self {
        let folded = raw.trim().to_lowercase().replace(' ', "_");
        match folded.as_str() {
            "pending" => Self::Pending,
            "paid" => Self::Paid,
            "dispatching" => Self::Dispatching,
            "in_transit" => Self::InTransit,
            "complete" => Self::Complete,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(raw.to_owned()),
        }
    }

    /// Canonical snake_case wire name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Dispatching => "dispatching",
            Self::InTransit => "in_transit",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
            Self::Other(raw) => raw,
        }
    }

    /// An order is live while an agent may still be moving with it.
    pub fn is_trackable(&self) -> bool {
        matches!(self, Self::Dispatching | Self::InTransit)
    }
}

impl Serialize for OrderStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(|raw| Self::parse(&raw))
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(alias = "order_id", alias = "orderId")]
    pub id: String,
    pub status: OrderStatus,
    pub price: Option<f64>,
    #[serde(alias = "robot_type", alias = "agent_kind")]
    pub agent: Option<AgentKind>,
    #[serde(alias = "fromAddress")]
    pub from_address: Option<String>,
    #[serde(alias = "toAddress")]
    pub to_address: Option<String>,
    #[serde(alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(alias = "estimatedArrival")]
    pub estimated_arrival: Option<DateTime<Utc>>,
}

/// Body for POST /orders.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub from_address: String,
    pub to_address: String,
    pub agent: AgentKind,
    pub item_description: Option<String>,
    pub weight_kg: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accepts_drifted_literals() {
        assert_eq!(OrderStatus::parse("in_transit"), OrderStatus::InTransit);
        assert_eq!(OrderStatus::parse("in transit"), OrderStatus::InTransit);
        assert_eq!(OrderStatus::parse("In Transit"), OrderStatus::InTransit);
        assert_eq!(OrderStatus::parse("dispatching"), OrderStatus::Dispatching);
    }

    #[test]
    fn unknown_status_is_preserved_verbatim() {
        assert_eq!(
            OrderStatus::parse("awaiting pigeon"),
            OrderStatus::Other("awaiting pigeon".to_owned())
        );
    }

    #[test]
    fn status_serializes_canonically() {
        let json = serde_json::to_string(&OrderStatus::InTransit).unwrap();
        assert_eq!(json, "\"in_transit\"");
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::InTransit);
    }

    #[test]
    fn trackable_states() {
        assert!(OrderStatus::InTransit.is_trackable());
        assert!(OrderStatus::Dispatching.is_trackable());
        assert!(!OrderStatus::Complete.is_trackable());
        assert!(!OrderStatus::Cancelled.is_trackable());
    }

    #[test]
    fn order_parses_snake_case_contract() {
        let order: Order = serde_json::from_str(
            r#"{
                "order_id": "ORD-1001",
                "status": "in transit",
                "price": 549.5,
                "robot_type": "drone",
                "from_address": "123 Library St",
                "to_address": "Dormitory Building A"
            }"#,
        )
        .unwrap();
        assert_eq!(order.id, "ORD-1001");
        assert_eq!(order.status, OrderStatus::InTransit);
        assert_eq!(order.agent, Some(AgentKind::Drone));
        assert_eq!(order.created_at, None);
    }
}
