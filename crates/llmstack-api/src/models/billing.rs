use serde::{Deserialize, Serialize};

/// A purchasable plan price (`/api/subscriptions/prices`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SubscriptionPrice {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub product_name: String,
    /// Amount in the currency's smallest unit (cents).
    #[serde(default)]
    pub unit_amount: Option<u64>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub recurring_interval: Option<String>,
}

/// Body of `POST /api/subscriptions/checkout`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub price_id: String,
}

/// Where to send the user to finish paying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckoutSession {
    #[serde(default)]
    pub checkout_session_url: String,
}
