use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{CheckoutRequest, CheckoutSession, SubscriptionPrice};

impl ApiClient {
    pub async fn list_subscription_prices(&self) -> Result<Vec<SubscriptionPrice>, Error> {
        self.get_all("api/subscriptions/prices").await
    }

    /// Start a checkout for `price_id`; the caller redirects to the returned URL.
    pub async fn create_checkout_session(&self, price_id: &str) -> Result<CheckoutSession, Error> {
        let req = CheckoutRequest {
            price_id: price_id.to_owned(),
        };
        self.post("api/subscriptions/checkout", &req).await
    }
}
