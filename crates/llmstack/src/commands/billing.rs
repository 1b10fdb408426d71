//! Billing command handlers.

use tabled::Tabled;

use llmstack_core::models::SubscriptionPrice;
use llmstack_core::{CoreError, DataStore};

use crate::cli::{BillingArgs, BillingCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct PriceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Interval")]
    interval: String,
}

impl From<&SubscriptionPrice> for PriceRow {
    fn from(p: &SubscriptionPrice) -> Self {
        Self {
            id: p.id.clone(),
            product: p.product_name.clone(),
            amount: format_amount(p.unit_amount, &p.currency),
            interval: p.recurring_interval.clone().unwrap_or_else(|| "once".into()),
        }
    }
}

/// Render minor currency units (cents) as a decimal amount.
fn format_amount(unit_amount: Option<u64>, currency: &str) -> String {
    match unit_amount {
        Some(minor) => format!("{}.{:02} {}", minor / 100, minor % 100, currency.to_uppercase()),
        None => "-".into(),
    }
}

pub async fn handle(store: &DataStore, args: BillingArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        BillingCommand::Prices => {
            let prices = util::load(store.subscription_prices()).await?;
            let out = output::render_list(&global.output, &prices, |p| PriceRow::from(p), |p| {
                p.id.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BillingCommand::Checkout { price_id } => {
            let session = store
                .client()
                .create_checkout_session(&price_id)
                .await
                .map_err(CoreError::from)?;
            let out = output::render_single(
                &global.output,
                &session,
                |s| s.checkout_session_url.clone(),
                |s| s.checkout_session_url.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_render_in_major_units() {
        assert_eq!(format_amount(Some(1999), "usd"), "19.99 USD");
        assert_eq!(format_amount(Some(500), "eur"), "5.00 EUR");
        assert_eq!(format_amount(None, "usd"), "-");
    }
}
