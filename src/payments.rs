//! Credit plans, checkout and payment history.
//!
//! The hosted checkout widget runs outside this crate. [`Checkout::start`]
//! creates the order the widget needs, and [`Checkout::complete`] forwards
//! the widget's confirmation to the server for verification.

use std::sync::Arc;

use crate::api::{OrderRequest, OrderResponse, SwiftShareApi, Transaction, VerifyRequest};
use crate::credits::CreditStore;
use crate::error::{Error, Result};
use crate::upload::Reconciliation;

/// Currency every plan is priced in.
pub const CURRENCY: &str = "INR";

/// A purchasable credit plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    /// Price in whole rupees.
    pub price: u64,
    pub credits: u64,
    pub recommended: bool,
}

/// The plan catalog, cheapest first.
pub const PLANS: [Plan; 4] = [
    Plan {
        id: "plus",
        name: "Plus",
        price: 999,
        credits: 500,
        recommended: false,
    },
    Plan {
        id: "pro",
        name: "Pro",
        price: 2499,
        credits: 2000,
        recommended: false,
    },
    Plan {
        id: "business",
        name: "Business",
        price: 4999,
        credits: 5000,
        recommended: true,
    },
    Plan {
        id: "enterprise",
        name: "Enterprise",
        price: 9999,
        credits: 1_000_000_000,
        recommended: false,
    },
];

impl Plan {
    /// Looks up a plan by id, case-insensitively.
    #[must_use]
    pub fn find(id: &str) -> Option<&'static Self> {
        PLANS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    /// Price in minor units (paise), as the payment gateway expects.
    #[must_use]
    pub const fn amount_minor(&self) -> u64 {
        self.price * 100
    }
}

/// What the checkout widget hands back after the user pays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Result of a verified payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub plan: &'static str,
    /// Balance after the credits were added, or the cached balance if it
    /// could not be re-read.
    pub balance: u64,
    pub reconciliation: Reconciliation,
}

impl PaymentReceipt {
    /// The success message shown after a purchase.
    #[must_use]
    pub fn message(&self) -> String {
        let name = Plan::find(self.plan).map_or(self.plan, |p| p.name);
        format!("Payment successful! {name} Credits have been added.")
    }
}

/// Drives a plan purchase and keeps the credit store in step.
pub struct Checkout {
    api: Arc<dyn SwiftShareApi>,
    credits: CreditStore,
}

impl Checkout {
    #[must_use]
    pub fn new(api: Arc<dyn SwiftShareApi>, credits: CreditStore) -> Self {
        Self { api, credits }
    }

    /// Creates a payment order for `plan` on the server.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error.
    pub async fn start(&self, plan: &Plan) -> Result<OrderResponse> {
        let request = OrderRequest {
            plan_id: plan.id.to_string(),
            amount: plan.amount_minor(),
            currency: CURRENCY.to_string(),
            credits: plan.credits,
        };
        let order = self.api.create_order(&request).await?;
        log::info!("Created order {} for plan {}", order.order_id, plan.id);
        Ok(order)
    }

    /// Verifies a completed payment and updates the balance.
    ///
    /// Uses the balance from the verification response when present, and
    /// refreshes from the server otherwise. Once the server has verified the
    /// payment the purchase succeeds even if that refresh fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaymentNotVerified`] if the server refused the
    /// confirmation, or the transport or server error.
    pub async fn complete(
        &self,
        plan: &'static Plan,
        confirmation: PaymentConfirmation,
    ) -> Result<PaymentReceipt> {
        let request = VerifyRequest {
            razorpay_order_id: confirmation.order_id,
            razorpay_payment_id: confirmation.payment_id,
            razorpay_signature: confirmation.signature,
            plan_id: plan.id.to_string(),
        };
        let response = self.api.verify_payment(&request).await?;
        if !response.success {
            let reason = response
                .message
                .unwrap_or_else(|| "please contact support".to_string());
            log::error!("Payment for order {} not verified: {reason}", request.razorpay_order_id);
            return Err(Error::PaymentNotVerified(reason));
        }

        let reconciliation = if let Some(credits) = response.credits {
            self.credits.set(credits);
            Reconciliation::Reported
        } else {
            log::debug!("Verification carried no balance, refreshing");
            match self.credits.refresh().await {
                Ok(_) => Reconciliation::Refreshed,
                Err(e) => {
                    log::warn!("Payment verified but balance refresh failed: {e}");
                    Reconciliation::Stale
                }
            }
        };
        Ok(PaymentReceipt {
            plan: plan.id,
            balance: self.credits.read(),
            reconciliation,
        })
    }

    /// The user's payment history.
    ///
    /// # Errors
    ///
    /// Returns the transport or server error.
    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        self.api.transactions().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;

    fn setup() -> (Arc<FakeApi>, Checkout) {
        let api = Arc::new(FakeApi::new(5));
        let store = CreditStore::new(api.clone());
        (api.clone(), Checkout::new(api, store))
    }

    fn confirm(order_id: &str) -> PaymentConfirmation {
        PaymentConfirmation {
            order_id: order_id.to_string(),
            payment_id: "pay_1".to_string(),
            signature: "sig".to_string(),
        }
    }

    #[test]
    fn catalog_lookup() {
        let pro = Plan::find("PRO").unwrap();
        assert_eq!(pro.credits, 2000);
        assert_eq!(pro.amount_minor(), 249_900);
        assert!(Plan::find("free").is_none());
        assert_eq!(PLANS.iter().filter(|p| p.recommended).count(), 1);
    }

    #[tokio::test]
    async fn purchase_uses_reported_balance() {
        let (_api, checkout) = setup();
        let plan = Plan::find("plus").unwrap();

        let order = checkout.start(plan).await.unwrap();
        assert_eq!(order.amount, 99_900);
        assert_eq!(order.currency, "INR");

        let receipt = checkout.complete(plan, confirm(&order.order_id)).await.unwrap();
        assert_eq!(receipt.balance, 505);
        assert_eq!(receipt.reconciliation, Reconciliation::Reported);
        assert_eq!(checkout.credits.read(), 505);
        assert_eq!(
            receipt.message(),
            "Payment successful! Plus Credits have been added."
        );

        let history = checkout.transactions().await.unwrap();
        assert_eq!(history[0].credits_added, 500);
        assert_eq!(history[0].status.as_deref(), Some("SUCCESS"));
    }

    #[tokio::test]
    async fn purchase_without_balance_refreshes() {
        let (api, checkout) = setup();
        api.behave(|b| b.report_verified_credits = false);
        let plan = Plan::find("pro").unwrap();
        let order = checkout.start(plan).await.unwrap();

        let receipt = checkout.complete(plan, confirm(&order.order_id)).await.unwrap();
        assert_eq!(receipt.balance, 2005);
        assert_eq!(receipt.reconciliation, Reconciliation::Refreshed);
        assert_eq!(checkout.credits.read(), 2005);
    }

    #[tokio::test]
    async fn verified_payment_succeeds_when_refresh_fails() {
        let (api, checkout) = setup();
        checkout.credits.refresh().await.unwrap();
        api.behave(|b| {
            b.report_verified_credits = false;
            b.fail_credits = true;
        });
        let plan = Plan::find("plus").unwrap();
        let order = checkout.start(plan).await.unwrap();

        let receipt = checkout.complete(plan, confirm(&order.order_id)).await.unwrap();
        assert_eq!(api.server_credits(), 505);
        assert_eq!(receipt.reconciliation, Reconciliation::Stale);
        // Cached until the next successful refresh
        assert_eq!(receipt.balance, 5);
        assert_eq!(checkout.credits.read(), 5);
        assert_eq!(
            receipt.message(),
            "Payment successful! Plus Credits have been added."
        );
    }

    #[tokio::test]
    async fn unverified_payment_leaves_balance() {
        let (api, checkout) = setup();
        checkout.credits.refresh().await.unwrap();
        api.behave(|b| b.verify_success = false);
        let plan = Plan::find("business").unwrap();

        let err = checkout.complete(plan, confirm("order_x")).await.unwrap_err();
        assert!(matches!(err, Error::PaymentNotVerified(_)));
        assert_eq!(checkout.credits.read(), 5);
    }
}
