//! Checkout-time order notification.
//!
//! Placing an order never waits on the CMS: the `notify_user` entry is
//! created by a background task and its outcome is delivered through a
//! [`NotificationHandle`]. A failed notification does not fail the order.

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::cms::error::{CmsError, CmsResult};
use crate::cms::search::ContentService;
use crate::cms::transport::{ContentApi, RequestOptions};

const NOTIFY_CONTENT_TYPE: &str = "notify_user";

/// Fixed metadata stamped on every notification entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationProfile {
    pub customer_name: String,
    pub company_name: String,
    pub year: String,
    pub locale: String,
}

impl Default for NotificationProfile {
    fn default() -> Self {
        Self {
            customer_name: "Multimart Customer".to_string(),
            company_name: "Multimart LTD".to_string(),
            year: "2006".to_string(),
            locale: "en-us".to_string(),
        }
    }
}

/// A validated checkout request.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    email: String,
    total: f64,
}

impl OrderRequest {
    pub fn new(email: &str, total: f64) -> CmsResult<Self> {
        let email = email.trim();
        validate_email(email)?;
        if !total.is_finite() || total < 0.0 {
            return Err(CmsError::InvalidInput(format!(
                "order total must be a non-negative amount, got {total}"
            )));
        }
        Ok(Self {
            email: email.to_string(),
            total,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

pub fn validate_email(email: &str) -> CmsResult<()> {
    if email.trim().is_empty() {
        return Err(CmsError::InvalidInput(
            "Please enter your email address".to_string(),
        ));
    }
    if !email_pattern().is_some_and(|re| re.is_match(email.trim())) {
        return Err(CmsError::InvalidInput(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

/// `order<n>` with `n` in `0..1_000_000`.
pub fn generate_order_id() -> String {
    format!("order{}", rand::thread_rng().gen_range(0..1_000_000))
}

pub fn notification_payload(
    order_id: &str,
    order: &OrderRequest,
    profile: &NotificationProfile,
) -> Value {
    json!({
        "entry": {
            "title": order_id,
            "email_id": order.email,
            "customer_name": profile.customer_name,
            "order_id": order_id,
            "order_total": order.total,
            "company_name": profile.company_name,
            "year": profile.year,
            "tags": [],
        }
    })
}

fn notification_endpoint(locale: &str) -> String {
    let cache_buster: f64 = rand::thread_rng().gen();
    format!(
        "/content_types/{NOTIFY_CONTENT_TYPE}/entries?form_uid={NOTIFY_CONTENT_TYPE}&locale={}&r={cache_buster}",
        urlencoding::encode(locale)
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    Delivered(Value),
    Failed(String),
}

impl NotificationOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotificationOutcome::Delivered(_))
    }
}

/// Receiving end of a background notification.
#[derive(Debug)]
pub struct NotificationHandle {
    rx: oneshot::Receiver<NotificationOutcome>,
}

impl NotificationHandle {
    pub async fn outcome(self) -> NotificationOutcome {
        self.rx.await.unwrap_or_else(|_| {
            NotificationOutcome::Failed("notification task ended without reporting".to_string())
        })
    }
}

#[derive(Debug)]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub total: f64,
    pub notification: NotificationHandle,
}

impl<A: ContentApi + 'static> ContentService<A> {
    /// Create the `notify_user` entry for `order_id` and wait for the CMS.
    pub async fn notify_user_order(
        &self,
        order_id: &str,
        order: &OrderRequest,
        profile: &NotificationProfile,
    ) -> CmsResult<Value> {
        let options = RequestOptions::post(notification_payload(order_id, order, profile))
            .header("accept", "application/json, text/plain, */*");
        let response = self
            .api
            .request(&notification_endpoint(&profile.locale), options)
            .await?;
        info!(order_id, "orders: notification sent");
        Ok(response)
    }

    /// Accept the order immediately and send the notification in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn place_order(&self, order: OrderRequest, profile: &NotificationProfile) -> CheckoutReceipt {
        let order_id = generate_order_id();
        let (tx, rx) = oneshot::channel();

        let service = self.clone();
        let profile = profile.clone();
        let task_order_id = order_id.clone();
        let total = order.total;
        tokio::spawn(async move {
            let outcome = match service
                .notify_user_order(&task_order_id, &order, &profile)
                .await
            {
                Ok(body) => NotificationOutcome::Delivered(body),
                Err(err) => {
                    error!(order_id = %task_order_id, %err, "orders: notification failed");
                    NotificationOutcome::Failed(err.to_string())
                }
            };
            // Receiver may have been dropped; the outcome is logged either way.
            let _ = tx.send(outcome);
        });

        info!(order_id = %order_id, total, "orders: order placed");
        CheckoutReceipt {
            order_id,
            total,
            notification: NotificationHandle { rx },
        }
    }
}
