// service/payment_provider.rs
use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{config::Config, service::error::ServiceError};

pub const STATUS_READY: &str = "READY";
pub const STATUS_DONE: &str = "DONE";
pub const STATUS_RELEASED: &str = "RELEASED";
pub const STATUS_CANCELED: &str = "CANCELED";
pub const STATUS_ABORTED: &str = "ABORTED";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowSession {
    pub payment_key: String,
    pub status: String,
    pub checkout_url: Option<String>,
}

/// Escrow gateway. Statuses are the provider's own strings and are passed
/// through untouched; callers compare against the `STATUS_*` constants.
#[async_trait]
pub trait PaymentProvider: std::fmt::Debug + Send + Sync {
    async fn create_escrow(
        &self,
        order_id: Uuid,
        amount: i64,
        description: &str,
    ) -> Result<EscrowSession, ServiceError>;

    async fn confirm_escrow(
        &self,
        payment_key: &str,
        order_id: Uuid,
        amount: i64,
    ) -> Result<String, ServiceError>;

    async fn release_escrow(&self, payment_key: &str, amount: i64) -> Result<String, ServiceError>;

    async fn refund_escrow(&self, payment_key: &str, reason: &str) -> Result<String, ServiceError>;
}

pub fn build_payment_provider(config: &Config) -> Arc<dyn PaymentProvider> {
    match &config.payment_secret_key {
        Some(secret_key) => Arc::new(HttpPaymentProvider::new(
            secret_key.clone(),
            config.payment_api_url.clone(),
        )),
        None => {
            tracing::warn!("PAYMENT_SECRET_KEY not set, using the mock payment provider");
            Arc::new(MockPaymentProvider::new())
        }
    }
}

pub struct HttpPaymentProvider {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl std::fmt::Debug for HttpPaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPaymentProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpPaymentProvider {
    pub fn new(secret_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, ServiceError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ServiceError::Payment(e.to_string()))?;

        let ok = response.status().is_success();
        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Payment(e.to_string()))?;

        if !ok {
            return Err(ServiceError::Payment(
                response_body["message"]
                    .as_str()
                    .unwrap_or("Payment provider request failed")
                    .to_string(),
            ));
        }

        Ok(response_body)
    }

    fn status_of(response_body: &serde_json::Value) -> Result<String, ServiceError> {
        response_body["status"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Payment("Provider response has no status".to_string()))
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn create_escrow(
        &self,
        order_id: Uuid,
        amount: i64,
        description: &str,
    ) -> Result<EscrowSession, ServiceError> {
        let response_body = self
            .post(
                "/escrows",
                serde_json::json!({
                    "order_id": order_id,
                    "amount": amount,
                    "description": description,
                }),
            )
            .await?;

        let payment_key = response_body["payment_key"]
            .as_str()
            .ok_or_else(|| ServiceError::Payment("Provider response has no payment_key".to_string()))?
            .to_string();

        Ok(EscrowSession {
            payment_key,
            status: Self::status_of(&response_body)?,
            checkout_url: response_body["checkout_url"].as_str().map(str::to_string),
        })
    }

    async fn confirm_escrow(
        &self,
        payment_key: &str,
        order_id: Uuid,
        amount: i64,
    ) -> Result<String, ServiceError> {
        let response_body = self
            .post(
                &format!("/escrows/{}/confirm", payment_key),
                serde_json::json!({ "order_id": order_id, "amount": amount }),
            )
            .await?;
        Self::status_of(&response_body)
    }

    async fn release_escrow(&self, payment_key: &str, amount: i64) -> Result<String, ServiceError> {
        let response_body = self
            .post(
                &format!("/escrows/{}/release", payment_key),
                serde_json::json!({ "amount": amount }),
            )
            .await?;
        Self::status_of(&response_body)
    }

    async fn refund_escrow(&self, payment_key: &str, reason: &str) -> Result<String, ServiceError> {
        let response_body = self
            .post(
                &format!("/escrows/{}/refund", payment_key),
                serde_json::json!({ "reason": reason }),
            )
            .await?;
        Self::status_of(&response_body)
    }
}

#[derive(Debug, Clone)]
struct MockEscrow {
    order_id: Uuid,
    amount: i64,
    status: String,
}

/// In-process provider for development and tests. A `declining` provider
/// answers every confirmation with `ABORTED`.
#[derive(Debug, Default)]
pub struct MockPaymentProvider {
    escrows: Mutex<HashMap<String, MockEscrow>>,
    decline: bool,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declining() -> Self {
        Self {
            escrows: Mutex::new(HashMap::new()),
            decline: true,
        }
    }

    /// Last status recorded for `payment_key`.
    pub async fn escrow_status(&self, payment_key: &str) -> Option<String> {
        self.escrows
            .lock()
            .await
            .get(payment_key)
            .map(|escrow| escrow.status.clone())
    }

    async fn set_status(&self, payment_key: &str, status: &str) -> Result<String, ServiceError> {
        let mut escrows = self.escrows.lock().await;
        let escrow = escrows
            .get_mut(payment_key)
            .ok_or_else(|| ServiceError::Payment(format!("Unknown payment key {}", payment_key)))?;
        escrow.status = status.to_string();
        Ok(escrow.status.clone())
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_escrow(
        &self,
        order_id: Uuid,
        amount: i64,
        _description: &str,
    ) -> Result<EscrowSession, ServiceError> {
        let payment_key = format!("mock_{}", Uuid::new_v4().simple());
        self.escrows.lock().await.insert(
            payment_key.clone(),
            MockEscrow {
                order_id,
                amount,
                status: STATUS_READY.to_string(),
            },
        );

        Ok(EscrowSession {
            payment_key,
            status: STATUS_READY.to_string(),
            checkout_url: None,
        })
    }

    async fn confirm_escrow(
        &self,
        payment_key: &str,
        order_id: Uuid,
        amount: i64,
    ) -> Result<String, ServiceError> {
        {
            let escrows = self.escrows.lock().await;
            let escrow = escrows.get(payment_key).ok_or_else(|| {
                ServiceError::Payment(format!("Unknown payment key {}", payment_key))
            })?;
            if escrow.order_id != order_id || escrow.amount != amount {
                return Err(ServiceError::Payment(
                    "Escrow does not match the order".to_string(),
                ));
            }
        }

        if self.decline {
            return self.set_status(payment_key, STATUS_ABORTED).await;
        }
        self.set_status(payment_key, STATUS_DONE).await
    }

    async fn release_escrow(&self, payment_key: &str, _amount: i64) -> Result<String, ServiceError> {
        self.set_status(payment_key, STATUS_RELEASED).await
    }

    async fn refund_escrow(&self, payment_key: &str, _reason: &str) -> Result<String, ServiceError> {
        self.set_status(payment_key, STATUS_CANCELED).await
    }
}
