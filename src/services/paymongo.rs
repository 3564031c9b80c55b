//! Thin client for the hosted payment-link gateway.
//!
//! The base URL is configurable so tests can point it at a local mock
//! server. Amounts go over the wire in centavos.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct PaymentGatewayClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
}

/// A link as returned by the gateway.
#[derive(Debug, Clone)]
pub struct GatewayLink {
    pub provider_ref: String,
    pub checkout_url: String,
    pub qr_code_data: Option<String>,
    pub status: GatewayLinkStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayLinkStatus {
    Unpaid,
    Paid,
}

#[derive(Serialize)]
struct CreateLinkBody<'a> {
    data: CreateLinkData<'a>,
}

#[derive(Serialize)]
struct CreateLinkData<'a> {
    attributes: CreateLinkAttributes<'a>,
}

#[derive(Serialize)]
struct CreateLinkAttributes<'a> {
    /// Centavos
    amount: i64,
    description: &'a str,
}

#[derive(Deserialize)]
struct LinkEnvelope {
    data: LinkData,
}

#[derive(Deserialize)]
struct LinkData {
    id: String,
    attributes: LinkAttributes,
}

#[derive(Deserialize)]
struct LinkAttributes {
    checkout_url: String,
    #[serde(default)]
    qr_code: Option<String>,
    status: String,
    #[serde(default)]
    payments: Vec<LinkPayment>,
}

#[derive(Deserialize)]
struct LinkPayment {
    attributes: LinkPaymentAttributes,
}

#[derive(Deserialize)]
struct LinkPaymentAttributes {
    /// Unix seconds
    #[serde(default)]
    paid_at: Option<i64>,
}

impl PaymentGatewayClient {
    pub fn new(base_url: String, secret_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    /// Creates a hosted payment link for the given amount.
    #[instrument(skip(self))]
    pub async fn create_link(
        &self,
        amount: Decimal,
        description: &str,
    ) -> Result<GatewayLink, ServiceError> {
        let centavos = to_centavos(amount)?;
        let body = CreateLinkBody {
            data: CreateLinkData {
                attributes: CreateLinkAttributes {
                    amount: centavos,
                    description,
                },
            },
        };

        let mut request = self.http.post(format!("{}/links", self.base_url)).json(&body);
        if let Some(key) = &self.secret_key {
            request = request.basic_auth(key, Some(""));
        }

        let response = request.send().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Payment gateway unreachable: {}", e))
        })?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Payment gateway returned {}",
                response.status()
            )));
        }
        let envelope: LinkEnvelope = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Bad gateway response: {}", e))
        })?;

        Ok(from_envelope(envelope))
    }

    /// Fetches the current state of a link.
    #[instrument(skip(self))]
    pub async fn fetch_link(&self, provider_ref: &str) -> Result<GatewayLink, ServiceError> {
        let mut request = self
            .http
            .get(format!("{}/links/{}", self.base_url, provider_ref));
        if let Some(key) = &self.secret_key {
            request = request.basic_auth(key, Some(""));
        }

        let response = request.send().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Payment gateway unreachable: {}", e))
        })?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Payment gateway returned {}",
                response.status()
            )));
        }
        let envelope: LinkEnvelope = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Bad gateway response: {}", e))
        })?;

        Ok(from_envelope(envelope))
    }
}

fn from_envelope(envelope: LinkEnvelope) -> GatewayLink {
    let status = if envelope.data.attributes.status == "paid" {
        GatewayLinkStatus::Paid
    } else {
        GatewayLinkStatus::Unpaid
    };
    let paid_at = envelope
        .data
        .attributes
        .payments
        .iter()
        .filter_map(|p| p.attributes.paid_at)
        .max()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

    GatewayLink {
        provider_ref: envelope.data.id,
        checkout_url: envelope.data.attributes.checkout_url,
        qr_code_data: envelope.data.attributes.qr_code,
        status,
        paid_at,
    }
}

fn to_centavos(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| ServiceError::InvalidInput("amount out of range".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converts_pesos_to_centavos() {
        assert_eq!(to_centavos(dec!(1500.00)).unwrap(), 150000);
        assert_eq!(to_centavos(dec!(0.50)).unwrap(), 50);
    }

    #[test]
    fn rejects_amounts_that_overflow_centavos() {
        assert_matches::assert_matches!(
            to_centavos(Decimal::from(i64::MAX)),
            Err(ServiceError::InvalidInput(_))
        );
    }
}
