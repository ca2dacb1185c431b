use crate::{config::PaymentConfig, errors::ServiceError};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc, time::Duration};
use tracing::{info, instrument};
use uuid::Uuid;

/// Payment method catalog entry. Static configuration, not user data.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethod {
    pub method_type: PaymentMethodType,
    pub display_name: &'static str,
    /// Processing fee in minor units added to the order total
    pub processing_fee: i64,
    pub enabled: bool,
    /// Card methods gate on the external OTP verification result
    pub requires_verification: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    CreditCard,
    DebitCard,
    Paypal,
    BankTransfer,
    CashOnDelivery,
}

impl PaymentMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Paypal => "paypal",
            Self::BankTransfer => "bank_transfer",
            Self::CashOnDelivery => "cash_on_delivery",
        }
    }

    /// Cash on delivery settles at the door; everything else settles at
    /// authorization time.
    pub fn defers_payment(&self) -> bool {
        matches!(self, Self::CashOnDelivery)
    }

    pub fn is_card(&self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }
}

impl fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static CATALOG: [PaymentMethod; 5] = [
    PaymentMethod {
        method_type: PaymentMethodType::CreditCard,
        display_name: "Credit card",
        processing_fee: 0,
        enabled: true,
        requires_verification: true,
    },
    PaymentMethod {
        method_type: PaymentMethodType::DebitCard,
        display_name: "Debit card",
        processing_fee: 0,
        enabled: true,
        requires_verification: true,
    },
    PaymentMethod {
        method_type: PaymentMethodType::Paypal,
        display_name: "PayPal",
        processing_fee: 150,
        enabled: true,
        requires_verification: false,
    },
    PaymentMethod {
        method_type: PaymentMethodType::BankTransfer,
        display_name: "Bank transfer",
        processing_fee: 0,
        enabled: true,
        requires_verification: false,
    },
    PaymentMethod {
        method_type: PaymentMethodType::CashOnDelivery,
        display_name: "Cash on delivery",
        processing_fee: 200,
        enabled: true,
        requires_verification: false,
    },
];

/// The full payment method catalog, in display order.
pub fn payment_method_catalog() -> &'static [PaymentMethod] {
    &CATALOG
}

pub fn lookup_method(method_type: PaymentMethodType) -> &'static PaymentMethod {
    CATALOG
        .iter()
        .find(|m| m.method_type == method_type)
        .expect("catalog covers every method type")
}

/// Card fields accompany card payments for the authorization call only.
/// They are never persisted and never logged.
#[derive(Clone, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub holder: String,
    pub expiry: String,
    pub cvv: String,
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &"****")
            .field("holder", &self.holder)
            .field("expiry", &"****")
            .field("cvv", &"****")
            .finish()
    }
}

/// A chosen payment method plus whatever instrument data it needs.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentDetails {
    pub method: PaymentMethodType,
    pub card: Option<CardDetails>,
}

#[derive(Debug, Clone)]
pub struct PaymentAuthorization {
    pub reference: String,
}

/// Authorization decision boundary. The coordinator only ever sees this
/// trait, so a real gateway client slots in without touching the rest of
/// the engine.
#[async_trait]
pub trait PaymentAuthorizer: Send + Sync {
    async fn authorize(
        &self,
        details: &PaymentDetails,
        amount: i64,
    ) -> Result<PaymentAuthorization, ServiceError>;
}

/// Stand-in for an external payment provider.
///
/// Cash on delivery authorizes immediately and deterministically. Other
/// methods incur an artificial latency and then draw an outcome: a small
/// probability of a transient network failure, a small probability of a
/// user-facing decline, otherwise success.
pub struct SimulatedGateway {
    decline_rate: f64,
    network_failure_rate: f64,
    latency: Duration,
}

impl SimulatedGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            decline_rate: config.decline_rate,
            network_failure_rate: config.network_failure_rate,
            latency: Duration::from_millis(config.latency_ms),
        }
    }

    /// Fully deterministic gateway for tests and demos.
    pub fn with_rates(decline_rate: f64, network_failure_rate: f64, latency: Duration) -> Self {
        Self {
            decline_rate,
            network_failure_rate,
            latency,
        }
    }
}

#[async_trait]
impl PaymentAuthorizer for SimulatedGateway {
    #[instrument(skip(self, details), fields(method = %details.method))]
    async fn authorize(
        &self,
        details: &PaymentDetails,
        amount: i64,
    ) -> Result<PaymentAuthorization, ServiceError> {
        if details.method == PaymentMethodType::CashOnDelivery {
            let reference = synthetic_reference("COD");
            info!(%reference, amount, "cash on delivery accepted");
            return Ok(PaymentAuthorization { reference });
        }

        tokio::time::sleep(self.latency).await;

        let draw: f64 = rand::thread_rng().gen();
        if draw < self.network_failure_rate {
            return Err(ServiceError::PaymentNetworkError(
                "payment provider unreachable, please try again".to_string(),
            ));
        }
        if draw < self.network_failure_rate + self.decline_rate {
            return Err(ServiceError::PaymentDeclined(
                "payment declined, check details".to_string(),
            ));
        }

        let reference = synthetic_reference("PAY");
        info!(%reference, amount, "payment authorized");
        Ok(PaymentAuthorization { reference })
    }
}

fn synthetic_reference(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, id[..12].to_uppercase())
}

/// Builds the authorizer selected by configuration.
pub fn build_authorizer(
    config: &PaymentConfig,
) -> Result<Arc<dyn PaymentAuthorizer>, ServiceError> {
    match config.gateway.as_str() {
        "simulated" => Ok(Arc::new(SimulatedGateway::new(config))),
        other => Err(ServiceError::InternalError(format!(
            "unknown payment gateway '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cod_details() -> PaymentDetails {
        PaymentDetails {
            method: PaymentMethodType::CashOnDelivery,
            card: None,
        }
    }

    fn card_details() -> PaymentDetails {
        PaymentDetails {
            method: PaymentMethodType::CreditCard,
            card: Some(CardDetails {
                number: "4111111111111111".to_string(),
                holder: "Dana Reyes".to_string(),
                expiry: "12/27".to_string(),
                cvv: "123".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn cash_on_delivery_always_authorizes() {
        // Even with a 100% decline rate the COD path never draws an outcome
        let gateway = SimulatedGateway::with_rates(1.0, 0.0, Duration::ZERO);
        for _ in 0..20 {
            let auth = gateway
                .authorize(&cod_details(), 5_000)
                .await
                .expect("COD must authorize");
            assert!(auth.reference.starts_with("COD-"));
        }
    }

    #[tokio::test]
    async fn forced_decline_is_a_decline() {
        let gateway = SimulatedGateway::with_rates(1.0, 0.0, Duration::ZERO);
        let err = gateway.authorize(&card_details(), 5_000).await.unwrap_err();
        assert!(matches!(err, ServiceError::PaymentDeclined(_)));
    }

    #[tokio::test]
    async fn forced_network_failure_is_distinguishable() {
        let gateway = SimulatedGateway::with_rates(0.0, 1.0, Duration::ZERO);
        let err = gateway.authorize(&card_details(), 5_000).await.unwrap_err();
        assert!(matches!(err, ServiceError::PaymentNetworkError(_)));
    }

    #[tokio::test]
    async fn zero_rates_always_succeed() {
        let gateway = SimulatedGateway::with_rates(0.0, 0.0, Duration::ZERO);
        let auth = gateway.authorize(&card_details(), 5_000).await.unwrap();
        assert!(auth.reference.starts_with("PAY-"));
    }

    #[test]
    fn catalog_covers_all_method_types() {
        for method_type in [
            PaymentMethodType::CreditCard,
            PaymentMethodType::DebitCard,
            PaymentMethodType::Paypal,
            PaymentMethodType::BankTransfer,
            PaymentMethodType::CashOnDelivery,
        ] {
            let entry = lookup_method(method_type);
            assert_eq!(entry.method_type, method_type);
            assert!(entry.processing_fee >= 0);
        }
    }

    #[test]
    fn only_cod_defers_payment() {
        assert!(PaymentMethodType::CashOnDelivery.defers_payment());
        assert!(!PaymentMethodType::CreditCard.defers_payment());
        assert!(!PaymentMethodType::Paypal.defers_payment());
    }

    #[test]
    fn card_debug_redacts_instrument_data() {
        let details = card_details();
        let rendered = format!("{:?}", details);
        assert!(!rendered.contains("4111111111111111"));
        assert!(!rendered.contains("123"));
    }

    #[test]
    fn method_type_serde_round_trip() {
        let json = serde_json::to_string(&PaymentMethodType::CashOnDelivery).unwrap();
        assert_eq!(json, "\"cash_on_delivery\"");
        let parsed: PaymentMethodType = serde_json::from_str("\"credit_card\"").unwrap();
        assert_eq!(parsed, PaymentMethodType::CreditCard);
    }
}
