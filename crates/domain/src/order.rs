use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::cart::CartLine;

/// Stored in place of the submitted CVV. The raw value never reaches the
/// database.
pub const CVV_PLACEHOLDER: &str = "***";

/// Fixed offset between purchase and the initial delivery estimate.
pub const DELIVERY_OFFSET_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalDetails {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "notas", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payment details as submitted at checkout. Either the full card number or
/// an already-masked last-4 may arrive; both are reduced to last-4 before
/// anything is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[serde(rename = "titular")]
    pub cardholder: String,
    #[serde(rename = "numeroTarjeta", skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(rename = "ultimos4", skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    #[serde(rename = "expiracion")]
    pub expiry: String,
    pub cvv: String,
}

/// The only payment shape that ever touches storage: last-4 digits and a
/// masked CVV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPayment {
    #[serde(rename = "titular")]
    pub cardholder: String,
    #[serde(rename = "ultimos4")]
    pub last4: String,
    #[serde(rename = "expiracion")]
    pub expiry: String,
    pub cvv: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amounts {
    pub subtotal: Decimal,
    #[serde(rename = "descuento")]
    pub discount: Decimal,
    #[serde(rename = "envio")]
    pub shipping: Decimal,
    pub total: Decimal,
}

/// A fully validated order submission, ready for redaction and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayload {
    #[serde(rename = "productos")]
    pub lines: Vec<CartLine>,
    #[serde(rename = "datosPersonales")]
    pub personal: PersonalDetails,
    #[serde(rename = "datosPago")]
    pub payment: PaymentDetails,
    #[serde(rename = "montos")]
    pub amounts: Amounts,
    #[serde(rename = "codigoDescuento", skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
}

/// Order submission as it arrives on the wire. The four top-level sections
/// are optional here so that a single validation pass can report every
/// missing one by name instead of failing on the first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOrderPayload {
    #[serde(rename = "productos")]
    pub lines: Option<Vec<CartLine>>,
    #[serde(rename = "datosPersonales")]
    pub personal: Option<PersonalDetails>,
    #[serde(rename = "datosPago")]
    pub payment: Option<PaymentDetails>,
    #[serde(rename = "montos")]
    pub amounts: Option<Amounts>,
    #[serde(rename = "codigoDescuento")]
    pub discount_code: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("order must include at least one product")]
    NoProducts,
}

impl RawOrderPayload {
    /// Checks the four required top-level sections, enumerating every absent
    /// one, then rejects an empty product list.
    pub fn validate(self) -> Result<OrderPayload, PayloadError> {
        let mut missing = Vec::new();
        if self.lines.is_none() {
            missing.push("productos");
        }
        if self.personal.is_none() {
            missing.push("datosPersonales");
        }
        if self.payment.is_none() {
            missing.push("datosPago");
        }
        if self.amounts.is_none() {
            missing.push("montos");
        }
        let (Some(lines), Some(personal), Some(payment), Some(amounts)) =
            (self.lines, self.personal, self.payment, self.amounts)
        else {
            return Err(PayloadError::MissingFields(missing));
        };

        if lines.is_empty() {
            return Err(PayloadError::NoProducts);
        }

        Ok(OrderPayload {
            lines,
            personal,
            payment,
            amounts,
            discount_code: self.discount_code,
        })
    }
}

/// Reduces submitted payment details to the storable shape: last-4 digits of
/// the card number and the fixed CVV placeholder.
pub fn redact_payment(payment: PaymentDetails) -> StoredPayment {
    let last4 = match payment.card_number {
        Some(number) => {
            let digits: String = number.chars().filter(char::is_ascii_digit).collect();
            digits[digits.len().saturating_sub(4)..].to_string()
        }
        None => payment.last4.unwrap_or_default(),
    };

    StoredPayment {
        cardholder: payment.cardholder,
        last4,
        expiry: payment.expiry,
        cvv: CVV_PLACEHOLDER.to_string(),
    }
}

/// Purchase timestamp plus the fixed seven-day offset. Computed once at
/// creation; later changes go through the administrative update.
pub fn delivery_estimate(purchased_at: DateTime<Utc>) -> DateTime<Utc> {
    purchased_at + Duration::days(DELIVERY_OFFSET_DAYS)
}

/// Administrative order status. The source system stored free text; the
/// typed boundary here closes the domain to the five known states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "procesando")]
    Processing,
    #[serde(rename = "enviado")]
    Shipped,
    #[serde(rename = "entregado")]
    Delivered,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Forward progression plus cancellation from any non-terminal state.
    /// A no-op transition to the current state is allowed so that partial
    /// updates can resend the status unchanged.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        match (self, next) {
            (Self::Pending, Self::Processing)
            | (Self::Processing, Self::Shipped)
            | (Self::Shipped, Self::Delivered) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::Processing => "procesando",
            Self::Shipped => "enviado",
            Self::Delivered => "entregado",
            Self::Cancelled => "cancelado",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendiente" => Ok(Self::Pending),
            "procesando" => Ok(Self::Processing),
            "enviado" => Ok(Self::Shipped),
            "entregado" => Ok(Self::Delivered),
            "cancelado" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn payment(card_number: Option<&str>) -> PaymentDetails {
        PaymentDetails {
            cardholder: "Ada Lovelace".to_string(),
            card_number: card_number.map(str::to_string),
            last4: None,
            expiry: "12/30".to_string(),
            cvv: "123".to_string(),
        }
    }

    fn full_raw() -> RawOrderPayload {
        serde_json::from_value(serde_json::json!({
            "productos": [
                {"productId": "p1", "name": "Mouse", "price": 20.0, "quantity": 2}
            ],
            "datosPersonales": {
                "nombre": "Ada", "email": "ada@example.com", "direccion": "Calle 1"
            },
            "datosPago": {
                "titular": "Ada Lovelace", "numeroTarjeta": "4111 1111 1111 1111",
                "expiracion": "12/30", "cvv": "123"
            },
            "montos": {"subtotal": 40.0, "descuento": 0.0, "envio": 5.0, "total": 45.0}
        }))
        .unwrap()
    }

    #[test]
    fn missing_sections_are_all_enumerated() {
        let err = RawOrderPayload::default().validate().unwrap_err();
        assert_eq!(
            err,
            PayloadError::MissingFields(vec![
                "productos",
                "datosPersonales",
                "datosPago",
                "montos"
            ])
        );
        assert_eq!(
            err.to_string(),
            "missing required fields: productos, datosPersonales, datosPago, montos"
        );
    }

    #[test]
    fn only_the_absent_sections_are_listed() {
        let mut raw = full_raw();
        raw.payment = None;
        let err = raw.validate().unwrap_err();
        assert_eq!(err, PayloadError::MissingFields(vec!["datosPago"]));
    }

    #[test]
    fn empty_product_list_is_rejected() {
        let mut raw = full_raw();
        raw.lines = Some(vec![]);
        assert_eq!(raw.validate().unwrap_err(), PayloadError::NoProducts);
    }

    #[test]
    fn complete_payload_validates() {
        let payload = full_raw().validate().unwrap();
        assert_eq!(payload.lines.len(), 1);
        assert_eq!(payload.amounts.total, dec!(45.0));
        assert!(payload.discount_code.is_none());
    }

    #[test]
    fn redaction_keeps_only_last_four_digits_and_masks_cvv() {
        let stored = redact_payment(payment(Some("4111 1111 1111 1234")));
        assert_eq!(stored.last4, "1234");
        assert_eq!(stored.cvv, CVV_PLACEHOLDER);
        assert_ne!(stored.cvv, "123");
    }

    #[test]
    fn redaction_accepts_pre_masked_payment() {
        let mut p = payment(None);
        p.last4 = Some("9876".to_string());
        let stored = redact_payment(p);
        assert_eq!(stored.last4, "9876");
        assert_eq!(stored.cvv, CVV_PLACEHOLDER);
    }

    #[test]
    fn delivery_estimate_is_exactly_seven_days_out() {
        let purchased = Utc.with_ymd_and_hms(2026, 3, 10, 15, 30, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 3, 17, 15, 30, 0).unwrap();
        assert_eq!(delivery_estimate(purchased), expected);
    }

    #[test]
    fn status_machine_allows_forward_progress_and_cancellation() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        use OrderStatus::*;
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Pending));
        // Resending the current status is a permitted no-op.
        assert!(Delivered.can_transition_to(Delivered));
    }

    #[test]
    fn skipping_states_is_rejected() {
        use OrderStatus::*;
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Processing.can_transition_to(Delivered));
    }

    #[test]
    fn status_round_trips_through_wire_names() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("despachado".parse::<OrderStatus>().is_err());
    }
}
