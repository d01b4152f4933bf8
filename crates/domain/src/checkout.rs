//! Checkout assembler: the last validation gate before an order submission
//! leaves the client. Field rules mirror what the storefront enforces in the
//! checkout form; a payload only reaches the order service once every field
//! passes, so there is no partial submission.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::order::{redact_payment, Amounts, OrderPayload, PaymentDetails, PersonalDetails};

/// Raw checkout form input. Personal name/email come from the authenticated
/// session rather than being re-entered.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutForm {
    pub lines: Vec<CartLine>,
    pub name: String,
    pub email: String,
    pub address: String,
    pub notes: Option<String>,
    pub cardholder: String,
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
    pub amounts: Amounts,
    pub discount_code: Option<String>,
}

/// Per-field validation failures. `None` means the field passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckoutErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvc: Option<String>,
}

impl CheckoutErrors {
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.cardholder.is_none()
            && self.card_number.is_none()
            && self.expiry.is_none()
            && self.cvc.is_none()
    }
}

const MIN_CARD_DIGITS: usize = 13;

fn card_digits(raw: &str) -> Option<String> {
    let stripped: String = raw.chars().filter(|c| *c != ' ').collect();
    if stripped.is_empty() || !stripped.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if stripped.len() < MIN_CARD_DIGITS {
        return None;
    }
    Some(stripped)
}

/// Parses `MM/YY` and rejects expiries already past relative to `now`,
/// comparing the two-digit year and then the month. The current month is
/// still valid.
fn expiry_is_valid(expiry: &str, now: DateTime<Utc>) -> bool {
    let Some((month_str, year_str)) = expiry.split_once('/') else {
        return false;
    };
    if month_str.len() != 2 || year_str.len() != 2 {
        return false;
    }
    let (Ok(month), Ok(year)) = (month_str.parse::<u32>(), year_str.parse::<u32>()) else {
        return false;
    };
    if !(1..=12).contains(&month) {
        return false;
    }

    let now_year = now.year() as u32 % 100;
    let now_month = now.month();
    year > now_year || (year == now_year && month >= now_month)
}

fn cvc_is_valid(cvc: &str) -> bool {
    (3..=4).contains(&cvc.len()) && cvc.chars().all(|c| c.is_ascii_digit())
}

impl CheckoutForm {
    /// Validates every field, collecting one error message per failing field.
    /// On success assembles the order-submission payload with payment data
    /// already reduced to last-4 + masked CVV.
    pub fn validate(self, now: DateTime<Utc>) -> Result<OrderPayload, CheckoutErrors> {
        let mut errors = CheckoutErrors::default();

        if self.address.trim().is_empty() {
            errors.address = Some("address is required".to_string());
        }
        if self.cardholder.trim().is_empty() {
            errors.cardholder = Some("cardholder name is required".to_string());
        }

        let digits = card_digits(&self.card_number);
        if digits.is_none() {
            errors.card_number =
                Some("card number must be at least 13 digits".to_string());
        }
        if !expiry_is_valid(&self.expiry, now) {
            errors.expiry = Some("expiry must be a future MM/YY date".to_string());
        }
        if !cvc_is_valid(&self.cvc) {
            errors.cvc = Some("security code must be 3 or 4 digits".to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let payment = redact_payment(PaymentDetails {
            cardholder: self.cardholder,
            card_number: digits,
            last4: None,
            expiry: self.expiry,
            cvv: self.cvc,
        });

        Ok(OrderPayload {
            lines: self.lines,
            personal: PersonalDetails {
                name: self.name,
                email: self.email,
                address: self.address,
                notes: self.notes,
            },
            payment: PaymentDetails {
                cardholder: payment.cardholder,
                card_number: None,
                last4: Some(payment.last4),
                expiry: payment.expiry,
                cvv: payment.cvv,
            },
            amounts: self.amounts,
            discount_code: self.discount_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap()
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            lines: vec![CartLine {
                product_id: "p1".to_string(),
                name: "Mouse".to_string(),
                price: dec!(20),
                image: None,
                quantity: 2,
            }],
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            address: "Calle 1, Madrid".to_string(),
            notes: None,
            cardholder: "Ada Lovelace".to_string(),
            card_number: "4111 1111 1111 1111".to_string(),
            expiry: "12/28".to_string(),
            cvc: "123".to_string(),
            amounts: Amounts {
                subtotal: dec!(40),
                discount: dec!(0),
                shipping: dec!(5),
                total: dec!(45),
            },
            discount_code: None,
        }
    }

    #[test]
    fn valid_form_assembles_a_masked_payload() {
        let payload = form().validate(now()).unwrap();
        assert_eq!(payload.payment.last4.as_deref(), Some("1111"));
        assert!(payload.payment.card_number.is_none());
        assert_eq!(payload.payment.cvv, "***");
        assert_eq!(payload.personal.email, "ada@example.com");
        assert_eq!(payload.amounts.total, dec!(45));
    }

    #[test]
    fn empty_address_and_cardholder_are_both_reported() {
        let mut f = form();
        f.address = "  ".to_string();
        f.cardholder = String::new();
        let errors = f.validate(now()).unwrap_err();
        assert!(errors.address.is_some());
        assert!(errors.cardholder.is_some());
        assert!(errors.card_number.is_none());
    }

    #[test]
    fn card_number_shorter_than_13_digits_fails() {
        let mut f = form();
        f.card_number = "4111 1111 1111".to_string(); // 12 digits
        let errors = f.validate(now()).unwrap_err();
        assert!(errors.card_number.is_some());
    }

    #[test]
    fn card_number_with_letters_fails() {
        let mut f = form();
        f.card_number = "4111 abcd 1111 1111".to_string();
        assert!(f.validate(now()).unwrap_err().card_number.is_some());
    }

    #[test]
    fn spaces_are_stripped_before_counting_digits() {
        let mut f = form();
        f.card_number = "4111111111111".to_string(); // exactly 13
        assert!(f.validate(now()).is_ok());
    }

    #[test]
    fn past_expiry_is_rejected_current_month_accepted() {
        let mut f = form();
        f.expiry = "07/26".to_string(); // month before `now`
        assert!(f.clone().validate(now()).unwrap_err().expiry.is_some());

        f.expiry = "08/26".to_string(); // current month
        assert!(f.clone().validate(now()).is_ok());

        f.expiry = "01/25".to_string(); // past year
        assert!(f.validate(now()).unwrap_err().expiry.is_some());
    }

    #[test]
    fn malformed_expiry_is_rejected() {
        for bad in ["13/30", "00/30", "1/30", "12-30", "12/2030", "aa/bb", ""] {
            let mut f = form();
            f.expiry = bad.to_string();
            assert!(
                f.validate(now()).unwrap_err().expiry.is_some(),
                "expiry {bad:?} should fail"
            );
        }
    }

    #[test]
    fn cvc_must_be_three_or_four_digits() {
        for (cvc, ok) in [("123", true), ("1234", true), ("12", false), ("12345", false), ("12a", false)] {
            let mut f = form();
            f.cvc = cvc.to_string();
            assert_eq!(f.validate(now()).is_ok(), ok, "cvc {cvc:?}");
        }
    }

    #[test]
    fn no_partial_submission_on_any_failure() {
        let mut f = form();
        f.cvc = "1".to_string();
        f.expiry = "01/20".to_string();
        let errors = f.validate(now()).unwrap_err();
        assert!(errors.cvc.is_some());
        assert!(errors.expiry.is_some());
    }
}
