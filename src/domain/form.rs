use crate::error::{Result, SessionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mask shown on the card until the user types a number. Doubles as the "unset" sentinel.
pub const CARD_NUMBER_PLACEHOLDER: &str = "#### #### #### ####";
/// Name shown on the card until the user types one. Doubles as the "unset" sentinel.
pub const CARD_HOLDER_PLACEHOLDER: &str = "FULL NAME";

pub const MIN_CVV_LEN: usize = 3;

/// Card details as collected by the payment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentForm {
    pub card_number: String,
    pub card_holder: String,
    pub card_month: String,
    pub card_year: String,
    pub card_cvv: String,
    pub is_card_flipped: bool,
}

impl Default for PaymentForm {
    fn default() -> Self {
        Self {
            card_number: CARD_NUMBER_PLACEHOLDER.to_string(),
            card_holder: CARD_HOLDER_PLACEHOLDER.to_string(),
            card_month: String::new(),
            card_year: String::new(),
            card_cvv: String::new(),
            is_card_flipped: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    CardNumber,
    CardHolder,
    CardMonth,
    CardYear,
    CardCvv,
    IsCardFlipped,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::CardNumber,
        FormField::CardHolder,
        FormField::CardMonth,
        FormField::CardYear,
        FormField::CardCvv,
        FormField::IsCardFlipped,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FormField::CardNumber => "cardNumber",
            FormField::CardHolder => "cardHolder",
            FormField::CardMonth => "cardMonth",
            FormField::CardYear => "cardYear",
            FormField::CardCvv => "cardCvv",
            FormField::IsCardFlipped => "isCardFlipped",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FormField {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        FormField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| SessionError::ValidationError(format!("Unknown form field: {s}")))
    }
}

/// A value typed into a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    /// Empty text and `false` count as "no value".
    pub fn is_falsy(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Flag(flag) => !flag,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// A single `key=value` edit, e.g. `cardCvv=123` or `isCardFlipped=true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    pub field: FormField,
    pub value: FieldValue,
}

impl FromStr for FieldEdit {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        let (key, raw) = s.split_once('=').ok_or_else(|| {
            SessionError::ValidationError(format!("Expected key=value, got: {s}"))
        })?;
        let field: FormField = key.trim().parse()?;
        let value = match field {
            FormField::IsCardFlipped => FieldValue::Flag(raw.trim().parse().map_err(|_| {
                SessionError::ValidationError(format!("{field} expects true or false"))
            })?),
            _ => FieldValue::Text(raw.to_string()),
        };
        Ok(Self { field, value })
    }
}

impl PaymentForm {
    /// Sets `field` to `value`, or to the field's default when the value is falsy.
    pub fn update_field(&mut self, field: FormField, value: impl Into<FieldValue>) -> Result<()> {
        let value = value.into();
        if value.is_falsy() {
            self.reset_field(field);
            return Ok(());
        }

        match (field, value) {
            (FormField::IsCardFlipped, FieldValue::Flag(flag)) => self.is_card_flipped = flag,
            (FormField::IsCardFlipped, FieldValue::Text(_)) => {
                return Err(SessionError::ValidationError(format!(
                    "{field} expects a flag"
                )));
            }
            (_, FieldValue::Flag(_)) => {
                return Err(SessionError::ValidationError(format!(
                    "{field} expects text"
                )));
            }
            (FormField::CardNumber, FieldValue::Text(text)) => self.card_number = text,
            (FormField::CardHolder, FieldValue::Text(text)) => self.card_holder = text,
            (FormField::CardMonth, FieldValue::Text(text)) => self.card_month = text,
            (FormField::CardYear, FieldValue::Text(text)) => self.card_year = text,
            (FormField::CardCvv, FieldValue::Text(text)) => self.card_cvv = text,
        }
        Ok(())
    }

    fn reset_field(&mut self, field: FormField) {
        let defaults = PaymentForm::default();
        match field {
            FormField::CardNumber => self.card_number = defaults.card_number,
            FormField::CardHolder => self.card_holder = defaults.card_holder,
            FormField::CardMonth => self.card_month = defaults.card_month,
            FormField::CardYear => self.card_year = defaults.card_year,
            FormField::CardCvv => self.card_cvv = defaults.card_cvv,
            FormField::IsCardFlipped => self.is_card_flipped = defaults.is_card_flipped,
        }
    }

    /// Returns true when every required field holds a user-entered value.
    pub fn is_submittable(&self) -> bool {
        !self.card_month.is_empty()
            && !self.card_year.is_empty()
            && self.card_cvv.chars().count() >= MIN_CVV_LEN
            && !self.card_number.is_empty()
            && self.card_number != CARD_NUMBER_PLACEHOLDER
            && !self.card_holder.is_empty()
            && self.card_holder != CARD_HOLDER_PLACEHOLDER
    }
}

/// Outbound request carrying the form snapshot and the booked price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSubmission {
    #[serde(flatten)]
    pub form: PaymentForm,
    pub price: Option<String>,
}

/// Result data recorded once a verification step succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedPayment {
    pub state: PaymentForm,
    #[serde(rename = "type")]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> PaymentForm {
        PaymentForm {
            card_number: "4111 1111 1111 1111".to_string(),
            card_holder: "MAX MUSTERMANN".to_string(),
            card_month: "04".to_string(),
            card_year: "2029".to_string(),
            card_cvv: "123".to_string(),
            is_card_flipped: false,
        }
    }

    #[test]
    fn test_default_form_is_not_submittable() {
        assert!(!PaymentForm::default().is_submittable());
    }

    #[test]
    fn test_filled_form_is_submittable() {
        assert!(filled_form().is_submittable());
    }

    #[test]
    fn test_each_missing_requirement_blocks_submission() {
        let broken: [fn(&mut PaymentForm); 8] = [
            |f| f.card_month.clear(),
            |f| f.card_year.clear(),
            |f| f.card_cvv = "12".to_string(),
            |f| f.card_cvv.clear(),
            |f| f.card_number = CARD_NUMBER_PLACEHOLDER.to_string(),
            |f| f.card_number.clear(),
            |f| f.card_holder = CARD_HOLDER_PLACEHOLDER.to_string(),
            |f| f.card_holder.clear(),
        ];

        for breaker in broken {
            let mut form = filled_form();
            breaker(&mut form);
            assert!(!form.is_submittable(), "{form:?} should not be submittable");
        }
    }

    #[test]
    fn test_update_field_falls_back_to_default() {
        let mut form = filled_form();
        form.update_field(FormField::CardNumber, "").unwrap();
        form.update_field(FormField::CardHolder, "").unwrap();
        assert_eq!(form.card_number, CARD_NUMBER_PLACEHOLDER);
        assert_eq!(form.card_holder, CARD_HOLDER_PLACEHOLDER);

        form.update_field(FormField::IsCardFlipped, true).unwrap();
        assert!(form.is_card_flipped);
        form.update_field(FormField::IsCardFlipped, false).unwrap();
        assert!(!form.is_card_flipped);
    }

    #[test]
    fn test_update_field_rejects_mismatched_value() {
        let mut form = PaymentForm::default();
        assert!(matches!(
            form.update_field(FormField::CardCvv, true),
            Err(SessionError::ValidationError(_))
        ));
        assert!(matches!(
            form.update_field(FormField::IsCardFlipped, "yes"),
            Err(SessionError::ValidationError(_))
        ));
        assert_eq!(form, PaymentForm::default());
    }

    #[test]
    fn test_field_edit_parsing() {
        let edit: FieldEdit = "cardHolder=ANNA SCHMIDT".parse().unwrap();
        assert_eq!(edit.field, FormField::CardHolder);
        assert_eq!(edit.value, FieldValue::Text("ANNA SCHMIDT".to_string()));

        let edit: FieldEdit = "isCardFlipped=true".parse().unwrap();
        assert_eq!(edit.value, FieldValue::Flag(true));

        let edit: FieldEdit = "cardCvv=".parse().unwrap();
        assert!(edit.value.is_falsy());

        assert!("isCardFlipped=maybe".parse::<FieldEdit>().is_err());
        assert!("cardCvv".parse::<FieldEdit>().is_err());
        assert!("pin=1234".parse::<FieldEdit>().is_err());
    }

    #[test]
    fn test_field_key_parsing() {
        assert_eq!("cardCvv".parse::<FormField>().unwrap(), FormField::CardCvv);
        assert!("cvv".parse::<FormField>().is_err());
    }

    #[test]
    fn test_submission_serialization_is_flat() {
        let submission = PaymentSubmission {
            form: filled_form(),
            price: Some("49".to_string()),
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["cardNumber"], "4111 1111 1111 1111");
        assert_eq!(json["isCardFlipped"], false);
        assert_eq!(json["price"], "49");
    }
}
