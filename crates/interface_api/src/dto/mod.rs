//! Request and response DTOs
//!
//! Money in requests is a bare decimal amount; the currency comes from the
//! general settings at the time of the request.

pub mod client;
pub mod expense;
pub mod invoice;
pub mod settings;
pub mod template;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use core_kernel::{Currency, Money, Rate};
use domain_billing::{LineItem, ShippingSelection, TaxSelection};

pub(crate) fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(ValidationError::new("must_not_be_negative"))
    } else {
        Ok(())
    }
}

/// Distinguishes an absent field from an explicit `null`
///
/// Use with `#[serde(default)]`: absent stays `None`, `null` becomes
/// `Some(None)`.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemRequest {
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(custom(function = "positive"))]
    pub quantity: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub unit_price: Decimal,
}

impl LineItemRequest {
    pub fn into_line_item(self, currency: Currency) -> LineItem {
        LineItem::new(
            self.description,
            self.quantity,
            Money::new(self.unit_price, currency),
        )
    }
}

pub(crate) fn into_line_items(items: Vec<LineItemRequest>, currency: Currency) -> Vec<LineItem> {
    items
        .into_iter()
        .map(|item| item.into_line_item(currency))
        .collect()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaxRequest {
    #[validate(length(min = 1, max = 100))]
    pub label: String,
    /// Percentage, e.g. `8.25`
    #[validate(custom(function = "non_negative"))]
    pub rate_percent: Decimal,
}

impl From<TaxRequest> for TaxSelection {
    fn from(request: TaxRequest) -> Self {
        TaxSelection {
            label: request.label,
            rate: Rate::from_percentage(request.rate_percent),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ShippingRequest {
    #[validate(length(min = 1, max = 100))]
    pub label: String,
    #[validate(custom(function = "non_negative"))]
    pub amount: Decimal,
}

impl ShippingRequest {
    pub fn into_selection(self, currency: Currency) -> ShippingSelection {
        ShippingSelection {
            label: self.label,
            amount: Money::new(self.amount, currency),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<LineItem> for LineItemResponse {
    fn from(item: LineItem) -> Self {
        Self {
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price.amount(),
            line_total: item.line_total.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaxResponse {
    pub label: String,
    pub rate_percent: Decimal,
}

impl From<TaxSelection> for TaxResponse {
    fn from(tax: TaxSelection) -> Self {
        Self {
            label: tax.label,
            rate_percent: tax.rate.as_percentage().normalize(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShippingResponse {
    pub label: String,
    pub amount: Decimal,
}

impl From<ShippingSelection> for ShippingResponse {
    fn from(shipping: ShippingSelection) -> Self {
        Self {
            label: shipping.label,
            amount: shipping.amount.amount(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_item_rules() {
        let item = LineItemRequest {
            description: "Design".to_string(),
            quantity: dec!(0),
            unit_price: dec!(-1),
        };
        let errors = item.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("quantity"));
        assert!(fields.contains_key("unit_price"));
        assert!(!fields.contains_key("description"));
    }

    #[test]
    fn test_line_item_total_uses_currency_rounding() {
        let item = LineItemRequest {
            description: "Hours".to_string(),
            quantity: dec!(1.5),
            unit_price: dec!(33.333),
        }
        .into_line_item(Currency::USD);
        assert_eq!(item.line_total, Money::new(dec!(50.00), Currency::USD));
    }

    #[test]
    fn test_double_option_distinguishes_null_from_absent() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "double_option")]
            notes: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        let cleared: Patch = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"notes": "hi"}"#).unwrap();
        assert_eq!(absent.notes, None);
        assert_eq!(cleared.notes, Some(None));
        assert_eq!(set.notes, Some(Some("hi".to_string())));
    }
}
