//! Cart and shipping validation.
//!
//! Validation never stops at the first problem: every field error is
//! collected so the client can highlight all of them at once.

use crate::error::{CommerceError, FieldError, Result};
use crate::types::{CartItem, LineTarget, OrderLine, PlaceOrderRequest, ShippingInfo, ValidatedOrder};

/// Maximum distinct lines in one order.
pub const MAX_LINE_ITEMS: usize = 50;

/// Maximum quantity of one product or ticket type per order.
pub const MAX_QUANTITY_PER_LINE: u32 = 20;

/// Validate and normalize an order request.
///
/// Duplicate lines for the same product or ticket type are merged, keeping
/// the position of the first occurrence.
///
/// # Errors
///
/// Returns [`CommerceError::Validation`] listing every invalid field.
pub fn validate_order(request: &PlaceOrderRequest) -> Result<ValidatedOrder> {
    let mut errors = Vec::new();

    let lines = validate_items(&request.items, &mut errors);
    let has_products = lines.iter().any(|line| line.target.is_product());

    let shipping = match &request.shipping {
        Some(shipping) => Some(validate_shipping(shipping, &mut errors)),
        None if has_products => {
            errors.push(FieldError::new(
                "shipping",
                "is required when the cart contains products",
            ));
            None
        }
        None => None,
    };

    if errors.is_empty() {
        Ok(ValidatedOrder { lines, shipping })
    } else {
        Err(CommerceError::Validation(errors))
    }
}

fn validate_items(items: &[CartItem], errors: &mut Vec<FieldError>) -> Vec<OrderLine> {
    if items.is_empty() {
        errors.push(FieldError::new("items", "must contain at least one item"));
        return Vec::new();
    }
    if items.len() > MAX_LINE_ITEMS {
        errors.push(FieldError::new(
            "items",
            format!("must contain at most {MAX_LINE_ITEMS} items"),
        ));
        return Vec::new();
    }

    let mut lines: Vec<OrderLine> = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let target = match (item.product_id, item.event_ticket_type_id) {
            (Some(product), None) => Some(LineTarget::Product(product)),
            (None, Some(ticket)) => Some(LineTarget::Ticket(ticket)),
            (Some(_), Some(_)) => {
                errors.push(FieldError::new(
                    format!("items[{index}]"),
                    "must reference either a product or a ticket type, not both",
                ));
                None
            }
            (None, None) => {
                errors.push(FieldError::new(
                    format!("items[{index}]"),
                    "must reference a product or a ticket type",
                ));
                None
            }
        };

        let quantity = match u32::try_from(item.quantity) {
            Ok(quantity) if (1..=MAX_QUANTITY_PER_LINE).contains(&quantity) => Some(quantity),
            _ => {
                errors.push(FieldError::new(
                    format!("items[{index}].quantity"),
                    format!("must be between 1 and {MAX_QUANTITY_PER_LINE}"),
                ));
                None
            }
        };

        let (Some(target), Some(quantity)) = (target, quantity) else {
            continue;
        };

        match lines.iter_mut().find(|line| line.target == target) {
            Some(existing) => {
                existing.quantity += quantity;
                if existing.quantity > MAX_QUANTITY_PER_LINE {
                    errors.push(FieldError::new(
                        format!("items[{index}].quantity"),
                        format!(
                            "combined quantity for {target} exceeds {MAX_QUANTITY_PER_LINE}"
                        ),
                    ));
                }
            }
            None => lines.push(OrderLine { target, quantity }),
        }
    }

    lines
}

fn validate_shipping(shipping: &ShippingInfo, errors: &mut Vec<FieldError>) -> ShippingInfo {
    let trimmed = ShippingInfo {
        full_name: shipping.full_name.trim().to_string(),
        email: shipping.email.trim().to_string(),
        phone: trim_optional(shipping.phone.as_deref()),
        address_line1: shipping.address_line1.trim().to_string(),
        address_line2: trim_optional(shipping.address_line2.as_deref()),
        city: shipping.city.trim().to_string(),
        postal_code: shipping.postal_code.trim().to_string(),
        country: shipping.country.trim().to_ascii_uppercase(),
    };

    check_length(errors, "shipping.full_name", &trimmed.full_name, 2, 120);

    if !is_valid_email(&trimmed.email) {
        errors.push(FieldError::new(
            "shipping.email",
            "must be a valid email address",
        ));
    }

    if let Some(phone) = &trimmed.phone {
        let allowed = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
        let length = phone.chars().count();
        if !allowed || !(6..=20).contains(&length) || !phone.chars().any(|c| c.is_ascii_digit()) {
            errors.push(FieldError::new(
                "shipping.phone",
                "must be 6 to 20 characters of digits, spaces, +, - or parentheses",
            ));
        }
    }

    check_length(errors, "shipping.address_line1", &trimmed.address_line1, 1, 200);
    if let Some(line2) = &trimmed.address_line2 {
        check_length(errors, "shipping.address_line2", line2, 0, 200);
    }
    check_length(errors, "shipping.city", &trimmed.city, 1, 100);

    let postal = &trimmed.postal_code;
    let postal_len = postal.chars().count();
    if !(3..=10).contains(&postal_len)
        || !postal
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
    {
        errors.push(FieldError::new(
            "shipping.postal_code",
            "must be 3 to 10 letters, digits, spaces or dashes",
        ));
    }

    if trimmed.country.len() != 2 || !trimmed.country.chars().all(|c| c.is_ascii_alphabetic()) {
        errors.push(FieldError::new(
            "shipping.country",
            "must be a two-letter ISO country code",
        ));
    }

    trimmed
}

fn trim_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn check_length(errors: &mut Vec<FieldError>, field: &str, value: &str, min: usize, max: usize) {
    let length = value.chars().count();
    if length < min || length > max {
        let message = if length == 0 {
            "is required".to_string()
        } else {
            format!("must be between {min} and {max} characters")
        };
        errors.push(FieldError::new(field, message));
    }
}

/// `local@domain.tld` with no whitespace and a TLD of two or more letters.
fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let Some(tld) = labels.last() else {
        return false;
    };

    labels.len() >= 2
        && labels.iter().all(|label| !label.is_empty())
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use campus_core::{ProductId, TicketTypeId};

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            full_name: "  Ada Lovelace ".into(),
            email: "ada@campus.test".into(),
            phone: Some("+44 (20) 7946-0958".into()),
            address_line1: "12 St James's Square".into(),
            address_line2: Some("   ".into()),
            city: "London".into(),
            postal_code: "SW1Y 4JH".into(),
            country: "gb".into(),
        }
    }

    fn fields(err: CommerceError) -> Vec<String> {
        match err {
            CommerceError::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_product_order_is_trimmed() {
        let request = PlaceOrderRequest {
            items: vec![CartItem::product(ProductId::new(), 2)],
            shipping: Some(shipping()),
        };

        let order = validate_order(&request).unwrap();
        let shipping = order.shipping.unwrap();

        assert_eq!(shipping.full_name, "Ada Lovelace");
        assert_eq!(shipping.country, "GB");
        assert!(shipping.address_line2.is_none());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = validate_order(&PlaceOrderRequest::default()).unwrap_err();
        assert_eq!(fields(err), vec!["items"]);
    }

    #[test]
    fn test_too_many_lines_rejected() {
        let items = (0..=MAX_LINE_ITEMS)
            .map(|_| CartItem::ticket(TicketTypeId::new(), 1))
            .collect();
        let err = validate_order(&PlaceOrderRequest {
            items,
            shipping: None,
        })
        .unwrap_err();

        assert_eq!(fields(err), vec!["items"]);
    }

    #[test]
    fn test_ticket_only_cart_needs_no_shipping() {
        let request = PlaceOrderRequest {
            items: vec![CartItem::ticket(TicketTypeId::new(), 3)],
            shipping: None,
        };

        let order = validate_order(&request).unwrap();
        assert!(order.shipping.is_none());
        assert!(!order.has_products());
    }

    #[test]
    fn test_product_cart_requires_shipping() {
        let request = PlaceOrderRequest {
            items: vec![CartItem::product(ProductId::new(), 1)],
            shipping: None,
        };

        assert_eq!(fields(validate_order(&request).unwrap_err()), vec!["shipping"]);
    }

    #[test]
    fn test_collects_every_error() {
        let request = PlaceOrderRequest {
            items: vec![
                CartItem {
                    product_id: None,
                    event_ticket_type_id: None,
                    quantity: 1,
                },
                CartItem::product(ProductId::new(), 0),
                CartItem {
                    product_id: Some(ProductId::new()),
                    event_ticket_type_id: Some(TicketTypeId::new()),
                    quantity: -4,
                },
            ],
            shipping: Some(ShippingInfo {
                email: "not-an-email".into(),
                country: "GBR".into(),
                ..shipping()
            }),
        };

        let fields = fields(validate_order(&request).unwrap_err());

        assert_eq!(
            fields,
            vec![
                "items[0]",
                "items[1].quantity",
                "items[2]",
                "items[2].quantity",
                "shipping.email",
                "shipping.country",
            ]
        );
    }

    #[test]
    fn test_duplicate_lines_are_merged() {
        let product = ProductId::new();
        let ticket = TicketTypeId::new();
        let request = PlaceOrderRequest {
            items: vec![
                CartItem::product(product, 2),
                CartItem::ticket(ticket, 1),
                CartItem::product(product, 3),
            ],
            shipping: Some(shipping()),
        };

        let order = validate_order(&request).unwrap();

        assert_eq!(
            order.lines,
            vec![
                OrderLine {
                    target: LineTarget::Product(product),
                    quantity: 5
                },
                OrderLine {
                    target: LineTarget::Ticket(ticket),
                    quantity: 1
                },
            ]
        );
    }

    #[test]
    fn test_merged_quantity_rechecked() {
        let ticket = TicketTypeId::new();
        let request = PlaceOrderRequest {
            items: vec![CartItem::ticket(ticket, 15), CartItem::ticket(ticket, 6)],
            shipping: None,
        };

        assert_eq!(
            fields(validate_order(&request).unwrap_err()),
            vec!["items[1].quantity"]
        );
    }

    #[test]
    fn test_missing_shipping_fields_reported_as_required() {
        let request = PlaceOrderRequest {
            items: vec![CartItem::product(ProductId::new(), 1)],
            shipping: Some(ShippingInfo::default()),
        };

        let err = validate_order(&request).unwrap_err();
        let CommerceError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let full_name = errors
            .iter()
            .find(|e| e.field == "shipping.full_name")
            .unwrap();

        assert_eq!(full_name.message, "is required");
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("a.b+tag@sub.example.org"));
        assert!(!is_valid_email("ada@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@example.c"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email("ada lovelace@example.com"));
        assert!(!is_valid_email("ada@example..com"));
    }

    #[test]
    fn test_phone_rules() {
        let mut errors = Vec::new();
        validate_shipping(
            &ShippingInfo {
                phone: Some("call me".into()),
                ..shipping()
            },
            &mut errors,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "shipping.phone");
    }
}
