//! Authoritative order pricing.
//!
//! Prices always come from the catalog. A member pays the lower of the
//! member and standard price; shipping is a flat fee charged only when the
//! order contains physical products.

use crate::catalog::CatalogEntry;
use crate::error::{CommerceError, Result};
use crate::types::PricedLine;
use campus_core::Money;

/// Currency used when none is configured.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Pricing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    /// ISO 4217 currency code
    pub currency: String,
    /// Flat fee for orders with products
    pub shipping_fee: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            shipping_fee: Money::ZERO,
        }
    }
}

/// A fully priced order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Priced lines in order
    pub lines: Vec<PricedLine>,
    /// Sum of line totals
    pub subtotal: Money,
    /// Shipping fee
    pub shipping: Money,
    /// `subtotal + shipping`
    pub total: Money,
}

/// Unit price for a buyer and whether the member tier was used.
#[must_use]
pub fn unit_price(price: Money, member_price: Option<Money>, is_member: bool) -> (Money, bool) {
    match member_price {
        Some(member) if is_member && member < price => (member, true),
        _ => (price, false),
    }
}

/// Price `entries` (each with its quantity).
///
/// # Errors
///
/// Returns `CommerceError::Validation` if an amount overflows or the total
/// does not fit a stored cents column.
pub fn quote(
    entries: &[(CatalogEntry, u32)],
    policy: &PricingPolicy,
    is_member: bool,
) -> Result<Quote> {
    let overflow = || CommerceError::invalid("items", "order total is too large");

    let mut lines = Vec::with_capacity(entries.len());
    let mut subtotal = Money::ZERO;

    for (entry, quantity) in entries {
        let (unit, member_price_applied) = unit_price(entry.price, entry.member_price, is_member);
        let line_total = unit.checked_times(*quantity).ok_or_else(overflow)?;
        subtotal = subtotal.checked_add(line_total).ok_or_else(overflow)?;

        lines.push(PricedLine {
            target: entry.target,
            name: entry.name.clone(),
            quantity: *quantity,
            unit_price: unit,
            line_total,
            member_price_applied,
        });
    }

    let shipping = if entries.iter().any(|(entry, _)| entry.target.is_product()) {
        policy.shipping_fee
    } else {
        Money::ZERO
    };
    let total = subtotal
        .checked_add(shipping)
        .filter(Money::fits_db)
        .ok_or_else(overflow)?;

    Ok(Quote {
        lines,
        subtotal,
        shipping,
        total,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::LineTarget;
    use campus_core::{EventId, ProductId, TicketTypeId};
    use proptest::prelude::*;

    fn entry(target: LineTarget, price: u64, member_price: Option<u64>) -> CatalogEntry {
        CatalogEntry {
            target,
            name: "item".into(),
            price: Money::from_cents(price),
            member_price: member_price.map(Money::from_cents),
            event_id: match target {
                LineTarget::Ticket(_) => Some(EventId::new()),
                LineTarget::Product(_) => None,
            },
        }
    }

    fn policy() -> PricingPolicy {
        PricingPolicy {
            currency: "EUR".into(),
            shipping_fee: Money::from_cents(495),
        }
    }

    #[test]
    fn test_member_gets_lower_price() {
        assert_eq!(
            unit_price(Money::from_cents(1_000), Some(Money::from_cents(800)), true),
            (Money::from_cents(800), true)
        );
        assert_eq!(
            unit_price(Money::from_cents(1_000), Some(Money::from_cents(800)), false),
            (Money::from_cents(1_000), false)
        );
    }

    #[test]
    fn test_member_price_above_standard_ignored() {
        assert_eq!(
            unit_price(Money::from_cents(1_000), Some(Money::from_cents(1_200)), true),
            (Money::from_cents(1_000), false)
        );
    }

    #[test]
    fn test_quote_with_products_adds_shipping() {
        let entries = vec![
            (entry(LineTarget::Product(ProductId::new()), 4_500, Some(3_900)), 2),
            (entry(LineTarget::Ticket(TicketTypeId::new()), 2_000, None), 3),
        ];

        let quote = quote(&entries, &policy(), true).unwrap();

        assert_eq!(quote.lines[0].line_total, Money::from_cents(7_800));
        assert!(quote.lines[0].member_price_applied);
        assert_eq!(quote.lines[1].line_total, Money::from_cents(6_000));
        assert_eq!(quote.subtotal, Money::from_cents(13_800));
        assert_eq!(quote.shipping, Money::from_cents(495));
        assert_eq!(quote.total, Money::from_cents(14_295));
    }

    #[test]
    fn test_ticket_only_quote_has_no_shipping() {
        let entries = vec![(entry(LineTarget::Ticket(TicketTypeId::new()), 2_000, None), 1)];
        let quote = quote(&entries, &policy(), false).unwrap();

        assert_eq!(quote.shipping, Money::ZERO);
        assert_eq!(quote.total, Money::from_cents(2_000));
    }

    #[test]
    fn test_overflow_rejected() {
        let entries = vec![(entry(LineTarget::Product(ProductId::new()), u64::MAX, None), 2)];
        assert!(matches!(
            quote(&entries, &policy(), false),
            Err(CommerceError::Validation(_))
        ));
    }

    #[test]
    fn test_total_must_fit_storage() {
        // Fits u64 but not the signed column it is stored in.
        let price = Money::MAX_STORED.cents() / 2 + 1;
        let entries = vec![(entry(LineTarget::Ticket(TicketTypeId::new()), price, None), 2)];

        assert!(matches!(
            quote(&entries, &policy(), false),
            Err(CommerceError::Validation(_))
        ));
    }

    #[test]
    fn test_total_at_storage_limit_accepted() {
        let entries = vec![(
            entry(LineTarget::Ticket(TicketTypeId::new()), Money::MAX_STORED.cents(), None),
            1,
        )];

        let quote = quote(&entries, &policy(), false).unwrap();
        assert_eq!(quote.total.to_db_cents(), i64::MAX);
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_lines_plus_shipping(
            lines in prop::collection::vec((1u64..1_000_000, proptest::option::of(1u64..1_000_000), 1u32..=20, any::<bool>()), 1..50),
            is_member in any::<bool>(),
        ) {
            let entries: Vec<_> = lines
                .iter()
                .map(|(price, member, qty, is_product)| {
                    let target = if *is_product {
                        LineTarget::Product(ProductId::new())
                    } else {
                        LineTarget::Ticket(TicketTypeId::new())
                    };
                    (entry(target, *price, *member), *qty)
                })
                .collect();

            let quote = quote(&entries, &policy(), is_member).unwrap();

            let sum: Money = quote.lines.iter().map(|line| line.line_total).sum();
            prop_assert_eq!(quote.subtotal, sum);
            prop_assert_eq!(quote.total.cents(), quote.subtotal.cents() + quote.shipping.cents());

            for ((entry, qty), line) in entries.iter().zip(&quote.lines) {
                prop_assert!(line.unit_price <= entry.price);
                prop_assert_eq!(line.line_total.cents(), line.unit_price.cents() * u64::from(*qty));
                if !is_member {
                    prop_assert_eq!(line.unit_price, entry.price);
                }
            }
        }
    }
}
