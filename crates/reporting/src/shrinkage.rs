//! Inventory shrinkage: stock recorded in the system but missing from the
//! last manual count, valued at cost.
//!
//! This reflects current stock state rather than period activity, so it is
//! never filtered by invoice date.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyerp_core::ProductId;
use tallyerp_ledger::Product;

use crate::dimension::compare_labels;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrinkageItem {
    pub product_id: ProductId,
    pub name: String,
    pub units: Decimal,
    pub cost_price: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryShrinkage {
    pub items: Vec<ShrinkageItem>,
    pub total: Decimal,
}

/// Shrinkage across active products; products without loss are omitted.
pub fn inventory_shrinkage(products: &[Product]) -> InventoryShrinkage {
    let mut items: Vec<ShrinkageItem> = products
        .iter()
        .filter(|p| p.is_active)
        .filter_map(|p| {
            let units = p.shrinkage_units();
            if units.is_zero() {
                return None;
            }
            Some(ShrinkageItem {
                product_id: p.id,
                name: p.name.clone(),
                units,
                cost_price: p.cost_price,
                value: units * p.cost_price,
            })
        })
        .collect();
    items.sort_by(|a, b| compare_labels(&a.name, &b.name).then(a.product_id.cmp(&b.product_id)));

    let total = items.iter().map(|i| i.value).sum();
    InventoryShrinkage { items, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tallyerp_core::CompanyId;

    fn product(name: &str, on_hand: Decimal, counted: Option<Decimal>, cost: Decimal, active: bool) -> Product {
        Product {
            id: ProductId::new(),
            company_id: CompanyId::new(),
            name: name.to_string(),
            cost_price: cost,
            unit_price: Decimal::ZERO,
            commission: Decimal::ZERO,
            quantity_on_hand: on_hand,
            manual_count: counted,
            added_employee_id: None,
            is_active: active,
        }
    }

    #[test]
    fn values_missing_units_at_cost() {
        let products = vec![
            product("Bolt", dec!(10), Some(dec!(7)), dec!(2.5), true),
            product("Nut", dec!(4), Some(dec!(6)), dec!(1), true),
            product("Gear", dec!(5), None, dec!(100), true),
            product("Axle", dec!(9), Some(dec!(0)), dec!(50), false),
        ];

        let shrinkage = inventory_shrinkage(&products);
        assert_eq!(shrinkage.items.len(), 1);
        assert_eq!(shrinkage.items[0].name, "Bolt");
        assert_eq!(shrinkage.total, dec!(7.5));
    }

    #[test]
    fn no_products_means_no_shrinkage() {
        assert_eq!(inventory_shrinkage(&[]).total, Decimal::ZERO);
    }
}
