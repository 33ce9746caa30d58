use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyerp_core::{CompanyId, EmployeeId, Entity, ProductId};

/// Catalog product snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub company_id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub cost_price: Decimal,
    #[serde(default)]
    pub unit_price: Decimal,
    /// Per-unit commission owed on each unit sold.
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default)]
    pub quantity_on_hand: Decimal,
    /// Physical stocktake count; `None` when no count has been recorded.
    pub manual_count: Option<Decimal>,
    /// Employee who registered the product.
    pub added_employee_id: Option<EmployeeId>,
    pub is_active: bool,
}

impl Product {
    /// Units recorded in the system but missing from the last stocktake.
    ///
    /// Never negative; zero when no stocktake has been recorded.
    pub fn shrinkage_units(&self) -> Decimal {
        match self.manual_count {
            Some(counted) => (self.quantity_on_hand - counted).max(Decimal::ZERO),
            None => Decimal::ZERO,
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
