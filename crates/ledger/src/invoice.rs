use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyerp_core::{CompanyId, CustomerId, DomainError, EmployeeId, Entity, InvoiceId, LineItemId, PaymentId, ProductId};

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    /// Issued to the customer ("opened").
    Sent,
    Paid,
    PartiallyPaid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    /// Statuses whose lines count as income in the P&L and sales reports.
    pub const REVENUE_RECOGNIZED: [InvoiceStatus; 5] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::PartiallyPaid,
        InvoiceStatus::Overdue,
    ];

    /// Statuses that can carry an open receivable in the aging report.
    pub const RECEIVABLE: [InvoiceStatus; 3] = [
        InvoiceStatus::Sent,
        InvoiceStatus::PartiallyPaid,
        InvoiceStatus::Overdue,
    ];

    /// Statuses whose `paid_amount` counts as collected cash.
    pub const COLLECTED: [InvoiceStatus; 2] = [InvoiceStatus::Paid, InvoiceStatus::PartiallyPaid];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_collected(&self) -> bool {
        Self::COLLECTED.contains(self)
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            // Older rows use "opened" for issued invoices.
            "sent" | "opened" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "partially_paid" => Ok(InvoiceStatus::PartiallyPaid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" | "canceled" => Ok(InvoiceStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown invoice status: {other}"))),
        }
    }
}

/// Invoice header snapshot.
///
/// Monetary fields are exact decimals; a NULL column arrives as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub company_id: CompanyId,
    pub invoice_number: String,
    pub customer_id: Option<CustomerId>,
    /// Salesperson recorded on the invoice.
    pub employee_id: Option<EmployeeId>,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    /// `total_amount - paid_amount`; negative when the invoice is overpaid.
    #[serde(default)]
    pub balance_due: Decimal,
    pub status: InvoiceStatus,
}

impl Invoice {
    /// `subtotal - discount + tax + shipping`.
    pub fn expected_total(&self) -> Decimal {
        self.subtotal - self.discount_amount + self.tax_amount + self.shipping_cost
    }

    /// Balance floored at zero for display.
    /// `total − paid`, derived from the header amounts rather than the
    /// stored `balance_due`.
    pub fn computed_balance(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }

    /// Amount owed back to the customer when overpaid (zero otherwise).
    pub fn credit_balance(&self) -> Decimal {
        if self.balance_due.is_sign_negative() {
            -self.balance_due
        } else {
            Decimal::ZERO
        }
    }

    pub fn has_open_balance(&self) -> bool {
        self.balance_due > Decimal::ZERO
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Invoice line item snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub id: LineItemId,
    pub invoice_id: InvoiceId,
    /// `None` when the line was never linked to a catalog product.
    pub product_id: Option<ProductId>,
    pub quantity: Decimal,
    /// Listed unit price.
    pub unit_price: Decimal,
    /// Unit price after any per-line discount.
    pub actual_unit_price: Decimal,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    #[serde(default)]
    pub total_price: Decimal,
}

impl InvoiceLineItem {
    /// Income from this line: `quantity × actual_unit_price` (tax excluded).
    pub fn net_amount(&self) -> Decimal {
        self.quantity * self.actual_unit_price
    }

    // Per-line discount: `quantity × (unit_price - actual_unit_price)`.
}

impl Entity for InvoiceLineItem {
    type Id = LineItemId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Payment applied to an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice(balance_due: Decimal) -> Invoice {
        Invoice {
            id: InvoiceId::new(),
            company_id: CompanyId::new(),
            invoice_number: "INV-1".to_string(),
            customer_id: None,
            employee_id: None,
            invoice_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            due_date: None,
            subtotal: dec!(900),
            discount_amount: dec!(100),
            tax_amount: dec!(50),
            shipping_cost: dec!(10),
            total_amount: dec!(860),
            paid_amount: dec!(860) - balance_due,
            balance_due,
            status: InvoiceStatus::Sent,
        }
    }

    #[test]
    fn expected_total_includes_shipping_and_discount() {
        assert_eq!(invoice(dec!(0)).expected_total(), dec!(860));
    }

    #[test]
    fn overpaid_balance_is_reported_as_credit_not_hidden() {
        let inv = invoice(dec!(-25.50));
        assert_eq!(inv.computed_balance(), dec!(-25.50));
        assert_eq!(inv.credit_balance(), dec!(25.50));
        assert!(!inv.has_open_balance());
    }

    #[test]
    fn legacy_opened_status_parses_as_sent() {
        assert_eq!("opened".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Sent);
        assert_eq!("partially_paid".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::PartiallyPaid);
        assert!("refunded".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn cancelled_invoices_are_not_income() {
        assert!(!InvoiceStatus::REVENUE_RECOGNIZED.contains(&InvoiceStatus::Cancelled));
        assert!(InvoiceStatus::REVENUE_RECOGNIZED.contains(&InvoiceStatus::Overdue));
        assert!(!InvoiceStatus::Overdue.is_collected());
    }
}
