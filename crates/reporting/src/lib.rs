//! Financial aggregation and reporting engine.
//!
//! Computes Profit & Loss, A/R aging, commission and sales rollups from the
//! raw rows exposed by a [`tallyerp_ledger::LedgerDataProvider`].
//!
//! - Computation modules (`profit_loss`, `shrinkage`, `aging`, `commission`,
//!   `sales`) are pure functions over fetched rows, summing at full precision.
//! - [`engine::ReportingEngine`] fetches the rows a report needs (concurrently)
//!   and runs the computation.
//! - [`assembler::ReportAssembler`] shapes results into response contracts,
//!   rounding once at the boundary.

pub mod aging;
pub mod assembler;
pub mod attribution;
pub mod commission;
pub mod dimension;
pub mod engine;
pub mod error;
pub mod profit_loss;
pub mod sales;
pub mod shrinkage;
pub mod window;

pub use aging::{AgingBucket, AgingBuckets, AgingRow, ArAging};
pub use assembler::{ReportAssembler, ReportWarning};
pub use attribution::AttributionPolicy;
pub use commission::{CommissionDetail, CommissionLine, CommissionSummary, CommissionSummaryRow};
pub use dimension::{Dimension, GroupKey};
pub use engine::ReportingEngine;
pub use error::{ReportError, ReportResult};
pub use profit_loss::{
    GroupRow, GroupedProfitAndLoss, MonthlyProfitAndLoss, OtherActivity, PeriodFigures, ProfitAndLoss,
};
pub use sales::{SalesRow, SalesSummary};
pub use shrinkage::{InventoryShrinkage, ShrinkageItem};
pub use window::{Clock, FixedClock, SystemClock};
