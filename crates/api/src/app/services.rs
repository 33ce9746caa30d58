use std::sync::Arc;

use tracing::info;

use tallyerp_core::CurrencyCode;
use tallyerp_infra::{AppConfig, Persistence, PostgresLedger};
use tallyerp_ledger::{InMemoryLedger, LedgerDataProvider, LedgerResult};
use tallyerp_reporting::{AttributionPolicy, ReportAssembler, ReportingEngine};

/// Everything a report handler needs.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub engine: ReportingEngine,
    pub assembler: ReportAssembler,
}

impl AppServices {
    pub fn new(ledger: Arc<dyn LedgerDataProvider>, currency: CurrencyCode, attribution: AttributionPolicy) -> Self {
        Self {
            engine: ReportingEngine::new(ledger).with_attribution(attribution),
            assembler: ReportAssembler::new(currency),
        }
    }

    pub fn with_engine(mut self, engine: ReportingEngine) -> Self {
        self.engine = engine;
        self
    }
}

/// Pick the ledger backend from configuration.
///
/// `USE_PERSISTENT_STORES=true` reads from Postgres; otherwise an empty
/// in-memory ledger is used.
pub async fn build_services(config: &AppConfig) -> LedgerResult<AppServices> {
    let ledger: Arc<dyn LedgerDataProvider> = match &config.persistence {
        Persistence::Postgres {
            database_url,
            max_connections,
        } => {
            info!("using Postgres ledger");
            Arc::new(PostgresLedger::connect(database_url, *max_connections).await?)
        }
        Persistence::InMemory => {
            info!("using in-memory ledger");
            Arc::new(InMemoryLedger::new())
        }
    };

    Ok(AppServices::new(ledger, config.currency.clone(), config.attribution))
}
