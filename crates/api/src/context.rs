use tallyerp_core::CompanyId;

/// Company a request reports on.
///
/// Set by [`crate::middleware::company_middleware`]; present on every
/// `/reports` route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CompanyContext {
    company_id: CompanyId,
}

impl CompanyContext {
    pub fn new(company_id: CompanyId) -> Self {
        Self { company_id }
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }
}
