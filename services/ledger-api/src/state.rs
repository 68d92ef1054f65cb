use ledger_core::Ledger;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Ledger handle
    pub ledger: Ledger,
}

impl AppState {
    /// State over an open ledger
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }
}
