use thiserror::Error;

#[derive(Error, Debug)]
pub enum KithoundError {
    /// The durable ledgers are load-bearing for correctness; failing to
    /// open or append them aborts the run.
    #[error("ledger failure: {0}")]
    Ledger(String),

    /// Recorded on the kit's classification record, never propagated
    /// past the extraction loop.
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
