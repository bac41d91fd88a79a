use thiserror::Error;

/// Validation and contract errors exposed by `wonrate-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid currency '{value}', expected one of USD, EUR, CNY, JPY")]
    InvalidCurrency { value: String },

    #[error("invalid source '{value}', expected one of snapshot, scrape, open_banking, mock")]
    InvalidSource { value: String },

    #[error("invalid calendar date '{value}', expected YYYY-MM-DD or YYYYMMDD")]
    InvalidDate { value: String },

    #[error("invalid rate kind '{value}', expected one of export, import, bank")]
    InvalidKind { value: String },
}
