use thiserror::Error;

#[derive(Error, Debug)]
pub enum MrpError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid part number: {0}")]
    InvalidPartNumber(String),

    #[error("Invalid lot size rule: {0}")]
    InvalidLotSizeRule(String),

    #[error("Invalid make/buy code: {0}")]
    InvalidMakeBuyCode(String),

    #[error("Invalid inventory status: {0}")]
    InvalidInventoryStatus(String),

    #[error("Invalid serial effectivity: {0}")]
    InvalidEffectivity(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Circular dependency detected in BOM: {0}")]
    CircularDependency(String),

    #[error("Duplicate BOM line: {0}")]
    DuplicateBomLine(String),

    #[error("Duplicate part number in item catalog: {0}")]
    DuplicatePartNumber(String),

    #[error("Orphaned part reference: {0}")]
    OrphanedPart(String),

    #[error("Allocation failed for {part} at {location}: {reason}")]
    AllocationFailed {
        part: String,
        location: String,
        reason: String,
    },

    #[error("Planning error: {0}")]
    Planning(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Planning run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, MrpError>;
