use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("Config directory not found at {0}. Run 'hekma-invoice init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Invalid file type '{0}'. Please select a CSV file (.csv extension required)")]
    InvalidFileType(PathBuf),

    #[error("The CSV file doesn't contain any valid product data")]
    EmptyImport,

    #[error("Failed to read file {0}")]
    ImportRead(PathBuf),

    #[error("Unknown currency '{0}'. Available: USD, EGP")]
    UnknownCurrency(String),

    #[error("Unknown invoice type '{0}'. Use 'proforma' or 'commercial'.")]
    UnknownSubtype(String),

    #[error("Line item '{0}' not found in the draft")]
    ItemNotFound(String),

    #[error("Product '{0}' not found in the catalog")]
    ProductNotFound(String),

    #[error("Failed to read shipment data {path}: {source}")]
    ShipmentParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize invoice snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InvoiceError>;
