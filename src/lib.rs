pub mod catalog;
pub mod config;
pub mod currency;
pub mod draft;
pub mod error;
pub mod render;
pub mod snapshot;

pub use catalog::{Catalog, ProductRecord};
pub use config::{AssetSettings, Company, Config};
pub use currency::CurrencyDefinition;
pub use draft::{DraftStore, FileStore, InvoiceDraft, InvoiceEditor, LineItem, MemoryStore, Subtype};
pub use error::{InvoiceError, Result};
pub use render::{DocumentJob, GenerationState, RenderPath};
pub use snapshot::InvoiceSnapshot;
