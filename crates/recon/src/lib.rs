//! `reprice-recon`: SKU normalization and price reconciliation engine.
//!
//! Pure engine crate: receives file contents as strings, returns rewritten
//! exports, error logs and reports. No filesystem or terminal access.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod mapping;
pub mod model;
pub mod normalize;
pub mod price;
pub mod report;
pub mod resolver;
pub mod sku;
pub mod table;

pub use config::RepriceConfig;
pub use engine::{run, RepriceOutcome};
pub use error::ReconError;
pub use export::OldExport;
pub use mapping::MeasurementMapping;
pub use model::{ErrorLog, PriceSource, Resolution, RunReport, UnresolvedReason};
pub use resolver::{Correction, CorrectionRequest, CorrectionSource, DeferAll, FixedCorrections, Resolver};
pub use table::{NewPriceFormat, PriceTable};
