//! Canonical data model shared by adapters and the registry.

mod bar;
mod source;
mod symbol;

pub use bar::{series_defect, PriceBar, SeriesDefect};
pub use source::{FetchOptions, FetchOutcome, SourceCapabilities, SourceDescriptor};
pub use symbol::{exchange_prefix, is_valid_symbol};
