//! Domain types: bars, datasets, identifiers.

pub mod bar;
pub mod ids;

pub use bar::{Bar, Dataset, Granularity};
pub use ids::{ConfigHash, RunId};
