//! Domain model: typed keys, fact-table rows and output documents.

pub mod document;
pub mod fields;
pub mod ids;
pub mod rows;

pub use document::{Document, FieldValue};
pub use ids::{
    AssayKey, ExperimentKey, GenotypeKey, ImagePaneKey, MarkerKey, MeasurementKey, ReferenceKey,
    ResultKey, SampleKey, Stage, TermKey,
};
