//! Lookup caches.
//!
//! Window-scoped caches are rebuilt for every key window by the job
//! strategies and dropped when the window ends. Whole-dataset caches, such as
//! [`MarkerAnnotations`] and [`FacetCaches`], are built once per job.

pub mod annotations;
pub mod dedup;
pub mod facets;
pub mod intern;
pub mod lookup;

pub use annotations::MarkerAnnotations;
pub use dedup::DedupTracker;
pub use facets::{CellTypeCache, Facet, FacetCaches};
pub use intern::StringPool;
pub use lookup::{
    GenotypeAlleles, GenotypeInfo, Lookup, MarkerInfo, MultiLookup, ReferenceInfo,
    load_genotype_alleles, load_genotypes, load_marker_synonyms, load_markers, load_references,
    load_term_synonyms,
};
