//! Strongly typed keys for every fact table.
//!
//! All keys are `#[serde(transparent)]` so they map straight onto the Int64
//! key columns of the fact tables.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Raw integer value of the key
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_key!(
    /// Key of a vocabulary term (EMAPA, EMAPS or any other vocabulary)
    TermKey
);
define_key!(
    /// Key of a marker (gene)
    MarkerKey
);
define_key!(
    /// Key of a genotype
    GenotypeKey
);
define_key!(
    /// Key of a literature reference
    ReferenceKey
);
define_key!(
    /// Key of a classical expression assay
    AssayKey
);
define_key!(
    /// Key of a classical expression result
    ResultKey
);
define_key!(
    /// Key of an RNA-seq consolidated sample
    SampleKey
);
define_key!(
    /// Key of an RNA-seq measurement (one marker in one consolidated sample)
    MeasurementKey
);
define_key!(
    /// Key of an RNA-seq experiment
    ExperimentKey
);
define_key!(
    /// Key of one pane of a figure image
    ImagePaneKey
);

impl GenotypeKey {
    /// Sentinel used by results for which no genotype is applicable
    pub const NONE: Self = Self(-1);

    /// Whether this key is the "no genotype applicable" sentinel
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }
}

/// Theiler stage of mouse development
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stage(pub u8);

impl Stage {
    /// Earliest Theiler stage
    pub const FIRST: Self = Self(1);
    /// Latest Theiler stage
    pub const LAST: Self = Self(28);

    /// Build a stage from a raw integer, rejecting values outside 1..=28
    #[must_use]
    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .map(Self)
            .filter(|stage| (Self::FIRST..=Self::LAST).contains(stage))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
