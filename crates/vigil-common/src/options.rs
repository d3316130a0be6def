//! Analysis options: runtime toggles consumed read-only by the type
//! algebra and the inference pass. These are behavioral switches, not
//! structural inputs to the data model.

use crate::limits::ARRAY_LITERAL_SAMPLE_SIZE;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Treat `null` as castable to any type at cast-check time.
    pub null_casts_as_any: bool,

    /// Treat scalar-to-scalar coercion (int/float/string/bool) as always
    /// legal when cast-checking.
    pub scalar_implicit_cast: bool,

    /// Number of leading elements sampled when inferring an array
    /// literal's element type.
    pub array_literal_sample_size: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            null_casts_as_any: false,
            scalar_implicit_cast: false,
            array_literal_sample_size: ARRAY_LITERAL_SAMPLE_SIZE,
        }
    }
}
