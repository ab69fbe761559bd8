//! Integer relations and the operations on them.
//!
//! This module provides the Presburger layer:
//! - Variable spaces and column layout
//! - Integer relations (equality and inequality tableaux)
//! - Exact integer sampling and emptiness
//! - Subset and equality checks
//! - Handles for host environments

pub mod space;
pub mod relation;
pub mod sample;
pub mod difference;
pub mod handle;

pub use space::{PresburgerSpace, VarKind};
pub use relation::{IntegerRelation, ReserveHint, Tableau, TableauKind};
pub use sample::{IntegerSampler, OmegaSampler, SampleOutcome, SamplerConfig};
pub use difference::{division_representations, DivisionRepr};
pub use handle::{RelationHandle, RelationStore};
