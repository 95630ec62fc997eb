pub mod curve;
pub mod evolver;
pub mod sample;

pub use curve::{Curve, CurveKind, CurveParams, FieldId};
pub use evolver::CurveEvolver;
pub use sample::Sample;
