//! Regression harness for the Fierro explicit solver: reads legacy VTK
//! results, diffs them against stored references and drives scenario runs.

pub mod domain;
pub mod modules;
pub mod numerics;
pub mod vtk;

pub use domain::{RegressError, RegressErrorCategory, RegressResult};
pub use modules::{comparator, manifest, regression, solver};
