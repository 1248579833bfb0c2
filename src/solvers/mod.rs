//! The synthesis pipeline's solver phases: R1 trivial assignment, the R2
//! constraint-programming matcher, the R3/R4 builders, the night-float
//! overlay solver, and the sampler resolver.
//!
//! Every solver here follows the same shape: a pure scoring/constraint
//! function feeding a greedy, best-first selection loop over the
//! remaining candidates, rather than a full branch-and-bound search —
//! the problems are small (at most 15×15 for track matching, ≤60×52
//! sparse for night float) and a best-first greedy pass is well within
//! reach without pulling in an external CP/ILP solver crate.

pub mod nf_solver;
pub mod r1;
pub mod r2_matcher;
pub mod r3_builder;
pub mod r4_builder;
pub mod sampler_resolver;
