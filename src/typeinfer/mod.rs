//! Call-related type inference over optimized TIR.

mod context;
mod infer;

pub use context::TypeContext;
pub use infer::TypeInferencer;
