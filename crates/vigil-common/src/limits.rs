//! Centralized limits and thresholds for the analyzer.
//!
//! Shared constants for sampling sizes and recursion depths used throughout
//! the codebase. Centralizing these values prevents duplicate definitions
//! with inconsistent values and documents the trade-off behind each limit.

/// Number of leading array-literal elements sampled when inferring a
/// generic element type.
///
/// A literal whose first `ARRAY_LITERAL_SAMPLE_SIZE` elements all resolve
/// to the same single type is inferred as an array of that type; anything
/// else (including disagreement hidden past the sample window) falls back
/// to the plain `array` type. Bounding the sample keeps inference cost
/// independent of literal size. The value is externally observable
/// analysis behavior, so it is also exposed as a runtime option.
pub const ARRAY_LITERAL_SAMPLE_SIZE: usize = 5;

/// Maximum depth for expression type inference.
///
/// Each nested expression adds a frame to the call stack; past this depth
/// the inference pass gives up on the subexpression and infers the empty
/// union instead of risking a stack overflow.
pub const MAX_EXPR_DEPTH: u32 = 500;

/// Maximum class-hierarchy hops followed when walking ancestors for a
/// member lookup or hierarchy expansion. Guards against pathological or
/// cyclic `extends` chains in broken input.
pub const MAX_HIERARCHY_DEPTH: u32 = 64;
