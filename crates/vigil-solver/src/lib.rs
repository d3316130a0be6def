//! Type algebra and symbol table for the vigil PHP analyzer.
//!
//! - `Type` / `UnionType` - immutable type values with set semantics:
//!   canonical scalar spellings, generic arrays, nullable class types
//! - cast compatibility - scalar coercion tables, class-hierarchy
//!   expansion with per-class memoization
//! - `CodeBase` - the one process-wide mutable symbol table, mapping
//!   interned FQSENs to class/function/constant records
//!
//! Key properties:
//! - O(1) type-set equality on small unions (sorted, deduplicated storage)
//! - the empty union means "no information", distinct from the null type
//! - hierarchy expansion is memoized per class and invalidated whenever
//!   the symbol table changes shape

pub mod cast;
pub mod codebase;
pub mod hierarchy;
pub mod types;
pub mod union;

pub use codebase::{
    ClassConstantRecord, ClassRecord, CodeBase, ConstantRecord, FunctionRecord, MethodRecord,
    ParameterRecord, PropertyRecord, class_modifiers, function_modifiers, member_modifiers,
};
pub use types::{ArrayKey, NativeKind, Type};
pub use union::UnionType;
