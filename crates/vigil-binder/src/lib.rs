//! Name identity and scope model for the vigil PHP analyzer.
//!
//! This crate owns the two value types threaded through every tree walk:
//!
//! - `FqsenId` / `FqsenRegistry` - interned fully-qualified
//!   structural-element names, with alternate ids for legal redeclaration
//! - `Context` - an immutable snapshot of "where in the program we are":
//!   file, namespace, import bindings, enclosing class/function scope
//!
//! Doc-comment annotation extraction (`@param` / `@return` / `@var`) also
//! lives here since it feeds declared identities their refined types.

pub mod annotations;
pub mod context;
pub mod fqsen;

pub use annotations::{DocAnnotations, parse_doc_comment};
pub use context::Context;
pub use fqsen::{ElementKind, FqsenError, FqsenId, FqsenRegistry};
