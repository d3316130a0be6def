//! Declaration and type-inference passes for the vigil PHP analyzer.
//!
//! Analysis is two synchronous tree walks over parser-supplied arenas:
//!
//! 1. **Declaration pass** (`declare_file`) - registers every declared
//!    element into the `CodeBase` under an FQSEN computed from the
//!    current `Context`, assigning alternate ids when a name is legally
//!    redeclared.
//! 2. **Inference pass** (`analyze_file`) - re-walks completed trees,
//!    computing a `UnionType` for every expression and reporting semantic
//!    problems through the diagnostic sink.
//!
//! Semantic problems never abort a walk: the offending expression infers
//! the bottom type and analysis continues. Only structural misuse (an
//! inference walk over undeclared trees) is fatal. Both passes dispatch
//! on `NodeKind` exhaustively - there is no wildcard arm to hide an
//! unhandled kind.

pub mod declarations;
pub mod expression;
pub mod hints;
pub mod inference;
pub mod plugin;
pub mod scope;

pub use declarations::declare_file;
pub use inference::analyze_file;
pub use plugin::Plugin;
pub use scope::Scope;
