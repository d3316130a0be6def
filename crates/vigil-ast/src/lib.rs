//! Syntax tree contract for the vigil PHP analyzer.
//!
//! vigil does not parse source text; an external parser supplies trees of
//! typed, kinded nodes. This crate defines that contract:
//! - `NodeArena` / `NodeIndex` - arena-allocated node storage
//! - `NodeKind` - the closed enumeration of node kinds
//! - `flags` - operator and modifier flag words
//! - `builder` - programmatic tree construction for tests and tooling
//!
//! Trees serialize to and from JSON (`SourceTree`), which is the wire form
//! the CLI consumes.

pub mod arena;
pub mod builder;
pub mod flags;
pub mod node;
pub mod views;

pub use arena::{NodeArena, NodeIndex, SourceTree};
pub use builder::AstBuilder;
pub use node::{Node, NodeKind, NodeValue};
pub use views::{ClassView, FunctionLikeView, ParamView, PropertyGroupView};
