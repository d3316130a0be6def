//! Plugin hooks.
//!
//! Externally registered callbacks invoked after declarations are
//! registered and after expression types are inferred. Hooks receive
//! shared references only: they can read the symbol table and context and
//! add diagnostics through the sink, but cannot mutate identities or
//! scope.

use vigil_ast::Node;
use vigil_binder::{Context, FqsenId};
use vigil_common::DiagnosticSink;
use vigil_solver::{CodeBase, UnionType};

/// Analysis hook points. All methods default to no-ops so plugins
/// implement only what they care about.
pub trait Plugin {
    /// A class, interface or trait was fully registered.
    fn class_declared(
        &self,
        _codebase: &CodeBase,
        _context: &Context,
        _class: FqsenId,
        _sink: &mut dyn DiagnosticSink,
    ) {
    }

    /// A function, method or closure was registered.
    fn function_declared(
        &self,
        _codebase: &CodeBase,
        _context: &Context,
        _function: FqsenId,
        _sink: &mut dyn DiagnosticSink,
    ) {
    }

    /// A property was registered on a class.
    fn property_declared(
        &self,
        _codebase: &CodeBase,
        _context: &Context,
        _class: FqsenId,
        _property: FqsenId,
        _sink: &mut dyn DiagnosticSink,
    ) {
    }

    /// An expression's union type was inferred.
    fn expression_inferred(
        &self,
        _codebase: &CodeBase,
        _context: &Context,
        _node: &Node,
        _union: &UnionType,
        _sink: &mut dyn DiagnosticSink,
    ) {
    }
}
