//! The scope value threaded through tree walks.
//!
//! A `Context` is an immutable snapshot of "where in the program we are":
//! file, namespace, import bindings, enclosing class/function scope, line
//! span, and whether the walk is inside a conditional branch. Every
//! `with_*` operation returns a new value; the receiver is never mutated.
//! Cloning is cheap - the import maps are `Arc`-shared and only copied
//! when a `use` statement actually extends them.
//!
//! Context holds no symbol-table reference: it is pure location plus
//! visible-name-bindings data.

use crate::fqsen::{ElementKind, FqsenId};
use rustc_hash::FxHashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Imports {
    classes: FxHashMap<String, FqsenId>,
    functions: FxHashMap<String, FqsenId>,
    constants: FxHashMap<String, FqsenId>,
}

#[derive(Clone, Debug)]
pub struct Context {
    file: Arc<str>,
    namespace: Arc<str>,
    imports: Arc<Imports>,
    class_fqsen: Option<FqsenId>,
    function_fqsen: Option<FqsenId>,
    lineno: u32,
    end_lineno: u32,
    in_conditional: bool,
}

impl Context {
    /// Context at the top of a file: global namespace, no imports, no
    /// enclosing scope.
    pub fn new(file: &str) -> Self {
        Self {
            file: Arc::from(file),
            namespace: Arc::from("\\"),
            imports: Arc::new(Imports::default()),
            class_fqsen: None,
            function_fqsen: None,
            lineno: 0,
            end_lineno: 0,
            in_conditional: false,
        }
    }

    // Accessors

    pub fn file(&self) -> &Arc<str> {
        &self.file
    }

    pub fn namespace(&self) -> Arc<str> {
        Arc::clone(&self.namespace)
    }

    pub fn class_fqsen(&self) -> Option<FqsenId> {
        self.class_fqsen
    }

    pub fn function_fqsen(&self) -> Option<FqsenId> {
        self.function_fqsen
    }

    pub fn is_in_class(&self) -> bool {
        self.class_fqsen.is_some()
    }

    pub fn is_in_function(&self) -> bool {
        self.function_fqsen.is_some()
    }

    pub fn is_in_conditional(&self) -> bool {
        self.in_conditional
    }

    pub fn lineno(&self) -> u32 {
        self.lineno
    }

    pub fn end_lineno(&self) -> u32 {
        self.end_lineno
    }

    /// Import binding for an alias, keyed by import kind. Class and
    /// function aliases fold case; constant aliases do not.
    pub fn import_for(&self, kind: ElementKind, alias: &str) -> Option<FqsenId> {
        match kind {
            ElementKind::Class => self.imports.classes.get(&alias.to_lowercase()).copied(),
            ElementKind::Function => self.imports.functions.get(&alias.to_lowercase()).copied(),
            ElementKind::GlobalConstant => self.imports.constants.get(alias).copied(),
            ElementKind::Method | ElementKind::Property | ElementKind::ClassConstant => None,
        }
    }

    // `with_*` operations - each returns a new Context differing in one
    // field.

    pub fn with_namespace(&self, namespace: &str) -> Self {
        let trimmed = namespace.trim_matches('\\');
        let canonical = if trimmed.is_empty() {
            "\\".to_string()
        } else {
            format!("\\{trimmed}")
        };
        Self {
            namespace: Arc::from(canonical.as_str()),
            // Entering a namespace resets the visible imports.
            imports: Arc::new(Imports::default()),
            ..self.clone()
        }
    }

    pub fn with_import(&self, kind: ElementKind, alias: &str, target: FqsenId) -> Self {
        let mut imports = Imports {
            classes: self.imports.classes.clone(),
            functions: self.imports.functions.clone(),
            constants: self.imports.constants.clone(),
        };
        match kind {
            ElementKind::Class => {
                imports.classes.insert(alias.to_lowercase(), target);
            }
            ElementKind::Function => {
                imports.functions.insert(alias.to_lowercase(), target);
            }
            ElementKind::GlobalConstant => {
                imports.constants.insert(alias.to_string(), target);
            }
            ElementKind::Method | ElementKind::Property | ElementKind::ClassConstant => {
                unreachable!("class members are not importable")
            }
        }
        Self {
            imports: Arc::new(imports),
            ..self.clone()
        }
    }

    pub fn with_class(&self, class: FqsenId) -> Self {
        Self {
            class_fqsen: Some(class),
            ..self.clone()
        }
    }

    pub fn with_function(&self, function: FqsenId) -> Self {
        Self {
            function_fqsen: Some(function),
            ..self.clone()
        }
    }

    pub fn with_lines(&self, lineno: u32, end_lineno: u32) -> Self {
        Self {
            lineno,
            end_lineno,
            ..self.clone()
        }
    }

    pub fn with_conditional(&self, in_conditional: bool) -> Self {
        Self {
            in_conditional,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fqsen::FqsenRegistry;

    #[test]
    fn with_operations_leave_receiver_untouched() {
        let ctx = Context::new("a.php");
        let inner = ctx.with_namespace("Foo\\Bar").with_conditional(true);

        assert_eq!(&*ctx.namespace(), "\\");
        assert!(!ctx.is_in_conditional());
        assert_eq!(&*inner.namespace(), "\\Foo\\Bar");
        assert!(inner.is_in_conditional());
    }

    #[test]
    fn import_lookup_folds_class_alias_case_only() {
        let registry = FqsenRegistry::new();
        let target = registry.class("Foo", "Bar");
        let constant = registry.global_constant("Foo", "BAR");

        let ctx = Context::new("a.php")
            .with_import(ElementKind::Class, "Baz", target)
            .with_import(ElementKind::GlobalConstant, "BAR", constant);

        assert_eq!(ctx.import_for(ElementKind::Class, "baz"), Some(target));
        assert_eq!(ctx.import_for(ElementKind::Class, "BAZ"), Some(target));
        assert_eq!(
            ctx.import_for(ElementKind::GlobalConstant, "BAR"),
            Some(constant)
        );
        assert_eq!(ctx.import_for(ElementKind::GlobalConstant, "bar"), None);
    }

    #[test]
    fn entering_a_namespace_resets_imports() {
        let registry = FqsenRegistry::new();
        let target = registry.class("Foo", "Bar");
        let ctx = Context::new("a.php").with_import(ElementKind::Class, "Baz", target);
        let inner = ctx.with_namespace("Other");
        assert_eq!(inner.import_for(ElementKind::Class, "Baz"), None);
    }
}
