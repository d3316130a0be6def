//! Class-hierarchy expansion.
//!
//! Cast checks against an interface or base class need the full
//! ancestor/interface/trait closure of each class type. The closure is
//! requested on nearly every cast check and the hierarchy is immutable
//! once fully declared, so it is memoized per class FQSEN; the cache is
//! invalidated whenever the symbol table changes shape.

use crate::codebase::CodeBase;
use crate::types::Type;
use crate::union::UnionType;
use rustc_hash::FxHashSet;
use vigil_binder::FqsenId;
use vigil_common::limits::MAX_HIERARCHY_DEPTH;

impl CodeBase {
    /// The class type itself plus every ancestor, interface and trait
    /// type reachable from it. Unknown ancestors contribute themselves
    /// but nothing further.
    pub fn expanded_class(&self, class: FqsenId) -> UnionType {
        if let Some(cached) = self.expansions.get(&class) {
            return cached.clone();
        }
        let mut seen = FxHashSet::default();
        let mut closure = Vec::new();
        self.collect_ancestors(class, &mut seen, &mut closure, 0);
        let expanded = UnionType::from_types(closure);
        self.expansions.insert(class, expanded.clone());
        expanded
    }

    fn collect_ancestors(
        &self,
        class: FqsenId,
        seen: &mut FxHashSet<FqsenId>,
        closure: &mut Vec<Type>,
        depth: u32,
    ) {
        if depth > MAX_HIERARCHY_DEPTH || !seen.insert(class) {
            return;
        }
        closure.push(Type::class(class));
        let Some(record) = self.class(class) else {
            return;
        };
        if let Some(parent) = record.parent {
            self.collect_ancestors(parent, seen, closure, depth + 1);
        }
        for &interface in &record.interfaces {
            self.collect_ancestors(interface, seen, closure, depth + 1);
        }
        for &trait_fqsen in &record.traits {
            self.collect_ancestors(trait_fqsen, seen, closure, depth + 1);
        }
    }
}

impl UnionType {
    /// Replace every class type with its ancestor closure, preserving
    /// each source type's nullability on the expanded members. Non-class
    /// members pass through unchanged.
    pub fn expand(&self, codebase: &CodeBase) -> UnionType {
        let mut expanded = Vec::new();
        for ty in self.types() {
            match ty {
                Type::ClassInstance { fqsen, nullable } => {
                    for member in codebase.expanded_class(*fqsen).types() {
                        let member = member.clone();
                        expanded.push(if *nullable {
                            member.into_nullable()
                        } else {
                            member
                        });
                    }
                }
                other => expanded.push(other.clone()),
            }
        }
        UnionType::from_types(expanded)
    }
}
