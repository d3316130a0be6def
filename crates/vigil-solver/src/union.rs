//! Union types: duplicate-free sets of possible types.
//!
//! A `UnionType` says "this expression may have any of these types across
//! all code paths" - a union of observed possibilities, not a choice.
//! Invariants:
//! - storage is sorted and deduplicated, so set equality is slice equality
//! - the bottom type is never stored; adding it is a no-op
//! - the empty union means "no information inferred", which is distinct
//!   from the null type

use crate::types::{ArrayKey, NativeKind, Type};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use vigil_binder::{FqsenId, FqsenRegistry};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnionType {
    types: SmallVec<[Type; 2]>,
}

impl UnionType {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Singleton union; the bottom type yields the empty union.
    pub fn of(ty: Type) -> Self {
        Self::from_types(std::iter::once(ty))
    }

    /// Build from arbitrary types, normalizing: bottom dropped, sorted,
    /// deduplicated.
    pub fn from_types(types: impl IntoIterator<Item = Type>) -> Self {
        let mut collected: SmallVec<[Type; 2]> =
            types.into_iter().filter(|t| !t.is_bottom()).collect();
        collected.sort();
        collected.dedup();
        Self { types: collected }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn contains(&self, ty: &Type) -> bool {
        self.types.binary_search(ty).is_ok()
    }

    pub fn has_native(&self, kind: NativeKind) -> bool {
        self.contains(&Type::Native(kind))
    }

    /// Set union. Adding types already present is a no-op.
    pub fn union(&self, other: &Self) -> Self {
        Self::from_types(self.types.iter().chain(other.types.iter()).cloned())
    }

    /// This union plus one more type.
    pub fn with_type(&self, ty: Type) -> Self {
        Self::from_types(self.types.iter().cloned().chain(std::iter::once(ty)))
    }

    /// Whether every member is a built-in kind (no class types). Empty
    /// unions are not native: they carry no information at all.
    pub fn is_native(&self) -> bool {
        !self.is_empty() && self.types.iter().all(Type::is_native)
    }

    /// The class-type members: the subset used to resolve method,
    /// property and constant accesses.
    pub fn class_types(&self) -> impl Iterator<Item = (FqsenId, bool)> + '_ {
        self.types.iter().filter_map(|t| match t {
            Type::ClassInstance { fqsen, nullable } => Some((*fqsen, *nullable)),
            _ => None,
        })
    }

    pub fn has_array_like(&self) -> bool {
        self.types.iter().any(Type::is_array_like)
    }

    /// Non-empty and every member is an array shape.
    pub fn is_exclusively_array_like(&self) -> bool {
        !self.is_empty() && self.types.iter().all(Type::is_array_like)
    }

    /// Non-empty and provably not an array: no array shape and no
    /// `mixed` member that could hide one.
    pub fn is_definitely_non_array(&self) -> bool {
        !self.is_empty()
            && !self.has_array_like()
            && !self.has_native(NativeKind::Mixed)
    }

    pub fn has_null(&self) -> bool {
        self.types.iter().any(Type::is_nullable)
    }

    /// The union with the null type and all nullable flags removed.
    pub fn without_null(&self) -> Self {
        Self::from_types(
            self.types
                .iter()
                .filter(|t| !matches!(t, Type::Native(NativeKind::Null)))
                .cloned()
                .map(Type::into_non_nullable),
        )
    }

    /// Human-readable `a|b|c` form, used as a diagnostic argument.
    pub fn display(&self, registry: &FqsenRegistry) -> String {
        let parts: Vec<String> = self.types.iter().map(|t| t.display(registry)).collect();
        parts.join("|")
    }

    /// Parse a doc-comment type expression (`int|?Foo|string[]`).
    ///
    /// `resolve_class` maps a class-name spelling to its identity;
    /// members it cannot resolve are skipped rather than failing the
    /// whole expression.
    pub fn from_doc_string(
        text: &str,
        mut resolve_class: impl FnMut(&str) -> Option<FqsenId>,
    ) -> Self {
        let mut types = Vec::new();
        for part in text.split('|') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some(ty) = parse_doc_member(part, &mut resolve_class) {
                match ty {
                    // `?T` on a native adds null alongside it.
                    DocType::Plain(t) => types.push(t),
                    DocType::NullableNative(t) => {
                        types.push(t);
                        types.push(Type::NULL);
                    }
                }
            }
        }
        Self::from_types(types)
    }
}

enum DocType {
    Plain(Type),
    NullableNative(Type),
}

fn parse_doc_member(
    part: &str,
    resolve_class: &mut impl FnMut(&str) -> Option<FqsenId>,
) -> Option<DocType> {
    if let Some(inner) = part.strip_prefix('?') {
        return match parse_doc_member(inner, resolve_class)? {
            DocType::Plain(Type::ClassInstance { fqsen, .. }) => {
                Some(DocType::Plain(Type::nullable_class(fqsen)))
            }
            DocType::Plain(t) | DocType::NullableNative(t) => Some(DocType::NullableNative(t)),
        };
    }
    if let Some(element) = part.strip_suffix("[]") {
        let element = match parse_doc_member(element, resolve_class)? {
            DocType::Plain(t) | DocType::NullableNative(t) => t,
        };
        return Some(DocType::Plain(Type::generic_array(ArrayKey::Mixed, element)));
    }
    if let Some(inner) = part
        .strip_prefix("array<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        let (key, element) = match inner.split_once(',') {
            Some((key, element)) => (key.trim(), element.trim()),
            None => ("mixed", inner.trim()),
        };
        let key = match NativeKind::from_name(key) {
            Some(NativeKind::Int) => ArrayKey::Int,
            Some(NativeKind::String) => ArrayKey::Str,
            _ => ArrayKey::Mixed,
        };
        let element = match parse_doc_member(element, resolve_class)? {
            DocType::Plain(t) | DocType::NullableNative(t) => t,
        };
        return Some(DocType::Plain(Type::generic_array(key, element)));
    }
    if let Some(kind) = NativeKind::from_name(part) {
        return Some(DocType::Plain(Type::Native(kind)));
    }
    resolve_class(part).map(|fqsen| DocType::Plain(Type::class(fqsen)))
}

#[cfg(test)]
#[path = "tests/union_tests.rs"]
mod tests;
