//! Cast compatibility.
//!
//! `can_cast_to` answers "could a value of this union be used where that
//! union is expected": true when at least one member of the expanded
//! source structurally matches at least one member of the target.
//! Precedence: identical class identity always matches; a class matches
//! ancestors it reaches (via expansion); native kinds match per a fixed
//! coercion table; `mixed` matches and is matched by everything; nullable
//! sources match non-nullable targets only when the target itself accepts
//! null.

use crate::codebase::CodeBase;
use crate::types::{ArrayKey, NativeKind, Type};
use crate::union::UnionType;
use vigil_common::AnalysisOptions;

/// Fixed native-to-native coercion table.
fn native_casts_to(from: NativeKind, to: NativeKind, options: &AnalysisOptions) -> bool {
    use NativeKind::*;
    if from == to || from == Mixed || to == Mixed {
        return true;
    }
    if from == Null {
        // A bare `return;` satisfies `void`; anything else only under
        // the toggle.
        return to == Void || options.null_casts_as_any;
    }
    match (from, to) {
        // Widening int to float is always accepted.
        (Int, Float) => true,
        // Remaining scalar pairs only under the coercion toggle.
        (Int | Float | String | Bool, Int | Float | String | Bool) => {
            options.scalar_implicit_cast
        }
        (Array, Iterable) => true,
        (Callable, Object) => true,
        _ => false,
    }
}

/// Whether a single (already expanded) source type matches a single
/// target type.
fn type_casts_to(from: &Type, to: &Type, options: &AnalysisOptions) -> bool {
    match (from, to) {
        (Type::None, _) | (_, Type::None) => false,

        (
            Type::ClassInstance {
                fqsen: from_fqsen,
                nullable: from_nullable,
            },
            Type::ClassInstance {
                fqsen: to_fqsen,
                nullable: to_nullable,
            },
        ) => from_fqsen == to_fqsen && (!from_nullable || *to_nullable),

        // Class instances satisfy `object` and `mixed`; a nullable one
        // also satisfies `null`.
        (Type::ClassInstance { nullable, .. }, Type::Native(kind)) => match kind {
            NativeKind::Mixed => true,
            NativeKind::Object => !nullable || options.null_casts_as_any,
            NativeKind::Null => *nullable,
            _ => false,
        },
        (Type::Native(NativeKind::Null), Type::ClassInstance { nullable, .. }) => {
            *nullable || options.null_casts_as_any
        }
        (Type::Native(NativeKind::Mixed), Type::ClassInstance { .. }) => true,
        (Type::Native(_), Type::ClassInstance { .. }) => false,

        (Type::GenericArray { .. }, Type::Native(kind)) => {
            matches!(kind, NativeKind::Array | NativeKind::Iterable | NativeKind::Mixed)
        }
        (Type::Native(kind), Type::GenericArray { .. }) => {
            *kind == NativeKind::Mixed
                || (*kind == NativeKind::Null && options.null_casts_as_any)
        }
        (Type::ClassInstance { .. }, Type::GenericArray { .. }) => false,
        (Type::GenericArray { .. }, Type::ClassInstance { .. }) => false,

        (
            Type::GenericArray {
                key: from_key,
                element: from_element,
            },
            Type::GenericArray {
                key: to_key,
                element: to_element,
            },
        ) => {
            (from_key == to_key || *to_key == ArrayKey::Mixed)
                && type_casts_to(from_element, to_element, options)
        }

        (Type::Native(from), Type::Native(to)) => native_casts_to(*from, *to, options),
    }
}

impl UnionType {
    /// Whether this union can be used where `target` is expected.
    ///
    /// Class members are expanded to their ancestor closures first, so a
    /// class casts to any interface or base class it reaches. Empty
    /// unions cast to anything: no information is not a mismatch.
    pub fn can_cast_to(
        &self,
        target: &UnionType,
        codebase: &CodeBase,
        options: &AnalysisOptions,
    ) -> bool {
        if self.is_empty() || target.is_empty() {
            return true;
        }
        let expanded = self.expand(codebase);
        expanded.types().iter().any(|from| {
            target
                .types()
                .iter()
                .any(|to| type_casts_to(from, to, options))
        })
    }
}

#[cfg(test)]
#[path = "tests/cast_tests.rs"]
mod tests;
