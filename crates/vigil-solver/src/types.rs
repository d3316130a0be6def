//! Single type values.
//!
//! A `Type` is one of: a native/scalar kind, a class instance (with a
//! nullable flag), a generic array (key kind plus element type), or the
//! bottom type `None` meaning "no information". Types are immutable and
//! cheaply clonable; equality compares canonical forms, so alias
//! spellings (`integer`, `boolean`, `double`, `NULL`, ...) are folded
//! before a `Type` ever exists.

use serde::{Deserialize, Serialize};
use vigil_binder::{FqsenId, FqsenRegistry};

/// Built-in type kinds, as opposed to user-declared class types.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum NativeKind {
    Array,
    Bool,
    Callable,
    Float,
    Int,
    Iterable,
    Mixed,
    Null,
    Object,
    String,
    Void,
}

impl NativeKind {
    /// Canonical spelling, one per kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Bool => "bool",
            Self::Callable => "callable",
            Self::Float => "float",
            Self::Int => "int",
            Self::Iterable => "iterable",
            Self::Mixed => "mixed",
            Self::Null => "null",
            Self::Object => "object",
            Self::String => "string",
            Self::Void => "void",
        }
    }

    /// Parse a type-name spelling, folding the language's historical
    /// aliases onto their canonical kind. Returns `None` for class names.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_lowercase().as_str() {
            "array" => Self::Array,
            "bool" | "boolean" => Self::Bool,
            "callable" => Self::Callable,
            "float" | "double" | "real" => Self::Float,
            "int" | "integer" => Self::Int,
            "iterable" => Self::Iterable,
            "mixed" => Self::Mixed,
            "null" => Self::Null,
            "object" => Self::Object,
            "string" => Self::String,
            "void" => Self::Void,
            _ => return None,
        })
    }
}

/// Key kind of a generic array type, covering list-like (`Int`),
/// map-like (`Str`) and unknown-key shapes.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ArrayKey {
    Int,
    Str,
    Mixed,
}

/// One possible type of an expression or declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
    /// Bottom: no information. Never stored in a union.
    None,
    Native(NativeKind),
    /// `element[]` / `array<key, element>`.
    GenericArray { key: ArrayKey, element: Box<Type> },
    /// A user-declared class, interface or trait instance.
    ClassInstance { fqsen: FqsenId, nullable: bool },
}

impl Type {
    pub const ARRAY: Self = Self::Native(NativeKind::Array);
    pub const BOOL: Self = Self::Native(NativeKind::Bool);
    pub const CALLABLE: Self = Self::Native(NativeKind::Callable);
    pub const FLOAT: Self = Self::Native(NativeKind::Float);
    pub const INT: Self = Self::Native(NativeKind::Int);
    pub const MIXED: Self = Self::Native(NativeKind::Mixed);
    pub const NULL: Self = Self::Native(NativeKind::Null);
    pub const OBJECT: Self = Self::Native(NativeKind::Object);
    pub const STRING: Self = Self::Native(NativeKind::String);
    pub const VOID: Self = Self::Native(NativeKind::Void);

    pub const fn class(fqsen: FqsenId) -> Self {
        Self::ClassInstance {
            fqsen,
            nullable: false,
        }
    }

    pub const fn nullable_class(fqsen: FqsenId) -> Self {
        Self::ClassInstance {
            fqsen,
            nullable: true,
        }
    }

    pub fn generic_array(key: ArrayKey, element: Type) -> Self {
        Self::GenericArray {
            key,
            element: Box::new(element),
        }
    }

    pub const fn is_bottom(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether this is a built-in kind rather than a class type. Generic
    /// arrays count as native: they carry no class identity of their own.
    pub const fn is_native(&self) -> bool {
        matches!(self, Self::Native(_) | Self::GenericArray { .. })
    }

    pub const fn is_array_like(&self) -> bool {
        matches!(self, Self::Native(NativeKind::Array) | Self::GenericArray { .. })
    }

    pub const fn fqsen(&self) -> Option<FqsenId> {
        match self {
            Self::ClassInstance { fqsen, .. } => Some(*fqsen),
            _ => None,
        }
    }

    pub const fn is_nullable(&self) -> bool {
        matches!(
            self,
            Self::Native(NativeKind::Null) | Self::ClassInstance { nullable: true, .. }
        )
    }

    /// The same type with its nullable flag set.
    pub fn into_nullable(self) -> Self {
        match self {
            Self::ClassInstance { fqsen, .. } => Self::ClassInstance {
                fqsen,
                nullable: true,
            },
            other => other,
        }
    }

    /// The same type with its nullable flag cleared.
    pub fn into_non_nullable(self) -> Self {
        match self {
            Self::ClassInstance { fqsen, .. } => Self::ClassInstance {
                fqsen,
                nullable: false,
            },
            other => other,
        }
    }

    /// Human-readable form, used as a diagnostic argument.
    pub fn display(&self, registry: &FqsenRegistry) -> String {
        match self {
            Self::None => "none".to_string(),
            Self::Native(kind) => kind.name().to_string(),
            Self::GenericArray { key, element } => match key {
                ArrayKey::Str => format!("array<string,{}>", element.display(registry)),
                ArrayKey::Int | ArrayKey::Mixed => {
                    format!("{}[]", element.display(registry))
                }
            },
            Self::ClassInstance { fqsen, nullable } => {
                let name = registry.display(*fqsen);
                if *nullable { format!("?{name}") } else { name }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_spellings_canonicalize() {
        assert_eq!(NativeKind::from_name("integer"), Some(NativeKind::Int));
        assert_eq!(NativeKind::from_name("boolean"), Some(NativeKind::Bool));
        assert_eq!(NativeKind::from_name("double"), Some(NativeKind::Float));
        assert_eq!(NativeKind::from_name("NULL"), Some(NativeKind::Null));
        assert_eq!(NativeKind::from_name("Widget"), None);
    }

    #[test]
    fn nullable_round_trip() {
        let fqsen = FqsenId(7);
        let t = Type::class(fqsen);
        assert!(!t.is_nullable());
        let n = t.clone().into_nullable();
        assert!(n.is_nullable());
        assert_eq!(n.into_non_nullable(), t);
    }
}
