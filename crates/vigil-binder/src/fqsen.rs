//! Fully-qualified structural-element names.
//!
//! Every declarable element - class, function, global constant, method,
//! property, class constant - gets exactly one interned identity per
//! distinct (namespace, name, owner, alternate) tuple. Handles are `u32`s;
//! equality is handle equality. The registry is shared (`&self` methods,
//! DashMap-backed) so identity creation can happen from any pass.
//!
//! Name comparison is case-insensitive for classes, functions, methods and
//! properties, case-sensitive for global and class constants. Namespace
//! paths always compare case-insensitively. The *alternate id*
//! disambiguates legal redeclarations of the same name: the first
//! declaration seen is the canonical one (alternate 0).

use crate::context::Context;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::RwLock;
use tracing::trace;
use vigil_common::interner::{Atom, Interner};

/// Kind of declarable element an FQSEN identifies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Class,
    Function,
    GlobalConstant,
    Method,
    Property,
    ClassConstant,
}

impl ElementKind {
    /// Whether names of this kind compare case-insensitively.
    pub const fn folds_case(self) -> bool {
        !matches!(self, Self::GlobalConstant | Self::ClassConstant)
    }

    /// Whether this kind is a class member (owner required).
    pub const fn is_member(self) -> bool {
        matches!(self, Self::Method | Self::Property | Self::ClassConstant)
    }

    fn key_tag(self) -> char {
        match self {
            Self::Class => 'c',
            Self::Function => 'f',
            Self::GlobalConstant => 'g',
            Self::Method => 'm',
            Self::Property => 'p',
            Self::ClassConstant => 'k',
        }
    }
}

/// Interned FQSEN handle. Two handles from the same registry are equal iff
/// they name the same element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FqsenId(pub u32);

/// Malformed FQSEN strings are caller contract violations, reported as
/// errors rather than user-facing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FqsenError {
    /// A member kind was parsed from a string with no `::` separator.
    MissingMemberSeparator,
    /// A top-level kind was parsed from a string containing `::`.
    UnexpectedMemberSeparator,
    /// Empty element name.
    EmptyName,
    /// Non-numeric alternate id suffix.
    InvalidAlternate,
}

impl fmt::Display for FqsenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMemberSeparator => write!(f, "expected `::` in member name"),
            Self::UnexpectedMemberSeparator => write!(f, "unexpected `::` in top-level name"),
            Self::EmptyName => write!(f, "empty element name"),
            Self::InvalidAlternate => write!(f, "invalid alternate id suffix"),
        }
    }
}

impl std::error::Error for FqsenError {}

struct FqsenData {
    kind: ElementKind,
    /// Canonical namespace form: `\` or `\Foo\Bar`, case as first written.
    namespace: Atom,
    /// Name as first written; comparison key is folded per kind.
    name: Atom,
    owner: Option<FqsenId>,
    alternate: u32,
}

/// Shared intern table for FQSENs.
pub struct FqsenRegistry {
    interner: Interner,
    map: DashMap<String, FqsenId>,
    data: RwLock<Vec<FqsenData>>,
}

/// Normalize a namespace path to its canonical `\`-rooted form.
fn normalize_namespace(namespace: &str) -> String {
    let trimmed = namespace.trim_matches('\\');
    if trimmed.is_empty() {
        "\\".to_string()
    } else {
        format!("\\{trimmed}")
    }
}

impl FqsenRegistry {
    pub fn new() -> Self {
        Self {
            interner: Interner::new(),
            map: DashMap::new(),
            data: RwLock::new(Vec::new()),
        }
    }

    fn intern(&self, key: String, make: impl FnOnce(&Interner) -> FqsenData) -> FqsenId {
        if let Some(id) = self.map.get(&key) {
            return *id;
        }
        let mut data = self.data.write().expect("fqsen table poisoned");
        if let Some(id) = self.map.get(&key) {
            return *id;
        }
        let id = FqsenId(u32::try_from(data.len()).expect("fqsen table overflow"));
        data.push(make(&self.interner));
        self.map.insert(key, id);
        id
    }

    fn top_level(&self, kind: ElementKind, namespace: &str, name: &str, alternate: u32) -> FqsenId {
        let namespace = normalize_namespace(namespace);
        let name_key = if kind.folds_case() {
            name.to_lowercase()
        } else {
            name.to_string()
        };
        let key = format!(
            "{}|{}|{}|{}",
            kind.key_tag(),
            namespace.to_lowercase(),
            name_key,
            alternate
        );
        self.intern(key, |interner| FqsenData {
            kind,
            namespace: interner.intern(&namespace),
            name: interner.intern(name),
            owner: None,
            alternate,
        })
    }

    fn member(&self, kind: ElementKind, owner: FqsenId, name: &str, alternate: u32) -> FqsenId {
        debug_assert_eq!(self.kind(owner), ElementKind::Class, "member owner must be a class");
        let name_key = if kind.folds_case() {
            name.to_lowercase()
        } else {
            name.to_string()
        };
        let key = format!("{}|{}|{}|{}", kind.key_tag(), owner.0, name_key, alternate);
        self.intern(key, |interner| FqsenData {
            kind,
            namespace: interner.intern(""),
            name: interner.intern(name),
            owner: Some(owner),
            alternate,
        })
    }

    // Constructors, one per element kind.

    pub fn class(&self, namespace: &str, name: &str) -> FqsenId {
        self.top_level(ElementKind::Class, namespace, name, 0)
    }

    pub fn function(&self, namespace: &str, name: &str) -> FqsenId {
        self.top_level(ElementKind::Function, namespace, name, 0)
    }

    pub fn global_constant(&self, namespace: &str, name: &str) -> FqsenId {
        self.top_level(ElementKind::GlobalConstant, namespace, name, 0)
    }

    pub fn method(&self, class: FqsenId, name: &str) -> FqsenId {
        self.member(ElementKind::Method, class, name, 0)
    }

    pub fn property(&self, class: FqsenId, name: &str) -> FqsenId {
        self.member(ElementKind::Property, class, name, 0)
    }

    pub fn class_constant(&self, class: FqsenId, name: &str) -> FqsenId {
        self.member(ElementKind::ClassConstant, class, name, 0)
    }

    /// The same identity under a different alternate id.
    pub fn with_alternate(&self, id: FqsenId, alternate: u32) -> FqsenId {
        let (kind, namespace, name, owner) = {
            let data = self.data.read().expect("fqsen table poisoned");
            let d = &data[id.0 as usize];
            (d.kind, d.namespace, d.name, d.owner)
        };
        let namespace = self.interner.resolve(namespace);
        let name = self.interner.resolve(name);
        match owner {
            Some(owner) => self.member(kind, owner, &name, alternate),
            None => self.top_level(kind, &namespace, &name, alternate),
        }
    }

    /// The canonical (alternate 0) form of an identity.
    pub fn canonical(&self, id: FqsenId) -> FqsenId {
        if self.alternate(id) == 0 {
            id
        } else {
            self.with_alternate(id, 0)
        }
    }

    // Accessors

    pub fn kind(&self, id: FqsenId) -> ElementKind {
        self.data.read().expect("fqsen table poisoned")[id.0 as usize].kind
    }

    pub fn name(&self, id: FqsenId) -> std::sync::Arc<str> {
        let atom = self.data.read().expect("fqsen table poisoned")[id.0 as usize].name;
        self.interner.resolve(atom)
    }

    pub fn namespace(&self, id: FqsenId) -> std::sync::Arc<str> {
        let atom = self.data.read().expect("fqsen table poisoned")[id.0 as usize].namespace;
        self.interner.resolve(atom)
    }

    pub fn owner(&self, id: FqsenId) -> Option<FqsenId> {
        self.data.read().expect("fqsen table poisoned")[id.0 as usize].owner
    }

    pub fn alternate(&self, id: FqsenId) -> u32 {
        self.data.read().expect("fqsen table poisoned")[id.0 as usize].alternate
    }

    /// Canonical string serialization:
    /// `\NS\Name[,alt]` or `\NS\Class[,alt]::member[,alt]`.
    pub fn display(&self, id: FqsenId) -> String {
        let (kind, namespace, name, owner, alternate) = {
            let data = self.data.read().expect("fqsen table poisoned");
            let d = &data[id.0 as usize];
            (d.kind, d.namespace, d.name, d.owner, d.alternate)
        };
        let name = self.interner.resolve(name);
        let mut out = match owner {
            Some(owner) => {
                let prefix = if kind == ElementKind::Property { "$" } else { "" };
                format!("{}::{}{}", self.display(owner), prefix, name)
            }
            None => {
                let namespace = self.interner.resolve(namespace);
                if &*namespace == "\\" {
                    format!("\\{name}")
                } else {
                    format!("{namespace}\\{name}")
                }
            }
        };
        if alternate > 0 {
            out.push(',');
            out.push_str(&alternate.to_string());
        }
        out
    }

    /// Split a trailing `,alt` suffix off an element name.
    fn split_alternate(part: &str) -> Result<(&str, u32), FqsenError> {
        match part.rsplit_once(',') {
            Some((name, alt)) => {
                let alternate = alt.parse().map_err(|_| FqsenError::InvalidAlternate)?;
                Ok((name, alternate))
            }
            None => Ok((part, 0)),
        }
    }

    /// Parse a fully-qualified string back into an identity.
    ///
    /// The round-trip law holds: `parse(kind, display(id)) == id` for every
    /// id of that kind.
    pub fn parse(&self, kind: ElementKind, text: &str) -> Result<FqsenId, FqsenError> {
        if kind.is_member() {
            let (class_part, member_part) = text
                .rsplit_once("::")
                .ok_or(FqsenError::MissingMemberSeparator)?;
            let owner = self.parse(ElementKind::Class, class_part)?;
            let member_part = member_part.strip_prefix('$').unwrap_or(member_part);
            let (name, alternate) = Self::split_alternate(member_part)?;
            if name.is_empty() {
                return Err(FqsenError::EmptyName);
            }
            return Ok(self.member(kind, owner, name, alternate));
        }

        if text.contains("::") {
            return Err(FqsenError::UnexpectedMemberSeparator);
        }
        let (path, alternate) = Self::split_alternate(text)?;
        let path = path.strip_prefix('\\').unwrap_or(path);
        let (namespace, name) = match path.rsplit_once('\\') {
            Some((namespace, name)) => (namespace, name),
            None => ("", path),
        };
        if name.is_empty() {
            return Err(FqsenError::EmptyName);
        }
        Ok(self.top_level(kind, namespace, name, alternate))
    }

    /// Resolve a source-level name to an identity within a context.
    ///
    /// Resolution order: a leading `\` is fully qualified; otherwise the
    /// context's import map is consulted for the name's first segment (of
    /// the matching import kind for unqualified names, the class table for
    /// qualified ones); otherwise the current namespace is prefixed.
    /// Functions and global constants additionally fall back to the global
    /// namespace when `exists` rejects the namespaced candidate - classes
    /// never do.
    pub fn resolve_name(
        &self,
        kind: ElementKind,
        name: &str,
        context: &Context,
        exists: impl Fn(FqsenId) -> bool,
    ) -> FqsenId {
        debug_assert!(!kind.is_member(), "members resolve through their class");

        if let Some(rest) = name.strip_prefix('\\') {
            let (namespace, local) = match rest.rsplit_once('\\') {
                Some((namespace, local)) => (namespace, local),
                None => ("", rest),
            };
            return self.top_level(kind, namespace, local, 0);
        }

        match name.split_once('\\') {
            // Qualified relative name: the first segment may be an alias,
            // always looked up in the class import table.
            Some((first, rest)) => {
                let base = match context.import_for(ElementKind::Class, first) {
                    Some(target) => self.display(target),
                    None => {
                        let namespace = context.namespace();
                        if &*namespace == "\\" {
                            format!("\\{first}")
                        } else {
                            format!("{namespace}\\{first}")
                        }
                    }
                };
                let full = format!("{base}\\{rest}");
                let (namespace, local) = full.rsplit_once('\\').expect("qualified path");
                self.top_level(kind, namespace, local, 0)
            }
            // Unqualified name: per-kind import table, then namespace
            // prefix, then (functions/constants only) global fallback.
            None => {
                if let Some(target) = context.import_for(kind, name) {
                    return target;
                }
                let namespace = context.namespace();
                let candidate = self.top_level(kind, &namespace, name, 0);
                if kind == ElementKind::Class || &*namespace == "\\" {
                    return candidate;
                }
                if exists(candidate) {
                    candidate
                } else {
                    trace!(name, "no namespaced definition, falling back to global");
                    self.top_level(kind, "", name, 0)
                }
            }
        }
    }
}

impl Default for FqsenRegistry {
    fn default() -> Self {
        Self::new()
    }
}
