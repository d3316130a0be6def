//! The process-wide symbol table.
//!
//! `CodeBase` maps interned FQSENs to typed records for classes,
//! functions and constants, with a file reverse index for incremental
//! invalidation. It is populated during the declaration pass, read (never
//! mutated) during the inference pass, and flushed per file when sources
//! change. Declaration is declare-or-report-exists: the alternate-id
//! search loops on the result, so re-declaring an unchanged file after a
//! flush reproduces identical ids.

use crate::types::Type;
use crate::union::UnionType;
use dashmap::DashMap;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_binder::{FqsenId, FqsenRegistry};

/// Class declaration modifiers as stored on records.
pub mod class_modifiers {
    pub const ABSTRACT: u32 = 1 << 0;
    pub const FINAL: u32 = 1 << 1;
    pub const INTERFACE: u32 = 1 << 2;
    pub const TRAIT: u32 = 1 << 3;
}

/// Member modifiers as stored on records.
pub mod member_modifiers {
    pub const PUBLIC: u32 = 1 << 0;
    pub const PROTECTED: u32 = 1 << 1;
    pub const PRIVATE: u32 = 1 << 2;
    pub const STATIC: u32 = 1 << 3;
    pub const ABSTRACT: u32 = 1 << 4;
    pub const FINAL: u32 = 1 << 5;
}

/// Function-like modifiers as stored on records.
pub mod function_modifiers {
    pub const CLOSURE: u32 = 1 << 0;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub name: String,
    pub union_type: UnionType,
    pub optional: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub fqsen: FqsenId,
    pub name: String,
    pub parameters: Vec<ParameterRecord>,
    pub return_type: UnionType,
    pub flags: u32,
    pub lineno: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub fqsen: FqsenId,
    pub name: String,
    pub union_type: UnionType,
    pub flags: u32,
    pub lineno: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassConstantRecord {
    pub fqsen: FqsenId,
    pub name: String,
    pub union_type: UnionType,
    pub lineno: u32,
}

/// One declared class, interface or trait.
///
/// Member maps preserve declaration order and are keyed by the
/// case-appropriate lookup key: folded for methods and properties, exact
/// for constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub fqsen: FqsenId,
    pub union_type: UnionType,
    pub parent: Option<FqsenId>,
    pub interfaces: Vec<FqsenId>,
    pub traits: Vec<FqsenId>,
    pub methods: IndexMap<String, MethodRecord>,
    pub properties: IndexMap<String, PropertyRecord>,
    pub constants: IndexMap<String, ClassConstantRecord>,
    pub flags: u32,
    pub file: String,
    pub lineno: u32,
}

impl ClassRecord {
    pub fn new(fqsen: FqsenId, flags: u32, file: &str, lineno: u32) -> Self {
        Self {
            fqsen,
            union_type: UnionType::of(Type::class(fqsen)),
            parent: None,
            interfaces: Vec::new(),
            traits: Vec::new(),
            methods: IndexMap::new(),
            properties: IndexMap::new(),
            constants: IndexMap::new(),
            flags,
            file: file.to_string(),
            lineno,
        }
    }

    pub const fn is_abstract(&self) -> bool {
        self.flags & class_modifiers::ABSTRACT != 0
    }

    pub const fn is_final(&self) -> bool {
        self.flags & class_modifiers::FINAL != 0
    }

    pub const fn is_interface(&self) -> bool {
        self.flags & class_modifiers::INTERFACE != 0
    }

    pub const fn is_trait(&self) -> bool {
        self.flags & class_modifiers::TRAIT != 0
    }

    pub fn method(&self, name: &str) -> Option<&MethodRecord> {
        self.methods.get(&name.to_lowercase())
    }

    pub fn property(&self, name: &str) -> Option<&PropertyRecord> {
        self.properties.get(&name.to_lowercase())
    }

    pub fn constant(&self, name: &str) -> Option<&ClassConstantRecord> {
        self.constants.get(name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub fqsen: FqsenId,
    pub name: String,
    pub parameters: Vec<ParameterRecord>,
    pub return_type: UnionType,
    pub flags: u32,
    pub file: String,
    pub lineno: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstantRecord {
    pub fqsen: FqsenId,
    pub union_type: UnionType,
    pub file: String,
    pub lineno: u32,
}

/// The global symbol table.
pub struct CodeBase {
    /// Shared identity intern table; every FQSEN in the records below
    /// came from here.
    pub fqsens: FqsenRegistry,
    classes: FxHashMap<FqsenId, ClassRecord>,
    functions: FxHashMap<FqsenId, FunctionRecord>,
    constants: FxHashMap<FqsenId, ConstantRecord>,
    /// file -> declared top-level ids, for per-file invalidation.
    files: FxHashMap<String, Vec<FqsenId>>,
    /// Memoized ancestor closures; cleared whenever the table changes
    /// shape, since stale closures are a correctness bug.
    pub(crate) expansions: DashMap<FqsenId, UnionType>,
}

impl CodeBase {
    pub fn new() -> Self {
        Self {
            fqsens: FqsenRegistry::new(),
            classes: FxHashMap::default(),
            functions: FxHashMap::default(),
            constants: FxHashMap::default(),
            files: FxHashMap::default(),
            expansions: DashMap::new(),
        }
    }

    // Declaration: insert-if-absent. A `false` return means the id is
    // taken and the caller should retry under the next alternate.

    pub fn declare_class(&mut self, record: ClassRecord) -> bool {
        if self.classes.contains_key(&record.fqsen) {
            return false;
        }
        debug!(fqsen = %self.fqsens.display(record.fqsen), "declare class");
        self.files
            .entry(record.file.clone())
            .or_default()
            .push(record.fqsen);
        self.classes.insert(record.fqsen, record);
        self.expansions.clear();
        true
    }

    pub fn declare_function(&mut self, record: FunctionRecord) -> bool {
        if self.functions.contains_key(&record.fqsen) {
            return false;
        }
        debug!(fqsen = %self.fqsens.display(record.fqsen), "declare function");
        self.files
            .entry(record.file.clone())
            .or_default()
            .push(record.fqsen);
        self.functions.insert(record.fqsen, record);
        true
    }

    pub fn declare_constant(&mut self, record: ConstantRecord) -> bool {
        if self.constants.contains_key(&record.fqsen) {
            return false;
        }
        self.files
            .entry(record.file.clone())
            .or_default()
            .push(record.fqsen);
        self.constants.insert(record.fqsen, record);
        true
    }

    // Lookup

    pub fn has_class(&self, fqsen: FqsenId) -> bool {
        self.classes.contains_key(&fqsen)
    }

    pub fn class(&self, fqsen: FqsenId) -> Option<&ClassRecord> {
        self.classes.get(&fqsen)
    }

    /// Mutable access for the declaration pass to fill members in after
    /// the class shell is registered.
    pub fn class_mut(&mut self, fqsen: FqsenId) -> Option<&mut ClassRecord> {
        self.classes.get_mut(&fqsen)
    }

    pub fn has_function(&self, fqsen: FqsenId) -> bool {
        self.functions.contains_key(&fqsen)
    }

    pub fn function(&self, fqsen: FqsenId) -> Option<&FunctionRecord> {
        self.functions.get(&fqsen)
    }

    pub fn has_constant(&self, fqsen: FqsenId) -> bool {
        self.constants.contains_key(&fqsen)
    }

    pub fn constant(&self, fqsen: FqsenId) -> Option<&ConstantRecord> {
        self.constants.get(&fqsen)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassRecord> {
        self.classes.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.functions.values()
    }

    /// Find a declared class by canonical identity and declaration site.
    ///
    /// The inference pass re-walks trees after declaration has assigned
    /// alternate ids; the declaration line disambiguates which alternate
    /// a given tree node produced.
    pub fn class_at_line(&self, base: FqsenId, file: &str, lineno: u32) -> Option<&ClassRecord> {
        let base = self.fqsens.canonical(base);
        let mut alternate = 0;
        loop {
            let candidate = self.fqsens.with_alternate(base, alternate);
            let record = self.classes.get(&candidate)?;
            if record.file == file && record.lineno == lineno {
                return Some(record);
            }
            alternate += 1;
        }
    }

    /// Find a declared function by canonical identity and declaration
    /// site; see [`Self::class_at_line`].
    pub fn function_at_line(
        &self,
        base: FqsenId,
        file: &str,
        lineno: u32,
    ) -> Option<&FunctionRecord> {
        let base = self.fqsens.canonical(base);
        let mut alternate = 0;
        loop {
            let candidate = self.fqsens.with_alternate(base, alternate);
            let record = self.functions.get(&candidate)?;
            if record.file == file && record.lineno == lineno {
                return Some(record);
            }
            alternate += 1;
        }
    }

    // Member lookup through the hierarchy: self, traits, parent chain,
    // interfaces, in that order.

    fn hierarchy_walk<'a, T>(
        &'a self,
        class: FqsenId,
        find: impl Fn(&'a ClassRecord) -> Option<T>,
    ) -> Option<T> {
        // Breadth-first: self, then traits, parent, interfaces, then
        // their ancestors. Closer declarations shadow farther ones.
        let mut queue = std::collections::VecDeque::from([class]);
        let mut seen = rustc_hash::FxHashSet::default();
        let mut hops = 0u32;
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            hops += 1;
            if hops > vigil_common::limits::MAX_HIERARCHY_DEPTH {
                break;
            }
            let Some(record) = self.classes.get(&current) else {
                continue;
            };
            if let Some(found) = find(record) {
                return Some(found);
            }
            queue.extend(record.traits.iter().copied());
            if let Some(parent) = record.parent {
                queue.push_back(parent);
            }
            queue.extend(record.interfaces.iter().copied());
        }
        None
    }

    /// Look up a method on a class or any of its ancestors.
    pub fn method_on(&self, class: FqsenId, name: &str) -> Option<&MethodRecord> {
        self.hierarchy_walk(class, |record| record.method(name))
    }

    /// Look up a property on a class or any of its ancestors.
    pub fn property_on(&self, class: FqsenId, name: &str) -> Option<&PropertyRecord> {
        self.hierarchy_walk(class, |record| record.property(name))
    }

    /// Look up a class constant, walking the ancestor chain until it is
    /// found or the chain is exhausted.
    pub fn class_constant_on(&self, class: FqsenId, name: &str) -> Option<&ClassConstantRecord> {
        self.hierarchy_walk(class, |record| record.constant(name))
    }

    /// Drop every declaration made by one file and invalidate dependent
    /// memoization. Re-declaring the same content afterwards reproduces
    /// bit-identical FQSENs and alternate ids.
    pub fn flush_file(&mut self, file: &str) {
        let Some(ids) = self.files.remove(file) else {
            return;
        };
        debug!(file, count = ids.len(), "flush file declarations");
        for id in ids {
            self.classes.remove(&id);
            self.functions.remove(&id);
            self.constants.remove(&id);
        }
        self.expansions.clear();
    }
}

impl Default for CodeBase {
    fn default() -> Self {
        Self::new()
    }
}
