//! Local variable scope for the inference pass.
//!
//! Tracks the union type each variable has been observed to hold so far
//! in the current function-like body. Branch scopes are merged by union:
//! a variable may hold any type it was assigned on any path.

use rustc_hash::FxHashMap;
use vigil_solver::UnionType;

#[derive(Clone, Debug, Default)]
pub struct Scope {
    variables: FxHashMap<String, UnionType>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&UnionType> {
        self.variables.get(name)
    }

    pub fn set(&mut self, name: &str, union: UnionType) {
        self.variables.insert(name.to_string(), union);
    }

    /// Fold branch scopes back into this one, unioning the types each
    /// variable was observed with across the branches.
    pub fn merge_branches(&mut self, branches: Vec<Scope>) {
        for branch in branches {
            for (name, union) in branch.variables {
                match self.variables.get_mut(&name) {
                    Some(existing) => *existing = existing.union(&union),
                    None => {
                        self.variables.insert(name, union);
                    }
                }
            }
        }
    }
}
