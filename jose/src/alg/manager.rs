use std::collections::BTreeMap;
use std::sync::Arc;

use crate::prelude::*;

/// The algorithms a builder, verifier or decrypter is allowed to use, indexed by name
pub struct AlgorithmManager<A: ?Sized> {
    algorithms: BTreeMap<&'static str, Arc<A>>,
}

impl<A: Algorithm + ?Sized> AlgorithmManager<A> {
    /// Indexes the algorithms by name, the last one wins on duplicates
    pub fn new(algorithms: impl IntoIterator<Item = Arc<A>>) -> Self {
        let algorithms = algorithms.into_iter().map(|a| (a.name(), a)).collect();
        Self { algorithms }
    }

    /// Algorithm with that exact, case-sensitive, name
    pub fn get(&self, name: &str) -> Option<&Arc<A>> {
        self.algorithms.get(name)
    }

    /// Whether the algorithm is in the manager
    pub fn has(&self, name: &str) -> bool {
        self.algorithms.contains_key(name)
    }

    /// Names of the managed algorithms
    pub fn list(&self) -> Vec<&'static str> {
        self.algorithms.keys().copied().collect()
    }

    /// Number of managed algorithms
    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    /// Whether no algorithm is allowed
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

impl<A: ?Sized> Clone for AlgorithmManager<A> {
    fn clone(&self) -> Self {
        Self {
            algorithms: self.algorithms.clone(),
        }
    }
}

impl<A: ?Sized> Default for AlgorithmManager<A> {
    fn default() -> Self {
        Self {
            algorithms: BTreeMap::new(),
        }
    }
}

impl<A: Algorithm + ?Sized> std::fmt::Debug for AlgorithmManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.algorithms.keys()).finish()
    }
}
