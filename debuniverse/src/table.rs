//! The package universe: a name-keyed table with dependency-closure
//! resolution.

use std::collections::{BTreeMap, VecDeque};

use crate::package::Package;

/// A name-keyed table of packages, owning the full universe parsed from a
/// `Packages` index.
#[derive(Debug, Default)]
pub struct PackageTable {
    packages: BTreeMap<String, Package>,
}

impl PackageTable {
    pub fn new(packages: Vec<Package>) -> Self {
        Self {
            packages: packages.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Package> {
        self.packages.get_mut(name)
    }

    /// Iterates packages in deterministic name order.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Computes the transitive dependency closure of `seeds`.
    ///
    /// Breadth-first, following only the first alternative of each
    /// `Depends`/`Pre-Depends` or-group (no backtracking), deduplicated,
    /// returned in discovery order. Seed names absent from the table are
    /// silently skipped — callers that need to warn on a missing seed
    /// should check membership before calling this.
    pub fn resolve_dependencies<'a, I>(&'a self, seeds: I) -> Vec<&'a Package>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen: BTreeMap<&str, ()> = BTreeMap::new();
        let mut order: Vec<&'a Package> = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        for name in seeds {
            if seen.insert(name, ()).is_none() {
                queue.push_back(name);
            }
        }

        while let Some(name) = queue.pop_front() {
            let Some(pkg) = self.packages.get(name) else {
                continue;
            };
            order.push(pkg);

            for group in pkg.pre_depends.iter().chain(pkg.depends.iter()) {
                let Some(primary) = group.primary() else {
                    continue;
                };
                if seen.insert(primary.name.as_str(), ()).is_none() {
                    queue.push_back(primary.name.as_str());
                }
            }
        }

        order
    }
}
