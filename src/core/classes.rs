//! Collision classes, the ignore-set language, and the category/mask
//! compiler.
//!
//! Classes declare who they refuse to touch symbolically; the compiler
//! lowers that graph onto the engine's 16-bit category/mask filter. Two
//! classes share a category exactly when the set of classes refusing to
//! touch them is identical, which keeps category usage minimal under the
//! engine's cap.

use std::collections::HashMap;

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::MAX_COLLISION_CATEGORIES;
use crate::error::{Result, StrataError};

/// Symbolic set of collision-class names, used both for `ignores`
/// declarations and for query filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassSet {
    /// Exactly the listed classes.
    Named(Vec<String>),
    /// Every registered class.
    All,
    /// Every registered class except the listed ones.
    AllExcept(Vec<String>),
}

impl Default for ClassSet {
    fn default() -> Self {
        ClassSet::Named(Vec::new())
    }
}

impl ClassSet {
    /// Convenience constructor for a [`ClassSet::Named`] set.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ClassSet::Named(names.into_iter().map(Into::into).collect())
    }

    /// Convenience constructor for a [`ClassSet::AllExcept`] set.
    pub fn all_except<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ClassSet::AllExcept(names.into_iter().map(Into::into).collect())
    }

    /// Membership test; `All` and `AllExcept` do not require knowing the
    /// registered universe.
    pub fn contains(&self, name: &str) -> bool {
        match self {
            ClassSet::Named(names) => names.iter().any(|n| n == name),
            ClassSet::All => true,
            ClassSet::AllExcept(names) => !names.iter().any(|n| n == name),
        }
    }

    /// Resolves the set against the registered universe for the class
    /// declaring it, preserving universe order and dropping duplicates.
    /// The `All`/`AllExcept` sentinels always subtract the declaring class,
    /// so `AllExcept(S)` expands to `universe \ (S ∪ {owner})`; a class
    /// only ignores itself when a `Named` list says so explicitly. Named
    /// entries that are not registered (yet) are skipped with a warning;
    /// the compiler reruns on every registration, so late additions
    /// converge.
    pub(crate) fn expand(&self, universe: &[String], owner: &str) -> Vec<String> {
        match self {
            ClassSet::Named(names) => {
                let mut out = Vec::new();
                for name in names {
                    if !universe.contains(name) {
                        warn!("ignore list references unregistered class {name:?}, skipping");
                        continue;
                    }
                    if !out.contains(name) {
                        out.push(name.clone());
                    }
                }
                out
            }
            ClassSet::All => universe.iter().filter(|name| *name != owner).cloned().collect(),
            ClassSet::AllExcept(except) => universe
                .iter()
                .filter(|name| *name != owner && !except.contains(name))
                .cloned()
                .collect(),
        }
    }
}

/// Declarative policy of one collision class.
///
/// In implicit event mode (the default) the four transition lists are
/// ignored: every class pair fires every transition. In explicit mode only
/// the listed peers generate events of that kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollisionClassDef {
    /// Classes this one refuses to physically contact.
    pub ignores: ClassSet,
    /// Peers generating enter events (explicit mode only).
    pub enter: Vec<String>,
    /// Peers generating exit events (explicit mode only).
    pub exit: Vec<String>,
    /// Peers generating pre-solve callbacks (explicit mode only).
    pub pre: Vec<String>,
    /// Peers generating post-solve callbacks (explicit mode only).
    pub post: Vec<String>,
}

impl CollisionClassDef {
    /// A class with no ignores and no explicit event peers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignores(mut self, ignores: ClassSet) -> Self {
        self.ignores = ignores;
        self
    }
}

/// Engine filter data derived for one class: a category id in `[1, 16]`
/// and the bitsets applied to its solid fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMask {
    /// 1-based category id shared by filter-equivalent classes.
    pub category: u32,
    /// Bit the class's fixtures carry as their category.
    pub membership_bits: u32,
    /// Categories the class accepts contact with.
    pub filter_bits: u32,
}

/// Registry of collision classes in registration order, plus the compiled
/// category/mask assignment.
pub(crate) struct ClassRegistry {
    order: Vec<String>,
    defs: HashMap<String, CollisionClassDef>,
    expanded: HashMap<String, Vec<String>>,
    assignment: HashMap<String, CategoryMask>,
    sensor_memo: HashMap<(String, String), bool>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            defs: HashMap::new(),
            expanded: HashMap::new(),
            assignment: HashMap::new(),
            sensor_memo: HashMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn def(&self, name: &str) -> Option<&CollisionClassDef> {
        self.defs.get(name)
    }

    pub fn category_mask(&self, name: &str) -> Option<CategoryMask> {
        self.assignment.get(name).copied()
    }

    /// Registers a class and recompiles the assignment. On failure the
    /// registry is left unchanged.
    pub fn register(&mut self, name: &str, def: CollisionClassDef) -> Result<()> {
        if self.contains(name) {
            return Err(StrataError::DuplicateClass(name.to_string()));
        }
        self.order.push(name.to_string());
        self.defs.insert(name.to_string(), def);
        if let Err(err) = self.recompile() {
            self.order.pop();
            self.defs.remove(name);
            // restore the previous consistent assignment
            let _ = self.recompile();
            return Err(err);
        }
        Ok(())
    }

    /// Whether events between the two classes travel the sensor path,
    /// i.e. the ignore relation holds in either direction. Memoized per
    /// unordered pair.
    pub fn sensor_pair(&mut self, a: &str, b: &str) -> bool {
        let key = if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };
        if let Some(&cached) = self.sensor_memo.get(&key) {
            return cached;
        }
        let ignores = |x: &str, y: &str| {
            self.expanded
                .get(x)
                .map(|set| set.iter().any(|n| n == y))
                .unwrap_or(false)
        };
        let result = ignores(a, b) || ignores(b, a);
        self.sensor_memo.insert(key, result);
        result
    }

    /// Two-way filter predicate: whether the engine lets fixtures of the
    /// two classes generate a contact.
    pub fn contact_allowed(&self, a: &str, b: &str) -> bool {
        let (Some(ma), Some(mb)) = (self.category_mask(a), self.category_mask(b)) else {
            return false;
        };
        (ma.membership_bits & mb.filter_bits) != 0 && (mb.membership_bits & ma.filter_bits) != 0
    }

    /// Lowers the ignore graph to categories and masks.
    ///
    /// 1. Expand each class's ignore set against the universe.
    /// 2. Build the reverse relation and group classes by their sorted
    ///    "who ignores me" signature; each group gets a category id in
    ///    first-seen order starting at 1.
    /// 3. A class's mask accepts every category except those of its
    ///    expanded ignore set.
    fn recompile(&mut self) -> Result<()> {
        let universe = self.order.clone();

        let mut expanded: HashMap<String, Vec<String>> = HashMap::new();
        let mut incoming: HashMap<String, Vec<String>> = HashMap::new();
        for name in &universe {
            incoming.insert(name.clone(), Vec::new());
        }
        for name in &universe {
            let set = self.defs[name].ignores.expand(&universe, name);
            for target in &set {
                incoming
                    .get_mut(target)
                    .expect("expand only yields registered classes")
                    .push(name.clone());
            }
            expanded.insert(name.clone(), set);
        }

        let mut category_of_signature: HashMap<String, u32> = HashMap::new();
        let mut category_of_class: HashMap<String, u32> = HashMap::new();
        for name in &universe {
            let mut sources = incoming[name].clone();
            sources.sort_by_key(|n| n.to_lowercase());
            let signature = sources.join("|");
            let next = category_of_signature.len() as u32 + 1;
            let category = *category_of_signature.entry(signature).or_insert(next);
            category_of_class.insert(name.clone(), category);
        }

        if category_of_signature.len() > MAX_COLLISION_CATEGORIES {
            return Err(StrataError::CategoryOverflow {
                classes: universe.clone(),
            });
        }

        let mut assignment = HashMap::new();
        for name in &universe {
            let category = category_of_class[name];
            let mut ignored_bits = 0u32;
            for target in &expanded[name] {
                ignored_bits |= 1 << (category_of_class[target] - 1);
            }
            assignment.insert(
                name.clone(),
                CategoryMask {
                    category,
                    membership_bits: 1 << (category - 1),
                    filter_bits: !ignored_bits,
                },
            );
            trace!(
                "class {name:?}: category {category}, filter {:#06x}",
                !ignored_bits & 0xffff
            );
        }

        self.expanded = expanded;
        self.assignment = assignment;
        self.sensor_memo.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_of(classes: &[(&str, CollisionClassDef)]) -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        for (name, def) in classes {
            registry.register(name, def.clone()).unwrap();
        }
        registry
    }

    fn ignoring(names: &[&str]) -> CollisionClassDef {
        CollisionClassDef::new().with_ignores(ClassSet::named(names.iter().copied()))
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ClassRegistry::new();
        registry.register("Solid", CollisionClassDef::new()).unwrap();
        assert!(matches!(
            registry.register("Solid", CollisionClassDef::new()),
            Err(StrataError::DuplicateClass(_))
        ));
    }

    #[test]
    fn ignore_filters_contact_both_ways() {
        let registry = registry_of(&[
            ("Player", ignoring(&["Enemy"])),
            ("Enemy", CollisionClassDef::new()),
            ("Wall", CollisionClassDef::new()),
        ]);
        assert!(!registry.contact_allowed("Player", "Enemy"));
        assert!(!registry.contact_allowed("Enemy", "Player"));
        assert!(registry.contact_allowed("Player", "Wall"));
        assert!(registry.contact_allowed("Enemy", "Wall"));
    }

    #[test]
    fn all_except_expands_to_the_complement_without_self() {
        let registry = registry_of(&[
            ("Ghost", CollisionClassDef::new().with_ignores(ClassSet::all_except(["Anchor"]))),
            ("Anchor", CollisionClassDef::new()),
            ("Wall", CollisionClassDef::new()),
        ]);
        // AllExcept(S) behaves as universe \ (S ∪ {self})
        assert!(registry.contact_allowed("Ghost", "Anchor"));
        assert!(!registry.contact_allowed("Ghost", "Wall"));
        assert!(registry.contact_allowed("Ghost", "Ghost"));
    }

    #[test]
    fn all_sentinel_never_ignores_self() {
        let registry = registry_of(&[
            ("Hermit", CollisionClassDef::new().with_ignores(ClassSet::All)),
            ("Wall", CollisionClassDef::new()),
        ]);
        assert!(!registry.contact_allowed("Hermit", "Wall"));
        assert!(registry.contact_allowed("Hermit", "Hermit"));
        // an explicit Named list still can
        let explicit = registry_of(&[("Loner", ignoring(&["Loner"])), ("Wall", CollisionClassDef::new())]);
        assert!(!explicit.contact_allowed("Loner", "Loner"));
        assert!(explicit.contact_allowed("Loner", "Wall"));
    }

    #[test]
    fn class_set_membership_is_universe_free() {
        let set = ClassSet::all_except(["P"]);
        assert!(!set.contains("P"));
        assert!(set.contains("E"));
        assert!(ClassSet::All.contains("anything"));
        assert!(ClassSet::named(["A"]).contains("A"));
        assert!(!ClassSet::named(["A"]).contains("B"));
    }

    #[test]
    fn filter_equivalent_classes_share_a_category() {
        // Five pairs of targets each ignored by one ignorer; ten ignorers
        // plus five untouched targets all share the "nobody ignores me"
        // signature. Twenty classes, six categories.
        let mut registry = ClassRegistry::new();
        for i in 0..5 {
            registry
                .register(&format!("Target{i}"), CollisionClassDef::new())
                .unwrap();
        }
        for i in 0..5 {
            registry
                .register(&format!("Spare{i}"), CollisionClassDef::new())
                .unwrap();
        }
        for i in 0..10 {
            let target = format!("Target{}", i / 2);
            registry
                .register(&format!("Ignorer{i}"), ignoring(&[target.as_str()]))
                .unwrap();
        }

        let categories: std::collections::HashSet<u32> = registry
            .names()
            .iter()
            .map(|n| registry.category_mask(n).unwrap().category)
            .collect();
        assert_eq!(categories.len(), 6);
        assert!(categories.iter().all(|&c| c >= 1 && c <= 15));

        // paired targets are ignored by different ignorers, so they get
        // distinct categories; their ignorers collapse into one
        let t0 = registry.category_mask("Target0").unwrap().category;
        let t1 = registry.category_mask("Target1").unwrap().category;
        assert_ne!(t0, t1);
        let i0 = registry.category_mask("Ignorer0").unwrap().category;
        let i1 = registry.category_mask("Ignorer1").unwrap().category;
        assert_eq!(i0, i1);
    }

    #[test]
    fn seventeen_distinct_signatures_overflow() {
        let mut registry = ClassRegistry::new();
        let names: Vec<String> = (0..17).map(|i| format!("C{i}")).collect();
        // C0 gets every class registered so far as its incoming set once
        // the later ones ignore it; build a strict chain so every class
        // ends up with a distinct "who ignores me" signature.
        let mut result = Ok(());
        for (i, name) in names.iter().enumerate() {
            let targets: Vec<&str> = names[..i].iter().map(String::as_str).collect();
            result = registry.register(name, ignoring(&targets));
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(StrataError::CategoryOverflow { .. })));
        // the failed registration rolled back
        assert_eq!(registry.names().len(), 16);
        assert!(!registry.contains("C16"));
    }

    #[test]
    fn sensor_pair_holds_in_either_direction() {
        let mut registry = registry_of(&[
            ("Player", ignoring(&["Enemy"])),
            ("Enemy", CollisionClassDef::new()),
            ("Wall", CollisionClassDef::new()),
        ]);
        assert!(registry.sensor_pair("Player", "Enemy"));
        assert!(registry.sensor_pair("Enemy", "Player"));
        assert!(!registry.sensor_pair("Enemy", "Wall"));
        // memoized result stays stable
        assert!(registry.sensor_pair("Player", "Enemy"));
    }
}
