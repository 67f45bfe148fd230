//! Delivery (release) model and the delivery registry.

use super::observable::{CollectionEvent, ListenerId, ObservableSet};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One recorded release.
///
/// Equality and ordering only look at the identifier. Deliveries whose
/// identifiers are semantic versions (`1.2`, `v2.0.1`, `3.0.0-rc.1`) order by
/// version precedence and sort before free-form labels, which use a natural
/// ordering where digit runs compare numerically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    id: String,
    /// Person who assembled the delivery
    pub integrator: String,
    /// Creation time, second precision
    pub created: DateTime<Utc>,
}

impl Delivery {
    /// Create a delivery stamped with the current time
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_details(id, String::new(), Utc::now())
    }

    /// Create a delivery with explicit metadata
    pub fn with_details(
        id: impl Into<String>,
        integrator: impl Into<String>,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            integrator: integrator.into(),
            created: created.trunc_subsecs(0),
        }
    }

    /// The version label identifying this delivery
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Parse a version label leniently: `v1.2` → `1.2.0`.
#[must_use]
pub fn parse_version_label(label: &str) -> Option<semver::Version> {
    let trimmed = label.trim().trim_start_matches(['v', 'V']);
    if let Ok(v) = semver::Version::parse(trimmed) {
        return Some(v);
    }
    // Pad missing minor/patch components of a purely numeric core.
    let (core, rest) = match trimmed.find(['-', '+']) {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    };
    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty()
        || parts.len() > 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    semver::Version::parse(&format!("{padded}{rest}")).ok()
}

/// Compare two strings naturally: digit runs numerically, the rest bytewise.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.as_bytes();
    let mut right = b.as_bytes();
    loop {
        match (left.first(), right.first()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let lx = left.iter().take_while(|c| c.is_ascii_digit()).count();
                let ly = right.iter().take_while(|c| c.is_ascii_digit()).count();
                let (nx, ny) = (trim_zeros(&left[..lx]), trim_zeros(&right[..ly]));
                let ord = nx.len().cmp(&ny.len()).then_with(|| nx.cmp(ny));
                if ord != Ordering::Equal {
                    return ord;
                }
                left = &left[lx..];
                right = &right[ly..];
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(y);
                }
                left = &left[1..];
                right = &right[1..];
            }
        }
    }
}

fn trim_zeros(digits: &[u8]) -> &[u8] {
    let zeros = digits.iter().take_while(|&&d| d == b'0').count();
    &digits[zeros..]
}

impl PartialEq for Delivery {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Delivery {}

impl PartialOrd for Delivery {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Delivery {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_ids(&self.id, &other.id)
    }
}

/// The delivery order applied to bare identifiers.
#[must_use]
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    let primary = match (parse_version_label(a), parse_version_label(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => natural_cmp(a, b),
    };
    // `1.0` and `v1.0.0` share a version; keep them distinct.
    primary.then_with(|| a.cmp(b))
}

impl std::hash::Hash for Delivery {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// The ordered set of known deliveries.
///
/// Wraps an [`ObservableSet`] so that views can follow additions and
/// removals.
#[derive(Default)]
pub struct DeliveryRegistry {
    set: ObservableSet<Delivery>,
}

impl DeliveryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a delivery; `false` if one with the same identifier exists
    pub fn add(&mut self, delivery: Delivery) -> bool {
        self.set.add(delivery)
    }

    /// Remove a delivery by identifier, returning it if it was present
    pub fn remove(&mut self, id: &str) -> Option<Delivery> {
        self.set.take(&Delivery::new(id))
    }

    /// Look up a delivery by identifier
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Delivery> {
        self.set.get(&Delivery::new(id))
    }

    /// Whether a delivery with the identifier exists
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The delivery immediately preceding `id` in the total order
    #[must_use]
    pub fn former(&self, id: &str) -> Option<&Delivery> {
        self.set.before(&Delivery::new(id))
    }

    /// The most recent delivery
    #[must_use]
    pub fn latest(&self) -> Option<&Delivery> {
        self.set.iter().next_back()
    }

    /// Replace integrator/timestamp of an existing delivery.
    ///
    /// Returns `false` if no delivery has the identifier.
    pub fn update(
        &mut self,
        id: &str,
        integrator: Option<String>,
        created: Option<DateTime<Utc>>,
    ) -> bool {
        let Some(mut delivery) = self.set.take_silently(&Delivery::new(id)) else {
            return false;
        };
        if let Some(integrator) = integrator {
            delivery.integrator = integrator;
        }
        if let Some(created) = created {
            delivery.created = created.trunc_subsecs(0);
        }
        self.set.insert_silently(delivery);
        true
    }

    /// Deliveries in ascending order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Delivery> {
        self.set.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Register a listener for additions and removals
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CollectionEvent<'_, Delivery>) + Send + 'static,
    {
        self.set.subscribe(listener)
    }

    /// Remove a listener
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.set.unsubscribe(id)
    }
}

impl fmt::Debug for DeliveryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.set.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ids(set: &BTreeSet<Delivery>) -> Vec<&str> {
        set.iter().map(Delivery::id).collect()
    }

    #[test]
    fn test_semver_ordering() {
        let set: BTreeSet<_> = ["1.10", "1.2", "v1.9.1", "2.0.0-rc.1", "2.0.0"]
            .into_iter()
            .map(Delivery::new)
            .collect();
        assert_eq!(ids(&set), vec!["1.2", "v1.9.1", "1.10", "2.0.0-rc.1", "2.0.0"]);
    }

    #[test]
    fn test_free_form_labels_sort_after_versions() {
        let set: BTreeSet<_> = ["sprint-10", "1.0", "sprint-9"]
            .into_iter()
            .map(Delivery::new)
            .collect();
        assert_eq!(ids(&set), vec!["1.0", "sprint-9", "sprint-10"]);
    }

    #[test]
    fn test_equal_versions_with_different_labels_stay_distinct() {
        let a = Delivery::new("1.0");
        let b = Delivery::new("v1.0.0");
        assert_ne!(a, b);
        assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    }

    #[test]
    fn test_equality_ignores_metadata() {
        let a = Delivery::with_details("1.0", "alice", Utc::now());
        let b = Delivery::with_details("1.0", "bob", Utc::now());
        assert_eq!(a, b);
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("build-2", "build-10"), Ordering::Less);
        assert_eq!(natural_cmp("a007", "a7"), Ordering::Equal);
        assert_eq!(natural_cmp("abc", "abd"), Ordering::Less);
    }

    #[test]
    fn test_registry_add_remove() {
        let mut registry = DeliveryRegistry::new();
        assert!(registry.add(Delivery::new("1.0")));
        assert!(registry.add(Delivery::new("1.1")));
        assert!(!registry.add(Delivery::new("1.0")));
        assert_eq!(registry.len(), 2);

        assert!(registry.remove("1.0").is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.remove("1.0").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_former_delivery() {
        let mut registry = DeliveryRegistry::new();
        for id in ["1.2", "1.0", "1.1"] {
            registry.add(Delivery::new(id));
        }
        assert_eq!(registry.former("1.2").map(Delivery::id), Some("1.1"));
        assert_eq!(registry.former("1.0"), None);
        assert_eq!(registry.latest().map(Delivery::id), Some("1.2"));
    }

    #[test]
    fn test_update_keeps_membership() {
        let mut registry = DeliveryRegistry::new();
        registry.add(Delivery::new("1.0"));
        assert!(registry.update("1.0", Some("carol".into()), None));
        assert_eq!(registry.get("1.0").unwrap().integrator, "carol");
        assert!(!registry.update("9.9", None, None));
        assert_eq!(registry.len(), 1);
    }
}
