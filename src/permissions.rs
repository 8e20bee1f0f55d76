use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One authorizable action: a route pattern and an HTTP method.
///
/// Matching is exact on both fields. `/discussions/{id}` and `/discussions/1`
/// are different permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub path: String,
    pub method: String,
}

/// A registered route has the same shape as the permission that guards it.
pub type RouteDescriptor = Permission;

impl Permission {
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
        }
    }

    pub fn matches(&self, path: &str, method: &str) -> bool {
        self.path == path && self.method == method
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Ordered list of permissions attached to a role.
///
/// Insertion order is kept and duplicates are allowed; the persisted form is
/// a JSON array of `{"path", "method"}` objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(Vec<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        // NULL-ish columns (an aggregate over zero rows) decode as empty
        if raw.trim().is_empty() || raw.trim() == "null" {
            return Ok(Self::new());
        }
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    pub fn push(&mut self, permission: Permission) {
        self.0.push(permission);
    }

    pub fn contains(&self, permission: &Permission) -> bool {
        self.0.iter().any(|p| p == permission)
    }

    /// Drops every element equal to `(path, method)` and returns how many went.
    pub fn remove_matching(&mut self, path: &str, method: &str) -> usize {
        let before = self.0.len();
        self.0.retain(|p| !p.matches(path, method));
        before - self.0.len()
    }

    /// Elements of `self` not present in `granted`, in `self`'s order.
    pub fn difference(&self, granted: &PermissionSet) -> PermissionSet {
        let granted: HashSet<&Permission> = granted.0.iter().collect();
        self.0
            .iter()
            .filter(|p| !granted.contains(p))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Permission> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Permission] {
        &self.0
    }
}

impl From<Vec<Permission>> for PermissionSet {
    fn from(value: Vec<Permission>) -> Self {
        Self(value)
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PermissionSet {
    type Item = Permission;
    type IntoIter = std::vec::IntoIter<Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = std::slice::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(path: &str, method: &str) -> Permission {
        Permission::new(path, method)
    }

    #[test]
    fn test_permission_serializes_as_path_method_object() {
        let json = serde_json::to_string(&p("/roles", "GET")).unwrap();
        assert_eq!(json, r#"{"path":"/roles","method":"GET"}"#);
    }

    #[test]
    fn test_set_keeps_order_and_duplicates() {
        let set = PermissionSet::from_json(
            r#"[{"path":"/c","method":"GET"},{"path":"/a","method":"POST"},{"path":"/c","method":"GET"}]"#,
        )
        .unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.as_slice()[0], p("/c", "GET"));
        assert_eq!(set.as_slice()[2], p("/c", "GET"));
    }

    #[test]
    fn test_null_column_decodes_as_empty() {
        assert!(PermissionSet::from_json("null").unwrap().is_empty());
        assert!(PermissionSet::from_json("").unwrap().is_empty());
    }

    #[test]
    fn test_contains_is_exact() {
        let set: PermissionSet = vec![p("/discussions/{id}", "GET")].into();

        assert!(set.contains(&p("/discussions/{id}", "GET")));
        assert!(!set.contains(&p("/discussions/1", "GET")));
        assert!(!set.contains(&p("/discussions/{id}", "POST")));
    }

    #[test]
    fn test_remove_matching_drops_every_copy() {
        let mut set: PermissionSet =
            vec![p("/c", "GET"), p("/d", "GET"), p("/c", "GET")].into();

        assert_eq!(set.remove_matching("/c", "GET"), 2);
        assert_eq!(set.as_slice(), &[p("/d", "GET")]);
        assert_eq!(set.remove_matching("/c", "GET"), 0);
    }

    #[test]
    fn test_difference_preserves_left_order() {
        let all: PermissionSet = vec![p("/a", "GET"), p("/b", "POST"), p("/c", "GET")].into();
        let granted: PermissionSet = vec![p("/b", "POST")].into();

        let left = all.difference(&granted);
        assert_eq!(left.as_slice(), &[p("/a", "GET"), p("/c", "GET")]);
    }
}
