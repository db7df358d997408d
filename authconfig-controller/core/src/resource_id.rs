use std::fmt;

/// Identifies a namespaced resource.
///
/// The `Display` form, `<namespace>/<name>`, is the key under which the
/// cache registers an AuthConfig's entries. Neither a namespace nor a name
/// may contain `/`, so the encoding is unambiguous.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The key used to look up this resource in the cache.
    #[inline]
    pub fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
