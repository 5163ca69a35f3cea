//! XML namespace handling
//!
//! Inventory documents come in several vocabulary versions, each with its own
//! namespace URI, and some producers prefix or capitalize tags. Roles are
//! therefore matched on the local name alone, folded to lowercase, while the
//! resolved namespace is kept on each element so the document can be written
//! back unchanged.

use crate::error::{ParseError, Result};
use indexmap::IndexMap;
use std::fmt;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// The namespace bound to the reserved `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Strip any namespace part from `tag` and fold the rest to lowercase.
///
/// Accepts Clark notation (`{uri}local`) and prefixed names (`p:local`).
/// Everything up to and including the first delimiter is treated as the
/// namespace part.
pub fn local_name(tag: &str) -> String {
    let local = if let Some((_, rest)) = tag.split_once('}') {
        rest
    } else if let Some((_, rest)) = tag.split_once(':') {
        rest
    } else {
        tag
    };
    local.to_lowercase()
}

/// Qualified name of an element as found in the source document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name, as written
    pub local_name: String,
    /// Prefix used in the source, if any
    pub prefix: Option<Prefix>,
}

impl QName {
    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// Create a QName with a namespace and no prefix
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// Create a sibling name that shares this name's namespace and prefix
    pub fn with_local_name(&self, local_name: impl Into<String>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            local_name: local_name.into(),
            prefix: self.prefix.clone(),
        }
    }

    /// Case-insensitive comparison of the local name
    pub fn matches(&self, name: &str) -> bool {
        local_name(&self.local_name) == local_name(name)
    }

    /// The name as written in a document (`prefix:local` or `local`)
    pub fn prefixed(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Namespace declarations made on a single element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI, in declaration order
    prefixes: IndexMap<Prefix, NamespaceUri>,
    /// Default namespace declaration; an empty string undeclares it
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.default_namespace = Some(namespace.into());
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace declaration
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// True if this element declares nothing
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.default_namespace.is_none()
    }

    /// Declarations as `xmlns` attributes, default namespace first
    pub fn declarations(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.prefixes.len() + 1);
        if let Some(ns) = &self.default_namespace {
            out.push(("xmlns".to_string(), ns.clone()));
        }
        for (prefix, ns) in &self.prefixes {
            out.push((format!("xmlns:{}", prefix), ns.clone()));
        }
        out
    }
}

/// Stack of in-scope declarations used while parsing
#[derive(Debug, Default)]
pub struct NamespaceScope {
    frames: Vec<NamespaceContext>,
}

impl NamespaceScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an element carrying `ctx`
    pub fn push(&mut self, ctx: NamespaceContext) {
        self.frames.push(ctx);
    }

    /// Leave the innermost element
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Resolve a raw element name against the declarations in scope
    pub fn resolve(&self, raw: &str) -> Result<QName> {
        match raw.split_once(':') {
            Some((prefix, local)) => {
                let namespace = if prefix == "xml" {
                    XML_NAMESPACE.to_string()
                } else {
                    self.frames
                        .iter()
                        .rev()
                        .find_map(|ctx| ctx.get_namespace(prefix))
                        .ok_or_else(|| {
                            ParseError::new(format!("unbound namespace prefix '{}'", prefix))
                        })?
                        .to_string()
                };
                Ok(QName {
                    namespace: Some(namespace),
                    local_name: local.to_string(),
                    prefix: Some(prefix.to_string()),
                })
            }
            None => {
                let namespace = self
                    .frames
                    .iter()
                    .rev()
                    .find_map(|ctx| ctx.get_default_namespace())
                    .filter(|ns| !ns.is_empty())
                    .map(str::to_string);
                Ok(QName {
                    namespace,
                    local_name: raw.to_string(),
                    prefix: None,
                })
            }
        }
    }
}
