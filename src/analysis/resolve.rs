//! Syntactic type-name resolution.
//!
//! Names are qualified from the file's own package and imports only; there
//! is no classpath. When on-demand (`.*`) imports are in scope an unqualified
//! name could live in several packages, and the result is
//! [`ResolvedType::Ambiguous`] rather than a guess.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::SourceUnit;

/// Primitive types, their boxed forms and `void`.
const PRIMITIVE_TYPES: &[&str] = &[
    "byte",
    "short",
    "int",
    "long",
    "float",
    "double",
    "boolean",
    "char",
    "Byte",
    "Short",
    "Integer",
    "Long",
    "Float",
    "Double",
    "Boolean",
    "Character",
    "void",
    "Void",
];

/// `java.lang` types that are never counted unless explicitly imported.
const IMPLICIT_TYPES: &[&str] = &[
    "String",
    "Object",
    "Throwable",
    "Exception",
    "RuntimeException",
    "Error",
    "Cloneable",
    "Comparable",
    "Serializable",
    "Iterable",
    "Number",
    "Enum",
];

const JAVA_LANG: &str = "java.lang.";

/// Outcome of resolving a type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ResolvedType {
    /// A single fully qualified name.
    Resolved(String),
    /// Several packages could supply the name. The first candidate is the
    /// same-package form.
    Ambiguous {
        simple_name: String,
        candidates: Vec<String>,
    },
}

impl ResolvedType {
    /// The name used for de-duplication and graph lookups.
    pub fn primary(&self) -> &str {
        match self {
            ResolvedType::Resolved(fqn) => fqn,
            ResolvedType::Ambiguous {
                simple_name,
                candidates,
            } => candidates.first().map(String::as_str).unwrap_or(simple_name),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolvedType::Ambiguous { .. })
    }

    /// Every name this reference might denote.
    pub fn candidates(&self) -> Vec<&str> {
        match self {
            ResolvedType::Resolved(fqn) => vec![fqn.as_str()],
            ResolvedType::Ambiguous { candidates, .. } => {
                candidates.iter().map(String::as_str).collect()
            }
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedType::Resolved(fqn) => write!(f, "{}", fqn),
            ResolvedType::Ambiguous { candidates, .. } => {
                write!(f, "{} (ambiguous)", candidates.join(" | "))
            }
        }
    }
}

/// Reduce a written type to its bare name: annotations, type arguments,
/// array dimensions and varargs are dropped.
///
/// `@NonNull Map<String, List<Order>>[]` becomes `Map`.
pub fn normalize(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            '@' => {
                // annotation name, then an optional argument list
                while let Some(&n) = chars.peek() {
                    if n.is_alphanumeric() || n == '_' || n == '$' || n == '.' {
                        chars.next();
                    } else {
                        break;
                    }
                }
                while chars.peek().is_some_and(|n| n.is_whitespace()) {
                    chars.next();
                }
                if chars.peek() == Some(&'(') {
                    let mut parens = 0usize;
                    for n in chars.by_ref() {
                        match n {
                            '(' => parens += 1,
                            ')' => {
                                parens -= 1;
                                if parens == 0 {
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
            '[' | ']' => {}
            c if c.is_whitespace() => {}
            c => out.push(c),
        }
    }

    let name = out.trim_end_matches('.').trim_start_matches('.');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Primitive, boxed primitive or `void`, written simply or as `java.lang.X`.
pub fn is_primitive(name: &str) -> bool {
    let simple = name.strip_prefix(JAVA_LANG).unwrap_or(name);
    PRIMITIVE_TYPES.contains(&simple)
}

/// Member of the implicit-availability allow-list, written simply or as
/// `java.lang.X`.
pub fn is_implicit(name: &str) -> bool {
    let simple = name.strip_prefix(JAVA_LANG).unwrap_or(name);
    IMPLICIT_TYPES.contains(&simple)
}

fn starts_upper(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Resolves type names as seen from one source unit.
pub struct TypeResolver<'a> {
    package: Option<&'a str>,
    self_name: String,
    class_name: &'a str,
    nested: &'a [String],
    type_parameters: &'a [String],
    /// simple name -> fully qualified name, from single-type imports
    explicit: HashMap<&'a str, &'a str>,
    /// packages imported on demand, excluding the file's own package
    on_demand: Vec<&'a str>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(unit: &'a SourceUnit) -> Self {
        let package = unit.package.as_deref().filter(|p| !p.is_empty());

        let mut explicit = HashMap::new();
        let mut on_demand = Vec::new();
        for import in unit.imports.iter().filter(|i| !i.is_static) {
            if import.is_wildcard {
                if Some(import.path.as_str()) != package
                    && !on_demand.contains(&import.path.as_str())
                {
                    on_demand.push(import.path.as_str());
                }
            } else {
                explicit.insert(import.simple_name(), import.path.as_str());
            }
        }

        Self {
            package,
            self_name: unit.qualified_name(),
            class_name: &unit.class_name,
            nested: &unit.nested_types,
            type_parameters: &unit.type_parameters,
            explicit,
            on_demand,
        }
    }

    /// Fully qualified name of the unit's own class.
    pub fn self_name(&self) -> &str {
        &self.self_name
    }

    /// Resolve a written type reference to an external type.
    ///
    /// Returns `None` for primitives, `void`, type variables, allow-listed
    /// `java.lang` types that are not explicitly imported, and references
    /// to the class itself or its member types.
    pub fn resolve(&self, raw: &str) -> Option<ResolvedType> {
        let name = normalize(raw)?;
        if is_primitive(&name) {
            return None;
        }

        let resolved = match name.split_once('.') {
            None => self.resolve_simple(&name)?,
            Some((head, rest)) if starts_upper(head) => {
                // Outer.Inner: qualify through the outer type
                let outer = self.resolve_simple(head)?;
                match outer {
                    ResolvedType::Resolved(fqn) => ResolvedType::Resolved(format!("{}.{}", fqn, rest)),
                    ResolvedType::Ambiguous {
                        simple_name,
                        candidates,
                    } => ResolvedType::Ambiguous {
                        simple_name: format!("{}.{}", simple_name, rest),
                        candidates: candidates
                            .into_iter()
                            .map(|c| format!("{}.{}", c, rest))
                            .collect(),
                    },
                }
            }
            Some(_) => {
                if name.starts_with(JAVA_LANG)
                    && is_implicit(&name)
                    && !self.explicit.values().any(|fqn| *fqn == name)
                {
                    return None;
                }
                ResolvedType::Resolved(name.clone())
            }
        };

        if self.is_self(resolved.primary()) {
            return None;
        }
        Some(resolved)
    }

    fn resolve_simple(&self, name: &str) -> Option<ResolvedType> {
        if self.type_parameters.iter().any(|t| t == name) {
            return None;
        }
        if name == self.class_name {
            return Some(ResolvedType::Resolved(self.self_name.clone()));
        }
        if self.nested.iter().any(|n| n == name) {
            return Some(ResolvedType::Resolved(format!("{}.{}", self.self_name, name)));
        }
        if let Some(fqn) = self.explicit.get(name) {
            return Some(ResolvedType::Resolved(fqn.to_string()));
        }
        if is_implicit(name) {
            return None;
        }

        let local = self.qualify(name);
        if self.on_demand.is_empty() {
            return Some(ResolvedType::Resolved(local));
        }

        let mut candidates = vec![local];
        candidates.extend(self.on_demand.iter().map(|pkg| format!("{}.{}", pkg, name)));
        Some(ResolvedType::Ambiguous {
            simple_name: name.to_string(),
            candidates,
        })
    }

    fn qualify(&self, name: &str) -> String {
        match self.package {
            Some(pkg) => format!("{}.{}", pkg, name),
            None => name.to_string(),
        }
    }

    fn is_self(&self, name: &str) -> bool {
        name == self.self_name
            || name
                .strip_prefix(self.self_name.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Import;
    use pretty_assertions::assert_eq;

    fn unit_with(imports: Vec<Import>) -> SourceUnit {
        let mut unit = SourceUnit::new("Shop.java", Some("com.acme.shop"), "Shop");
        unit.imports = imports;
        unit.nested_types = vec!["Line".to_string()];
        unit.type_parameters = vec!["T".to_string()];
        unit
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("List<Order>").as_deref(), Some("List"));
        assert_eq!(normalize("Map<String, List<Order>>[]").as_deref(), Some("Map"));
        assert_eq!(normalize("Order...").as_deref(), Some("Order"));
        assert_eq!(normalize("@NonNull Order").as_deref(), Some("Order"));
        assert_eq!(
            normalize("@Size(max = 3) java.util.List<String>").as_deref(),
            Some("java.util.List")
        );
        assert_eq!(normalize("int[][]").as_deref(), Some("int"));
        assert_eq!(normalize("Map.Entry<K, V>").as_deref(), Some("Map.Entry"));
        assert_eq!(normalize("  "), None);
    }

    #[test]
    fn test_primitives_and_allow_list() {
        assert!(is_primitive("int"));
        assert!(is_primitive("Integer"));
        assert!(is_primitive("java.lang.Void"));
        assert!(!is_primitive("Order"));

        assert!(is_implicit("String"));
        assert!(is_implicit("java.lang.Exception"));
        assert!(!is_implicit("List"));
    }

    #[test]
    fn test_resolve_same_package_and_imports() {
        let unit = unit_with(vec![Import::single("java.util.List")]);
        let resolver = TypeResolver::new(&unit);

        assert_eq!(
            resolver.resolve("Order"),
            Some(ResolvedType::Resolved("com.acme.shop.Order".to_string()))
        );
        assert_eq!(
            resolver.resolve("List<Order>"),
            Some(ResolvedType::Resolved("java.util.List".to_string()))
        );
        assert_eq!(
            resolver.resolve("com.acme.billing.Invoice"),
            Some(ResolvedType::Resolved("com.acme.billing.Invoice".to_string()))
        );
        assert_eq!(
            resolver.resolve("java.util.Map.Entry"),
            Some(ResolvedType::Resolved("java.util.Map.Entry".to_string()))
        );
    }

    #[test]
    fn test_resolve_discards_non_dependencies() {
        let unit = unit_with(Vec::new());
        let resolver = TypeResolver::new(&unit);

        for raw in ["int", "boolean", "void", "Integer", "String", "java.lang.Object", "T", "T[]"] {
            assert_eq!(resolver.resolve(raw), None, "{} should be dropped", raw);
        }
        // the class itself and its member types
        assert_eq!(resolver.resolve("Shop"), None);
        assert_eq!(resolver.resolve("Line"), None);
        assert_eq!(resolver.resolve("Shop.Line"), None);
        assert_eq!(resolver.resolve("com.acme.shop.Shop"), None);
    }

    #[test]
    fn test_explicit_import_overrides_allow_list() {
        let unit = unit_with(vec![Import::single("com.acme.text.String")]);
        let resolver = TypeResolver::new(&unit);
        assert_eq!(
            resolver.resolve("String"),
            Some(ResolvedType::Resolved("com.acme.text.String".to_string()))
        );
    }

    #[test]
    fn test_wildcard_import_is_ambiguous() {
        let unit = unit_with(vec![
            Import::wildcard("com.acme.billing"),
            Import::wildcard("com.acme.shop"),
        ]);
        let resolver = TypeResolver::new(&unit);

        let resolved = resolver.resolve("Invoice").unwrap();
        assert_eq!(
            resolved,
            ResolvedType::Ambiguous {
                simple_name: "Invoice".to_string(),
                candidates: vec![
                    "com.acme.shop.Invoice".to_string(),
                    "com.acme.billing.Invoice".to_string(),
                ],
            }
        );
        assert_eq!(resolved.primary(), "com.acme.shop.Invoice");
        assert!(resolved.is_ambiguous());
    }

    #[test]
    fn test_outer_inner_through_import() {
        let unit = unit_with(vec![Import::single("java.util.Map")]);
        let resolver = TypeResolver::new(&unit);
        assert_eq!(
            resolver.resolve("Map.Entry<String, Order>"),
            Some(ResolvedType::Resolved("java.util.Map.Entry".to_string()))
        );
    }

    #[test]
    fn test_default_package() {
        let unit = SourceUnit::new("Main.java", None, "Main");
        let resolver = TypeResolver::new(&unit);
        assert_eq!(
            resolver.resolve("Helper"),
            Some(ResolvedType::Resolved("Helper".to_string()))
        );
    }
}
