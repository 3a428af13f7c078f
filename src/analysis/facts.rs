//! Fact structures extracted from AST analysis.
//!
//! A [`SourceUnit`] is the engine's view of one parsed file: the analyzed
//! class, its members, and per-body facts gathered from the syntax tree.
//! Nothing downstream touches tree-sitter nodes directly.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed).
    pub end_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column + 1,
        }
    }

    /// Span covering whole lines `start..=end`; handy for hand-built units.
    pub fn lines(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            start_col: 1,
            end_line,
            end_col: 1,
            ..Default::default()
        }
    }

    /// Number of lines covered, inclusive of both ends.
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Kind of the analyzed type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Enum,
    Record,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Enum => "enum",
            ClassKind::Record => "record",
        }
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An import declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// The imported name without the trailing `.*`.
    pub path: String,
    /// `import static ...`
    pub is_static: bool,
    /// `import pkg.*;`
    pub is_wildcard: bool,
    pub line: usize,
}

impl Import {
    pub fn single(path: &str) -> Self {
        Self {
            path: path.to_string(),
            is_static: false,
            is_wildcard: false,
            line: 1,
        }
    }

    pub fn wildcard(package: &str) -> Self {
        Self {
            path: package.to_string(),
            is_static: false,
            is_wildcard: true,
            line: 1,
        }
    }

    /// Last segment of the import path.
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

/// A field declared by the class. One entry per declarator, so
/// `int a, b;` yields two fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Declared type as written, e.g. `List<Order>` or `int[]`.
    pub type_name: String,
    pub line: usize,
}

/// A formal parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

impl Parameter {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

/// The receiver of a method call, classified syntactically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum CallScope {
    /// `foo()`
    Implicit,
    /// `this.foo()`
    This,
    /// `super.foo()`
    Super,
    /// `repo.foo()` or `Helper.foo()`
    Name(String),
    /// `this.repo.foo()`, `a.b.foo()`, `com.acme.Util.foo()`
    Path(String),
    /// Any other receiver: a call result, a literal, a `new` expression...
    Expression,
}

impl CallScope {
    /// Whether the call targets the class itself.
    pub fn is_internal(&self) -> bool {
        matches!(self, CallScope::Implicit | CallScope::This)
    }
}

/// One method invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub name: String,
    pub scope: CallScope,
    pub line: usize,
}

impl CallSite {
    pub fn new(name: &str, scope: CallScope) -> Self {
        Self {
            name: name.to_string(),
            scope,
            line: 1,
        }
    }
}

/// Control flow information for cyclomatic complexity calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlFlowInfo {
    /// Number of if statements.
    pub if_count: usize,
    /// Number of for, enhanced for, while and do statements.
    pub loop_count: usize,
    /// Number of non-default case labels.
    pub case_count: usize,
    /// Number of ternary ?: operators.
    pub ternary_count: usize,
    /// Number of catch clauses.
    pub catch_count: usize,
}

impl ControlFlowInfo {
    /// Count of decision points.
    pub fn decision_points(&self) -> usize {
        self.if_count + self.loop_count + self.case_count + self.ternary_count + self.catch_count
    }

    /// CC = 1 + decision_points
    pub fn cyclomatic_complexity(&self) -> usize {
        1 + self.decision_points()
    }

    /// Accumulate another body's counters into this one.
    pub fn add(&mut self, other: &ControlFlowInfo) {
        self.if_count += other.if_count;
        self.loop_count += other.loop_count;
        self.case_count += other.case_count;
        self.ternary_count += other.ternary_count;
        self.catch_count += other.catch_count;
    }
}

/// Facts gathered from one executable body (method, constructor, or the
/// class's initializers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyFacts {
    pub control_flow: ControlFlowInfo,
    pub calls: Vec<CallSite>,
    /// Names of class fields the body reads or writes (bare or via `this.`).
    pub field_refs: Vec<String>,
    /// Target types of `new` expressions.
    pub instantiations: Vec<String>,
    /// Target types of cast expressions.
    pub casts: Vec<String>,
    /// Local variable name -> declared type.
    pub local_types: BTreeMap<String, String>,
}

impl BodyFacts {
    pub fn external_calls(&self) -> impl Iterator<Item = &CallSite> {
        self.calls.iter().filter(|c| !c.scope.is_internal())
    }

    pub fn internal_calls(&self) -> impl Iterator<Item = &CallSite> {
        self.calls.iter().filter(|c| c.scope.is_internal())
    }
}

/// A method or constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// Return type as written; `None` for constructors.
    pub return_type: Option<String>,
    pub span: Span,
    pub body: BodyFacts,
}

impl Method {
    /// Lines spanned by the whole declaration.
    pub fn loc(&self) -> usize {
        self.span.line_count()
    }

    pub fn returns_void(&self) -> bool {
        matches!(self.return_type.as_deref(), Some("void"))
    }

    /// Declared type of a parameter or local variable visible in the body.
    pub fn variable_type(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.type_name.as_str())
            .or_else(|| self.body.local_types.get(name).map(String::as_str))
    }
}

/// All facts extracted from a single file, centred on its analyzed class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    /// File path.
    pub path: String,
    /// Package name (if declared).
    pub package: Option<String>,
    pub class_name: String,
    pub kind: ClassKind,
    pub imports: Vec<Import>,
    /// Superclass as written in the `extends` clause.
    pub superclass: Option<String>,
    /// Interfaces as written in the `implements` clause.
    pub interfaces: Vec<String>,
    /// Simple names of member types declared inside the class body.
    pub nested_types: Vec<String>,
    /// Type variables declared by the class or any of its methods.
    pub type_parameters: Vec<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub constructors: Vec<Method>,
    /// Field initializers, initializer blocks and enum constant arguments.
    pub initializers: BodyFacts,
    /// Span of the class declaration.
    pub span: Span,
}

impl SourceUnit {
    /// Create an empty unit; mostly useful for building fixtures by hand.
    pub fn new(path: &str, package: Option<&str>, class_name: &str) -> Self {
        Self {
            path: path.to_string(),
            package: package.map(str::to_string),
            class_name: class_name.to_string(),
            kind: ClassKind::Class,
            imports: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            nested_types: Vec::new(),
            type_parameters: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            initializers: BodyFacts::default(),
            span: Span::lines(1, 1),
        }
    }

    /// `package.ClassName`, or the bare class name in the default package.
    pub fn qualified_name(&self) -> String {
        match &self.package {
            Some(pkg) if !pkg.is_empty() => format!("{}.{}", pkg, self.class_name),
            _ => self.class_name.clone(),
        }
    }

    /// Methods followed by constructors.
    pub fn callables(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().chain(self.constructors.iter())
    }

    /// Every body in the class, initializers included.
    pub fn bodies(&self) -> impl Iterator<Item = &BodyFacts> {
        self.callables()
            .map(|m| &m.body)
            .chain(std::iter::once(&self.initializers))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn loc(&self) -> usize {
        self.span.line_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyclomatic_complexity() {
        let mut cf = ControlFlowInfo::default();
        assert_eq!(cf.cyclomatic_complexity(), 1); // Base complexity

        cf.if_count = 2;
        cf.loop_count = 1;
        cf.case_count = 3;
        // 1 + 2 + 1 + 3 = 7
        assert_eq!(cf.cyclomatic_complexity(), 7);
    }

    #[test]
    fn test_qualified_name() {
        let unit = SourceUnit::new("Foo.java", Some("com.acme"), "Foo");
        assert_eq!(unit.qualified_name(), "com.acme.Foo");

        let unit = SourceUnit::new("Foo.java", None, "Foo");
        assert_eq!(unit.qualified_name(), "Foo");
    }

    #[test]
    fn test_span_line_count() {
        assert_eq!(Span::lines(3, 3).line_count(), 1);
        assert_eq!(Span::lines(10, 59).line_count(), 50);
    }

    #[test]
    fn test_variable_type_prefers_parameters() {
        let mut body = BodyFacts::default();
        body.local_types.insert("order".to_string(), "Draft".to_string());
        let method = Method {
            name: "ship".to_string(),
            parameters: vec![Parameter::new("order", "Order")],
            return_type: Some("void".to_string()),
            span: Span::lines(1, 3),
            body,
        };
        assert_eq!(method.variable_type("order"), Some("Order"));
        assert_eq!(method.variable_type("missing"), None);
        assert!(method.returns_void());
    }

    #[test]
    fn test_call_scope_internal() {
        assert!(CallScope::Implicit.is_internal());
        assert!(CallScope::This.is_internal());
        assert!(!CallScope::Super.is_internal());
        assert!(!CallScope::Name("repo".to_string()).is_internal());
    }
}
