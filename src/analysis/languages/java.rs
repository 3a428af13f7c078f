//! Java language analyzer using tree-sitter.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::{
    BodyFacts, CallScope, CallSite, ClassKind, ControlFlowInfo, Field, Import, LanguageAnalyzer,
    Method, Parameter, ParsedFile, SourceUnit, Span,
};

const CONTROL_FLOW_QUERY: &str = r#"
(if_statement) @if
(for_statement) @for
(enhanced_for_statement) @for_each
(while_statement) @while
(do_statement) @do
(switch_label) @case
(ternary_expression) @ternary
(catch_clause) @catch
"#;

/// Tree-sitter query for extracting imports.
const IMPORT_QUERY: &str = r#"
(import_declaration) @import
"#;

/// Tree-sitter query for package declaration.
const PACKAGE_QUERY: &str = r#"
(package_declaration
  [(scoped_identifier) (identifier)] @package_name
)
"#;

/// Declarations that can be the analyzed class of a file.
const ANALYZABLE_KINDS: &[&str] = &["class_declaration", "enum_declaration", "record_declaration"];

/// Declarations that introduce a member type name.
const TYPE_DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "enum_declaration",
    "record_declaration",
    "interface_declaration",
    "annotation_type_declaration",
];

/// Nodes that open a new scope for local declarations.
const SCOPE_KINDS: &[&str] = &[
    "block",
    "constructor_body",
    "for_statement",
    "enhanced_for_statement",
    "catch_clause",
    "try_with_resources_statement",
    "switch_block",
    "lambda_expression",
];

pub struct JavaAnalyzer {
    language: Language,
    // Compiled on first use, shared by every file.
    control_flow_query: OnceCell<Query>,
    import_query: OnceCell<Query>,
    package_query: OnceCell<Query>,
}

impl JavaAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_java::LANGUAGE.into(),
            control_flow_query: OnceCell::new(),
            import_query: OnceCell::new(),
            package_query: OnceCell::new(),
        }
    }

    fn query<'q>(&self, cell: &'q OnceCell<Query>, source: &str) -> anyhow::Result<&'q Query> {
        let query = cell.get_or_try_init(|| Query::new(&self.language, source))?;
        Ok(query)
    }

    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    fn extract_package(&self, parsed: &ParsedFile) -> Option<String> {
        let query = self.query(&self.package_query, PACKAGE_QUERY).ok()?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, parsed.tree.root_node(), &parsed.source[..]);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                if name == "package_name" {
                    return Some(parsed.node_text(capture.node).to_string());
                }
            }
        }
        None
    }

    fn extract_imports(&self, parsed: &ParsedFile) -> anyhow::Result<Vec<Import>> {
        let query = self.query(&self.import_query, IMPORT_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, parsed.tree.root_node(), &parsed.source[..]);

        let mut imports = Vec::new();
        let mut seen = HashSet::new();

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                let mut is_static = false;
                let mut is_wildcard = false;
                let mut path = String::new();

                let mut walker = node.walk();
                for child in node.children(&mut walker) {
                    match child.kind() {
                        "static" => is_static = true,
                        "asterisk" => is_wildcard = true,
                        "scoped_identifier" | "identifier" => {
                            path = parsed.node_text(child).to_string();
                        }
                        _ => {}
                    }
                }

                if path.is_empty() || !seen.insert((path.clone(), is_static, is_wildcard)) {
                    continue;
                }
                imports.push(Import {
                    path,
                    is_static,
                    is_wildcard,
                    line: Span::from_node(node).start_line,
                });
            }
        }

        Ok(imports)
    }

    fn extract_control_flow(
        &self,
        parsed: &ParsedFile,
        body_node: Node,
    ) -> anyhow::Result<ControlFlowInfo> {
        let query = self.query(&self.control_flow_query, CONTROL_FLOW_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, body_node, &parsed.source[..]);

        let mut info = ControlFlowInfo::default();

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                match name {
                    "if" => info.if_count += 1,
                    "for" | "for_each" | "while" | "do" => info.loop_count += 1,
                    "case" => {
                        // `default` labels are not decision points
                        let is_default = capture
                            .node
                            .child(0)
                            .map(|c| c.kind() == "default")
                            .unwrap_or(false);
                        if !is_default {
                            info.case_count += 1;
                        }
                    }
                    "ternary" => info.ternary_count += 1,
                    "catch" => info.catch_count += 1,
                    _ => {}
                }
            }
        }

        Ok(info)
    }

    /// Pick the top-level class, enum or record named after the file,
    /// falling back to the first one declared.
    fn find_analyzed_class<'t>(&self, parsed: &ParsedFile, root: Node<'t>) -> Option<Node<'t>> {
        let stem = Path::new(&parsed.path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let candidates: Vec<Node<'t>> = named_children(root)
            .into_iter()
            .filter(|n| ANALYZABLE_KINDS.contains(&n.kind()))
            .collect();

        candidates
            .iter()
            .copied()
            .find(|n| {
                n.child_by_field_name("name")
                    .map(|name| parsed.node_text(name) == stem)
                    .unwrap_or(false)
            })
            .or_else(|| candidates.first().copied())
    }

    fn extract_parameters(&self, parsed: &ParsedFile, params_node: Option<Node>) -> Vec<Parameter> {
        let Some(params_node) = params_node else {
            return Vec::new();
        };

        let mut parameters = Vec::new();
        for child in named_children(params_node) {
            match child.kind() {
                "formal_parameter" => {
                    let type_name = child
                        .child_by_field_name("type")
                        .map(|t| parsed.node_text(t))
                        .unwrap_or("");
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| parsed.node_text(n))
                        .unwrap_or("");
                    parameters.push(Parameter::new(name, type_name));
                }
                "spread_parameter" => {
                    let children = named_children(child);
                    let type_name = children
                        .iter()
                        .find(|n| is_type_node(n.kind()))
                        .map(|t| format!("{}...", parsed.node_text(*t)))
                        .unwrap_or_default();
                    let name = children
                        .iter()
                        .find(|n| n.kind() == "variable_declarator")
                        .and_then(|d| d.child_by_field_name("name"))
                        .map(|n| parsed.node_text(n))
                        .unwrap_or("");
                    parameters.push(Parameter::new(name, &type_name));
                }
                _ => {}
            }
        }
        parameters
    }

    fn collect_body(
        &self,
        parsed: &ParsedFile,
        body: Option<Node>,
        fields: &HashSet<String>,
        parameters: &[Parameter],
    ) -> anyhow::Result<BodyFacts> {
        let mut collector = BodyCollector::new(parsed, fields);
        for p in parameters {
            collector.declare(p.name.clone());
        }
        if let Some(body) = body {
            collector.walk(body);
            collector.facts.control_flow = self.extract_control_flow(parsed, body)?;
        }
        Ok(collector.finish())
    }

    fn build_method(
        &self,
        parsed: &ParsedFile,
        node: Node,
        fields: &HashSet<String>,
        implicit_params: &[Parameter],
    ) -> anyhow::Result<Method> {
        let name = node
            .child_by_field_name("name")
            .map(|n| parsed.node_text(n).to_string())
            .ok_or_else(|| anyhow::anyhow!("{} without a name", node.kind()))?;

        let parameters = if node.kind() == "compact_constructor_declaration" {
            implicit_params.to_vec()
        } else {
            self.extract_parameters(parsed, node.child_by_field_name("parameters"))
        };

        let return_type = match node.kind() {
            "method_declaration" => node
                .child_by_field_name("type")
                .map(|t| parsed.node_text(t).to_string()),
            _ => None,
        };

        let body = self.collect_body(parsed, node.child_by_field_name("body"), fields, &parameters)?;

        Ok(Method {
            name,
            parameters,
            return_type,
            span: Span::from_node(node),
            body,
        })
    }
}

impl Default for JavaAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for JavaAnalyzer {
    fn language_id(&self) -> &'static str {
        "java"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse Java source: {}", path.display()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_string_lossy().to_string(),
        })
    }

    fn extract_unit(&self, parsed: &ParsedFile) -> anyhow::Result<SourceUnit> {
        let root = parsed.tree.root_node();
        let class_node = self
            .find_analyzed_class(parsed, root)
            .ok_or_else(|| anyhow::anyhow!("no class, enum or record declaration"))?;

        let class_name = class_node
            .child_by_field_name("name")
            .map(|n| parsed.node_text(n).to_string())
            .ok_or_else(|| anyhow::anyhow!("type declaration without a name"))?;

        let package = self.extract_package(parsed);
        let mut unit = SourceUnit::new(&parsed.path, package.as_deref(), &class_name);
        unit.kind = match class_node.kind() {
            "enum_declaration" => ClassKind::Enum,
            "record_declaration" => ClassKind::Record,
            _ => ClassKind::Class,
        };
        unit.span = Span::from_node(class_node);
        unit.imports = self.extract_imports(parsed)?;

        unit.superclass = class_node
            .child_by_field_name("superclass")
            .and_then(|s| s.named_child(0))
            .map(|t| parsed.node_text(t).to_string());

        if let Some(list) = class_node
            .child_by_field_name("interfaces")
            .and_then(|i| i.named_child(0))
        {
            unit.interfaces = named_children(list)
                .into_iter()
                .map(|t| parsed.node_text(t).to_string())
                .collect();
        }

        unit.type_parameters = type_parameter_names(parsed, class_node);

        // Record components double as fields and as the compact constructor's parameters.
        let record_components = if unit.kind == ClassKind::Record {
            self.extract_parameters(parsed, class_node.child_by_field_name("parameters"))
        } else {
            Vec::new()
        };
        let component_line = unit.span.start_line;
        for component in &record_components {
            unit.fields.push(Field {
                name: component.name.clone(),
                type_name: component.type_name.clone(),
                line: component_line,
            });
        }

        let members = class_members(class_node);

        // Fields first: bodies need the full set to recognize field uses.
        let mut initializer_nodes = Vec::new();
        for member in &members {
            match member.kind() {
                "field_declaration" => {
                    let type_name = member
                        .child_by_field_name("type")
                        .map(|t| parsed.node_text(t))
                        .unwrap_or("");
                    let mut walker = member.walk();
                    for declarator in member.children_by_field_name("declarator", &mut walker) {
                        if let Some(name) = declarator.child_by_field_name("name") {
                            unit.fields.push(Field {
                                name: parsed.node_text(name).to_string(),
                                type_name: type_name.to_string(),
                                line: Span::from_node(declarator).start_line,
                            });
                        }
                        if let Some(value) = declarator.child_by_field_name("value") {
                            initializer_nodes.push(value);
                        }
                    }
                }
                "block" | "static_initializer" => initializer_nodes.push(*member),
                "enum_constant" => {
                    for child in named_children(*member) {
                        if matches!(child.kind(), "argument_list" | "class_body") {
                            initializer_nodes.push(child);
                        }
                    }
                }
                kind if TYPE_DECLARATION_KINDS.contains(&kind) => {
                    if let Some(name) = member.child_by_field_name("name") {
                        unit.nested_types.push(parsed.node_text(name).to_string());
                    }
                }
                _ => {}
            }
        }

        let field_names: HashSet<String> = unit.fields.iter().map(|f| f.name.clone()).collect();

        for member in &members {
            match member.kind() {
                "method_declaration" => {
                    for tp in type_parameter_names(parsed, *member) {
                        if !unit.type_parameters.contains(&tp) {
                            unit.type_parameters.push(tp);
                        }
                    }
                    let method = self.build_method(parsed, *member, &field_names, &[])?;
                    unit.methods.push(method);
                }
                "constructor_declaration" | "compact_constructor_declaration" => {
                    let ctor =
                        self.build_method(parsed, *member, &field_names, &record_components)?;
                    unit.constructors.push(ctor);
                }
                _ => {}
            }
        }

        let mut collector = BodyCollector::new(parsed, &field_names);
        let mut control_flow = ControlFlowInfo::default();
        for node in &initializer_nodes {
            collector.walk(*node);
            control_flow.add(&self.extract_control_flow(parsed, *node)?);
        }
        collector.facts.control_flow = control_flow;
        unit.initializers = collector.finish();

        Ok(unit)
    }
}

/// Walks one executable body and records the facts the metrics need.
struct BodyCollector<'a> {
    parsed: &'a ParsedFile,
    fields: &'a HashSet<String>,
    facts: BodyFacts,
    /// Open scopes, innermost last, with the tree depth of the node that
    /// opened them. The first one holds the parameters and is never closed.
    scopes: Vec<(usize, HashSet<String>)>,
    field_refs: BTreeSet<String>,
}

impl<'a> BodyCollector<'a> {
    fn new(parsed: &'a ParsedFile, fields: &'a HashSet<String>) -> Self {
        Self {
            parsed,
            fields,
            facts: BodyFacts::default(),
            scopes: vec![(0, HashSet::new())],
            field_refs: BTreeSet::new(),
        }
    }

    /// Declare a parameter or local in the innermost open scope.
    fn declare(&mut self, name: String) {
        if let Some((_, names)) = self.scopes.last_mut() {
            names.insert(name);
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().any(|(_, names)| names.contains(name))
    }

    /// Pre-order walk of the subtree rooted at `root`.
    fn walk(&mut self, root: Node) {
        self.scopes.truncate(1);
        let mut cursor = root.walk();
        let mut depth = 0;
        'outer: loop {
            let node = cursor.node();
            // Leaving a subtree closes the scopes opened inside it.
            while self.scopes.len() > 1 && self.scopes.last().is_some_and(|(d, _)| *d >= depth) {
                self.scopes.pop();
            }
            if SCOPE_KINDS.contains(&node.kind()) {
                self.scopes.push((depth, HashSet::new()));
            }
            self.visit(node);

            if cursor.goto_first_child() {
                depth += 1;
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    continue 'outer;
                }
                if !cursor.goto_parent() {
                    break 'outer;
                }
                depth -= 1;
            }
        }
    }

    fn visit(&mut self, node: Node) {
        let parsed = self.parsed;
        match node.kind() {
            "method_invocation" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let scope = call_scope(parsed, node.child_by_field_name("object"));
                    self.facts.calls.push(CallSite {
                        name: parsed.node_text(name).to_string(),
                        scope,
                        line: Span::from_node(node).start_line,
                    });
                }
            }
            "object_creation_expression" => {
                if let Some(t) = node.child_by_field_name("type") {
                    self.facts.instantiations.push(parsed.node_text(t).to_string());
                }
            }
            "cast_expression" => {
                let mut walker = node.walk();
                for t in node.children_by_field_name("type", &mut walker) {
                    self.facts.casts.push(parsed.node_text(t).to_string());
                }
            }
            "local_variable_declaration" => {
                let declared = node
                    .child_by_field_name("type")
                    .map(|t| parsed.node_text(t))
                    .unwrap_or("");
                let mut walker = node.walk();
                for declarator in node.children_by_field_name("declarator", &mut walker) {
                    let Some(name) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    let name = parsed.node_text(name).to_string();
                    let type_name = if declared == "var" {
                        // Only `var x = new T(..)` tells us anything syntactically.
                        declarator
                            .child_by_field_name("value")
                            .filter(|v| v.kind() == "object_creation_expression")
                            .and_then(|v| v.child_by_field_name("type"))
                            .map(|t| parsed.node_text(t).to_string())
                    } else {
                        Some(declared.to_string())
                    };
                    if let Some(type_name) = type_name {
                        self.facts.local_types.insert(name.clone(), type_name);
                    }
                    self.declare(name);
                }
            }
            "enhanced_for_statement" | "resource" => {
                if let (Some(t), Some(name)) = (
                    node.child_by_field_name("type"),
                    node.child_by_field_name("name"),
                ) {
                    let name = parsed.node_text(name).to_string();
                    let declared = parsed.node_text(t);
                    if declared != "var" {
                        self.facts
                            .local_types
                            .insert(name.clone(), declared.to_string());
                    }
                    self.declare(name);
                }
            }
            "catch_formal_parameter" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name = parsed.node_text(name).to_string();
                    let caught = named_children(node)
                        .into_iter()
                        .find(|n| n.kind() == "catch_type")
                        .and_then(|c| c.named_child(0))
                        .map(|t| parsed.node_text(t).to_string());
                    if let Some(caught) = caught {
                        self.facts.local_types.insert(name.clone(), caught);
                    }
                    self.declare(name);
                }
            }
            "lambda_expression" => {
                if let Some(params) = node.child_by_field_name("parameters") {
                    match params.kind() {
                        "identifier" => {
                            self.declare(parsed.node_text(params).to_string());
                        }
                        _ => {
                            for p in named_children(params) {
                                let name = match p.kind() {
                                    "identifier" => Some(p),
                                    _ => p.child_by_field_name("name"),
                                };
                                if let Some(name) = name {
                                    self.declare(parsed.node_text(name).to_string());
                                }
                            }
                        }
                    }
                }
            }
            "field_access" => {
                let object = node.child_by_field_name("object");
                let field = node.child_by_field_name("field");
                if let (Some(object), Some(field)) = (object, field) {
                    let name = parsed.node_text(field);
                    if object.kind() == "this" && self.fields.contains(name) {
                        self.field_refs.insert(name.to_string());
                    }
                }
            }
            "identifier" => {
                let name = parsed.node_text(node);
                if self.fields.contains(name) && is_value_reference(node) && !self.is_declared(name)
                {
                    self.field_refs.insert(name.to_string());
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> BodyFacts {
        self.facts.field_refs = self.field_refs.into_iter().collect();
        self.facts
    }
}

/// Classify the receiver of a method call.
fn call_scope(parsed: &ParsedFile, object: Option<Node>) -> CallScope {
    let Some(object) = object else {
        return CallScope::Implicit;
    };
    match object.kind() {
        "this" => CallScope::This,
        "super" => CallScope::Super,
        "identifier" => CallScope::Name(parsed.node_text(object).to_string()),
        "field_access" | "scoped_identifier" if is_name_path(object) => {
            let text: String = parsed.node_text(object).split_whitespace().collect();
            CallScope::Path(text)
        }
        _ => CallScope::Expression,
    }
}

/// `a.b.c` or `this.a.b`: a chain of plain names.
fn is_name_path(node: Node) -> bool {
    match node.kind() {
        "identifier" | "this" | "scoped_identifier" => true,
        "field_access" => {
            let object_ok = node
                .child_by_field_name("object")
                .map(is_name_path)
                .unwrap_or(false);
            let field_ok = node
                .child_by_field_name("field")
                .map(|f| f.kind() == "identifier")
                .unwrap_or(false);
            object_ok && field_ok
        }
        _ => false,
    }
}

/// Whether an identifier node reads or writes a variable, as opposed to
/// naming a method, a declaration, a label or a member of another object.
fn is_value_reference(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    let is_field = |field: &str| parent.child_by_field_name(field) == Some(node);

    match parent.kind() {
        "method_invocation" => !is_field("name"),
        "field_access" => !is_field("field"),
        "variable_declarator"
        | "formal_parameter"
        | "catch_formal_parameter"
        | "enhanced_for_statement"
        | "resource" => !is_field("name"),
        "lambda_expression"
        | "inferred_parameters"
        | "labeled_statement"
        | "break_statement"
        | "continue_statement"
        | "scoped_identifier"
        | "marker_annotation"
        | "annotation" => false,
        "method_reference" => parent.named_child(0) == Some(node),
        _ => true,
    }
}

fn is_type_node(kind: &str) -> bool {
    matches!(
        kind,
        "type_identifier"
            | "scoped_type_identifier"
            | "generic_type"
            | "array_type"
            | "integral_type"
            | "floating_point_type"
            | "boolean_type"
            | "annotated_type"
    )
}

fn named_children(node: Node) -> Vec<Node> {
    let mut walker = node.walk();
    let children: Vec<Node> = node.named_children(&mut walker).collect();
    children
}

/// Members of a class, record or enum body.
fn class_members(class_node: Node) -> Vec<Node> {
    let Some(body) = class_node.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut members = Vec::new();
    for child in named_children(body) {
        if child.kind() == "enum_body_declarations" {
            members.extend(named_children(child));
        } else {
            members.push(child);
        }
    }
    members
}

fn type_parameter_names(parsed: &ParsedFile, decl: Node) -> Vec<String> {
    let Some(params) = decl.child_by_field_name("type_parameters") else {
        return Vec::new();
    };
    named_children(params)
        .into_iter()
        .filter(|p| p.kind() == "type_parameter")
        .filter_map(|p| {
            named_children(p)
                .into_iter()
                .find(|c| matches!(c.kind(), "type_identifier" | "identifier"))
                .map(|c| parsed.node_text(c).to_string())
        })
        .collect()
}
