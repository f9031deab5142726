//! Static export analysis of handler modules
//!
//! A module is never executed. Its syntax tree is walked once to produce a
//! flat list of [`ExportDeclaration`]s, and everything the router needs to
//! know (which methods it serves, whether it has a fallback handler) is
//! derived from that list by pure functions.

use std::fs;
use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::error::ParseError;
use crate::method::Method;

/// Name of the named export used as a fallback when no default export exists
pub const HANDLER_EXPORT: &str = "handler";

/// Export name reported for default exports
pub const DEFAULT_EXPORT: &str = "default";

/// One exported binding of a module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExportDeclaration {
    pub name: String,
    pub is_default: bool,
}

impl ExportDeclaration {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_default: false,
        }
    }

    pub fn default_export() -> Self {
        Self {
            name: DEFAULT_EXPORT.to_string(),
            is_default: true,
        }
    }
}

/// What a module can serve, derived from its exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerShape {
    /// Named method exports, as `(method, export name as written)`, in declaration order
    Methods(Vec<(Method, String)>),
    /// No method exports; every method goes to this export (`default` or `handler`)
    All(String),
    /// Nothing routable
    Unroutable,
}

/// Exports of a single module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleExports {
    pub declarations: Vec<ExportDeclaration>,
}

impl ModuleExports {
    pub fn new(declarations: Vec<ExportDeclaration>) -> Self {
        Self { declarations }
    }

    pub fn has_default(&self) -> bool {
        self.declarations.iter().any(|d| d.is_default)
    }

    /// Names of the non-default exports, deduplicated, in declaration order
    pub fn named(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for declaration in self.declarations.iter().filter(|d| !d.is_default) {
            if !names.contains(&declaration.name) {
                names.push(declaration.name.clone());
            }
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn shape(&self) -> HandlerShape {
        classify(&self.declarations)
    }
}

/// Classifies a module's exports
///
/// Named exports matching an HTTP method case-insensitively win. Without any,
/// a default export is the `ALL` handler, then an export named `handler`.
/// The first export spelling a method claims it.
///
/// # Examples
///
/// ```
/// use skyport_router::exports::{classify, ExportDeclaration, HandlerShape};
/// use skyport_router::Method;
///
/// let shape = classify(&[ExportDeclaration::named("GET"), ExportDeclaration::default_export()]);
/// assert_eq!(shape, HandlerShape::Methods(vec![(Method::Get, "GET".to_string())]));
///
/// let shape = classify(&[ExportDeclaration::named("handler")]);
/// assert_eq!(shape, HandlerShape::All("handler".to_string()));
///
/// assert_eq!(classify(&[ExportDeclaration::named("helper")]), HandlerShape::Unroutable);
/// ```
pub fn classify(declarations: &[ExportDeclaration]) -> HandlerShape {
    let mut methods: Vec<(Method, String)> = Vec::new();
    for declaration in declarations.iter().filter(|d| !d.is_default) {
        if let Some(method) = Method::from_export_name(&declaration.name) {
            if !methods.iter().any(|(m, _)| *m == method) {
                methods.push((method, declaration.name.clone()));
            }
        }
    }

    if !methods.is_empty() {
        return HandlerShape::Methods(methods);
    }

    if declarations.iter().any(|d| d.is_default) {
        HandlerShape::All(DEFAULT_EXPORT.to_string())
    } else if declarations
        .iter()
        .any(|d| !d.is_default && d.name == HANDLER_EXPORT)
    {
        HandlerShape::All(HANDLER_EXPORT.to_string())
    } else {
        HandlerShape::Unroutable
    }
}

/// Source reader seam: the scanners and the expander ask it for a module's exports
///
/// The filesystem-backed [`SourceAnalyzer`] is the production implementation;
/// tests can substitute an in-memory table.
pub trait ExportReader {
    fn read_exports(&self, path: &Path) -> Result<ModuleExports, ParseError>;
}

/// Grammar flavor, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    TypeScript,
    Tsx,
}

impl Dialect {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") | Some("jsx") => Dialect::Tsx,
            _ => Dialect::TypeScript,
        }
    }
}

/// Reads modules from disk and parses them with tree-sitter
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceAnalyzer;

impl ExportReader for SourceAnalyzer {
    fn read_exports(&self, path: &Path) -> Result<ModuleExports, ParseError> {
        let bytes = fs::read(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8(bytes).map_err(|e| ParseError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        parse_exports(&source, Dialect::from_path(path))
    }
}

/// Parses module source and lists its top-level exports
///
/// A tree containing error or missing nodes is rejected: a module the parser
/// had to guess about is not trusted for routing.
pub fn parse_exports(source: &str, dialect: Dialect) -> Result<ModuleExports, ParseError> {
    let language = match dialect {
        Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
        Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX,
    };

    let mut parser = Parser::new();
    parser
        .set_language(&language.into())
        .map_err(|e| ParseError::Language(e.to_string()))?;

    let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;
    let root = tree.root_node();

    if root.has_error() {
        let (line, column) = first_error_position(root);
        return Err(ParseError::Syntax { line, column });
    }

    let mut declarations = Vec::new();
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        if node.kind() == "export_statement" {
            collect_export_statement(node, source, &mut declarations);
        }
    }

    Ok(ModuleExports::new(declarations))
}

/// 1-based position of the first error or missing node
fn first_error_position(root: Node<'_>) -> (usize, usize) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let point = node.start_position();
            return (point.row + 1, point.column + 1);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    let point = root.start_position();
    (point.row + 1, point.column + 1)
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// Anonymous tokens directly under a node (`default`, `type`, `*`, `=`)
fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

fn collect_export_statement(node: Node<'_>, source: &str, out: &mut Vec<ExportDeclaration>) {
    // export default ..., export = ...
    if has_token(node, "default") || has_token(node, "=") {
        out.push(ExportDeclaration::default_export());
        return;
    }

    // export type { A }
    if has_token(node, "type") {
        return;
    }

    if let Some(declaration) = node.child_by_field_name("declaration") {
        collect_declaration(declaration, source, out);
        return;
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "export_clause" => collect_export_clause(child, source, out),
            // export * as ns from "./mod"
            "namespace_export" => {
                let mut inner = child.walk();
                let name = child
                    .named_children(&mut inner)
                    .last()
                    .map(|n| unquote(text(n, source)).to_string());
                if let Some(name) = name {
                    out.push(ExportDeclaration::named(name));
                }
            }
            _ => {}
        }
    }
}

fn collect_declaration(node: Node<'_>, source: &str, out: &mut Vec<ExportDeclaration>) {
    match node.kind() {
        "function_declaration"
        | "generator_function_declaration"
        | "function_signature"
        | "class_declaration"
        | "abstract_class_declaration"
        | "enum_declaration"
        | "internal_module"
        | "module" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.push(ExportDeclaration::named(unquote(text(name, source))));
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name) = declarator.child_by_field_name("name") {
                    collect_binding_names(name, source, out);
                }
            }
        }
        // export declare const GET: Handler;
        "ambient_declaration" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_declaration(child, source, out);
            }
        }
        // interfaces and type aliases have no runtime value
        _ => {}
    }
}

/// Identifiers bound by a declarator name, including destructuring patterns
fn collect_binding_names(node: Node<'_>, source: &str, out: &mut Vec<ExportDeclaration>) {
    match node.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            out.push(ExportDeclaration::named(text(node, source)));
        }
        "pair_pattern" => {
            if let Some(value) = node.child_by_field_name("value") {
                collect_binding_names(value, source, out);
            }
        }
        "assignment_pattern" | "object_assignment_pattern" => {
            if let Some(left) = node.child_by_field_name("left") {
                collect_binding_names(left, source, out);
            }
        }
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_binding_names(child, source, out);
            }
        }
        _ => {}
    }
}

fn collect_export_clause(node: Node<'_>, source: &str, out: &mut Vec<ExportDeclaration>) {
    let mut cursor = node.walk();
    for specifier in node.named_children(&mut cursor) {
        if specifier.kind() != "export_specifier" || has_token(specifier, "type") {
            continue;
        }
        let exported = specifier
            .child_by_field_name("alias")
            .or_else(|| specifier.child_by_field_name("name"));
        let Some(exported) = exported else {
            continue;
        };

        let name = unquote(text(exported, source));
        if name == DEFAULT_EXPORT {
            out.push(ExportDeclaration::default_export());
        } else {
            out.push(ExportDeclaration::named(name));
        }
    }
}

fn unquote(raw: &str) -> &str {
    raw.trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(source: &str) -> Vec<(String, bool)> {
        parse_exports(source, Dialect::TypeScript)
            .unwrap()
            .declarations
            .into_iter()
            .map(|d| (d.name, d.is_default))
            .collect()
    }

    #[test]
    fn test_function_and_const_exports() {
        let source = r#"
            import { db } from "../db";

            export async function GET(req: Request) {
                return new Response("ok");
            }

            export const POST = async (req: Request) => new Response("created");
            export let counter = 0, other = 1;
        "#;
        assert_eq!(
            names(source),
            vec![
                ("GET".to_string(), false),
                ("POST".to_string(), false),
                ("counter".to_string(), false),
                ("other".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_default_exports() {
        assert_eq!(
            names("export default async function (req: Request) { return null; }"),
            vec![("default".to_string(), true)]
        );
        assert_eq!(
            names("const h = () => 1;\nexport default h;"),
            vec![("default".to_string(), true)]
        );
    }

    #[test]
    fn test_export_clause_with_aliases() {
        let source = r#"
            function list() {}
            function create() {}
            export { list as GET, create as post };
        "#;
        assert_eq!(
            names(source),
            vec![("GET".to_string(), false), ("post".to_string(), false)]
        );
    }

    #[test]
    fn test_alias_to_default() {
        let source = "function handle() {}\nexport { handle as default };";
        assert_eq!(names(source), vec![("default".to_string(), true)]);
    }

    #[test]
    fn test_type_only_exports_are_ignored() {
        let source = r#"
            export interface Payload { id: string }
            export type Id = string;
            export function handler() {}
        "#;
        assert_eq!(names(source), vec![("handler".to_string(), false)]);
    }

    #[test]
    fn test_nested_exports_are_not_top_level() {
        let source = r#"
            function outer() {
                const GET = 1;
                return GET;
            }
        "#;
        assert!(names(source).is_empty());
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        let err = parse_exports("export function GET( {", Dialect::TypeScript).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_tsx_dialect() {
        let source = "export default function Page() { return <div>hi</div>; }";
        let exports = parse_exports(source, Dialect::Tsx).unwrap();
        assert!(exports.has_default());
    }

    #[test]
    fn test_classify_prefers_methods_over_default() {
        let exports = ModuleExports::new(vec![
            ExportDeclaration::default_export(),
            ExportDeclaration::named("get"),
            ExportDeclaration::named("handler"),
        ]);
        assert_eq!(
            exports.shape(),
            HandlerShape::Methods(vec![(Method::Get, "get".to_string())])
        );
    }

    #[test]
    fn test_classify_default_beats_handler() {
        let shape = classify(&[
            ExportDeclaration::named("handler"),
            ExportDeclaration::default_export(),
        ]);
        assert_eq!(shape, HandlerShape::All("default".to_string()));
    }

    #[test]
    fn test_named_deduplicates() {
        let exports = ModuleExports::new(vec![
            ExportDeclaration::named("GET"),
            ExportDeclaration::named("GET"),
            ExportDeclaration::default_export(),
        ]);
        assert_eq!(exports.named(), vec!["GET".to_string()]);
    }
}
