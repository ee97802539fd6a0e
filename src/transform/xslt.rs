// src/transform/xslt.rs

//! A small XSLT 1.0 interpreter covering what configuration templates use:
//! match templates with priorities, `apply-templates`, `value-of`,
//! `for-each`, `if`, `choose`, `text`, `copy-of` and literal result elements
//! with attribute value templates.
//!
//! Stylesheets are compiled once into an instruction tree and then applied
//! to a parsed input document.

use roxmltree::{Document, Node};
use thiserror::Error;

use crate::markup::{escape_attribute, escape_text, XML_DECLARATION};

use super::xpath::{self, string_value, Context, Expr, LocationPath, XPathError, XValue};

pub const XSLT_NAMESPACE: &str = "http://www.w3.org/1999/XSL/Transform";

/// Nested template applications allowed before evaluation is aborted.
pub const MAX_TEMPLATE_DEPTH: usize = 512;

#[derive(Debug, Error)]
pub enum StylesheetError {
    #[error("not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("root element must be xsl:stylesheet or xsl:transform, found <{0}>")]
    NotAStylesheet(String),

    #[error("<xsl:{0}> is not supported")]
    Unsupported(String),

    #[error("<xsl:{element}> requires a {attribute:?} attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("invalid expression {expr:?}: {source}")]
    Expression {
        expr: String,
        #[source]
        source: XPathError,
    },

    #[error("invalid priority {0:?}")]
    Priority(String),

    #[error("unterminated attribute value template {0:?}")]
    AttributeTemplate(String),
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("template recursion exceeds {0} levels")]
    TooDeep(usize),

    #[error(transparent)]
    XPath(#[from] XPathError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMethod {
    Xml,
    Text,
}

#[derive(Debug)]
struct Rule {
    pattern: LocationPath,
    priority: f64,
    body: usize,
}

#[derive(Debug)]
enum Instruction {
    Text(String),
    ValueOf(Expr),
    CopyOf(Expr),
    ApplyTemplates(Option<Expr>),
    ForEach {
        select: Expr,
        body: Vec<Instruction>,
    },
    If {
        test: Expr,
        body: Vec<Instruction>,
    },
    Choose {
        branches: Vec<(Expr, Vec<Instruction>)>,
        otherwise: Vec<Instruction>,
    },
    Element {
        name: String,
        attributes: Vec<(String, Vec<AvtPart>)>,
        body: Vec<Instruction>,
    },
}

#[derive(Debug)]
enum AvtPart {
    Literal(String),
    Expr(Expr),
}

/// A compiled stylesheet.
#[derive(Debug)]
pub struct Stylesheet {
    method: OutputMethod,
    omit_declaration: bool,
    rules: Vec<Rule>,
    bodies: Vec<Vec<Instruction>>,
}

impl Stylesheet {
    pub fn parse(text: &str) -> Result<Self, StylesheetError> {
        let doc = Document::parse(text)?;
        let root = doc.root_element();
        if !is_xsl(root, "stylesheet") && !is_xsl(root, "transform") {
            return Err(StylesheetError::NotAStylesheet(
                root.tag_name().name().to_string(),
            ));
        }

        let mut sheet = Stylesheet {
            method: OutputMethod::Xml,
            omit_declaration: false,
            rules: Vec::new(),
            bodies: Vec::new(),
        };

        // Top-level elements outside the XSLT namespace are user data and
        // carry no meaning for the transform.
        for child in root.children().filter(|n| n.is_element() && in_xsl_namespace(*n)) {
            match child.tag_name().name() {
                "output" => {
                    sheet.method = match child.attribute("method") {
                        None | Some("xml") | Some("html") => OutputMethod::Xml,
                        Some("text") => OutputMethod::Text,
                        Some(other) => {
                            return Err(StylesheetError::Unsupported(format!(
                                "output method=\"{other}\""
                            )));
                        }
                    };
                    sheet.omit_declaration = child.attribute("omit-xml-declaration") == Some("yes");
                }
                "template" => sheet.add_template(child)?,
                "strip-space" | "preserve-space" => {}
                other => return Err(StylesheetError::Unsupported(other.to_string())),
            }
        }

        Ok(sheet)
    }

    pub fn method(&self) -> OutputMethod {
        self.method
    }

    fn add_template(&mut self, node: Node<'_, '_>) -> Result<(), StylesheetError> {
        let Some(pattern) = node.attribute("match") else {
            return Err(StylesheetError::Unsupported(
                "template without match".to_string(),
            ));
        };
        let alternatives = xpath::parse_pattern(pattern).map_err(|source| {
            StylesheetError::Expression {
                expr: pattern.to_string(),
                source,
            }
        })?;
        let explicit = node
            .attribute("priority")
            .map(|p| {
                p.trim()
                    .parse::<f64>()
                    .map_err(|_| StylesheetError::Priority(p.to_string()))
            })
            .transpose()?;

        let body = self.bodies.len();
        self.bodies.push(compile_body(node)?);
        for pattern in alternatives {
            let priority = explicit.unwrap_or_else(|| pattern.default_priority());
            self.rules.push(Rule {
                pattern,
                priority,
                body,
            });
        }
        Ok(())
    }

    /// Apply the stylesheet to `input`, returning the serialized result.
    pub fn apply(&self, input: &Document<'_>) -> Result<String, ApplyError> {
        let mut out = Output::new(self.method);
        self.apply_templates(vec![input.root()], &mut out, 0)?;
        Ok(out.finish(self.omit_declaration))
    }

    fn apply_templates(
        &self,
        nodes: Vec<Node<'_, '_>>,
        out: &mut Output,
        depth: usize,
    ) -> Result<(), ApplyError> {
        if depth > MAX_TEMPLATE_DEPTH {
            return Err(ApplyError::TooDeep(MAX_TEMPLATE_DEPTH));
        }
        let size = nodes.len();
        for (index, node) in nodes.into_iter().enumerate() {
            let ctx = Context {
                node,
                position: index + 1,
                size,
            };
            match self.find_rule(node)? {
                Some(body) => self.execute(&self.bodies[body], &ctx, out, depth + 1)?,
                None => self.builtin(&ctx, out, depth + 1)?,
            }
        }
        Ok(())
    }

    /// Highest-priority matching rule; later rules win ties.
    fn find_rule(&self, node: Node<'_, '_>) -> Result<Option<usize>, ApplyError> {
        let mut best: Option<&Rule> = None;
        for rule in &self.rules {
            if !rule.pattern.matches(node)? {
                continue;
            }
            match best {
                Some(current) if current.priority > rule.priority => {}
                _ => best = Some(rule),
            }
        }
        Ok(best.map(|rule| rule.body))
    }

    fn builtin(&self, ctx: &Context<'_, '_>, out: &mut Output, depth: usize) -> Result<(), ApplyError> {
        let node = ctx.node;
        if node.is_root() || node.is_element() {
            self.apply_templates(node.children().collect(), out, depth)
        } else {
            if node.is_text() {
                out.text(node.text().unwrap_or_default());
            }
            Ok(())
        }
    }

    fn execute(
        &self,
        body: &[Instruction],
        ctx: &Context<'_, '_>,
        out: &mut Output,
        depth: usize,
    ) -> Result<(), ApplyError> {
        for instruction in body {
            match instruction {
                Instruction::Text(text) => out.text(text),
                Instruction::ValueOf(expr) => out.text(&expr.evaluate(ctx)?.to_string_value()),
                Instruction::CopyOf(expr) => match expr.evaluate(ctx)? {
                    XValue::Nodes(nodes) => {
                        for node in nodes {
                            out.copy_node(node);
                        }
                    }
                    other => out.text(&other.to_string_value()),
                },
                Instruction::ApplyTemplates(select) => {
                    let nodes = match select {
                        Some(expr) => expr.select_nodes(ctx)?,
                        None => ctx.node.children().collect(),
                    };
                    self.apply_templates(nodes, out, depth)?;
                }
                Instruction::ForEach { select, body } => {
                    let nodes = select.select_nodes(ctx)?;
                    let size = nodes.len();
                    for (index, node) in nodes.into_iter().enumerate() {
                        let inner = Context {
                            node,
                            position: index + 1,
                            size,
                        };
                        self.execute(body, &inner, out, depth + 1)?;
                    }
                }
                Instruction::If { test, body } => {
                    if test.evaluate(ctx)?.to_bool() {
                        self.execute(body, ctx, out, depth)?;
                    }
                }
                Instruction::Choose {
                    branches,
                    otherwise,
                } => {
                    let mut taken = None;
                    for (test, body) in branches {
                        if test.evaluate(ctx)?.to_bool() {
                            taken = Some(body);
                            break;
                        }
                    }
                    self.execute(taken.unwrap_or(otherwise), ctx, out, depth)?;
                }
                Instruction::Element {
                    name,
                    attributes,
                    body,
                } => {
                    let mut rendered = Vec::with_capacity(attributes.len());
                    for (attr, parts) in attributes {
                        rendered.push((attr.as_str(), render_avt(parts, ctx)?));
                    }
                    out.start_element(name, &rendered);
                    self.execute(body, ctx, out, depth)?;
                    out.end_element(name);
                }
            }
        }
        Ok(())
    }
}

fn in_xsl_namespace(node: Node<'_, '_>) -> bool {
    node.tag_name().namespace() == Some(XSLT_NAMESPACE)
}

fn is_xsl(node: Node<'_, '_>, name: &str) -> bool {
    in_xsl_namespace(node) && node.tag_name().name() == name
}

fn compile_body(parent: Node<'_, '_>) -> Result<Vec<Instruction>, StylesheetError> {
    let mut body = Vec::new();
    for child in parent.children() {
        if child.is_text() {
            let text = child.text().unwrap_or_default();
            if !text.trim().is_empty() {
                body.push(Instruction::Text(text.to_string()));
            }
        } else if child.is_element() {
            if in_xsl_namespace(child) {
                body.push(compile_instruction(child)?);
            } else {
                body.push(compile_literal_element(child)?);
            }
        }
    }
    Ok(body)
}

fn compile_instruction(node: Node<'_, '_>) -> Result<Instruction, StylesheetError> {
    let name = node.tag_name().name();
    Ok(match name {
        "value-of" => Instruction::ValueOf(required_expr(node, "select")?),
        "copy-of" => Instruction::CopyOf(required_expr(node, "select")?),
        "apply-templates" => {
            if node.children().any(|c| c.is_element()) {
                return Err(StylesheetError::Unsupported(
                    "apply-templates with sort or with-param".to_string(),
                ));
            }
            let select = node
                .attribute("select")
                .map(compile_expr)
                .transpose()?;
            Instruction::ApplyTemplates(select)
        }
        "for-each" => Instruction::ForEach {
            select: required_expr(node, "select")?,
            body: compile_body(node)?,
        },
        "if" => Instruction::If {
            test: required_expr(node, "test")?,
            body: compile_body(node)?,
        },
        "choose" => {
            let mut branches = Vec::new();
            let mut otherwise = Vec::new();
            for child in node.children().filter(|n| n.is_element()) {
                if is_xsl(child, "when") {
                    branches.push((required_expr(child, "test")?, compile_body(child)?));
                } else if is_xsl(child, "otherwise") {
                    otherwise = compile_body(child)?;
                } else {
                    return Err(StylesheetError::Unsupported(format!(
                        "{} inside choose",
                        child.tag_name().name()
                    )));
                }
            }
            Instruction::Choose {
                branches,
                otherwise,
            }
        }
        "text" => Instruction::Text(node.text().unwrap_or_default().to_string()),
        other => return Err(StylesheetError::Unsupported(other.to_string())),
    })
}

fn compile_literal_element(node: Node<'_, '_>) -> Result<Instruction, StylesheetError> {
    let mut attributes = Vec::new();
    for attr in node.attributes() {
        if attr.namespace() == Some(XSLT_NAMESPACE) {
            continue;
        }
        attributes.push((attr.name().to_string(), parse_avt(attr.value())?));
    }
    Ok(Instruction::Element {
        name: node.tag_name().name().to_string(),
        attributes,
        body: compile_body(node)?,
    })
}

fn compile_expr(source: &str) -> Result<Expr, StylesheetError> {
    xpath::parse(source).map_err(|source_err| StylesheetError::Expression {
        expr: source.to_string(),
        source: source_err,
    })
}

fn required_expr(node: Node<'_, '_>, attribute: &'static str) -> Result<Expr, StylesheetError> {
    let source = node
        .attribute(attribute)
        .ok_or_else(|| StylesheetError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute,
        })?;
    compile_expr(source)
}

fn parse_avt(value: &str) -> Result<Vec<AvtPart>, StylesheetError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut expr = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => expr.push(c),
                        None => return Err(StylesheetError::AttributeTemplate(value.to_string())),
                    }
                }
                if !literal.is_empty() {
                    parts.push(AvtPart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(AvtPart::Expr(compile_expr(&expr)?));
            }
            c => literal.push(c),
        }
    }
    if !literal.is_empty() {
        parts.push(AvtPart::Literal(literal));
    }
    Ok(parts)
}

fn render_avt(parts: &[AvtPart], ctx: &Context<'_, '_>) -> Result<String, XPathError> {
    let mut value = String::new();
    for part in parts {
        match part {
            AvtPart::Literal(text) => value.push_str(text),
            AvtPart::Expr(expr) => value.push_str(&expr.evaluate(ctx)?.to_string_value()),
        }
    }
    Ok(value)
}

/// Result tree serializer.
struct Output {
    method: OutputMethod,
    buf: String,
}

impl Output {
    fn new(method: OutputMethod) -> Self {
        Self {
            method,
            buf: String::new(),
        }
    }

    fn text(&mut self, text: &str) {
        match self.method {
            OutputMethod::Text => self.buf.push_str(text),
            OutputMethod::Xml => self.buf.push_str(&escape_text(text)),
        }
    }

    fn start_element<A: AsRef<str>>(&mut self, name: &str, attributes: &[(A, String)]) {
        if self.method == OutputMethod::Text {
            return;
        }
        self.buf.push('<');
        self.buf.push_str(name);
        for (attr, value) in attributes {
            self.buf.push(' ');
            self.buf.push_str(attr.as_ref());
            self.buf.push_str("=\"");
            self.buf.push_str(&escape_attribute(value));
            self.buf.push('"');
        }
        self.buf.push('>');
    }

    fn end_element(&mut self, name: &str) {
        if self.method == OutputMethod::Text {
            return;
        }
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
    }

    fn copy_node(&mut self, node: Node<'_, '_>) {
        if self.method == OutputMethod::Text {
            self.text(&string_value(node));
        } else if node.is_element() {
            let attributes: Vec<(String, String)> = node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect();
            let tag = node.tag_name();
            let name = tag.name();
            self.start_element(name, &attributes);
            for child in node.children() {
                self.copy_node(child);
            }
            self.end_element(name);
        } else if node.is_text() {
            self.text(node.text().unwrap_or_default());
        } else if node.is_root() {
            for child in node.children() {
                self.copy_node(child);
            }
        }
    }

    fn finish(self, omit_declaration: bool) -> String {
        match self.method {
            OutputMethod::Text => self.buf,
            OutputMethod::Xml => {
                let mut document = String::with_capacity(self.buf.len() + 32);
                if !omit_declaration {
                    document.push_str(XML_DECLARATION);
                    document.push('\n');
                }
                document.push_str(&self.buf);
                if !document.ends_with('\n') {
                    document.push('\n');
                }
                document
            }
        }
    }
}
