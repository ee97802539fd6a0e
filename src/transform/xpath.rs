// src/transform/xpath.rs

//! The XPath 1.0 subset understood by the built-in XSLT engine.
//!
//! Supported: absolute and relative location paths over the child,
//! self (`.`), parent (`..`) and descendant-or-self (`//`) axes; name tests,
//! `*`, `text()` and `node()`; positional and boolean predicates; union
//! (`|`), `=`, `!=`, `and`, `or`; string and number literals; and a handful
//! of core functions. Attributes, variables, arithmetic and explicit axis
//! names are rejected when the expression is compiled.

use std::iter::Peekable;
use std::str::CharIndices;

use roxmltree::Node;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum XPathError {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("unterminated string literal")]
    UnterminatedLiteral,

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unsupported construct: {0}")]
    Unsupported(String),

    #[error("unknown function {0}()")]
    UnknownFunction(String),

    #[error("{name}() takes {expected} argument(s), got {got}")]
    Arity {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("expected a node-set")]
    NotANodeSet,
}

type XResult<T> = std::result::Result<T, XPathError>;

// ---------------------------------------------------------------------------
// Syntax tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(String),
    Number(f64),
    Path(LocationPath),
    Union(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call(Function, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
}

impl CompareOp {
    fn holds<T: PartialEq + ?Sized>(self, lhs: &T, rhs: &T) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::NotEq => lhs != rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    SelfNode,
    Parent,
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    Name(String),
    AnyElement,
    Text,
    AnyNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Not,
    Count,
    String,
    Concat,
    Contains,
    StartsWith,
    NormalizeSpace,
    StringLength,
    Position,
    Last,
    True,
    False,
    Name,
    Boolean,
    Number,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "not" => Function::Not,
            "count" => Function::Count,
            "string" => Function::String,
            "concat" => Function::Concat,
            "contains" => Function::Contains,
            "starts-with" => Function::StartsWith,
            "normalize-space" => Function::NormalizeSpace,
            "string-length" => Function::StringLength,
            "position" => Function::Position,
            "last" => Function::Last,
            "true" => Function::True,
            "false" => Function::False,
            "name" | "local-name" => Function::Name,
            "boolean" => Function::Boolean,
            "number" => Function::Number,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Function::Not => "not",
            Function::Count => "count",
            Function::String => "string",
            Function::Concat => "concat",
            Function::Contains => "contains",
            Function::StartsWith => "starts-with",
            Function::NormalizeSpace => "normalize-space",
            Function::StringLength => "string-length",
            Function::Position => "position",
            Function::Last => "last",
            Function::True => "true",
            Function::False => "false",
            Function::Name => "name",
            Function::Boolean => "boolean",
            Function::Number => "number",
        }
    }

    fn check_arity(self, got: usize) -> XResult<()> {
        let (min, max, expected) = match self {
            Function::Position | Function::Last | Function::True | Function::False => {
                (0, Some(0), "no")
            }
            Function::Not | Function::Count | Function::Boolean => (1, Some(1), "exactly 1"),
            Function::Contains | Function::StartsWith => (2, Some(2), "exactly 2"),
            Function::Concat => (2, None, "at least 2"),
            Function::String
            | Function::NormalizeSpace
            | Function::StringLength
            | Function::Name
            | Function::Number => (0, Some(1), "at most 1"),
        };
        if got < min || max.is_some_and(|max| got > max) {
            return Err(XPathError::Arity {
                name: self.name(),
                expected,
                got,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Pipe,
    Eq,
    NotEq,
    Star,
    Dot,
    DotDot,
    At,
    Dollar,
    Literal(String),
    Number(f64),
    Name(String),
}

fn tokenize(input: &str) -> XResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let token = match c {
            '/' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == '/').is_some() {
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '[' => single(&mut chars, Token::LBracket),
            ']' => single(&mut chars, Token::RBracket),
            '(' => single(&mut chars, Token::LParen),
            ')' => single(&mut chars, Token::RParen),
            ',' => single(&mut chars, Token::Comma),
            '|' => single(&mut chars, Token::Pipe),
            '=' => single(&mut chars, Token::Eq),
            '*' => single(&mut chars, Token::Star),
            '@' => single(&mut chars, Token::At),
            '$' => single(&mut chars, Token::Dollar),
            '!' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == '=').is_none() {
                    return Err(XPathError::UnexpectedChar('!'));
                }
                Token::NotEq
            }
            '.' => {
                let rest = &input[start + 1..];
                if rest.starts_with('.') {
                    chars.next();
                    chars.next();
                    Token::DotDot
                } else if rest.starts_with(|c: char| c.is_ascii_digit()) {
                    number(input, &mut chars)?
                } else {
                    chars.next();
                    Token::Dot
                }
            }
            '"' | '\'' => {
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some((_, q)) if q == c => break,
                        Some((_, other)) => literal.push(other),
                        None => return Err(XPathError::UnterminatedLiteral),
                    }
                }
                Token::Literal(literal)
            }
            c if c.is_ascii_digit() => number(input, &mut chars)?,
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some((_, c)) =
                    chars.next_if(|&(_, c)| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
                {
                    name.push(c);
                }
                if name.contains("::") {
                    return Err(XPathError::Unsupported(format!("axis specifier in {name:?}")));
                }
                Token::Name(name)
            }
            other => return Err(XPathError::UnexpectedChar(other)),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

fn single(chars: &mut Peekable<CharIndices<'_>>, token: Token) -> Token {
    chars.next();
    token
}

fn number(input: &str, chars: &mut Peekable<CharIndices<'_>>) -> XResult<Token> {
    let mut end = input.len();
    let start = chars.peek().map(|&(i, _)| i).unwrap_or(end);
    while let Some(&(i, c)) = chars.peek() {
        if c.is_ascii_digit() || c == '.' {
            chars.next();
        } else {
            end = i;
            break;
        }
    }
    input[start..end]
        .parse::<f64>()
        .map(Token::Number)
        .map_err(|_| XPathError::UnexpectedToken(input[start..end].to_string()))
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Compile an expression.
pub fn parse(input: &str) -> XResult<Expr> {
    let mut parser = ExprParser {
        tokens: tokenize(input)?,
        pos: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(token) = parser.peek() {
        return Err(XPathError::UnexpectedToken(format!("{token:?}")));
    }
    Ok(expr)
}

/// Compile a template `match` pattern into its `|`-separated alternatives.
pub fn parse_pattern(input: &str) -> XResult<Vec<LocationPath>> {
    fn flatten(expr: Expr, out: &mut Vec<LocationPath>) -> XResult<()> {
        match expr {
            Expr::Path(path) => {
                out.push(path);
                Ok(())
            }
            Expr::Union(lhs, rhs) => {
                flatten(*lhs, out)?;
                flatten(*rhs, out)
            }
            other => Err(XPathError::Unsupported(format!(
                "pattern must be a location path, got {other:?}"
            ))),
        }
    }

    let mut alternatives = Vec::new();
    flatten(parse(input)?, &mut alternatives)?;
    Ok(alternatives)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> XResult<()> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(XPathError::UnexpectedToken(format!("{token:?}"))),
            None => Err(XPathError::UnexpectedEnd),
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Name(name)) if name == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> XResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat_keyword("or") {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> XResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.eat_keyword("and") {
            let rhs = self.parse_equality()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> XResult<Expr> {
        let mut lhs = self.parse_union()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::NotEq,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_union()?;
            lhs = Expr::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_union(&mut self) -> XResult<Expr> {
        let mut lhs = self.parse_primary()?;
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            let rhs = self.parse_primary()?;
            lhs = Expr::Union(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> XResult<Expr> {
        match self.peek() {
            None => Err(XPathError::UnexpectedEnd),
            Some(Token::Literal(_)) => match self.advance() {
                Some(Token::Literal(s)) => Ok(Expr::Literal(s)),
                _ => Err(XPathError::UnexpectedEnd),
            },
            Some(Token::Number(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let expr = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Dollar) => Err(XPathError::Unsupported("variables".to_string())),
            Some(Token::Name(name))
                if self.peek_at(1) == Some(&Token::LParen) && name != "text" && name != "node" =>
            {
                let name = name.clone();
                self.pos += 2;
                self.parse_call(&name)
            }
            Some(_) => Ok(Expr::Path(self.parse_path()?)),
        }
    }

    fn parse_call(&mut self, name: &str) -> XResult<Expr> {
        let function =
            Function::lookup(name).ok_or_else(|| XPathError::UnknownFunction(name.to_string()))?;
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
        } else {
            loop {
                args.push(self.parse_or()?);
                match self.advance() {
                    Some(Token::Comma) => continue,
                    Some(Token::RParen) => break,
                    Some(token) => return Err(XPathError::UnexpectedToken(format!("{token:?}"))),
                    None => return Err(XPathError::UnexpectedEnd),
                }
            }
        }
        function.check_arity(args.len())?;
        Ok(Expr::Call(function, args))
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Dot | Token::DotDot | Token::Star | Token::Name(_) | Token::At)
        )
    }

    fn parse_path(&mut self) -> XResult<LocationPath> {
        let mut absolute = false;
        let mut steps = Vec::new();

        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                absolute = true;
                if !self.at_step_start() {
                    return Ok(LocationPath { absolute, steps });
                }
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                absolute = true;
                steps.push(Step::descendant_or_self());
            }
            _ => {}
        }

        steps.push(self.parse_step()?);
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.pos += 1;
                    steps.push(self.parse_step()?);
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(Step::descendant_or_self());
                    steps.push(self.parse_step()?);
                }
                _ => break,
            }
        }

        Ok(LocationPath { absolute, steps })
    }

    fn parse_step(&mut self) -> XResult<Step> {
        let (axis, test) = match self.advance() {
            Some(Token::Dot) => return Ok(Step::new(Axis::SelfNode, NodeTest::AnyNode)),
            Some(Token::DotDot) => return Ok(Step::new(Axis::Parent, NodeTest::AnyNode)),
            Some(Token::Star) => (Axis::Child, NodeTest::AnyElement),
            Some(Token::At) => return Err(XPathError::Unsupported("attribute axis".to_string())),
            Some(Token::Name(name)) if self.peek() == Some(&Token::LParen) => {
                self.pos += 1;
                self.expect(Token::RParen)?;
                match name.as_str() {
                    "text" => (Axis::Child, NodeTest::Text),
                    "node" => (Axis::Child, NodeTest::AnyNode),
                    other => return Err(XPathError::Unsupported(format!("node test {other}()"))),
                }
            }
            Some(Token::Name(name)) => {
                let local = name.rsplit(':').next().unwrap_or(&name).to_string();
                (Axis::Child, NodeTest::Name(local))
            }
            Some(token) => return Err(XPathError::UnexpectedToken(format!("{token:?}"))),
            None => return Err(XPathError::UnexpectedEnd),
        };

        let mut step = Step::new(axis, test);
        while self.peek() == Some(&Token::LBracket) {
            self.pos += 1;
            step.predicates.push(self.parse_or()?);
            self.expect(Token::RBracket)?;
        }
        Ok(step)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluation context: the context node plus its position in the current
/// node list (both 1-based, as in XPath).
#[derive(Debug, Clone, Copy)]
pub struct Context<'a, 'input> {
    pub node: Node<'a, 'input>,
    pub position: usize,
    pub size: usize,
}

impl<'a, 'input> Context<'a, 'input> {
    pub fn new(node: Node<'a, 'input>) -> Self {
        Self {
            node,
            position: 1,
            size: 1,
        }
    }
}

/// Result of evaluating an expression.
#[derive(Debug, Clone)]
pub enum XValue<'a, 'input> {
    Nodes(Vec<Node<'a, 'input>>),
    Str(String),
    Num(f64),
    Bool(bool),
}

impl XValue<'_, '_> {
    pub fn to_bool(&self) -> bool {
        match self {
            XValue::Nodes(nodes) => !nodes.is_empty(),
            XValue::Str(s) => !s.is_empty(),
            XValue::Num(n) => *n != 0.0 && !n.is_nan(),
            XValue::Bool(b) => *b,
        }
    }

    pub fn to_string_value(&self) -> String {
        match self {
            XValue::Nodes(nodes) => nodes.first().map(|n| string_value(*n)).unwrap_or_default(),
            XValue::Str(s) => s.clone(),
            XValue::Num(n) => format_number(*n),
            XValue::Bool(b) => b.to_string(),
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            XValue::Num(n) => *n,
            XValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            other => parse_number(&other.to_string_value()),
        }
    }
}

/// Concatenated text content of a node.
pub fn string_value(node: Node<'_, '_>) -> String {
    if node.is_text() {
        return node.text().unwrap_or_default().to_string();
    }
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn sort_document_order(nodes: &mut Vec<Node<'_, '_>>) {
    nodes.sort_by_key(|n| n.id().get_usize());
    nodes.dedup_by_key(|n| n.id());
}

impl Expr {
    pub fn evaluate<'a, 'input>(&self, ctx: &Context<'a, 'input>) -> XResult<XValue<'a, 'input>> {
        Ok(match self {
            Expr::Literal(s) => XValue::Str(s.clone()),
            Expr::Number(n) => XValue::Num(*n),
            Expr::Path(path) => XValue::Nodes(path.select(ctx.node)?),
            Expr::Union(lhs, rhs) => {
                let mut nodes = lhs.select_nodes(ctx)?;
                nodes.extend(rhs.select_nodes(ctx)?);
                sort_document_order(&mut nodes);
                XValue::Nodes(nodes)
            }
            Expr::Or(lhs, rhs) => {
                XValue::Bool(lhs.evaluate(ctx)?.to_bool() || rhs.evaluate(ctx)?.to_bool())
            }
            Expr::And(lhs, rhs) => {
                XValue::Bool(lhs.evaluate(ctx)?.to_bool() && rhs.evaluate(ctx)?.to_bool())
            }
            Expr::Compare { op, lhs, rhs } => {
                XValue::Bool(compare(*op, &lhs.evaluate(ctx)?, &rhs.evaluate(ctx)?))
            }
            Expr::Call(function, args) => call(*function, args, ctx)?,
        })
    }

    /// Evaluate and require a node-set.
    pub fn select_nodes<'a, 'input>(
        &self,
        ctx: &Context<'a, 'input>,
    ) -> XResult<Vec<Node<'a, 'input>>> {
        match self.evaluate(ctx)? {
            XValue::Nodes(nodes) => Ok(nodes),
            _ => Err(XPathError::NotANodeSet),
        }
    }
}

fn compare(op: CompareOp, lhs: &XValue<'_, '_>, rhs: &XValue<'_, '_>) -> bool {
    match (lhs, rhs) {
        (XValue::Nodes(a), XValue::Nodes(b)) => a.iter().any(|x| {
            let x = string_value(*x);
            b.iter().any(|y| op.holds(x.as_str(), string_value(*y).as_str()))
        }),
        (XValue::Nodes(nodes), other) | (other, XValue::Nodes(nodes)) => match other {
            XValue::Bool(b) => op.holds(&!nodes.is_empty(), b),
            XValue::Num(n) => nodes
                .iter()
                .any(|x| op.holds(&parse_number(&string_value(*x)), n)),
            XValue::Str(s) => nodes
                .iter()
                .any(|x| op.holds(string_value(*x).as_str(), s.as_str())),
            XValue::Nodes(_) => false,
        },
        (XValue::Bool(_), _) | (_, XValue::Bool(_)) => op.holds(&lhs.to_bool(), &rhs.to_bool()),
        (XValue::Num(_), _) | (_, XValue::Num(_)) => op.holds(&lhs.to_number(), &rhs.to_number()),
        _ => op.holds(lhs.to_string_value().as_str(), rhs.to_string_value().as_str()),
    }
}

fn call<'a, 'input>(
    function: Function,
    args: &[Expr],
    ctx: &Context<'a, 'input>,
) -> XResult<XValue<'a, 'input>> {
    let arg_string = |i: usize| -> XResult<String> {
        match args.get(i) {
            Some(arg) => Ok(arg.evaluate(ctx)?.to_string_value()),
            None => Ok(string_value(ctx.node)),
        }
    };

    Ok(match function {
        Function::Not => XValue::Bool(!args[0].evaluate(ctx)?.to_bool()),
        Function::Boolean => XValue::Bool(args[0].evaluate(ctx)?.to_bool()),
        Function::Count => XValue::Num(args[0].select_nodes(ctx)?.len() as f64),
        Function::String => XValue::Str(arg_string(0)?),
        Function::Number => XValue::Num(parse_number(&arg_string(0)?)),
        Function::Concat => {
            let mut out = String::new();
            for arg in args {
                out.push_str(&arg.evaluate(ctx)?.to_string_value());
            }
            XValue::Str(out)
        }
        Function::Contains => XValue::Bool(arg_string(0)?.contains(arg_string(1)?.as_str())),
        Function::StartsWith => XValue::Bool(arg_string(0)?.starts_with(arg_string(1)?.as_str())),
        Function::NormalizeSpace => {
            XValue::Str(arg_string(0)?.split_whitespace().collect::<Vec<_>>().join(" "))
        }
        Function::StringLength => XValue::Num(arg_string(0)?.chars().count() as f64),
        Function::Position => XValue::Num(ctx.position as f64),
        Function::Last => XValue::Num(ctx.size as f64),
        Function::True => XValue::Bool(true),
        Function::False => XValue::Bool(false),
        Function::Name => {
            let node = match args.first() {
                Some(arg) => arg.select_nodes(ctx)?.first().copied(),
                None => Some(ctx.node),
            };
            let name = node
                .filter(|n| n.is_element())
                .map(|n| n.tag_name().name().to_string())
                .unwrap_or_default();
            XValue::Str(name)
        }
    })
}

impl Step {
    fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }

    fn descendant_or_self() -> Self {
        Self::new(Axis::DescendantOrSelf, NodeTest::AnyNode)
    }

    fn select_from<'a, 'input>(&self, node: Node<'a, 'input>) -> XResult<Vec<Node<'a, 'input>>> {
        let candidates: Vec<Node<'a, 'input>> = match self.axis {
            Axis::Child => node.children().collect(),
            Axis::SelfNode => vec![node],
            Axis::Parent => node.parent().into_iter().collect(),
            Axis::DescendantOrSelf => node.descendants().collect(),
        };
        let mut nodes: Vec<_> = candidates
            .into_iter()
            .filter(|n| self.test.matches(*n))
            .collect();

        for predicate in &self.predicates {
            let size = nodes.len();
            let mut kept = Vec::with_capacity(size);
            for (index, candidate) in nodes.into_iter().enumerate() {
                let ctx = Context {
                    node: candidate,
                    position: index + 1,
                    size,
                };
                let keep = match predicate.evaluate(&ctx)? {
                    XValue::Num(n) => n == (index + 1) as f64,
                    other => other.to_bool(),
                };
                if keep {
                    kept.push(candidate);
                }
            }
            nodes = kept;
        }
        Ok(nodes)
    }
}

impl NodeTest {
    fn matches(&self, node: Node<'_, '_>) -> bool {
        match self {
            NodeTest::Name(name) => node.is_element() && node.tag_name().name() == name,
            NodeTest::AnyElement => node.is_element(),
            NodeTest::Text => node.is_text(),
            NodeTest::AnyNode => true,
        }
    }
}

impl LocationPath {
    /// Nodes selected by this path from `origin`, in document order.
    pub fn select<'a, 'input>(&self, origin: Node<'a, 'input>) -> XResult<Vec<Node<'a, 'input>>> {
        let start = if self.absolute {
            origin.document().root()
        } else {
            origin
        };
        let mut current = vec![start];
        for step in &self.steps {
            let mut next = Vec::new();
            for node in &current {
                next.extend(step.select_from(*node)?);
            }
            sort_document_order(&mut next);
            current = next;
        }
        Ok(current)
    }

    /// Whether `node` matches this path used as an XSLT pattern: some
    /// ancestor-or-self context selects it.
    pub fn matches(&self, node: Node<'_, '_>) -> XResult<bool> {
        if self.absolute {
            return Ok(self.select(node)?.contains(&node));
        }
        for ctx in node.ancestors() {
            if self.select(ctx)?.contains(&node) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Default template priority for this pattern alternative.
    pub fn default_priority(&self) -> f64 {
        if !self.absolute {
            if let [step] = self.steps.as_slice() {
                if step.axis == Axis::Child && step.predicates.is_empty() {
                    return match step.test {
                        NodeTest::Name(_) => 0.0,
                        _ => -0.5,
                    };
                }
            }
        }
        0.5
    }
}
