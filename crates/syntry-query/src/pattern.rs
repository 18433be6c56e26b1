//! Pattern text parsing.
//!
//! The pattern dialect is the tree-sitter query s-expression surface used
//! by the bundled `.scm`-style queries:
//!
//! ```text
//! (call
//!   function: (identifier) @security.eval_exec
//!   (#match? @security.eval_exec "^(eval|exec)$"))
//! ```
//!
//! Supported forms: named kinds `(call)`, wildcard `(_)` and bare `_`,
//! anonymous tokens `("+")`, field-anchored children `field: (kind)`,
//! positional children, structural absence `!(kind)` and `!field`,
//! captures `@name`, predicate clauses `(#name? @capture "arg")`, and
//! `;` line comments. Several top-level patterns form alternatives of one
//! query; predicates apply to the pattern they are written in.

use syntry_core::EngineError;

/// How a matcher constrains a node's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindMatcher {
    /// Exact grammar kind, e.g. `"except_clause"`.
    Kind(String),
    /// Any named node: `(_)` or `_`.
    Wildcard,
    /// Anonymous token by its text, e.g. `("+")`.
    Token(String),
}

/// One node of a pattern tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMatcher {
    pub kind: KindMatcher,
    /// Capture names bound to the node this matcher unifies with.
    pub captures: Vec<String>,
    pub children: Vec<ChildMatcher>,
}

/// A constraint on the children of a matched node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildMatcher {
    /// Must unify with one child under this field name.
    Field(String, NodeMatcher),
    /// Must unify with one named child, in order relative to other
    /// positional constraints.
    Positional(NodeMatcher),
    /// No direct child may unify with this matcher: `!(kind)`.
    Forbidden(NodeMatcher),
    /// The field must be empty: `!field`.
    AbsentField(String),
}

impl NodeMatcher {
    /// Capture names bound anywhere in this matcher. Captures inside
    /// `Forbidden` sub-matchers never bind and are excluded.
    pub(crate) fn bound_captures(&self, out: &mut Vec<String>) {
        out.extend(self.captures.iter().cloned());
        for child in &self.children {
            match child {
                ChildMatcher::Field(_, m) | ChildMatcher::Positional(m) => m.bound_captures(out),
                ChildMatcher::Forbidden(_) | ChildMatcher::AbsentField(_) => {}
            }
        }
    }
}

/// An argument of a predicate clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateArg {
    Capture(String),
    Literal(String),
}

/// A predicate clause as written, before registry compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedPredicate {
    pub name: String,
    pub args: Vec<PredicateArg>,
    /// Byte offset of the predicate name in the pattern text.
    pub offset: usize,
}

/// One top-level pattern alternative with its predicate clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedPattern {
    pub matcher: NodeMatcher,
    pub predicates: Vec<ParsedPredicate>,
}

/// Parse pattern text into its alternatives.
pub(crate) fn parse_pattern_text(text: &str) -> Result<Vec<ParsedPattern>, EngineError> {
    let mut parser = Parser::new(text);
    let mut patterns: Vec<ParsedPattern> = Vec::new();

    loop {
        let (tok, offset) = parser.peek()?.clone();
        match tok {
            Tok::Eof => break,
            Tok::LParen => {
                parser.next()?;
                if matches!(parser.peek()?.0, Tok::Pred(_)) {
                    let predicate = parser.parse_predicate_body()?;
                    match patterns.last_mut() {
                        Some(pattern) => pattern.predicates.push(predicate),
                        None => {
                            return Err(syntax(offset, "predicate clause before any pattern"));
                        }
                    }
                } else {
                    let matcher = parser.parse_node_body()?;
                    let matcher = parser.attach_captures(matcher)?;
                    let predicates = std::mem::take(&mut parser.pending_predicates);
                    patterns.push(ParsedPattern {
                        matcher,
                        predicates,
                    });
                }
            }
            _ => return Err(syntax(offset, "expected '(' at top level")),
        }
    }

    if patterns.is_empty() {
        return Err(syntax(0, "pattern text contains no patterns"));
    }
    Ok(patterns)
}

fn syntax(offset: usize, message: impl Into<String>) -> EngineError {
    EngineError::QuerySyntax {
        offset,
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    LParen,
    RParen,
    Colon,
    Bang,
    Ident(String),
    Capture(String),
    Pred(String),
    Str(String),
    Wildcard,
    Eof,
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    peeked: Option<(Tok, usize)>,
    /// Predicate clauses encountered inside the pattern currently being
    /// parsed; drained into the pattern once it closes.
    pending_predicates: Vec<ParsedPredicate>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            peeked: None,
            pending_predicates: Vec::new(),
        }
    }

    fn peek(&mut self) -> Result<&(Tok, usize), EngineError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lex()?);
        }
        Ok(self.peeked.as_ref().unwrap())
    }

    fn next(&mut self) -> Result<(Tok, usize), EngineError> {
        match self.peeked.take() {
            Some(tok) => Ok(tok),
            None => self.lex(),
        }
    }

    fn skip_trivia(&mut self) {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b';' => {
                    while self.pos < bytes.len() && bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn lex(&mut self) -> Result<(Tok, usize), EngineError> {
        self.skip_trivia();
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let Some(&c) = bytes.get(self.pos) else {
            return Ok((Tok::Eof, start));
        };

        match c {
            b'(' => {
                self.pos += 1;
                Ok((Tok::LParen, start))
            }
            b')' => {
                self.pos += 1;
                Ok((Tok::RParen, start))
            }
            b':' => {
                self.pos += 1;
                Ok((Tok::Colon, start))
            }
            b'!' => {
                self.pos += 1;
                Ok((Tok::Bang, start))
            }
            b'@' => {
                self.pos += 1;
                let name = self.lex_name(|c| {
                    c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || c == b'-'
                });
                if name.is_empty() {
                    return Err(syntax(start, "expected capture name after '@'"));
                }
                Ok((Tok::Capture(name), start))
            }
            b'#' => {
                self.pos += 1;
                let name =
                    self.lex_name(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'-');
                if name.is_empty() {
                    return Err(syntax(start, "expected predicate name after '#'"));
                }
                if bytes.get(self.pos) != Some(&b'?') {
                    return Err(syntax(start, "predicate name must end with '?'"));
                }
                self.pos += 1;
                Ok((Tok::Pred(name), start))
            }
            b'"' => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match bytes.get(self.pos) {
                        None => return Err(syntax(start, "unterminated string literal")),
                        Some(b'"') => {
                            self.pos += 1;
                            break;
                        }
                        Some(b'\\') => {
                            let escaped = bytes.get(self.pos + 1).copied();
                            match escaped {
                                Some(b'"') => value.push('"'),
                                Some(b'\\') => value.push('\\'),
                                Some(b'n') => value.push('\n'),
                                Some(b't') => value.push('\t'),
                                _ => {
                                    return Err(syntax(
                                        self.pos,
                                        "unknown escape in string literal",
                                    ));
                                }
                            }
                            self.pos += 2;
                        }
                        Some(_) => {
                            let ch_start = self.pos;
                            let mut end = ch_start + 1;
                            while end < bytes.len() && !self.text.is_char_boundary(end) {
                                end += 1;
                            }
                            value.push_str(&self.text[ch_start..end]);
                            self.pos = end;
                        }
                    }
                }
                Ok((Tok::Str(value), start))
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let name = self.lex_name(|c| c.is_ascii_alphanumeric() || c == b'_');
                if name == "_" {
                    Ok((Tok::Wildcard, start))
                } else {
                    Ok((Tok::Ident(name), start))
                }
            }
            _ => Err(syntax(start, format!("unexpected character '{}'", c as char))),
        }
    }

    fn lex_name(&mut self, accept: fn(u8) -> bool) -> String {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len() && accept(bytes[self.pos]) {
            self.pos += 1;
        }
        self.text[start..self.pos].to_string()
    }

    /// Parse the inside of a node pattern; the opening '(' is already
    /// consumed. Consumes the closing ')'.
    fn parse_node_body(&mut self) -> Result<NodeMatcher, EngineError> {
        let (head, head_offset) = self.next()?;
        let kind = match head {
            Tok::Ident(name) => KindMatcher::Kind(name),
            Tok::Wildcard => KindMatcher::Wildcard,
            Tok::Str(token) => KindMatcher::Token(token),
            Tok::RParen => return Err(syntax(head_offset, "empty node pattern")),
            _ => return Err(syntax(head_offset, "expected node kind, '_' or string")),
        };

        let mut matcher = NodeMatcher {
            kind,
            captures: Vec::new(),
            children: Vec::new(),
        };

        loop {
            let (tok, offset) = self.peek()?.clone();
            match tok {
                Tok::RParen => {
                    self.next()?;
                    return Ok(matcher);
                }
                Tok::LParen => {
                    self.next()?;
                    if matches!(self.peek()?.0, Tok::Pred(_)) {
                        // Predicate clauses written inside a pattern apply
                        // to that pattern; the caller scoops them up.
                        let predicate = self.parse_predicate_body()?;
                        self.pending_predicates.push(predicate);
                    } else {
                        let child = self.parse_node_body()?;
                        let child = self.attach_captures(child)?;
                        matcher.children.push(ChildMatcher::Positional(child));
                    }
                }
                Tok::Ident(name) => {
                    self.next()?;
                    let (colon, colon_offset) = self.next()?;
                    if colon != Tok::Colon {
                        return Err(syntax(colon_offset, "expected ':' after field name"));
                    }
                    let value = self.parse_term()?;
                    matcher.children.push(ChildMatcher::Field(name, value));
                }
                Tok::Wildcard => {
                    self.next()?;
                    let child = self.attach_captures(NodeMatcher {
                        kind: KindMatcher::Wildcard,
                        captures: Vec::new(),
                        children: Vec::new(),
                    })?;
                    matcher.children.push(ChildMatcher::Positional(child));
                }
                Tok::Str(token) => {
                    self.next()?;
                    let child = self.attach_captures(NodeMatcher {
                        kind: KindMatcher::Token(token),
                        captures: Vec::new(),
                        children: Vec::new(),
                    })?;
                    matcher.children.push(ChildMatcher::Positional(child));
                }
                Tok::Bang => {
                    self.next()?;
                    match self.peek()?.clone() {
                        (Tok::LParen, _) => {
                            self.next()?;
                            let forbidden = self.parse_node_body()?;
                            // Captures under a forbidden matcher never
                            // bind; they are parsed but excluded from the
                            // bound set at compile time.
                            let forbidden = self.attach_captures(forbidden)?;
                            matcher.children.push(ChildMatcher::Forbidden(forbidden));
                        }
                        (Tok::Ident(field), _) => {
                            self.next()?;
                            matcher.children.push(ChildMatcher::AbsentField(field));
                        }
                        (_, bad_offset) => {
                            return Err(syntax(
                                bad_offset,
                                "expected '(' or field name after '!'",
                            ));
                        }
                    }
                }
                Tok::Capture(_) => {
                    return Err(syntax(offset, "capture must follow a node"));
                }
                Tok::Eof => return Err(syntax(offset, "unexpected end of pattern")),
                Tok::Colon | Tok::Pred(_) => {
                    return Err(syntax(offset, "unexpected token in node pattern"));
                }
            }
        }
    }

    /// Parse a node, wildcard or token term, with trailing captures.
    fn parse_term(&mut self) -> Result<NodeMatcher, EngineError> {
        let (tok, offset) = self.next()?;
        let matcher = match tok {
            Tok::LParen => self.parse_node_body()?,
            Tok::Wildcard => NodeMatcher {
                kind: KindMatcher::Wildcard,
                captures: Vec::new(),
                children: Vec::new(),
            },
            Tok::Str(token) => NodeMatcher {
                kind: KindMatcher::Token(token),
                captures: Vec::new(),
                children: Vec::new(),
            },
            _ => return Err(syntax(offset, "expected '(' , '_' or string")),
        };
        self.attach_captures(matcher)
    }

    /// Attach any trailing `@capture` tokens to a just-parsed matcher.
    fn attach_captures(&mut self, mut matcher: NodeMatcher) -> Result<NodeMatcher, EngineError> {
        while matches!(self.peek()?.0, Tok::Capture(_)) {
            if let (Tok::Capture(name), _) = self.next()? {
                matcher.captures.push(name);
            }
        }
        Ok(matcher)
    }

    /// Parse a predicate clause; '(' is consumed and the head is a `Pred`
    /// token. Consumes the closing ')'.
    fn parse_predicate_body(&mut self) -> Result<ParsedPredicate, EngineError> {
        let (tok, offset) = self.next()?;
        let Tok::Pred(name) = tok else {
            return Err(syntax(offset, "expected predicate name"));
        };

        let mut args = Vec::new();
        loop {
            let (tok, arg_offset) = self.next()?;
            match tok {
                Tok::RParen => break,
                Tok::Capture(capture) => args.push(PredicateArg::Capture(capture)),
                Tok::Str(literal) => args.push(PredicateArg::Literal(literal)),
                Tok::Eof => return Err(syntax(arg_offset, "unexpected end of predicate")),
                _ => {
                    return Err(syntax(
                        arg_offset,
                        "predicate arguments must be captures or strings",
                    ));
                }
            }
        }

        Ok(ParsedPredicate { name, args, offset })
    }
}
