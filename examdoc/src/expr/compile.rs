//! Compilation of plain arithmetic expressions into evaluators of `x`.
//!
//! The accepted language is deliberately small: numbers, the variable `x`,
//! the constants `pi` and `e`, the operators `+ - * / ^` (also `**`),
//! parentheses and a fixed set of one-argument functions plus `pow(a, b)`.
//! Anything else compiles to `None`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::geometry::limits::{MAX_EXPRESSION_DEPTH, MAX_EXPRESSION_LEN};

static ALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9xX+\-*/^().,\sA-Za-z_]*$").expect("static pattern")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Abs,
    Exp,
    /// natural logarithm
    Ln,
    /// base-10 logarithm
    Log,
    Pow,
}

impl Func {
    fn from_name(name: &str) -> Option<Func> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "sqrt" => Func::Sqrt,
            "abs" => Func::Abs,
            "exp" => Func::Exp,
            "ln" => Func::Ln,
            "log" => Func::Log,
            "pow" => Func::Pow,
            _ => return None,
        })
    }

    fn arity(self) -> usize {
        match self {
            Func::Pow => 2,
            _ => 1,
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        let a = args.first().copied().unwrap_or(f64::NAN);
        match self {
            Func::Sin => a.sin(),
            Func::Cos => a.cos(),
            Func::Tan => a.tan(),
            Func::Asin => a.asin(),
            Func::Acos => a.acos(),
            Func::Atan => a.atan(),
            Func::Sqrt => a.sqrt(),
            Func::Abs => a.abs(),
            Func::Exp => a.exp(),
            Func::Ln => a.ln(),
            Func::Log => a.log10(),
            Func::Pow => a.powf(args.get(1).copied().unwrap_or(f64::NAN)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Num(f64),
    Var,
    Neg(Box<Node>),
    Bin(BinOp, Box<Node>, Box<Node>),
    Call(Func, Vec<Node>),
}

impl Node {
    fn eval(&self, x: f64) -> f64 {
        match self {
            Node::Num(v) => *v,
            Node::Var => x,
            Node::Neg(n) => -n.eval(x),
            Node::Bin(op, a, b) => {
                let a = a.eval(x);
                let b = b.eval(x);
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => a.powf(b),
                }
            }
            Node::Call(f, args) => {
                let vals: Vec<f64> = args.iter().map(|a| a.eval(x)).collect();
                f.apply(&vals)
            }
        }
    }
}

/// A validated expression of one variable.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledExpr {
    source: String,
    root: Node,
}

impl CompiledExpr {
    /// Evaluate at `x`. Non-finite results mean "no value here".
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        self.root.eval(x)
    }

    /// Like [`eval`](Self::eval) but maps non-finite results to `None`.
    pub fn eval_finite(&self, x: f64) -> Option<f64> {
        let y = self.eval(x);
        y.is_finite().then_some(y)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Compile an infix expression (already converted from LaTeX).
///
/// Returns `None` for characters outside the allow-list, unknown
/// identifiers, wrong arity, unbalanced parentheses or trailing input.
/// Identifiers and arity are resolved here, so a compiled expression
/// evaluates at every `x` without faulting.
pub fn compile_expression(expr: &str) -> Option<CompiledExpr> {
    if expr.trim().is_empty() || expr.len() > MAX_EXPRESSION_LEN || !ALLOWED.is_match(expr) {
        return None;
    }
    let tokens = insert_implicit_mul(tokenize(expr)?);
    let mut parser = Parser { tokens: &tokens, pos: 0, depth: 0 };
    let root = parser.expr()?;
    if parser.pos != tokens.len() {
        return None;
    }
    Some(CompiledExpr { source: expr.to_string(), root })
}

/// Normalize, convert and compile an authored (possibly LaTeX) expression.
pub fn compile_latex(latex: &str) -> Option<CompiledExpr> {
    let expr = super::latex::normalize_graph_expression(latex);
    let compiled = compile_expression(&expr);
    if compiled.is_none() {
        tracing::debug!(latex, expr = expr.as_str(), "expression did not compile");
    }
    compiled
}

#[derive(Clone, Debug, PartialEq)]
enum Tok {
    Num(f64),
    Var,
    Const(f64),
    Func(Func),
    Op(BinOp),
    LParen,
    RParen,
    Comma,
}

fn tokenize(src: &str) -> Option<Vec<Tok>> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'0'..=b'9' | b'.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let v: f64 = src[start..i].parse().ok()?;
                out.push(Tok::Num(v));
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                // a digit ends the run: `x2` is `x` times `2`
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
                    i += 1;
                }
                split_identifier(&src[start..i], &mut out)?;
            }
            b'+' => {
                out.push(Tok::Op(BinOp::Add));
                i += 1;
            }
            b'-' => {
                out.push(Tok::Op(BinOp::Sub));
                i += 1;
            }
            b'*' => {
                if bytes.get(i + 1) == Some(&b'*') {
                    out.push(Tok::Op(BinOp::Pow));
                    i += 2;
                } else {
                    out.push(Tok::Op(BinOp::Mul));
                    i += 1;
                }
            }
            b'/' => {
                out.push(Tok::Op(BinOp::Div));
                i += 1;
            }
            b'^' => {
                out.push(Tok::Op(BinOp::Pow));
                i += 1;
            }
            b'(' => {
                out.push(Tok::LParen);
                i += 1;
            }
            b')' => {
                out.push(Tok::RParen);
                i += 1;
            }
            b',' => {
                out.push(Tok::Comma);
                i += 1;
            }
            // the allow-list admits unicode whitespace
            _ if (c as char).is_ascii() => return None,
            _ => {
                let ch = src[i..].chars().next()?;
                if !ch.is_whitespace() {
                    return None;
                }
                i += ch.len_utf8();
            }
        }
    }
    Some(out)
}

fn named_token(name: &str) -> Option<Tok> {
    match name {
        "x" | "X" => Some(Tok::Var),
        "pi" | "PI" => Some(Tok::Const(std::f64::consts::PI)),
        "e" | "E" => Some(Tok::Const(std::f64::consts::E)),
        _ => Func::from_name(name).map(Tok::Func),
    }
}

/// Split a run of letters into known names, longest match first, so that
/// `sinx` and `xpi` (whitespace is dropped by the LaTeX conversion) still
/// compile.
fn split_identifier(ident: &str, out: &mut Vec<Tok>) -> Option<()> {
    if let Some(tok) = named_token(ident) {
        out.push(tok);
        return Some(());
    }
    let mut rest = ident;
    while !rest.is_empty() {
        let (len, tok) = (1..=rest.len())
            .rev()
            .filter(|&n| rest.is_char_boundary(n))
            .find_map(|n| named_token(&rest[..n]).map(|t| (n, t)))?;
        out.push(tok);
        rest = &rest[len..];
    }
    Some(())
}

fn ends_operand(t: &Tok) -> bool {
    matches!(t, Tok::Num(_) | Tok::Var | Tok::Const(_) | Tok::RParen)
}

fn starts_operand(t: &Tok) -> bool {
    matches!(t, Tok::Var | Tok::Const(_) | Tok::Func(_) | Tok::LParen)
}

/// `2x`, `2(x+1)`, `(x)(x)`, `x sin(x)` -> explicit `*`.
fn insert_implicit_mul(tokens: Vec<Tok>) -> Vec<Tok> {
    let mut out: Vec<Tok> = Vec::with_capacity(tokens.len() * 2);
    for tok in tokens {
        if let Some(prev) = out.last() {
            let number_after_operand = matches!(tok, Tok::Num(_)) && !matches!(prev, Tok::Num(_));
            if ends_operand(prev) && (starts_operand(&tok) || number_after_operand) {
                out.push(Tok::Op(BinOp::Mul));
            }
        }
        out.push(tok);
    }
    out
}

struct Parser<'a> {
    tokens: &'a [Tok],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Tok> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&'a Tok> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn enter(&mut self) -> Option<()> {
        self.depth += 1;
        (self.depth <= MAX_EXPRESSION_DEPTH).then_some(())
    }

    fn expr(&mut self) -> Option<Node> {
        self.enter()?;
        let mut lhs = self.term()?;
        while let Some(Tok::Op(op @ (BinOp::Add | BinOp::Sub))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Node::Bin(*op, Box::new(lhs), Box::new(rhs));
        }
        self.depth -= 1;
        Some(lhs)
    }

    fn term(&mut self) -> Option<Node> {
        let mut lhs = self.unary()?;
        while let Some(Tok::Op(op @ (BinOp::Mul | BinOp::Div))) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Node::Bin(*op, Box::new(lhs), Box::new(rhs));
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<Node> {
        match self.peek() {
            Some(Tok::Op(BinOp::Sub)) => {
                self.pos += 1;
                self.enter()?;
                let inner = self.unary()?;
                self.depth -= 1;
                Some(Node::Neg(Box::new(inner)))
            }
            Some(Tok::Op(BinOp::Add)) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    // right associative: 2^3^2 = 2^(3^2)
    fn power(&mut self) -> Option<Node> {
        let base = self.primary()?;
        if let Some(Tok::Op(BinOp::Pow)) = self.peek() {
            self.pos += 1;
            self.enter()?;
            let exp = self.unary()?;
            self.depth -= 1;
            return Some(Node::Bin(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Some(base)
    }

    fn primary(&mut self) -> Option<Node> {
        match self.bump()? {
            Tok::Num(v) => Some(Node::Num(*v)),
            Tok::Var => Some(Node::Var),
            Tok::Const(v) => Some(Node::Num(*v)),
            Tok::LParen => {
                let inner = self.expr()?;
                match self.bump()? {
                    Tok::RParen => Some(inner),
                    _ => None,
                }
            }
            Tok::Func(f) => self.call(*f),
            _ => None,
        }
    }

    fn call(&mut self, f: Func) -> Option<Node> {
        self.enter()?;
        let args = if let Some(Tok::LParen) = self.peek() {
            self.pos += 1;
            let mut args = vec![self.expr()?];
            loop {
                match self.bump()? {
                    Tok::Comma => args.push(self.expr()?),
                    Tok::RParen => break,
                    _ => return None,
                }
            }
            args
        } else {
            // `sin x`, `ln 2x` binds to the next power-level operand
            vec![self.power()?]
        };
        self.depth -= 1;
        if args.len() != f.arity() {
            return None;
        }
        Some(Node::Call(f, args))
    }
}
