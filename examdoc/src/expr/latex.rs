//! LaTeX to plain arithmetic expression conversion.
//!
//! Graph functions are authored in the math editor, so their expressions
//! arrive as LaTeX (`\frac{1}{2}x^{2}`). This module rewrites the small
//! subset the graph engine understands into an infix expression that
//! [`compile_expression`](super::compile::compile_expression) can parse.

use crate::geometry::limits::MAX_EXPRESSION_DEPTH;

/// Commands rewritten to a bare function identifier.
const FUNCTION_COMMANDS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "arcsin", "arccos", "arctan", "abs", "exp", "ln",
    "log",
];

/// Commands whose single group argument is unwrapped without parentheses.
const UNWRAP_COMMANDS: &[&str] = &["mathrm", "text", "operatorname", "mathit", "textrm"];

/// True when the input carries any LaTeX structure.
pub fn has_latex_markers(src: &str) -> bool {
    src.contains(['\\', '{', '}'])
}

/// Prepare an authored graph expression for compilation.
///
/// Strips math delimiters and a leading `y =` / `f(x) =` assignment, maps
/// unicode operators to ASCII, and runs the LaTeX conversion when needed.
pub fn normalize_graph_expression(latex: &str) -> String {
    let mut s = latex.trim().trim_matches('$').trim().to_string();
    for (from, to) in [
        ('\u{2212}', "-"),
        ('\u{00d7}', "*"),
        ('\u{22c5}', "*"),
        ('\u{00b7}', "*"),
        ('\u{00f7}', "/"),
        ('\u{03c0}', "pi"),
    ] {
        if s.contains(from) {
            s = s.replace(from, to);
        }
    }
    if let Some(rhs) = strip_assignment(&s) {
        s = rhs.to_string();
    }
    if has_latex_markers(&s) {
        convert_latex_to_expression(&s)
    } else {
        s
    }
}

// `y=`, `f(x)=`, `g\left(x\right)=` style prefixes
fn strip_assignment(s: &str) -> Option<&str> {
    let (lhs, rhs) = s.split_once('=')?;
    let lhs: String = lhs
        .replace("\\left", "")
        .replace("\\right", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let mut chars = lhs.chars();
    let name = chars.next()?;
    let rest: String = chars.collect();
    if name.is_ascii_alphabetic() && (rest.is_empty() || rest == "(x)") {
        Some(rhs.trim())
    } else {
        None
    }
}

/// Rewrite a LaTeX fragment into an infix arithmetic expression.
///
/// Input without any LaTeX marker is returned unchanged. On unbalanced
/// braces the conversion stops and returns what it produced so far.
pub fn convert_latex_to_expression(latex: &str) -> String {
    if !has_latex_markers(latex) {
        return latex.to_string();
    }
    let chars: Vec<char> = latex.chars().collect();
    let mut scan = Scan { out: String::with_capacity(latex.len()), halted: false };
    scan.convert(&chars, 0);
    scan.out
}

struct Scan {
    out: String,
    halted: bool,
}

impl Scan {
    fn convert(&mut self, src: &[char], depth: usize) {
        if depth > MAX_EXPRESSION_DEPTH {
            self.halted = true;
            return;
        }
        let mut i = 0usize;
        while i < src.len() && !self.halted {
            let c = src[i];
            match c {
                c if c.is_whitespace() => i += 1,
                '\\' => i = self.command(src, i + 1, depth),
                '{' => match read_group(src, i) {
                    Some((inner, next)) => {
                        self.out.push('(');
                        self.convert(inner, depth + 1);
                        self.out.push(')');
                        i = next;
                    }
                    None => self.halted = true,
                },
                '}' => self.halted = true,
                '^' => {
                    let j = skip_ws(src, i + 1);
                    if src.get(j) == Some(&'{') {
                        match read_group(src, j) {
                            Some((inner, next)) => {
                                self.out.push_str("^(");
                                self.convert(inner, depth + 1);
                                self.out.push(')');
                                i = next;
                            }
                            None => self.halted = true,
                        }
                    } else {
                        self.out.push('^');
                        i += 1;
                    }
                }
                _ => {
                    self.out.push(c);
                    i += 1;
                }
            }
        }
    }

    /// Handle the command starting right after a backslash at `start`.
    /// Returns the index to continue scanning from.
    fn command(&mut self, src: &[char], start: usize, depth: usize) -> usize {
        let mut end = start;
        while end < src.len() && src[end].is_ascii_alphabetic() {
            end += 1;
        }
        if end == start {
            // spacing (`\,`, `\;`, `\ `) or an escaped brace
            return match src.get(start) {
                Some('{') => {
                    self.out.push('(');
                    start + 1
                }
                Some('}') => {
                    self.out.push(')');
                    start + 1
                }
                Some(_) => start + 1,
                None => start,
            };
        }
        let name: String = src[start..end].iter().collect();
        match name.as_str() {
            "frac" | "dfrac" | "tfrac" => {
                let Some((num, after_num)) = read_group(src, skip_ws(src, end)) else {
                    self.halted = true;
                    return src.len();
                };
                let Some((den, after_den)) = read_group(src, skip_ws(src, after_num)) else {
                    self.halted = true;
                    return src.len();
                };
                self.out.push('(');
                self.convert(num, depth + 1);
                self.out.push_str(")/(");
                self.convert(den, depth + 1);
                self.out.push(')');
                after_den
            }
            "sqrt" => self.sqrt(src, end, depth),
            "left" | "right" => {
                // `\left.` is an invisible delimiter
                let j = skip_ws(src, end);
                if src.get(j) == Some(&'.') {
                    j + 1
                } else {
                    end
                }
            }
            "cdot" | "times" | "ast" => {
                self.out.push('*');
                end
            }
            "div" => {
                self.out.push('/');
                end
            }
            "pi" => {
                self.out.push_str("pi");
                end
            }
            n if UNWRAP_COMMANDS.contains(&n) => match read_group(src, skip_ws(src, end)) {
                Some((inner, next)) => {
                    self.convert(inner, depth + 1);
                    next
                }
                None => end,
            },
            n if FUNCTION_COMMANDS.contains(&n) => {
                let ident = match n {
                    "arcsin" => "asin",
                    "arccos" => "acos",
                    "arctan" => "atan",
                    other => other,
                };
                self.out.push_str(ident);
                end
            }
            other => {
                // Unknown commands pass through as identifiers; the compiler
                // rejects the ones it cannot evaluate.
                self.out.push_str(other);
                end
            }
        }
    }

    // `\sqrt{a}` -> `sqrt(a)`, `\sqrt[n]{a}` -> `(a)^(1/(n))`
    fn sqrt(&mut self, src: &[char], end: usize, depth: usize) -> usize {
        let mut j = skip_ws(src, end);
        let mut index: Option<&[char]> = None;
        if src.get(j) == Some(&'[') {
            match src[j + 1..].iter().position(|&c| c == ']') {
                Some(off) => {
                    index = Some(&src[j + 1..j + 1 + off]);
                    j = skip_ws(src, j + 2 + off);
                }
                None => {
                    self.halted = true;
                    return src.len();
                }
            }
        }
        if src.get(j) != Some(&'{') {
            self.out.push_str("sqrt");
            return j;
        }
        let Some((inner, next)) = read_group(src, j) else {
            self.halted = true;
            return src.len();
        };
        match index {
            Some(n) => {
                self.out.push('(');
                self.convert(inner, depth + 1);
                self.out.push_str(")^(1/(");
                self.convert(n, depth + 1);
                self.out.push_str("))");
            }
            None => {
                self.out.push_str("sqrt(");
                self.convert(inner, depth + 1);
                self.out.push(')');
            }
        }
        next
    }
}

fn skip_ws(src: &[char], mut i: usize) -> usize {
    while i < src.len() && src[i].is_whitespace() {
        i += 1;
    }
    i
}

/// Read the brace group opening at `open`. Returns the inner slice and the
/// index after the matching `}`; `None` when `open` is not a `{` or the group
/// never closes.
fn read_group(src: &[char], open: usize) -> Option<(&[char], usize)> {
    if src.get(open) != Some(&'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < src.len() {
        match src[i] {
            '\\' => {
                // escaped braces do not count
                i += 2;
                continue;
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&src[open + 1..i], i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
