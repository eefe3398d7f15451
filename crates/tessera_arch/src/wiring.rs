//! The miniature wiring DSL used inside interface implementations.
//!
//! Four production rules: `(bv v w)` for literals, `(bit i e)` for
//! single-bit projection, `(concat e ...)` for concatenation, and a bare
//! `name` for a symbol resolved against the caller's bindings.

use crate::error::ArchError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tessera_ir::Expr;

/// A parsed wiring-DSL expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireExpr {
    /// A literal bit-vector `(bv value width)`.
    Bv {
        /// The literal value.
        value: u64,
        /// The literal width in bits.
        width: u32,
    },
    /// A single-bit projection `(bit index expr)`.
    Bit {
        /// The bit index, counted from the least significant bit.
        index: u32,
        /// The operand.
        expr: Box<WireExpr>,
    },
    /// A concatenation `(concat e ...)`, first operand most significant.
    Concat(Vec<WireExpr>),
    /// A symbol resolved against the port map or internal-state map.
    Sym(String),
}

impl WireExpr {
    /// Evaluates against a binding map, producing an IR expression.
    ///
    /// Symbols are looked up in `bindings`; an absent symbol is fatal and
    /// names the symbol.
    pub fn eval(&self, bindings: &IndexMap<String, Expr>) -> Result<Expr, ArchError> {
        match self {
            WireExpr::Bv { value, width } => Ok(Expr::constant_u64(*value, *width)),
            WireExpr::Bit { index, expr } => Ok(Expr::bit(*index, expr.eval(bindings)?)?),
            WireExpr::Concat(parts) => {
                let parts = parts
                    .iter()
                    .map(|p| p.eval(bindings))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expr::concat(parts)?)
            }
            WireExpr::Sym(name) => bindings
                .get(name)
                .cloned()
                .ok_or_else(|| ArchError::UnresolvedSymbol(name.clone())),
        }
    }

    /// Computes the static width given the widths of referenced symbols.
    pub fn width(&self, symbol_width: &impl Fn(&str) -> Option<u32>) -> Result<u32, ArchError> {
        match self {
            WireExpr::Bv { width, .. } => Ok(*width),
            WireExpr::Bit { .. } => Ok(1),
            WireExpr::Concat(parts) => parts
                .iter()
                .map(|p| p.width(symbol_width))
                .try_fold(0u32, |acc, w| Ok(acc + w?)),
            WireExpr::Sym(name) => {
                symbol_width(name).ok_or_else(|| ArchError::UnresolvedSymbol(name.clone()))
            }
        }
    }

    /// Collects every symbol referenced by this expression.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            WireExpr::Bv { .. } => {}
            WireExpr::Bit { expr, .. } => expr.collect_symbols(out),
            WireExpr::Concat(parts) => {
                for p in parts {
                    p.collect_symbols(out);
                }
            }
            WireExpr::Sym(name) => out.push(name),
        }
    }
}

/// Parses a wiring-DSL expression from its surface form.
pub fn parse_wire_expr(text: &str) -> Result<WireExpr, ArchError> {
    let tokens = tokenize(text);
    let mut pos = 0;
    let expr = parse(text, &tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(err(text, "trailing input after expression"));
    }
    Ok(expr)
}

#[derive(Debug, PartialEq)]
enum Token {
    Open,
    Close,
    Atom(String),
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut atom = String::new();
    for c in text.chars() {
        match c {
            '(' | ')' => {
                if !atom.is_empty() {
                    tokens.push(Token::Atom(std::mem::take(&mut atom)));
                }
                tokens.push(if c == '(' { Token::Open } else { Token::Close });
            }
            c if c.is_whitespace() => {
                if !atom.is_empty() {
                    tokens.push(Token::Atom(std::mem::take(&mut atom)));
                }
            }
            c => atom.push(c),
        }
    }
    if !atom.is_empty() {
        tokens.push(Token::Atom(atom));
    }
    tokens
}

fn err(text: &str, message: impl Into<String>) -> ArchError {
    ArchError::WiringParse {
        text: text.to_string(),
        message: message.into(),
    }
}

fn parse(text: &str, tokens: &[Token], pos: &mut usize) -> Result<WireExpr, ArchError> {
    match tokens.get(*pos) {
        None => Err(err(text, "unexpected end of input")),
        Some(Token::Close) => Err(err(text, "unexpected ')'")),
        Some(Token::Atom(a)) => {
            *pos += 1;
            Ok(WireExpr::Sym(a.clone()))
        }
        Some(Token::Open) => {
            *pos += 1;
            let head = match tokens.get(*pos) {
                Some(Token::Atom(a)) => a.clone(),
                _ => return Err(err(text, "expected an operator after '('")),
            };
            *pos += 1;
            let expr = match head.as_str() {
                "bv" => {
                    let value = expect_int(text, tokens, pos, "bv value")?;
                    let width = expect_int(text, tokens, pos, "bv width")? as u32;
                    WireExpr::Bv { value, width }
                }
                "bit" => {
                    let index = expect_int(text, tokens, pos, "bit index")? as u32;
                    let expr = parse(text, tokens, pos)?;
                    WireExpr::Bit {
                        index,
                        expr: Box::new(expr),
                    }
                }
                "concat" => {
                    let mut parts = Vec::new();
                    while !matches!(tokens.get(*pos), Some(Token::Close) | None) {
                        parts.push(parse(text, tokens, pos)?);
                    }
                    if parts.is_empty() {
                        return Err(err(text, "concat requires at least one operand"));
                    }
                    WireExpr::Concat(parts)
                }
                other => return Err(err(text, format!("unknown operator {other:?}"))),
            };
            match tokens.get(*pos) {
                Some(Token::Close) => {
                    *pos += 1;
                    Ok(expr)
                }
                _ => Err(err(text, format!("expected ')' closing {head:?}"))),
            }
        }
    }
}

fn expect_int(text: &str, tokens: &[Token], pos: &mut usize, what: &str) -> Result<u64, ArchError> {
    match tokens.get(*pos) {
        Some(Token::Atom(a)) => {
            let v = a
                .parse::<u64>()
                .map_err(|_| err(text, format!("{what} must be an integer, got {a:?}")))?;
            *pos += 1;
            Ok(v)
        }
        _ => Err(err(text, format!("expected an integer for {what}"))),
    }
}
