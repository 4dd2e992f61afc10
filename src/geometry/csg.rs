use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Surface;

//=====================================================================
// Constructive solid geometry expressions.
//
// A region is written as a sequence of tokens: signed surface ids
// (half-spaces), ':' for union, '~' or '#' for the complement of the
// following term, and parentheses for grouping. Adjacent terms are
// intersected. Precedence is complement > intersection > union, and
// operators of equal precedence group left to right.
//=====================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CsgToken {
    Halfspace(i64),
    Union,
    Complement,
    LeftParen,
    RightParen,
}

impl fmt::Display for CsgToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsgToken::Halfspace(id) if *id > 0 => write!(f, "+{}", id),
            CsgToken::Halfspace(id) => write!(f, "{}", id),
            CsgToken::Union => write!(f, ":"),
            CsgToken::Complement => write!(f, "~"),
            CsgToken::LeftParen => write!(f, "("),
            CsgToken::RightParen => write!(f, ")"),
        }
    }
}

// Parse failure at a token position (character position while tokenizing)
#[derive(Debug, Clone, PartialEq)]
pub struct CsgError {
    pub position: usize,
    pub message: String,
}

impl CsgError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self { position, message: message.into() }
    }
}

impl CsgToken {
    // Split a region string such as "-1 2 : (3 -4) ~(5 -6)" into tokens
    pub fn tokenize(expression: &str) -> Result<Vec<CsgToken>, CsgError> {
        let chars: Vec<char> = expression.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match c {
                c if c.is_whitespace() => {}
                ':' => tokens.push(CsgToken::Union),
                '~' | '#' => tokens.push(CsgToken::Complement),
                '(' => tokens.push(CsgToken::LeftParen),
                ')' => tokens.push(CsgToken::RightParen),
                '+' | '-' | '0'..='9' => {
                    let start = i;
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    let text: String = chars[start..i].iter().collect();
                    let id: i64 = text
                        .parse()
                        .map_err(|_| CsgError::new(start, format!("'{}' is not a signed surface id", text)))?;
                    if id == 0 {
                        return Err(CsgError::new(start, "surface id 0 has no sign"));
                    }
                    tokens.push(CsgToken::Halfspace(id));
                    continue;
                }
                other => return Err(CsgError::new(i, format!("unexpected character '{}'", other))),
            }
            i += 1;
        }
        Ok(tokens)
    }
}

// Parsed expression tree. Half-spaces hold dense surface indices.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Halfspace { surface: usize, positive: bool },
    Intersection(Vec<Region>),
    Union(Vec<Region>),
    Complement(Box<Region>),
}

impl Default for Region {
    // The empty intersection, which is all of space
    fn default() -> Self {
        Region::Intersection(Vec::new())
    }
}

impl Region {
    // Build the tree from tokens. `resolve` maps a surface id onto its
    // dense index; an unknown id is reported as UnknownSurface by the caller.
    pub fn parse<F>(tokens: &[CsgToken], resolve: F) -> Result<Region, RegionParseError>
    where
        F: Fn(u32) -> Option<usize>,
    {
        if tokens.is_empty() {
            return Ok(Region::default());
        }
        let mut parser = Parser { tokens, position: 0, resolve };
        let region = parser.union()?;
        if parser.position < tokens.len() {
            return Err(RegionParseError::Malformed(CsgError::new(
                parser.position,
                format!("unexpected '{}'", tokens[parser.position]),
            )));
        }
        Ok(region)
    }

    // Evaluate the expression at a point. `crossed` is the surface the point
    // has just been moved across, whose sense follows the direction.
    pub fn contains(&self, p: &[f64; 3], u: &[f64; 3], surfaces: &[Surface], crossed: Option<usize>) -> bool {
        match self {
            Region::Halfspace { surface, positive } => {
                surfaces[*surface].sense(p, u, crossed == Some(*surface)) == *positive
            }
            Region::Intersection(terms) => terms.iter().all(|term| term.contains(p, u, surfaces, crossed)),
            Region::Union(terms) => terms.iter().any(|term| term.contains(p, u, surfaces, crossed)),
            Region::Complement(term) => !term.contains(p, u, surfaces, crossed),
        }
    }

    // Every surface index referenced, without duplicates, in first-seen order
    pub fn surfaces(&self) -> Vec<usize> {
        let mut found = Vec::new();
        self.collect_surfaces(&mut found);
        found
    }

    fn collect_surfaces(&self, found: &mut Vec<usize>) {
        match self {
            Region::Halfspace { surface, .. } => {
                if !found.contains(surface) {
                    found.push(*surface);
                }
            }
            Region::Intersection(terms) | Region::Union(terms) => {
                terms.iter().for_each(|term| term.collect_surfaces(found))
            }
            Region::Complement(term) => term.collect_surfaces(found),
        }
    }

    // True for a plain intersection of half-spaces
    pub fn is_simple(&self) -> bool {
        match self {
            Region::Halfspace { .. } => true,
            Region::Intersection(terms) => terms.iter().all(|term| matches!(term, Region::Halfspace { .. })),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegionParseError {
    Malformed(CsgError),
    UnknownSurface(u32),
}

// Recursive descent over the grammar
//   union        := intersection (':' intersection)*
//   intersection := factor factor*
//   factor       := halfspace | '(' union ')' | '~' factor
struct Parser<'a, F> {
    tokens: &'a [CsgToken],
    position: usize,
    resolve: F,
}

impl<F> Parser<'_, F>
where
    F: Fn(u32) -> Option<usize>,
{
    fn peek(&self) -> Option<CsgToken> {
        self.tokens.get(self.position).copied()
    }

    fn malformed(&self, message: impl Into<String>) -> RegionParseError {
        RegionParseError::Malformed(CsgError::new(self.position, message))
    }

    fn union(&mut self) -> Result<Region, RegionParseError> {
        let mut terms = vec![self.intersection()?];
        while self.peek() == Some(CsgToken::Union) {
            self.position += 1;
            terms.push(self.intersection()?);
        }
        Ok(if terms.len() == 1 { terms.remove(0) } else { Region::Union(terms) })
    }

    fn intersection(&mut self) -> Result<Region, RegionParseError> {
        let mut terms = vec![self.factor()?];
        while matches!(
            self.peek(),
            Some(CsgToken::Halfspace(_) | CsgToken::LeftParen | CsgToken::Complement)
        ) {
            terms.push(self.factor()?);
        }
        Ok(if terms.len() == 1 { terms.remove(0) } else { Region::Intersection(terms) })
    }

    fn factor(&mut self) -> Result<Region, RegionParseError> {
        match self.peek() {
            Some(CsgToken::Halfspace(signed)) => {
                let id = u32::try_from(signed.unsigned_abs())
                    .map_err(|_| self.malformed(format!("surface id {} is out of range", signed)))?;
                let surface = (self.resolve)(id).ok_or(RegionParseError::UnknownSurface(id))?;
                self.position += 1;
                Ok(Region::Halfspace { surface, positive: signed > 0 })
            }
            Some(CsgToken::Complement) => {
                self.position += 1;
                if self.peek().is_none() {
                    return Err(self.malformed("complement operator at end of expression"));
                }
                Ok(Region::Complement(Box::new(self.factor()?)))
            }
            Some(CsgToken::LeftParen) => {
                self.position += 1;
                if self.peek() == Some(CsgToken::RightParen) {
                    return Err(self.malformed("empty parentheses"));
                }
                let inner = self.union()?;
                if self.peek() != Some(CsgToken::RightParen) {
                    return Err(self.malformed("unmatched '('"));
                }
                self.position += 1;
                Ok(inner)
            }
            Some(CsgToken::Union) => Err(self.malformed("union operator without a left operand")),
            Some(CsgToken::RightParen) => Err(self.malformed("unmatched ')'")),
            None => Err(self.malformed("expression ends where a term was expected")),
        }
    }
}
