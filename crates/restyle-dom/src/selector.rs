//! Selector parsing
//!
//! Supports the subset the resolver emits and the recovery strategies
//! rewrite: type selectors, `*`, `#id`, `.class`, `:nth-child(k)`,
//! `:first-child`, `:last-child`, descendant and `>` combinators and
//! comma-separated groups.

use crate::error::SelectorError;

/// Parsed selector (comma-separated groups of compound chains)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub(crate) groups: Vec<Vec<Step>>,
}

/// One compound selector plus the combinator linking it to its left neighbour
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) combinator: Option<Combinator>,
    pub(crate) compound: Compound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) pseudos: Vec<Pseudo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pseudo {
    NthChild(usize),
    FirstChild,
    LastChild,
}

impl Selector {
    /// Parse a selector string
    ///
    /// # Errors
    /// Returns [`SelectorError`] for empty, malformed or unsupported input.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut parser = Parser {
            src: input,
            chars: input.char_indices().collect(),
            pos: 0,
        };
        let mut groups = Vec::new();
        loop {
            groups.push(parser.chain()?);
            parser.skip_ws();
            match parser.peek() {
                None => break,
                Some(',') => parser.pos += 1,
                Some(c) => {
                    return Err(SelectorError::invalid(
                        input,
                        parser.offset(),
                        format!("unexpected '{c}'"),
                    ))
                }
            }
        }
        Ok(Self { groups })
    }

    /// `Some(id)` when the selector is exactly `#id`
    #[must_use]
    pub fn id_only(&self) -> Option<&str> {
        match self.groups.as_slice() {
            [chain] => match chain.as_slice() {
                [Step {
                    compound:
                        Compound {
                            tag: None,
                            id: Some(id),
                            classes,
                            pseudos,
                        },
                    ..
                }] if classes.is_empty() && pseudos.is_empty() => Some(id.as_str()),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Whether `token` can be written as a bare CSS identifier
///
/// Rejects combinator, bracket, colon, slash and percent syntax as well as
/// leading digits, so the token round-trips through [`Selector::parse`].
#[must_use]
pub fn is_simple_identifier(token: &str) -> bool {
    let body = token.strip_prefix('-').unwrap_or(token);
    match body.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    body.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

struct Parser<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.src.len(), |&(i, _)| i)
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, reason: impl Into<String>) -> SelectorError {
        SelectorError::invalid(self.src, self.offset(), reason)
    }

    fn chain(&mut self) -> Result<Vec<Step>, SelectorError> {
        self.skip_ws();
        let mut steps = vec![Step {
            combinator: None,
            compound: self.compound()?,
        }];
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                Some(',') | None => break,
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
            };
            steps.push(Step {
                combinator: Some(combinator),
                compound: self.compound()?,
            });
        }
        Ok(steps)
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut universal = false;
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                universal = true;
            }
            Some(c) if c.is_ascii_alphabetic() => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    let id = self.ident()?;
                    if compound.id.replace(id).is_some() {
                        return Err(self.error("duplicate id in compound selector"));
                    }
                }
                Some('.') => {
                    self.pos += 1;
                    let class = self.ident()?;
                    compound.classes.push(class);
                }
                Some(':') => {
                    self.pos += 1;
                    let pseudo = self.pseudo()?;
                    compound.pseudos.push(pseudo);
                }
                _ => break,
            }
        }
        if !universal && compound == Compound::default() {
            return Err(self.error("expected a compound selector"));
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii())
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected an identifier"));
        }
        Ok(self.chars[start..self.pos].iter().map(|&(_, c)| c).collect())
    }

    fn pseudo(&mut self) -> Result<Pseudo, SelectorError> {
        let name = self.ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => Ok(Pseudo::FirstChild),
            "last-child" => Ok(Pseudo::LastChild),
            "nth-child" => {
                if self.peek() != Some('(') {
                    return Err(self.error("expected '(' after :nth-child"));
                }
                self.pos += 1;
                self.skip_ws();
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
                self.skip_ws();
                if self.peek() != Some(')') {
                    return Err(self.error("expected ')' to close :nth-child"));
                }
                self.pos += 1;
                match digits.parse::<usize>() {
                    Ok(k) if k >= 1 => Ok(Pseudo::NthChild(k)),
                    _ => Err(self.error("nth-child index must be a positive integer")),
                }
            }
            other => Err(SelectorError::UnsupportedPseudo {
                selector: self.src.to_string(),
                pseudo: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structural_path() {
        let sel = Selector::parse("#main > :nth-child(3)").unwrap();
        assert_eq!(sel.groups.len(), 1);
        let chain = &sel.groups[0];
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].compound.id.as_deref(), Some("main"));
        assert_eq!(chain[1].combinator, Some(Combinator::Child));
        assert_eq!(chain[1].compound.pseudos, vec![Pseudo::NthChild(3)]);
    }

    #[test]
    fn parses_descendant_and_groups() {
        let sel = Selector::parse("div.card p, span").unwrap();
        assert_eq!(sel.groups.len(), 2);
        assert_eq!(sel.groups[0][1].combinator, Some(Combinator::Descendant));
        assert_eq!(sel.groups[0][0].compound.classes, vec!["card".to_string()]);
    }

    #[test]
    fn id_only_detection() {
        assert_eq!(Selector::parse("#hero").unwrap().id_only(), Some("hero"));
        assert_eq!(Selector::parse("div#hero").unwrap().id_only(), None);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        assert!(Selector::parse("div..card").is_err());
        assert!(Selector::parse("> p").is_err());
        assert!(Selector::parse("li:nth-child(0)").is_err());
        assert!(matches!(
            Selector::parse("a:hover"),
            Err(SelectorError::UnsupportedPseudo { .. })
        ));
    }

    #[test]
    fn simple_identifiers() {
        assert!(is_simple_identifier("card"));
        assert!(is_simple_identifier("btn-primary_2"));
        assert!(!is_simple_identifier("md:flex"));
        assert!(!is_simple_identifier("w-1/2"));
        assert!(!is_simple_identifier("w-[10px]"));
        assert!(!is_simple_identifier("2col"));
        assert!(!is_simple_identifier("-2col"));
        assert!(!is_simple_identifier(""));
    }
}
