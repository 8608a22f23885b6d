//! Filter string parser
//!
//! Single left-to-right scan with an explicit cursor over the characters of
//! the filter:
//!
//! ```text
//! filter     := '(' filtercomp ')'
//! filtercomp := and | or | not | item
//! and        := '&' filter+
//! or         := '|' filter+
//! not        := '!' filter
//! item       := attr ('=' | '~=' | '>=' | '<=') value
//! ```
//!
//! `\` escapes any character in a value. Whitespace between tokens is
//! skipped, and unescaped whitespace at either edge of a value is stripped.

use super::FilterComponent;
use crate::error::FilterParseError;

/// Parse a complete filter string
pub fn parse(filter: &str) -> Result<FilterComponent, FilterParseError> {
    let mut parser = Parser::new(filter);
    let component = parser.parse_filter()?;
    parser.skip_whitespace();
    if parser.pos != parser.chars.len() {
        return Err(parser.error("extraneous trailing characters"));
    }
    Ok(component)
}

struct Parser<'a> {
    filter: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(filter: &'a str) -> Self {
        Self {
            filter,
            chars: filter.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> FilterParseError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, position: usize, message: &str) -> FilterParseError {
        FilterParseError {
            message: message.to_string(),
            position,
            remainder: self.chars[position.min(self.chars.len())..].iter().collect(),
            filter: self.filter.to_string(),
        }
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse_filter(&mut self) -> Result<FilterComponent, FilterParseError> {
        self.skip_whitespace();
        if self.peek() != Some('(') {
            return Err(self.error("missing '('"));
        }
        self.pos += 1;

        let component = self.parse_filtercomp()?;

        self.skip_whitespace();
        if self.peek() != Some(')') {
            return Err(self.error("missing ')'"));
        }
        self.pos += 1;
        self.skip_whitespace();

        Ok(component)
    }

    fn parse_filtercomp(&mut self) -> Result<FilterComponent, FilterParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some('&') => {
                self.pos += 1;
                Ok(FilterComponent::And(self.parse_filter_list()?))
            }
            Some('|') => {
                self.pos += 1;
                Ok(FilterComponent::Or(self.parse_filter_list()?))
            }
            Some('!') => {
                self.pos += 1;
                Ok(FilterComponent::Not(Box::new(self.parse_filter()?)))
            }
            _ => self.parse_item(),
        }
    }

    fn parse_filter_list(&mut self) -> Result<Vec<FilterComponent>, FilterParseError> {
        self.skip_whitespace();
        let mut children = Vec::new();
        while self.peek() == Some('(') {
            children.push(self.parse_filter()?);
        }
        if children.is_empty() {
            return Err(self.error("missing '(' in filter list"));
        }
        Ok(children)
    }

    fn parse_item(&mut self) -> Result<FilterComponent, FilterParseError> {
        let attr = self.parse_attr()?;

        match (self.peek(), self.peek_at(1)) {
            (Some('~'), Some('=')) => {
                self.pos += 2;
                let value = self.parse_value()?;
                Ok(FilterComponent::Approx { attr, value })
            }
            (Some('>'), Some('=')) => {
                self.pos += 2;
                let value = self.parse_value()?;
                Ok(FilterComponent::Greater { attr, value })
            }
            (Some('<'), Some('=')) => {
                self.pos += 2;
                let value = self.parse_value()?;
                Ok(FilterComponent::Less { attr, value })
            }
            (Some('='), _) => {
                self.pos += 1;
                let mut parts = self.scan_value(true)?;
                if parts.len() == 1 {
                    let value = parts.pop().unwrap_or_default();
                    Ok(FilterComponent::Equal { attr, value })
                } else if parts.len() == 2 && parts.iter().all(String::is_empty) {
                    Ok(FilterComponent::Present { attr })
                } else {
                    Ok(FilterComponent::Substring { attr, parts })
                }
            }
            _ => Err(self.error("missing or invalid operator")),
        }
    }

    fn parse_attr(&mut self) -> Result<String, FilterParseError> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '~' | '<' | '>' | '=' | '(' | ')') {
                break;
            }
            self.pos += 1;
        }

        let attr: String = self.chars[start..self.pos].iter().collect();
        let attr = attr.trim_end();
        if attr.is_empty() {
            return Err(self.error_at(start, "missing attribute name"));
        }
        Ok(attr.to_string())
    }

    fn parse_value(&mut self) -> Result<String, FilterParseError> {
        let mut parts = self.scan_value(false)?;
        Ok(parts.pop().unwrap_or_default())
    }

    /// Scan a value up to the closing `)`, splitting on unescaped `*` when
    /// `wildcards` is set
    fn scan_value(&mut self, wildcards: bool) -> Result<Vec<String>, FilterParseError> {
        self.skip_whitespace();
        let start = self.pos;

        let mut parts = vec![String::new()];
        let mut last_len = 0usize;
        // Characters of the last part that must survive trailing-space trimming
        let mut protected = 0usize;

        loop {
            match self.peek() {
                None => return Err(self.error("missing ')' after value")),
                Some(')') => break,
                Some('(') => return Err(self.error("invalid character '(' in value")),
                Some('\\') => {
                    self.pos += 1;
                    let escaped = self
                        .peek()
                        .ok_or_else(|| self.error("dangling escape at end of filter"))?;
                    self.pos += 1;
                    if let Some(last) = parts.last_mut() {
                        last.push(escaped);
                    }
                    last_len += 1;
                    protected = last_len;
                }
                Some('*') if wildcards => {
                    self.pos += 1;
                    parts.push(String::new());
                    last_len = 0;
                    protected = 0;
                }
                Some(c) => {
                    self.pos += 1;
                    if let Some(last) = parts.last_mut() {
                        last.push(c);
                    }
                    last_len += 1;
                }
            }
        }

        if let Some(last) = parts.last_mut() {
            while last_len > protected && last.ends_with(char::is_whitespace) {
                last.pop();
                last_len -= 1;
            }
        }

        if parts.len() == 1 && parts[0].is_empty() {
            return Err(self.error_at(start, "missing value"));
        }
        Ok(parts)
    }
}
