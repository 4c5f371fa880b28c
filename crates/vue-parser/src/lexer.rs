//! Byte-level scanner for component files.

use source_map::Span;

/// A scanner over the raw text of a component file.
pub struct SfcLexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> SfcLexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Get the current position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the remaining source.
    pub fn remaining(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// Peek at the next character.
    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Consume and return the next character.
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace and return the number of bytes skipped.
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        self.consume_while(char::is_whitespace);
        self.pos - start
    }

    /// Check if the remaining source starts with the given string.
    pub fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    /// Consume a string if the remaining source starts with it.
    pub fn consume(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate is true.
    pub fn consume_while<F>(&mut self, pred: F) -> &'a str
    where
        F: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if pred(c) {
                self.next_char();
            } else {
                break;
            }
        }
        &self.source[start..self.pos]
    }

    /// Consume until the given string is found (or the end of input).
    pub fn consume_until(&mut self, s: &str) -> &'a str {
        let start = self.pos;
        let end = self
            .remaining()
            .find(s)
            .map_or(self.source.len(), |i| self.pos + i);
        self.pos = end;
        &self.source[start..end]
    }

    /// Read a tag name.
    pub fn read_tag_name(&mut self) -> Option<&'a str> {
        let start = self.pos;
        match self.peek_char() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                self.next_char();
            }
            _ => return None,
        }
        self.consume_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':');
        Some(&self.source[start..self.pos])
    }

    /// Read an attribute name.
    pub fn read_attr_name(&mut self) -> Option<&'a str> {
        let name = self.consume_while(|c| {
            !c.is_whitespace() && c != '=' && c != '>' && c != '/' && c != '"' && c != '\''
        });
        (!name.is_empty()).then_some(name)
    }

    /// Read a quoted string value. The flag is false when the closing quote
    /// is missing.
    pub fn read_quoted_string(&mut self) -> Option<(&'a str, bool)> {
        let quote = self.peek_char()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        self.next_char();
        let start = self.pos;
        match self.remaining().find(quote) {
            Some(i) => {
                self.pos += i;
                let value = &self.source[start..self.pos];
                self.next_char();
                Some((value, true))
            }
            None => {
                self.pos = self.source.len();
                Some((&self.source[start..], false))
            }
        }
    }

    /// Read an unquoted attribute value.
    pub fn read_unquoted_value(&mut self) -> &'a str {
        self.consume_while(|c| !c.is_whitespace() && c != '>')
    }

    /// Read a comment. The flag is false when `-->` is missing.
    pub fn read_comment(&mut self) -> Option<(&'a str, bool)> {
        if !self.consume("<!--") {
            return None;
        }
        let content = self.consume_until("-->");
        let terminated = self.consume("-->");
        Some((content, terminated))
    }

    /// Check whether a closing tag for `tag` starts here.
    fn at_close_tag(&self, tag: &str) -> bool {
        let rest = self.remaining();
        if !rest.starts_with("</") {
            return false;
        }
        let after = &rest[2..];
        after
            .get(..tag.len())
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
            && matches!(
                after[tag.len()..].chars().next(),
                Some('>' | ' ' | '\t' | '\n' | '\r') | None
            )
    }

    /// Check whether an opening tag for `tag` starts here.
    fn at_open_tag(&self, tag: &str) -> bool {
        let rest = self.remaining();
        if !rest.starts_with('<') {
            return false;
        }
        let after = &rest[1..];
        after
            .get(..tag.len())
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
            && matches!(
                after[tag.len()..].chars().next(),
                Some('>' | '/' | ' ' | '\t' | '\n' | '\r')
            )
    }

    /// Read raw block content up to the closing tag. The flag is false when
    /// the input ended first; the content then runs to the end of input.
    pub fn read_block_content(&mut self, closing_tag: &str) -> (&'a str, bool) {
        let start = self.pos;
        while !self.is_eof() {
            if self.at_close_tag(closing_tag) {
                return (&self.source[start..self.pos], true);
            }
            self.next_char();
        }
        (&self.source[start..], false)
    }

    /// Read template content, letting nested `<template>` elements balance
    /// their own closing tags.
    pub fn read_template_content(&mut self) -> (&'a str, bool) {
        let start = self.pos;
        let mut depth = 0usize;
        while !self.is_eof() {
            if self.starts_with("<!--") {
                self.read_comment();
                continue;
            }
            if self.at_close_tag("template") {
                if depth == 0 {
                    return (&self.source[start..self.pos], true);
                }
                depth -= 1;
            } else if self.at_open_tag("template") {
                let tag_end = self.remaining().find('>');
                let self_closing = tag_end
                    .map(|i| self.remaining()[..i].ends_with('/'))
                    .unwrap_or(false);
                if !self_closing {
                    depth += 1;
                }
            }
            self.next_char();
        }
        (&self.source[start..], false)
    }

    /// Check if at end of input.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Get a span from start to current position.
    pub fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }
}
