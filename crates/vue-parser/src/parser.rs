//! Section splitter for component files.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::SfcLexer;
use source_map::Span;

/// Split a component file into its top-level sections.
///
/// Splitting is best-effort: unterminated tags and blocks still produce
/// ranges, and every problem is recorded in [`Sections::errors`].
pub fn split_sections(source: &str) -> Sections {
    let mut parser = SfcParser::new(source);
    parser.parse();
    parser.sections
}

/// Parser for component files.
struct SfcParser<'a> {
    lexer: SfcLexer<'a>,
    sections: Sections,
}

/// What the opening tag of a block looked like.
struct OpenTag {
    name: String,
    attrs: Vec<BlockAttr>,
    self_closing: bool,
}

impl<'a> SfcParser<'a> {
    /// Create a new parser for the given source.
    fn new(source: &'a str) -> Self {
        Self {
            lexer: SfcLexer::new(source),
            sections: Sections::new(source.len() as u32),
        }
    }

    fn parse(&mut self) {
        while !self.lexer.is_eof() {
            self.lexer.skip_whitespace();

            if self.lexer.is_eof() {
                break;
            }

            if self.lexer.starts_with("<!--") {
                self.parse_comment();
                continue;
            }

            if self.lexer.starts_with("<") && !self.lexer.starts_with("</") {
                let before = self.lexer.pos();
                self.parse_block();
                if self.lexer.pos() == before {
                    self.lexer.next_char();
                }
                continue;
            }

            // Stray text and closing tags at the root are ignored.
            self.lexer.next_char();
        }
    }

    fn parse_comment(&mut self) {
        let start = self.lexer.pos();
        if let Some((_, terminated)) = self.lexer.read_comment() {
            let span = self.lexer.span_from(start);
            if !terminated {
                self.sections
                    .errors
                    .push(ParseError::unterminated_comment(span));
            }
            self.sections.comments.push(Comment { span });
        }
    }

    /// Read `<name attrs...>` or `<name attrs.../>`.
    fn parse_open_tag(&mut self) -> Option<OpenTag> {
        let start = self.lexer.pos();
        if !self.lexer.consume("<") {
            return None;
        }
        let Some(name) = self.lexer.read_tag_name() else {
            return None;
        };
        let name = name.to_lowercase();
        let attrs = self.parse_attributes();
        self.lexer.skip_whitespace();

        let self_closing = self.lexer.consume("/>");
        if !self_closing && !self.lexer.consume(">") {
            let span = self.lexer.span_from(start);
            self.sections
                .errors
                .push(ParseError::unterminated_tag(&name, span));
        }
        Some(OpenTag {
            name,
            attrs,
            self_closing,
        })
    }

    fn parse_block(&mut self) {
        let start = self.lexer.pos();
        let Some(tag) = self.parse_open_tag() else {
            return;
        };
        let open_span = self.lexer.span_from(start);

        let (content_span, closed) = if tag.self_closing {
            (Span::empty(self.lexer.pos() as u32), true)
        } else {
            let content_start = self.lexer.pos();
            let (_, closed) = if tag.name == "template" {
                self.lexer.read_template_content()
            } else {
                self.lexer.read_block_content(&tag.name)
            };
            (self.lexer.span_from(content_start), closed)
        };

        if !tag.self_closing {
            if closed {
                self.lexer.consume_until(">");
                self.lexer.consume(">");
            } else {
                self.sections
                    .errors
                    .push(ParseError::unclosed_block(&tag.name, open_span));
            }
        }

        let span = self.lexer.span_from(start);
        let block = SfcBlock {
            span,
            content_span,
            attrs: tag.attrs,
            closed,
        };
        self.attach_block(tag.name, block);
    }

    fn attach_block(&mut self, name: String, block: SfcBlock) {
        let lang = block.get_attr("lang").map(String::from);
        match name.as_str() {
            "template" => {
                if self.sections.template.is_some() {
                    self.sections
                        .errors
                        .push(ParseError::duplicate_block("template", block.span));
                } else {
                    self.sections.template = Some(TemplateBlock { block, lang });
                }
            }
            "script" => {
                if self.sections.script.is_some() {
                    self.sections
                        .errors
                        .push(ParseError::duplicate_block("script", block.span));
                } else {
                    let src = block.get_attr("src").map(String::from);
                    self.sections.script = Some(ScriptBlock { block, lang, src });
                }
            }
            "style" => {
                let scoped = block.has_attr("scoped");
                self.sections.styles.push(StyleBlock {
                    block,
                    lang,
                    scoped,
                });
            }
            _ => {
                self.sections.custom_blocks.push(CustomBlock {
                    block,
                    block_type: name.into(),
                });
            }
        }
    }

    /// Parse attributes of a tag.
    fn parse_attributes(&mut self) -> Vec<BlockAttr> {
        let mut attrs = Vec::new();

        loop {
            self.lexer.skip_whitespace();

            if self.lexer.starts_with(">") || self.lexer.starts_with("/>") || self.lexer.is_eof() {
                break;
            }
            // A new tag before `>` means this one was never terminated.
            if self.lexer.starts_with("<") {
                break;
            }

            let attr_start = self.lexer.pos();
            let name = match self.lexer.read_attr_name() {
                Some(n) => n,
                None => {
                    self.lexer.next_char();
                    continue;
                }
            };

            self.lexer.skip_whitespace();

            if self.lexer.consume("=") {
                self.lexer.skip_whitespace();
                let value_start = self.lexer.pos();
                let (value, value_span) = match self.lexer.read_quoted_string() {
                    Some((v, terminated)) => {
                        let end = if terminated {
                            self.lexer.pos() - 1
                        } else {
                            self.lexer.pos()
                        };
                        (v, Span::new(value_start as u32 + 1, end as u32))
                    }
                    None => {
                        let v = self.lexer.read_unquoted_value();
                        (v, self.lexer.span_from(value_start))
                    }
                };
                let span = self.lexer.span_from(attr_start);
                attrs.push(BlockAttr::with_value(name, value, span, value_span));
            } else {
                let span = self.lexer.span_from(attr_start);
                attrs.push(BlockAttr::boolean(name, span));
            }
        }

        attrs
    }
}
