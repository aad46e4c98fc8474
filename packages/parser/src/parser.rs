use crate::ast::*;
use crate::error::ParseError;
use crate::tokenizer::{tokenize, Position, Positioned, Token};

type PResult<T> = Result<T, ParseError>;

/// Recursive-descent parser for the .ui language.
///
/// Errors are collected, not thrown: a malformed statement is reported and
/// the parser skips to the next statement boundary (`;` or the matching `}`)
/// so every sibling after the failure still parses.
pub struct Parser<'src> {
    tokens: Vec<Positioned<'src>>,
    pos: usize,
    errors: Vec<ParseError>,
}

/// Parse source text into a structure-preserving AST plus every diagnostic
/// collected along the way.
pub fn parse_ast(source: &str) -> (DocumentNode, Vec<ParseError>) {
    let mut parser = Parser::new(source);
    let doc = parser.parse_document();
    (doc, parser.errors)
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            tokens: tokenize(source),
            pos: 0,
            errors: Vec::new(),
        }
    }

    pub fn parse_document(&mut self) -> DocumentNode {
        let mut items: Vec<DocumentItem> = Vec::new();
        let mut pending: Vec<(String, bool, Position)> = Vec::new();
        let mut seen_construct = false;
        let mut element_index = 0usize;

        while !self.is_at_end() {
            match self.peek_token() {
                Some(Token::LineComment(text)) => {
                    let text = text.to_string();
                    let position = self.current_position();
                    pending.push((text, false, position));
                    self.advance();
                }
                Some(Token::BlockComment(text)) => {
                    let text = text.to_string();
                    let position = self.current_position();
                    pending.push((text, true, position));
                    self.advance();
                }
                Some(Token::Dollar) if self.is_import_ahead() => {
                    match self.parse_import() {
                        Ok(import) => {
                            let attachment = CommentAttachment::Import {
                                alias: import.alias.clone(),
                            };
                            Self::flush_comments(
                                &mut items,
                                &mut pending,
                                seen_construct,
                                attachment,
                            );
                            seen_construct = true;
                            items.push(DocumentItem::Import(import));
                        }
                        Err(e) => self.recover(e),
                    }
                }
                Some(Token::At) if self.is_style_definition_ahead() => {
                    match self.parse_style_definition() {
                        Ok(style) => {
                            let attachment = CommentAttachment::Style {
                                name: style.name.clone(),
                            };
                            Self::flush_comments(
                                &mut items,
                                &mut pending,
                                seen_construct,
                                attachment,
                            );
                            seen_construct = true;
                            items.push(DocumentItem::Style(style));
                        }
                        Err(e) => self.recover(e),
                    }
                }
                Some(Token::Ident(_))
                | Some(Token::At)
                | Some(Token::Dollar)
                | Some(Token::Hash)
                | Some(Token::Color(_)) => match self.parse_any_element() {
                    Ok(element) => {
                        // Tolerate a formatter-emitted `;` after the block
                        self.match_symbol(&Token::Semicolon);
                        let attachment = CommentAttachment::Element {
                            index: element_index,
                        };
                        Self::flush_comments(&mut items, &mut pending, seen_construct, attachment);
                        seen_construct = true;
                        element_index += 1;
                        items.push(DocumentItem::Element(element));
                    }
                    Err(e) => self.recover(e),
                },
                Some(Token::Error(message)) => {
                    let message = message.clone();
                    let position = self.current_position();
                    self.errors.push(ParseError::new(position, message));
                    self.advance();
                }
                Some(other) => {
                    let message = format!("unexpected {}", other);
                    let position = self.current_position();
                    self.errors.push(ParseError::new(position, message));
                    self.synchronize();
                }
                None => break,
            }
        }

        // Whatever comments remain trail the last construct
        for (text, block, position) in pending.drain(..) {
            items.push(DocumentItem::Comment(CommentNode {
                text,
                block,
                attachment: CommentAttachment::FileFooter,
                position,
            }));
        }

        DocumentNode { items }
    }

    fn flush_comments(
        items: &mut Vec<DocumentItem>,
        pending: &mut Vec<(String, bool, Position)>,
        seen_construct: bool,
        attachment: CommentAttachment,
    ) {
        for (text, block, position) in pending.drain(..) {
            let attachment = if seen_construct {
                attachment.clone()
            } else {
                CommentAttachment::FileHeader
            };
            items.push(DocumentItem::Comment(CommentNode {
                text,
                block,
                attachment,
                position,
            }));
        }
    }

    /// `$Alias = "path";`, as opposed to a `$Alias.@Name {...}` element.
    fn is_import_ahead(&self) -> bool {
        matches!(self.peek_ahead(1), Some(Token::Ident(_)))
            && matches!(self.peek_ahead(2), Some(Token::Equals))
    }

    /// `@Name = ...;`, as opposed to a `@Name #Id {...}` element.
    fn is_style_definition_ahead(&self) -> bool {
        matches!(self.peek_ahead(1), Some(Token::Ident(_)))
            && matches!(self.peek_ahead(2), Some(Token::Equals))
    }

    fn parse_import(&mut self) -> PResult<ImportNode> {
        let position = self.current_position();
        self.expect_symbol(Token::Dollar)?;
        let (alias, _) = self.expect_ident()?;
        self.expect_symbol(Token::Equals)?;
        let path = self.expect_string()?;
        self.expect_symbol(Token::Semicolon)?;
        Ok(ImportNode {
            alias,
            path,
            position,
        })
    }

    fn parse_style_definition(&mut self) -> PResult<StyleDefinitionNode> {
        let position = self.current_position();
        self.expect_symbol(Token::At)?;
        let (name, _) = self.expect_ident()?;
        self.expect_symbol(Token::Equals)?;
        let body = self.parse_style_body()?;
        self.expect_symbol(Token::Semicolon)?;
        Ok(StyleDefinitionNode {
            name,
            body,
            position,
        })
    }

    fn parse_style_body(&mut self) -> PResult<StyleBodyNode> {
        match (self.peek_token(), self.peek_ahead(1)) {
            (Some(Token::Ident(_)), Some(Token::LParen)) => {
                let position = self.current_position();
                let (type_name, _) = self.expect_ident()?;
                self.expect_symbol(Token::LParen)?;
                let mut properties = Vec::new();
                while !self.check(&Token::RParen) {
                    let prop_position = self.current_position();
                    let (name, _) = self.expect_ident()?;
                    self.expect_symbol(Token::Colon)?;
                    let value = self.parse_value()?;
                    properties.push(PropertyNode {
                        name,
                        value,
                        position: prop_position,
                    });
                    if !self.match_symbol(&Token::Comma) {
                        break;
                    }
                }
                self.expect_symbol(Token::RParen)?;
                Ok(StyleBodyNode::Constructor {
                    type_name,
                    properties,
                    position,
                })
            }
            (Some(Token::Ident(_)), Some(Token::LBrace)) => {
                let element = self.parse_element()?;
                Ok(StyleBodyNode::Element(Box::new(element)))
            }
            (Some(Token::LParen), _) if self.is_tuple_ahead() => {
                Ok(StyleBodyNode::Tuple(self.parse_tuple()?))
            }
            _ => Ok(StyleBodyNode::Scalar(self.parse_value()?)),
        }
    }

    /// An element in any surface form: plain `Type #id {}`, style-prefixed
    /// `@S #id {}`, variable-ref `$A.@S #id {}` or ID-only `#id {}`.
    fn parse_any_element(&mut self) -> PResult<ElementNode> {
        match self.peek_token() {
            Some(Token::Ident(_)) => self.parse_element(),
            Some(Token::At) | Some(Token::Dollar) => {
                let reference = self.parse_reference()?;
                let position = reference.position;
                self.parse_prefixed_element(ElementPrefix::Style(reference), position)
            }
            Some(Token::Hash) | Some(Token::Color(_)) => {
                let position = self.current_position();
                self.parse_prefixed_element(ElementPrefix::IdOnly, position)
            }
            _ => Err(ParseError::new(
                self.current_position(),
                "expected an element",
            )),
        }
    }

    fn parse_element(&mut self) -> PResult<ElementNode> {
        let position = self.current_position();
        let (type_name, _) = self.expect_ident()?;
        let id = self.parse_optional_id()?;
        self.expect_symbol(Token::LBrace)?;
        let body = self.parse_element_body();
        self.expect_symbol(Token::RBrace)?;

        let mut element = ElementNode {
            type_name,
            source_type: None,
            prefix: None,
            id,
            body,
            position,
        };
        canonicalize(&mut element);
        Ok(element)
    }

    fn parse_prefixed_element(
        &mut self,
        prefix: ElementPrefix,
        position: Position,
    ) -> PResult<ElementNode> {
        let id = self.parse_optional_id()?;
        if matches!(prefix, ElementPrefix::IdOnly) && id.is_none() {
            return Err(ParseError::new(position, "expected element id after '#'"));
        }
        self.expect_symbol(Token::LBrace)?;
        let body = self.parse_element_body();
        self.expect_symbol(Token::RBrace)?;
        Ok(ElementNode {
            type_name: String::new(),
            source_type: None,
            prefix: Some(prefix),
            id,
            body,
            position,
        })
    }

    fn parse_optional_id(&mut self) -> PResult<Option<String>> {
        // `#badc0d` lexes as a single color literal; in header position it is
        // an element id
        if let Some(Token::Color(hex)) = self.peek_token() {
            let name = hex.to_string();
            self.advance();
            return Ok(Some(name));
        }
        if !self.match_symbol(&Token::Hash) {
            return Ok(None);
        }
        match self.peek_token() {
            Some(Token::Ident(name)) => {
                let name = name.to_string();
                self.advance();
                Ok(Some(name))
            }
            // `#badc0d` lexes as a color literal but is a valid hex-looking id
            Some(Token::Color(hex)) => {
                let name = hex.to_string();
                self.advance();
                Ok(Some(name))
            }
            _ => Err(ParseError::new(
                self.current_position(),
                "expected identifier after '#'",
            )),
        }
    }

    fn parse_element_body(&mut self) -> Vec<ElementItem> {
        let mut body = Vec::new();

        while !self.check(&Token::RBrace) && !self.is_at_end() {
            match self.parse_element_item() {
                Ok(item) => body.push(item),
                Err(e) => self.recover(e),
            }
        }

        body
    }

    fn parse_element_item(&mut self) -> PResult<ElementItem> {
        let position = self.current_position();
        match self.peek_token() {
            Some(Token::LineComment(text)) => {
                let node = CommentNode {
                    text: text.to_string(),
                    block: false,
                    attachment: CommentAttachment::Sibling,
                    position,
                };
                self.advance();
                Ok(ElementItem::Comment(node))
            }
            Some(Token::BlockComment(text)) => {
                let node = CommentNode {
                    text: text.to_string(),
                    block: true,
                    attachment: CommentAttachment::Sibling,
                    position,
                };
                self.advance();
                Ok(ElementItem::Comment(node))
            }
            Some(Token::Ident(_)) => match self.peek_ahead(1) {
                Some(Token::Colon) => {
                    let (name, _) = self.expect_ident()?;
                    self.expect_symbol(Token::Colon)?;
                    let value = self.parse_value()?;
                    self.expect_symbol(Token::Semicolon)?;
                    Ok(ElementItem::Property(PropertyNode {
                        name,
                        value,
                        position,
                    }))
                }
                Some(Token::Hash) | Some(Token::LBrace) | Some(Token::Color(_)) => {
                    let child = self.parse_element()?;
                    self.match_symbol(&Token::Semicolon);
                    Ok(ElementItem::Child(child))
                }
                _ => Err(ParseError::new(
                    position,
                    "expected ':' for a property or '{' for a child element",
                )),
            },
            Some(Token::At) if self.is_scoped_style_ahead() => {
                self.expect_symbol(Token::At)?;
                let (name, _) = self.expect_ident()?;
                self.expect_symbol(Token::Equals)?;
                let value = self.parse_value()?;
                self.expect_symbol(Token::Semicolon)?;
                Ok(ElementItem::ScopedStyle {
                    name,
                    value,
                    position,
                })
            }
            Some(Token::At) | Some(Token::Dollar) => {
                let reference = self.parse_reference()?;
                match self.peek_token() {
                    // `@S #Id {` / `$A.@S {`: a prefixed child element
                    Some(Token::Hash) | Some(Token::LBrace) | Some(Token::Color(_)) => {
                        let element = self
                            .parse_prefixed_element(ElementPrefix::Style(reference), position)?;
                        self.match_symbol(&Token::Semicolon);
                        Ok(ElementItem::Child(element))
                    }
                    _ => {
                        let value = self.finish_value(ValueNode::Reference(reference))?;
                        self.expect_symbol(Token::Semicolon)?;
                        Ok(ElementItem::StyleUse {
                            spread: false,
                            value,
                            position,
                        })
                    }
                }
            }
            Some(Token::Ellipsis) => {
                self.advance();
                let value = self.parse_value()?;
                self.expect_symbol(Token::Semicolon)?;
                Ok(ElementItem::StyleUse {
                    spread: true,
                    value,
                    position,
                })
            }
            Some(Token::LParen) => {
                let tuple = self.parse_tuple()?;
                self.expect_symbol(Token::Semicolon)?;
                Ok(ElementItem::StyleUse {
                    spread: false,
                    value: ValueNode::Tuple(tuple),
                    position,
                })
            }
            Some(Token::Hash) | Some(Token::Color(_)) => {
                let element = self.parse_prefixed_element(ElementPrefix::IdOnly, position)?;
                self.match_symbol(&Token::Semicolon);
                Ok(ElementItem::Child(element))
            }
            Some(Token::Error(message)) => {
                let message = message.clone();
                self.advance();
                Err(ParseError::new(position, message))
            }
            Some(other) => Err(ParseError::new(
                position,
                format!("unexpected {} in element body", other),
            )),
            None => Err(ParseError::at_end("unclosed element body")),
        }
    }

    fn is_scoped_style_ahead(&self) -> bool {
        matches!(self.peek_ahead(1), Some(Token::Ident(_)))
            && matches!(self.peek_ahead(2), Some(Token::Equals))
    }

    // ---- values ----------------------------------------------------------

    fn parse_value(&mut self) -> PResult<ValueNode> {
        let primary = self.parse_primary()?;
        self.finish_value(primary)
    }

    /// Continue binary-operator parsing after a primary has been consumed.
    fn finish_value(&mut self, first: ValueNode) -> PResult<ValueNode> {
        self.parse_binary_rest(first, 1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> PResult<ValueNode> {
        let first = self.parse_primary()?;
        self.parse_binary_rest(first, min_prec)
    }

    fn parse_binary_rest(&mut self, mut left: ValueNode, min_prec: u8) -> PResult<ValueNode> {
        while let Some(op) = self.peek_operator() {
            if op.precedence() < min_prec {
                break;
            }
            self.advance();
            // min_prec + 1 keeps same-precedence chains left-associative
            let right = self.parse_binary(op.precedence() + 1)?;
            let position = left.position();
            left = ValueNode::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                position,
            };
        }
        Ok(left)
    }

    fn peek_operator(&self) -> Option<BinaryOp> {
        match self.peek_token() {
            Some(Token::Plus) => Some(BinaryOp::Add),
            Some(Token::Minus) => Some(BinaryOp::Subtract),
            Some(Token::Star) => Some(BinaryOp::Multiply),
            Some(Token::Slash) => Some(BinaryOp::Divide),
            _ => None,
        }
    }

    fn parse_primary(&mut self) -> PResult<ValueNode> {
        let position = self.current_position();
        match self.peek_token() {
            Some(Token::Str(value)) => {
                let value = value.clone();
                self.advance();
                Ok(ValueNode::Str { value, position })
            }
            Some(Token::Number(value)) => {
                let value = *value;
                self.advance();
                Ok(ValueNode::Number { value, position })
            }
            Some(Token::Percent(value)) => {
                let value = *value;
                self.advance();
                Ok(ValueNode::Percent { value, position })
            }
            Some(Token::True) => {
                self.advance();
                Ok(ValueNode::Boolean {
                    value: true,
                    position,
                })
            }
            Some(Token::False) => {
                self.advance();
                Ok(ValueNode::Boolean {
                    value: false,
                    position,
                })
            }
            Some(Token::Null) => {
                self.advance();
                Ok(ValueNode::Null { position })
            }
            Some(Token::Localized(key)) => {
                let key = key.to_string();
                self.advance();
                Ok(ValueNode::Localized { key, position })
            }
            Some(Token::Color(rgb)) => {
                let rgb = rgb.to_string();
                self.advance();
                let alpha = self.parse_optional_alpha();
                Ok(ValueNode::Color {
                    rgb,
                    alpha,
                    position,
                })
            }
            Some(Token::Ident(name)) => {
                let name = name.to_string();
                self.advance();
                Ok(ValueNode::Identifier { name, position })
            }
            Some(Token::At) | Some(Token::Dollar) => {
                Ok(ValueNode::Reference(self.parse_reference()?))
            }
            Some(Token::Ellipsis) => {
                self.advance();
                let inner = self.parse_primary()?;
                Ok(ValueNode::Spread {
                    inner: Box::new(inner),
                    position,
                })
            }
            Some(Token::Minus) => {
                self.advance();
                match self.parse_primary()? {
                    ValueNode::Number { value, .. } => Ok(ValueNode::Number {
                        value: -value,
                        position,
                    }),
                    ValueNode::Percent { value, .. } => Ok(ValueNode::Percent {
                        value: -value,
                        position,
                    }),
                    _ => Err(ParseError::new(
                        position,
                        "expected a numeric literal after '-'",
                    )),
                }
            }
            Some(Token::LParen) => {
                if self.is_tuple_ahead() {
                    Ok(ValueNode::Tuple(self.parse_tuple()?))
                } else {
                    self.advance();
                    let inner = self.parse_binary(1)?;
                    self.expect_symbol(Token::RParen)?;
                    Ok(inner)
                }
            }
            Some(Token::LBracket) => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(&Token::RBracket) {
                    items.push(self.parse_value()?);
                    if !self.match_symbol(&Token::Comma) {
                        break;
                    }
                }
                self.expect_symbol(Token::RBracket)?;
                Ok(ValueNode::List { items, position })
            }
            Some(other) => Err(ParseError::new(
                position,
                format!("expected a value, found {}", other),
            )),
            None => Err(ParseError::at_end("expected a value")),
        }
    }

    /// `(0.5)` directly after a color literal is its alpha channel.
    fn parse_optional_alpha(&mut self) -> Option<f64> {
        if !matches!(self.peek_token(), Some(Token::LParen)) {
            return None;
        }
        if let (Some(Token::Number(alpha)), Some(Token::RParen)) =
            (self.peek_ahead(1), self.peek_ahead(2))
        {
            let alpha = *alpha;
            self.advance();
            self.advance();
            self.advance();
            Some(alpha)
        } else {
            None
        }
    }

    /// A `(` starts a tuple when followed by `)`, `...`, or `key:`.
    fn is_tuple_ahead(&self) -> bool {
        match self.peek_ahead(1) {
            Some(Token::RParen) | Some(Token::Ellipsis) => true,
            Some(Token::Ident(_)) => matches!(self.peek_ahead(2), Some(Token::Colon)),
            _ => false,
        }
    }

    fn parse_tuple(&mut self) -> PResult<TupleNode> {
        let position = self.current_position();
        self.expect_symbol(Token::LParen)?;
        let mut entries = Vec::new();
        while !self.check(&Token::RParen) {
            if self.match_symbol(&Token::Ellipsis) {
                let value = self.parse_value()?;
                entries.push(TupleEntryNode::Spread { value });
            } else {
                let (key, _) = self.expect_ident()?;
                self.expect_symbol(Token::Colon)?;
                let value = self.parse_value()?;
                entries.push(TupleEntryNode::Keyed { key, value });
            }
            if !self.match_symbol(&Token::Comma) {
                break;
            }
        }
        self.expect_symbol(Token::RParen)?;
        Ok(TupleNode { entries, position })
    }

    fn parse_reference(&mut self) -> PResult<ReferenceNode> {
        let position = self.current_position();
        let alias = if self.match_symbol(&Token::Dollar) {
            let (alias, _) = self.expect_ident()?;
            self.expect_symbol(Token::Dot)?;
            Some(alias)
        } else {
            None
        };
        self.expect_symbol(Token::At)?;
        let (name, _) = self.expect_ident()?;

        let mut segments = Vec::new();
        while matches!(self.peek_token(), Some(Token::Dot))
            && matches!(self.peek_ahead(1), Some(Token::Ident(_)))
        {
            self.advance();
            let (segment, _) = self.expect_ident()?;
            segments.push(segment);
        }

        Ok(ReferenceNode {
            alias,
            name,
            segments,
            position,
        })
    }

    // ---- error recovery --------------------------------------------------

    fn recover(&mut self, error: ParseError) {
        self.errors.push(error);
        self.synchronize();
    }

    /// Skip to the next statement boundary: past the next `;` at the current
    /// nesting depth, or just before the `}` that closes it.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek_token() {
            match token {
                Token::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                Token::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                }
                Token::LBrace => {
                    depth += 1;
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ---- token cursor ----------------------------------------------------

    fn peek(&self) -> Option<&Positioned<'src>> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&Token<'src>> {
        self.peek().map(|p| &p.token)
    }

    fn peek_ahead(&self, n: usize) -> Option<&Token<'src>> {
        self.tokens.get(self.pos + n).map(|p| &p.token)
    }

    fn current_position(&self) -> Position {
        match self.peek() {
            Some(p) => p.position,
            None => self
                .tokens
                .last()
                .map(|p| p.position)
                .unwrap_or_else(Position::start),
        }
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: &Token<'src>) -> bool {
        self.peek_token() == Some(token)
    }

    fn match_symbol(&mut self, token: &Token<'src>) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, token: Token<'src>) -> PResult<()> {
        if self.check(&token) {
            self.advance();
            Ok(())
        } else {
            match self.peek_token() {
                Some(found) => Err(ParseError::new(
                    self.current_position(),
                    format!("expected {}, found {}", token, found),
                )),
                None => Err(ParseError::at_end(format!("expected {}", token))),
            }
        }
    }

    fn expect_ident(&mut self) -> PResult<(String, Position)> {
        let position = self.current_position();
        match self.peek_token() {
            Some(Token::Ident(name)) => {
                let name = name.to_string();
                self.advance();
                Ok((name, position))
            }
            Some(found) => Err(ParseError::new(
                position,
                format!("expected identifier, found {}", found),
            )),
            None => Err(ParseError::at_end("expected identifier")),
        }
    }

    fn expect_string(&mut self) -> PResult<String> {
        match self.peek_token() {
            Some(Token::Str(value)) => {
                let value = value.clone();
                self.advance();
                Ok(value)
            }
            Some(found) => Err(ParseError::new(
                self.current_position(),
                format!("expected string, found {}", found),
            )),
            None => Err(ParseError::at_end("expected string")),
        }
    }
}

/// Engine-specific aliases mapped to the abstract types the rest of the
/// engine reasons about. `source_type` keeps the original spelling so export
/// is byte-exact.
fn canonicalize(element: &mut ElementNode) {
    let canonical = match element.type_name.as_str() {
        "TextButton" => Some("Button"),
        "AssetImage" => Some("Image"),
        "TabNavigation" => Some("TabPanel"),
        "Group" if has_property(element, "LayoutMode") => {
            rename_property(element, "LayoutMode", "Orientation");
            Some("ScrollView")
        }
        _ => None,
    };
    if let Some(canonical) = canonical {
        element.source_type = Some(std::mem::replace(
            &mut element.type_name,
            canonical.to_string(),
        ));
    }
}

fn has_property(element: &ElementNode, name: &str) -> bool {
    element
        .body
        .iter()
        .any(|item| matches!(item, ElementItem::Property(p) if p.name == name))
}

fn rename_property(element: &mut ElementNode, from: &str, to: &str) {
    for item in &mut element.body {
        if let ElementItem::Property(p) = item {
            if p.name == from {
                p.name = to.to_string();
            }
        }
    }
}
