//! Grammar productions
//!
//! One method per production, tried in the fixed order of the document shape. Section
//! productions (`name`, `evastringtable`, `paramcardlayout`, `dependency`, ...) are plain
//! recursive descent. The `param` production drives the [`BuilderContext`] in a loop so
//! nesting depth is limited by memory only.

use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::xprot::ast::{
    ComposerEntry, Dependency, DependencyAttribute, DependencyContext, Document,
    EvaStringEntry, LayoutItem, Param, ParamCardLayout, Value,
};
use crate::xprot::config::{DependencyAttributePolicy, ParserConfig};
use crate::xprot::parsing::builder::{BuilderContext, BuilderError};
use crate::xprot::parsing::cursor::{parse_float, parse_integer, TokenCursor};
use crate::xprot::parsing::ParseError;
use crate::xprot::token::{Token, TokenKind};

pub struct Parser<'a> {
    cursor: TokenCursor<'a>,
    ctx: BuilderContext,
    config: &'a ParserConfig,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], config: &'a ParserConfig) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            ctx: BuilderContext::new(),
            config,
        }
    }

    /// `< XProtocol > { name id userversion evastringtable param* paramcardlayout
    /// dependency* protocolcomposer* }`
    pub fn document(mut self) -> Result<Document, ParseError> {
        self.cursor.expect_field(TokenKind::XProtocol)?;
        self.cursor
            .expect(TokenKind::LBrace, "'{' opening the XProtocol body")?;

        let name = self.name()?;
        let id = self.id()?;
        let userversion = self.userversion()?;
        let eva_string_table = self.eva_string_table()?;

        let mut root_params = Vec::new();
        while self.at_param() {
            root_params.push(self.param()?);
        }

        let param_card_layout = self.param_card_layout()?;

        let mut dependencies = BTreeMap::new();
        while self.cursor.at_field(TokenKind::Dependency) {
            let (label, dependency) = self.dependency()?;
            // Repeated labels overwrite, last one wins
            dependencies.insert(label, dependency);
        }

        let mut protocol_composers = BTreeMap::new();
        while self.cursor.at_field(TokenKind::ProtocolComposer) {
            let (label, entries) = self.protocol_composer()?;
            protocol_composers.insert(label, entries);
        }

        self.cursor.expect(
            TokenKind::RBrace,
            "'<Dependency>', '<ProtocolComposer>' or '}' closing the XProtocol body",
        )?;
        if !self.cursor.is_at_end() {
            return Err(self.cursor.unexpected("end of input"));
        }

        Ok(Document {
            name,
            id,
            userversion,
            eva_string_table,
            param_card_layout,
            dependencies,
            protocol_composers,
            root_params,
        })
    }

    /// `< Name > QUOTED_STRING`
    fn name(&mut self) -> Result<String, ParseError> {
        self.cursor.expect_field(TokenKind::Name)?;
        self.cursor.expect_string("quoted protocol name")
    }

    /// `< ID > INTEGER`
    fn id(&mut self) -> Result<i64, ParseError> {
        self.cursor.expect_field(TokenKind::Id)?;
        self.cursor.expect_integer("integer protocol id")
    }

    /// `< Userversion > FLOAT`
    fn userversion(&mut self) -> Result<f64, ParseError> {
        self.cursor.expect_field(TokenKind::Userversion)?;
        self.cursor.expect_float("float user version")
    }

    /// `< EVAStringTable > { (INTEGER QUOTED_STRING? )* }`
    fn eva_string_table(&mut self) -> Result<Vec<EvaStringEntry>, ParseError> {
        self.cursor.expect_field(TokenKind::EvaStringTable)?;
        self.cursor
            .expect(TokenKind::LBrace, "'{' opening EVAStringTable")?;

        let mut entries = Vec::new();
        while self.cursor.at(TokenKind::Integer) {
            let id = self.cursor.expect_integer("integer string id")?;
            let text = if self.cursor.at(TokenKind::QuotedString) {
                Some(self.cursor.expect_string("quoted string")?)
            } else {
                None
            };
            entries.push(EvaStringEntry { id, text });
        }

        self.cursor.expect(
            TokenKind::RBrace,
            "integer string id or '}' closing EVAStringTable",
        )?;
        Ok(entries)
    }

    /// `< Keyword . QUOTED_STRING >`, returning the label
    fn section_label(&mut self, keyword: TokenKind) -> Result<String, ParseError> {
        let expected = format!("'<{}.\"label\">'", keyword);
        self.cursor.expect(TokenKind::LAngle, &expected)?;
        self.cursor.expect(keyword, &expected)?;
        self.cursor.expect(TokenKind::Period, &expected)?;
        let label = self.cursor.expect_string(&expected)?;
        self.cursor.expect(TokenKind::RAngle, &expected)?;
        Ok(label)
    }

    /// `< ParamCardLayout . "label" > { layoutline* }`
    fn param_card_layout(&mut self) -> Result<ParamCardLayout, ParseError> {
        let label = self.section_label(TokenKind::ParamCardLayout)?;
        self.cursor
            .expect(TokenKind::LBrace, "'{' opening ParamCardLayout")?;

        let mut items = Vec::new();
        while !self.cursor.at(TokenKind::RBrace) {
            items.push(self.layout_item()?);
        }
        self.cursor
            .expect(TokenKind::RBrace, "'}' closing ParamCardLayout")?;

        Ok(ParamCardLayout { label, items })
    }

    /// `< Repr > QUOTED_STRING` or
    /// `< Control > { < Param > QUOTED_STRING < Pos > INTEGER INTEGER [< Repr > QUOTED_STRING] }`
    fn layout_item(&mut self) -> Result<LayoutItem, ParseError> {
        const EXPECTED: &str = "'<Repr>', '<Control>' or '}' closing ParamCardLayout";

        if self.cursor.at_field(TokenKind::Repr) {
            self.cursor.expect_field(TokenKind::Repr)?;
            let repr = self.cursor.expect_string("quoted representation")?;
            return Ok(LayoutItem::ReprOnly(repr));
        }
        if !self.cursor.at_field(TokenKind::Control) {
            return Err(self.cursor.unexpected(EXPECTED));
        }

        self.cursor.expect_field(TokenKind::Control)?;
        self.cursor
            .expect(TokenKind::LBrace, "'{' opening Control")?;
        self.cursor.expect_field(TokenKind::Param)?;
        let param_name = self.cursor.expect_string("quoted parameter name")?;
        self.cursor.expect_field(TokenKind::Pos)?;
        let x = self.cursor.expect_integer("integer x position")?;
        let y = self.cursor.expect_integer("integer y position")?;
        let repr = if self.cursor.at_field(TokenKind::Repr) {
            self.cursor.expect_field(TokenKind::Repr)?;
            Some(self.cursor.expect_string("quoted representation")?)
        } else {
            None
        };
        self.cursor
            .expect(TokenKind::RBrace, "'<Repr>' or '}' closing Control")?;

        Ok(LayoutItem::Control {
            param_name,
            pos: (x, y),
            repr,
        })
    }

    /// `< Dependency . "label" > { QUOTED_STRING* attribute? }`
    fn dependency(&mut self) -> Result<(String, Dependency), ParseError> {
        let label = self.section_label(TokenKind::Dependency)?;
        self.cursor
            .expect(TokenKind::LBrace, "'{' opening Dependency")?;

        let mut string_list = Vec::new();
        while self.cursor.at(TokenKind::QuotedString) {
            string_list.push(self.cursor.expect_string("quoted condition")?);
        }

        let mut attribute = None;
        while !self.cursor.at(TokenKind::RBrace) {
            let line = self.cursor.line();
            let parsed = self.dependency_attribute()?;
            if attribute.is_none() {
                attribute = Some(parsed);
                continue;
            }
            match self.config.dependency_attributes {
                DependencyAttributePolicy::Strict => {
                    return Err(ParseError::DuplicateAttribute { line, label });
                }
                DependencyAttributePolicy::KeepFirst => {
                    warn!(
                        line,
                        label = %label,
                        discarded = ?parsed,
                        "extra dependency attribute discarded"
                    );
                }
            }
        }
        self.cursor
            .expect(TokenKind::RBrace, "'}' closing Dependency")?;

        Ok((
            label,
            Dependency {
                string_list,
                attribute,
            },
        ))
    }

    /// `< Dll > QS [< Context > QS [< Context > QS]]` | `< Context > QS` | `< Visible > QS`
    fn dependency_attribute(&mut self) -> Result<DependencyAttribute, ParseError> {
        if self.cursor.at_field(TokenKind::Dll) {
            self.cursor.expect_field(TokenKind::Dll)?;
            let dll = self.cursor.expect_string("quoted dll name")?;
            let context = if self.cursor.at_field(TokenKind::Context) {
                self.cursor.expect_field(TokenKind::Context)?;
                let first = self.cursor.expect_string("quoted context")?;
                if self.cursor.at_field(TokenKind::Context) {
                    self.cursor.expect_field(TokenKind::Context)?;
                    let second = self.cursor.expect_string("quoted context")?;
                    Some(DependencyContext::Pair(first, second))
                } else {
                    Some(DependencyContext::Single(first))
                }
            } else {
                None
            };
            return Ok(DependencyAttribute::Dll { dll, context });
        }
        if self.cursor.at_field(TokenKind::Context) {
            self.cursor.expect_field(TokenKind::Context)?;
            let context = self.cursor.expect_string("quoted context")?;
            return Ok(DependencyAttribute::Context(context));
        }
        if self.cursor.at_field(TokenKind::Visible) {
            self.cursor.expect_field(TokenKind::Visible)?;
            let visible = self.cursor.expect_string("quoted visibility")?;
            return Ok(DependencyAttribute::Visible(visible));
        }
        Err(self
            .cursor
            .unexpected("'<Dll>', '<Context>', '<Visible>' or '}' closing Dependency"))
    }

    /// `< ProtocolComposer . "label" > { (< InFile > QS | < Dll > QS)* }`
    fn protocol_composer(&mut self) -> Result<(String, Vec<ComposerEntry>), ParseError> {
        let label = self.section_label(TokenKind::ProtocolComposer)?;
        self.cursor
            .expect(TokenKind::LBrace, "'{' opening ProtocolComposer")?;

        let mut entries = Vec::new();
        loop {
            if self.cursor.at_field(TokenKind::InFile) {
                self.cursor.expect_field(TokenKind::InFile)?;
                entries.push(ComposerEntry::InFile(
                    self.cursor.expect_string("quoted file name")?,
                ));
            } else if self.cursor.at_field(TokenKind::Dll) {
                self.cursor.expect_field(TokenKind::Dll)?;
                entries.push(ComposerEntry::Dll(
                    self.cursor.expect_string("quoted dll name")?,
                ));
            } else {
                break;
            }
        }
        self.cursor.expect(
            TokenKind::RBrace,
            "'<InFile>', '<Dll>' or '}' closing ProtocolComposer",
        )?;

        Ok((label, entries))
    }

    /// Lookahead for the `param` production: `{` or `<` followed by a container keyword
    fn at_param(&self) -> bool {
        match self.cursor.peek_kind() {
            Some(TokenKind::LBrace) => true,
            Some(TokenKind::LAngle) => self
                .cursor
                .peek_nth_kind(1)
                .is_some_and(|kind| kind.container_kind().is_some()),
            _ => false,
        }
    }

    /// `param : < Kind . QS > { paramsorvalues } | { paramsorvalues }`
    ///
    /// `paramsorvalues` mixes `tag param`, `param` and `value` items in any order until the
    /// matching `}`. Nested params are opened and closed on the builder stack; the loop ends
    /// when the outermost one closes.
    fn param(&mut self) -> Result<Param, ParseError> {
        self.open_param()?;

        loop {
            let Some(token) = self.cursor.peek() else {
                return Err(self.cursor.unexpected("'}' closing parameter body"));
            };

            match token.kind {
                TokenKind::RBrace => {
                    let closed = self.ctx.close().map_err(|e| self.builder_error(e))?;
                    self.cursor.advance();
                    if let Some(param) = closed {
                        return Ok(param);
                    }
                }
                TokenKind::LAngle => match self.cursor.peek_nth_kind(1) {
                    Some(kind) if kind.container_kind().is_some() => self.open_param()?,
                    Some(kind) if kind.tag().is_some() => self.tag(kind)?,
                    _ => {
                        self.cursor.advance();
                        return Err(self.cursor.unexpected("parameter or tag keyword"));
                    }
                },
                TokenKind::LBrace => {
                    if self.at_string_list() {
                        let list = self.string_list()?;
                        self.push_value(Value::StringList(list))?;
                    } else {
                        self.open_param()?;
                    }
                }
                TokenKind::QuotedString => {
                    let text = token.unquoted().to_string();
                    self.push_value(Value::String(text))?;
                    self.cursor.advance();
                }
                TokenKind::Integer => {
                    let value = Value::Integer(parse_integer(token)?);
                    self.push_value(value)?;
                    self.cursor.advance();
                }
                TokenKind::Float => {
                    let value = Value::Float(parse_float(token)?);
                    self.push_value(value)?;
                    self.cursor.advance();
                }
                _ => {
                    return Err(self
                        .cursor
                        .unexpected("parameter, tag, value or '}' closing parameter body"))
                }
            }
        }
    }

    /// Consume a param header (`< Kind . QS > {` or a bare `{`) and push it on the stack
    fn open_param(&mut self) -> Result<(), ParseError> {
        let line = self.cursor.line();

        if self.cursor.at(TokenKind::LBrace) {
            self.cursor.advance();
            self.ctx.open(Param::anonymous(line));
            return Ok(());
        }

        const EXPECTED: &str = "parameter header '<ParamKind.\"name\">'";
        self.cursor.expect(TokenKind::LAngle, EXPECTED)?;
        let kind = match self.cursor.peek_kind().and_then(|k| k.container_kind()) {
            Some(kind) => kind,
            None => return Err(self.cursor.unexpected("parameter kind keyword")),
        };
        self.cursor.advance();
        self.cursor.expect(TokenKind::Period, EXPECTED)?;
        let name = self.cursor.expect_string("quoted parameter name")?;
        self.cursor.expect(TokenKind::RAngle, EXPECTED)?;
        self.cursor
            .expect(TokenKind::LBrace, "'{' opening parameter body")?;

        trace!(kind = %kind, name = %name, line, depth = self.ctx.depth(), "opened parameter");
        self.ctx.open(Param::new(kind, name, line));
        Ok(())
    }

    /// `< Tag >`, filling the pending-tag register
    fn tag(&mut self, keyword: TokenKind) -> Result<(), ParseError> {
        let Some(tag) = keyword.tag() else {
            return Err(self.cursor.unexpected("tag keyword"));
        };
        self.ctx
            .set_pending_tag(tag)
            .map_err(|e| self.builder_error(e))?;
        self.cursor.expect_field(keyword)
    }

    /// A `{` whose body is nothing but quoted strings is a string list, not a group
    fn at_string_list(&self) -> bool {
        let mut offset = 1;
        while self.cursor.peek_nth_kind(offset) == Some(TokenKind::QuotedString) {
            offset += 1;
        }
        self.cursor.peek_nth_kind(offset) == Some(TokenKind::RBrace)
    }

    /// `{ QUOTED_STRING* }`
    fn string_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.cursor
            .expect(TokenKind::LBrace, "'{' opening string list")?;
        let mut list = Vec::new();
        while self.cursor.at(TokenKind::QuotedString) {
            list.push(self.cursor.expect_string("quoted string")?);
        }
        self.cursor
            .expect(TokenKind::RBrace, "'}' closing string list")?;
        Ok(list)
    }

    fn push_value(&mut self, value: Value) -> Result<(), ParseError> {
        self.ctx
            .push_value(value)
            .map(|_| ())
            .map_err(|e| self.builder_error(e))
    }

    fn builder_error(&self, error: BuilderError) -> ParseError {
        match error {
            BuilderError::DanglingTag(tag) | BuilderError::TagAlreadyPending(tag) => self
                .cursor
                .unexpected(format!("value or parameter after tag '<{}>'", tag)),
            BuilderError::NoOpenParam => self.cursor.unexpected("parameter header"),
        }
    }
}
