//! In-memory reference model.
//!
//! `PlainModel` is a flat list of blocks, each holding inline items: runs of
//! attributed text and inline elements (one offset wide). It implements
//! [`EditorModel`] with real rollback and undo, and records every writer call
//! so tests can assert on the exact operation sequence.
//!
//! Models can be built from and rendered to a compact markup:
//!
//! ```text
//! <paragraph>foo[]<$text bold="true">bar</$text><image></image></paragraph>
//! ```
//!
//! `[` and `]` mark the selection start and end, `[]` a collapsed caret.

use smol_str::SmolStr;

use crate::error::InputError;
use crate::model::{EditorModel, ModelOp, ModelWriter};
use crate::types::{Attributes, BatchId, ModelPosition, ModelRange, ModelSelection};
use crate::undo::{History, UndoManager};

/// Inline content of a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
    Text { text: String, attributes: Attributes },
    Element { name: SmolStr },
}

impl Inline {
    /// Length in model offsets.
    pub fn len(&self) -> usize {
        match self {
            Inline::Text { text, .. } => text.chars().count(),
            Inline::Element { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One offset of block content. Blocks are edited cell-wise and repacked.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Cell {
    Char(char, Attributes),
    Element(SmolStr),
}

/// A block element (paragraph, heading...) with inline children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    name: SmolStr,
    items: Vec<Inline>,
}

impl Block {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn paragraph() -> Self {
        Self::new("paragraph")
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.push_text(text, &Attributes::new());
        self
    }

    pub fn with_styled(mut self, text: &str, attributes: Attributes) -> Self {
        self.push_text(text, &attributes);
        self
    }

    pub fn with_element(mut self, name: impl Into<SmolStr>) -> Self {
        self.items.push(Inline::Element { name: name.into() });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[Inline] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.iter().map(Inline::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Text content, with inline elements as U+FFFC.
    pub fn text(&self) -> String {
        self.items
            .iter()
            .map(|item| match item {
                Inline::Text { text, .. } => text.as_str(),
                Inline::Element { .. } => "\u{FFFC}",
            })
            .collect()
    }

    fn push_text(&mut self, text: &str, attributes: &Attributes) {
        if text.is_empty() {
            return;
        }
        if let Some(Inline::Text {
            text: last,
            attributes: last_attributes,
        }) = self.items.last_mut()
        {
            if last_attributes == attributes {
                last.push_str(text);
                return;
            }
        }
        self.items.push(Inline::Text {
            text: text.to_string(),
            attributes: attributes.clone(),
        });
    }

    fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.len());
        for item in &self.items {
            match item {
                Inline::Text { text, attributes } => {
                    cells.extend(text.chars().map(|c| Cell::Char(c, attributes.clone())));
                }
                Inline::Element { name } => cells.push(Cell::Element(name.clone())),
            }
        }
        cells
    }

    fn set_cells(&mut self, cells: Vec<Cell>) {
        self.items.clear();
        for cell in cells {
            match cell {
                Cell::Char(c, attributes) => {
                    let mut buf = [0u8; 4];
                    self.push_text(c.encode_utf8(&mut buf), &attributes);
                }
                Cell::Element(name) => self.items.push(Inline::Element { name }),
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Snapshot {
    blocks: Vec<Block>,
    anchor: ModelPosition,
    focus: ModelPosition,
    attribute_override: Option<Attributes>,
}

/// Reference [`EditorModel`].
#[derive(Clone, Debug)]
pub struct PlainModel {
    blocks: Vec<Block>,
    anchor: ModelPosition,
    focus: ModelPosition,
    attribute_override: Option<Attributes>,
    history: History<Snapshot>,
    ops: Vec<ModelOp>,
    committed: usize,
}

impl Default for PlainModel {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PlainModel {
    /// Model with the caret at the start of the first block. An empty block
    /// list becomes one empty paragraph.
    pub fn new(mut blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            blocks.push(Block::paragraph());
        }
        Self {
            blocks,
            anchor: ModelPosition::default(),
            focus: ModelPosition::default(),
            attribute_override: None,
            history: History::new(100),
            ops: Vec::new(),
            committed: 0,
        }
    }

    pub fn with_max_undo_steps(mut self, max_steps: usize) -> Self {
        self.history = History::new(max_steps);
        self
    }

    /// Parse the markup described in the module docs.
    pub fn from_markup(markup: &str) -> Result<Self, InputError> {
        let mut parser = MarkupParser {
            rest: markup,
            blocks: Vec::new(),
            start: None,
            end: None,
        };
        parser.parse()?;

        let (anchor, focus) = match (parser.start, parser.end) {
            (Some(start), Some(end)) => (start, end),
            (None, None) => (ModelPosition::default(), ModelPosition::default()),
            _ => return Err(markup_error("unbalanced selection markers")),
        };

        let mut model = Self::new(parser.blocks);
        model.set_selection_range(anchor, focus)?;
        Ok(model)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Text of block `index` (see [`Block::text`]).
    pub fn text(&self, index: usize) -> Option<String> {
        self.blocks.get(index).map(Block::text)
    }

    /// Move the selection outside of any change. Clears attribute overrides.
    pub fn set_selection_range(
        &mut self,
        anchor: ModelPosition,
        focus: ModelPosition,
    ) -> Result<(), InputError> {
        self.check_position(anchor)?;
        self.check_position(focus)?;
        self.anchor = anchor;
        self.focus = focus;
        self.attribute_override = None;
        Ok(())
    }

    /// Override the attributes the selection reports until it moves again.
    pub fn set_selection_attributes(&mut self, attributes: Attributes) {
        self.attribute_override = Some(attributes);
    }

    /// Every writer call of committed changes, oldest first.
    pub fn ops(&self) -> &[ModelOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<ModelOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of successful [`EditorModel::change`] calls that wrote something.
    pub fn committed_changes(&self) -> usize {
        self.committed
    }

    /// Render blocks and selection as markup.
    pub fn to_markup(&self) -> String {
        let range = ModelRange::new(self.anchor, self.focus);
        let mut out = String::new();

        for (index, block) in self.blocks.iter().enumerate() {
            let marker = |offset: usize| {
                let at = ModelPosition::new(index, offset);
                match (at == range.start, at == range.end) {
                    (true, true) => "[]",
                    (true, false) => "[",
                    (false, true) => "]",
                    (false, false) => "",
                }
            };

            out.push('<');
            out.push_str(&block.name);
            out.push('>');

            let mut offset = 0;
            let mut after_text = false;
            for item in &block.items {
                match item {
                    Inline::Element { name } => {
                        if !after_text {
                            out.push_str(marker(offset));
                        }
                        out.push('<');
                        out.push_str(name);
                        out.push_str("></");
                        out.push_str(name);
                        out.push('>');
                        offset += 1;
                        after_text = false;
                    }
                    Inline::Text { text, attributes } => {
                        if !attributes.is_empty() {
                            out.push_str("<$text");
                            for (key, value) in attributes.iter() {
                                out.push(' ');
                                out.push_str(key);
                                out.push_str("=\"");
                                out.push_str(value);
                                out.push('"');
                            }
                            out.push('>');
                        }
                        if !after_text {
                            out.push_str(marker(offset));
                        }
                        for c in text.chars() {
                            out.push(c);
                            offset += 1;
                            out.push_str(marker(offset));
                        }
                        if !attributes.is_empty() {
                            out.push_str("</$text>");
                        }
                        after_text = true;
                    }
                }
            }
            if !after_text {
                out.push_str(marker(offset));
            }

            out.push_str("</");
            out.push_str(&block.name);
            out.push('>');
        }

        out
    }

    fn check_position(&self, at: ModelPosition) -> Result<(), InputError> {
        match self.blocks.get(at.block) {
            Some(block) if at.offset <= block.len() => Ok(()),
            _ => Err(InputError::InvalidPosition(at)),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            blocks: self.blocks.clone(),
            anchor: self.anchor,
            focus: self.focus,
            attribute_override: self.attribute_override.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.blocks = snapshot.blocks;
        self.anchor = snapshot.anchor;
        self.focus = snapshot.focus;
        self.attribute_override = snapshot.attribute_override;
    }

    /// Attributes of the text the selection sits in: the char before a caret
    /// (or after it at a block start), the first selected char of a range.
    fn derived_attributes(&self) -> Attributes {
        let range = ModelRange::new(self.anchor, self.focus);
        let Some(block) = self.blocks.get(range.start.block) else {
            return Attributes::new();
        };
        let cells = block.cells();
        let offset = range.start.offset;

        let before = offset.checked_sub(1).and_then(|i| cells.get(i));
        let after = cells.get(offset);
        let candidates = if range.is_collapsed() {
            [before, after]
        } else {
            [after, None]
        };

        candidates
            .into_iter()
            .flatten()
            .find_map(|cell| match cell {
                Cell::Char(_, attributes) => Some(attributes.clone()),
                Cell::Element(_) => None,
            })
            .unwrap_or_default()
    }

    fn map_positions(&mut self, f: impl Fn(ModelPosition) -> ModelPosition) {
        self.anchor = f(self.anchor);
        self.focus = f(self.focus);
    }
}

impl EditorModel for PlainModel {
    fn selection(&self) -> ModelSelection {
        ModelSelection {
            anchor: self.anchor,
            focus: self.focus,
            attributes: self
                .attribute_override
                .clone()
                .unwrap_or_else(|| self.derived_attributes()),
        }
    }

    fn change<R>(
        &mut self,
        batch: BatchId,
        f: impl FnOnce(&mut dyn ModelWriter) -> Result<R, InputError>,
    ) -> Result<R, InputError> {
        let before = self.snapshot();
        let ops_before = self.ops.len();

        let mut writer = PlainWriter { model: self };
        match f(&mut writer) {
            Ok(value) => {
                if self.ops.len() > ops_before {
                    self.history.record(batch, before);
                    self.committed += 1;
                }
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(batch = batch.0, error = %err, "change failed, rolling back");
                self.restore(before);
                self.ops.truncate(ops_before);
                Err(err)
            }
        }
    }
}

impl UndoManager for PlainModel {
    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) -> bool {
        let current = self.snapshot();
        let Some(previous) = self.history.undo(current) else {
            return false;
        };
        self.restore(previous);
        true
    }

    fn redo(&mut self) -> bool {
        let current = self.snapshot();
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        self.restore(next);
        true
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}

/// Writer handed out by [`PlainModel::change`].
struct PlainWriter<'a> {
    model: &'a mut PlainModel,
}

impl ModelWriter for PlainWriter<'_> {
    fn insert_text(
        &mut self,
        at: ModelPosition,
        text: &str,
        attributes: &Attributes,
    ) -> Result<(), InputError> {
        self.model.check_position(at)?;
        if text.is_empty() {
            return Ok(());
        }

        let block = &mut self.model.blocks[at.block];
        let mut cells = block.cells();
        let len = text.chars().count();
        cells.splice(
            at.offset..at.offset,
            text.chars().map(|c| Cell::Char(c, attributes.clone())),
        );
        block.set_cells(cells);

        self.model.map_positions(|pos| {
            if pos.block == at.block && pos.offset > at.offset {
                pos.advanced(len)
            } else {
                pos
            }
        });
        self.model.ops.push(ModelOp::Insert {
            at,
            text: text.to_string(),
            attributes: attributes.clone(),
        });
        Ok(())
    }

    fn remove_range(&mut self, range: ModelRange) -> Result<(), InputError> {
        self.model.check_position(range.start)?;
        self.model.check_position(range.end)?;
        if range.is_collapsed() {
            return Ok(());
        }

        let ModelRange { start, end } = range;
        if start.block == end.block {
            let block = &mut self.model.blocks[start.block];
            let mut cells = block.cells();
            cells.drain(start.offset..end.offset);
            block.set_cells(cells);
        } else {
            let first = &mut self.model.blocks[start.block];
            let mut cells = first.cells();
            cells.truncate(start.offset);
            first.set_cells(cells);

            let last = &mut self.model.blocks[end.block];
            let mut cells = last.cells();
            cells.drain(..end.offset);
            last.set_cells(cells);

            self.model.blocks.drain(start.block + 1..end.block);
        }

        let removed_blocks = end.block - start.block - usize::from(start.block != end.block);
        self.model.map_positions(|pos| {
            if pos <= start {
                pos
            } else if pos <= end {
                start
            } else if pos.block == end.block {
                let block = if start.block == end.block {
                    start.block
                } else {
                    start.block + 1
                };
                let offset = if start.block == end.block {
                    pos.offset - (end.offset - start.offset)
                } else {
                    pos.offset - end.offset
                };
                ModelPosition::new(block, offset)
            } else {
                ModelPosition::new(pos.block - removed_blocks, pos.offset)
            }
        });
        self.model.ops.push(ModelOp::Remove(range));
        Ok(())
    }

    fn merge_blocks(&mut self, first: usize) -> Result<(), InputError> {
        if first + 1 >= self.model.blocks.len() {
            return Err(InputError::Model(format!(
                "no block after block {first} to merge"
            )));
        }

        let second = self.model.blocks.remove(first + 1);
        let joined_at = self.model.blocks[first].len();
        let mut cells = self.model.blocks[first].cells();
        cells.extend(second.cells());
        self.model.blocks[first].set_cells(cells);

        self.model.map_positions(|pos| {
            if pos.block == first + 1 {
                ModelPosition::new(first, joined_at + pos.offset)
            } else if pos.block > first + 1 {
                ModelPosition::new(pos.block - 1, pos.offset)
            } else {
                pos
            }
        });
        self.model.ops.push(ModelOp::Merge(first));
        Ok(())
    }

    fn set_selection(
        &mut self,
        anchor: ModelPosition,
        focus: ModelPosition,
    ) -> Result<(), InputError> {
        self.model.set_selection_range(anchor, focus)?;
        self.model.ops.push(ModelOp::Select { anchor, focus });
        Ok(())
    }
}

fn markup_error(message: impl Into<String>) -> InputError {
    InputError::Model(format!("markup: {}", message.into()))
}

struct MarkupParser<'a> {
    rest: &'a str,
    blocks: Vec<Block>,
    start: Option<ModelPosition>,
    end: Option<ModelPosition>,
}

impl MarkupParser<'_> {
    fn parse(&mut self) -> Result<(), InputError> {
        loop {
            self.rest = self.rest.trim_start();
            if self.rest.is_empty() {
                return Ok(());
            }
            let (name, _) = self.open_tag()?;
            let mut block = Block::new(name.clone());
            self.inline_content(&mut block, &Attributes::new(), &name)?;
            self.blocks.push(block);
        }
    }

    fn open_tag(&mut self) -> Result<(SmolStr, Attributes), InputError> {
        let rest = self
            .rest
            .strip_prefix('<')
            .ok_or_else(|| markup_error("expected `<`"))?;
        let close = rest
            .find('>')
            .ok_or_else(|| markup_error("unterminated tag"))?;
        let tag = &rest[..close];
        self.rest = &rest[close + 1..];

        let (name, attributes) = tag.split_once(' ').unwrap_or((tag, ""));
        if name.is_empty() {
            return Err(markup_error("empty tag name"));
        }
        Ok((name.into(), parse_attributes(attributes)?))
    }

    fn close_tag(&mut self, name: &str) -> Result<(), InputError> {
        let expected = format!("</{name}>");
        self.rest = self
            .rest
            .strip_prefix(expected.as_str())
            .ok_or_else(|| markup_error(format!("expected `{expected}`")))?;
        Ok(())
    }

    fn inline_content(
        &mut self,
        block: &mut Block,
        attributes: &Attributes,
        closing: &str,
    ) -> Result<(), InputError> {
        loop {
            if self.rest.starts_with("</") {
                return self.close_tag(closing);
            }
            if self.rest.starts_with('<') {
                let (name, inner) = self.open_tag()?;
                if name == "$text" {
                    self.inline_content(block, &inner, "$text")?;
                } else {
                    self.close_tag(&name)?;
                    block.items.push(Inline::Element { name });
                }
                continue;
            }

            let mut chars = self.rest.chars();
            let c = chars
                .next()
                .ok_or_else(|| markup_error(format!("missing `</{closing}>`")))?;
            self.rest = chars.as_str();

            let here = ModelPosition::new(self.blocks.len(), block.len());
            match c {
                '[' => self.start = Some(here),
                ']' => self.end = Some(here),
                _ => {
                    let mut buf = [0u8; 4];
                    block.push_text(c.encode_utf8(&mut buf), attributes);
                }
            }
        }
    }
}

fn parse_attributes(mut source: &str) -> Result<Attributes, InputError> {
    let mut attributes = Attributes::new();
    loop {
        source = source.trim_start();
        if source.is_empty() {
            return Ok(attributes);
        }
        let (key, rest) = source
            .split_once("=\"")
            .ok_or_else(|| markup_error("expected key=\"value\""))?;
        let (value, rest) = rest
            .split_once('"')
            .ok_or_else(|| markup_error("unterminated attribute value"))?;
        attributes.set(key.trim(), value);
        source = rest;
    }
}
