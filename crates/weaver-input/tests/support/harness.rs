use weaver_input::{
    InputConfig, InputError, InputHandler, KeyEvent, KeydownOutcome, ModelOp, ModelPosition,
    MutationOutcome, MutationRecord, PlainModel, PlainView, SelectionHint, SelectionOutcome,
};

use super::logging_buffer::LoggingBuffer;

/// Model, view and handler, re-rendering the view after every handled event
/// the way a host editor would.
pub struct Editor {
    pub model: PlainModel,
    pub view: PlainView,
    pub handler: InputHandler<LoggingBuffer>,
}

impl Editor {
    pub fn new(markup: &str) -> Self {
        Self::with_config(markup, InputConfig::default())
    }

    pub fn with_config(markup: &str, config: InputConfig) -> Self {
        super::init_tracing();
        let model = PlainModel::from_markup(markup)
            .expect("valid markup")
            .with_max_undo_steps(config.max_undo_steps);
        let view = PlainView::render(&model);
        let buffer = LoggingBuffer::new(config.undo_step_size);
        Self {
            model,
            view,
            handler: InputHandler::with_buffer(config, buffer),
        }
    }

    pub fn mutate(
        &mut self,
        records: &[MutationRecord],
        hint: Option<&SelectionHint>,
    ) -> Result<MutationOutcome, InputError> {
        let outcome = self
            .handler
            .handle_mutations(&mut self.model, &self.view, records, hint);
        self.render();
        outcome
    }

    pub fn keydown(&mut self, event: KeyEvent) -> Result<KeydownOutcome, InputError> {
        let outcome = self.handler.handle_keydown(&mut self.model, &event);
        self.render();
        outcome
    }

    /// Move the caret the way a click or arrow key would.
    pub fn move_caret(&mut self, to: ModelPosition) -> SelectionOutcome {
        self.select(to, to)
    }

    pub fn select(&mut self, anchor: ModelPosition, focus: ModelPosition) -> SelectionOutcome {
        self.model
            .set_selection_range(anchor, focus)
            .expect("selection inside the document");
        self.render();
        self.handler.selection_changed(&self.model)
    }

    pub fn render(&mut self) {
        self.view = PlainView::render(&self.model);
    }

    pub fn markup(&self) -> String {
        self.model.to_markup()
    }

    pub fn ops(&self) -> &[ModelOp] {
        self.model.ops()
    }

    /// One line per recorded model op, for snapshots.
    pub fn op_lines(&self) -> Vec<String> {
        self.ops().iter().map(describe_op).collect()
    }
}

pub fn describe_op(op: &ModelOp) -> String {
    match op {
        ModelOp::Insert {
            at,
            text,
            attributes,
        } => {
            let attrs: Vec<String> = attributes.iter().map(|(k, v)| format!("{k}={v}")).collect();
            if attrs.is_empty() {
                format!("insert {at} {text:?}")
            } else {
                format!("insert {at} {text:?} [{}]", attrs.join(" "))
            }
        }
        ModelOp::Remove(range) => format!("remove {}..{}", range.start, range.end),
        ModelOp::Merge(block) => format!("merge {block}"),
        ModelOp::Select { anchor, focus } => format!("select {anchor}..{focus}"),
    }
}
