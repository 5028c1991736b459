//! The input handler: mutation batches and keydowns in, model changes out.

use web_time::Instant;

use crate::apply::{apply_batch, delete_content, plan_batch};
use crate::buffer::{ChangeBuffer, TypingBuffer};
use crate::command::InputCommand;
use crate::config::InputConfig;
use crate::error::InputError;
use crate::events::ViewEvent;
use crate::gate::{GateDecision, GateState, KeyEvent, KeystrokeGate};
use crate::model::EditorModel;
use crate::mutation::{MutationRecord, normalize};
use crate::selection::SelectionTarget;
use crate::types::{BatchId, ModelPosition, ModelRange, SelectionHint};
use crate::view::ViewMapper;

/// What a handled mutation batch did to the model.
#[derive(Debug, Clone)]
pub struct EditSummary {
    /// Undo step the change was recorded under.
    pub batch: BatchId,
    /// Records that became text changes.
    pub applied: usize,
    /// Records dropped as unsupported.
    pub dropped: usize,
    /// Chars inserted.
    pub inserted: usize,
    /// Chars removed.
    pub deleted: usize,
    /// Selection set after the change.
    pub selection: Option<SelectionTarget<ModelPosition>>,
    /// When the change was applied.
    pub timestamp: Instant,
}

impl PartialEq for EditSummary {
    fn eq(&self, other: &Self) -> bool {
        // Compare all fields except timestamp
        self.batch == other.batch
            && self.applied == other.applied
            && self.dropped == other.dropped
            && self.inserted == other.inserted
            && self.deleted == other.deleted
            && self.selection == other.selection
    }
}

impl Eq for EditSummary {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The input command is disabled.
    Ignored,
    /// Nothing to write: every record was unsupported or a no-op.
    Unchanged { dropped: usize },
    Applied(EditSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownOutcome {
    /// The input command is disabled.
    Ignored,
    Composing,
    NonPrintable,
    CollapsedSelection,
    /// The selected range was removed ahead of the browser's insertion.
    SelectionDeleted(ModelRange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The input command is disabled.
    Ignored,
    /// The selection is where the handler itself last put it.
    OwnChange,
    /// The user moved the selection; the typing batch was closed.
    Moved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Mutations(MutationOutcome),
    Keydown(KeydownOutcome),
    Selection(SelectionOutcome),
    /// Composition start/end; the gate state afterwards.
    Composition(GateState),
}

/// Reconciles view input with an [`EditorModel`].
///
/// The handler owns the input command, the keystroke gate and the change
/// buffer. The model and the view mapper are passed in per call, so the host
/// stays free to re-render between events.
#[derive(Debug, Clone)]
pub struct InputHandler<B: ChangeBuffer = TypingBuffer> {
    config: InputConfig,
    command: InputCommand,
    gate: KeystrokeGate,
    buffer: B,
    /// Selection (anchor, focus) written by the last handled change.
    last_selection: Option<(ModelPosition, ModelPosition)>,
}

impl InputHandler<TypingBuffer> {
    pub fn new(config: InputConfig) -> Self {
        let buffer = TypingBuffer::new(config.undo_step_size);
        Self::with_buffer(config, buffer)
    }
}

impl Default for InputHandler<TypingBuffer> {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

impl<B: ChangeBuffer> InputHandler<B> {
    pub fn with_buffer(config: InputConfig, buffer: B) -> Self {
        Self {
            command: InputCommand::new(config.enabled),
            gate: KeystrokeGate::new(config.composition_grace()),
            config,
            buffer,
            last_selection: None,
        }
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn command(&self) -> &InputCommand {
        &self.command
    }

    pub fn command_mut(&mut self) -> &mut InputCommand {
        &mut self.command
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Handle one mutation observer flush.
    ///
    /// Records are normalized, planned against `view` (the render the
    /// records were observed on) and applied as one model change in the
    /// buffer's current batch. A mapping failure aborts before anything is
    /// written; a model error rolls the change back. Both are returned.
    pub fn handle_mutations<M: EditorModel, V: ViewMapper>(
        &mut self,
        model: &mut M,
        view: &V,
        records: &[MutationRecord],
        hint: Option<&SelectionHint>,
    ) -> Result<MutationOutcome, InputError> {
        if !self.command.is_enabled() {
            tracing::trace!(records = records.len(), "input disabled, ignoring mutations");
            return Ok(MutationOutcome::Ignored);
        }
        self.gate.mutations_observed();

        let mutations = normalize(records, self.config.nbsp);
        let dropped = records.len() - mutations.len();
        if mutations.is_empty() {
            tracing::debug!(dropped, "no supported mutations in batch");
            return Ok(MutationOutcome::Unchanged { dropped });
        }

        let attributes = model.selection().attributes;
        let planned = plan_batch(&mutations, view, hint, &attributes).inspect_err(|err| {
            tracing::warn!(error = %err, "aborting mutation batch");
        })?;
        if planned.is_empty() {
            return Ok(MutationOutcome::Unchanged { dropped });
        }

        let batch = self.buffer.batch();
        model
            .change(batch, |writer| apply_batch(writer, &planned))
            .inspect_err(|err| tracing::warn!(error = %err, "mutation batch rolled back"))?;

        let inserted = planned.inserted_chars();
        self.buffer.input(inserted);
        self.remember_selection(model);

        let summary = EditSummary {
            batch,
            applied: mutations.len(),
            dropped,
            inserted,
            deleted: planned.deleted_chars(),
            selection: planned.selection,
            timestamp: Instant::now(),
        };
        tracing::debug!(
            batch = batch.0,
            applied = summary.applied,
            dropped,
            inserted,
            deleted = summary.deleted,
            "applied mutation batch"
        );
        Ok(MutationOutcome::Applied(summary))
    }

    /// Handle a keydown, removing a non-collapsed selection before a
    /// printable key can replace it.
    pub fn handle_keydown<M: EditorModel>(
        &mut self,
        model: &mut M,
        event: &KeyEvent,
    ) -> Result<KeydownOutcome, InputError> {
        if !self.command.is_enabled() {
            return Ok(KeydownOutcome::Ignored);
        }

        let selection = model.selection();
        match self.gate.keydown(event, selection.is_collapsed()) {
            GateDecision::Composing => Ok(KeydownOutcome::Composing),
            GateDecision::NonPrintable => Ok(KeydownOutcome::NonPrintable),
            GateDecision::CollapsedSelection => Ok(KeydownOutcome::CollapsedSelection),
            GateDecision::DeleteSelection => {
                let range = selection.range();
                self.delete_selection(model, range)?;
                self.gate.selection_deleted();
                Ok(KeydownOutcome::SelectionDeleted(range))
            }
        }
    }

    fn delete_selection<M: EditorModel>(
        &mut self,
        model: &mut M,
        range: ModelRange,
    ) -> Result<(), InputError> {
        tracing::debug!(start = %range.start, end = %range.end, "removing selection before input");

        self.buffer.lock();
        let batch = self.buffer.batch();
        let result = model.change(batch, |writer| {
            delete_content(writer, range)?;
            writer.set_selection(range.start, range.start)
        });
        // Collapsing the selection is part of the typing step, not a move.
        self.buffer.selection_changed();
        self.buffer.unlock();

        result.inspect_err(|err| tracing::warn!(error = %err, "selection removal failed"))?;
        self.remember_selection(model);
        Ok(())
    }

    /// The model selection changed outside of input handling.
    ///
    /// A selection equal to the one the handler last wrote is an echo of its
    /// own change and keeps the typing batch open. Anything else closes it.
    pub fn selection_changed<M: EditorModel>(&mut self, model: &M) -> SelectionOutcome {
        if !self.command.is_enabled() {
            return SelectionOutcome::Ignored;
        }
        let selection = model.selection();
        if self.last_selection == Some((selection.anchor, selection.focus)) {
            tracing::trace!(focus = %selection.focus, "selection echo of own change");
            return SelectionOutcome::OwnChange;
        }
        tracing::trace!(
            anchor = %selection.anchor,
            focus = %selection.focus,
            "selection moved, closing typing batch"
        );
        self.last_selection = None;
        self.buffer.selection_changed();
        SelectionOutcome::Moved
    }

    /// Someone changed the document under `batch`.
    pub fn document_changed(&mut self, batch: BatchId) {
        self.buffer.document_changed(batch);
    }

    fn remember_selection<M: EditorModel>(&mut self, model: &M) {
        let selection = model.selection();
        self.last_selection = Some((selection.anchor, selection.focus));
    }

    pub fn composition_start(&mut self) -> GateState {
        self.gate.composition_start();
        self.gate.state()
    }

    pub fn composition_end(&mut self) -> GateState {
        self.gate.composition_end();
        self.gate.state()
    }

    /// Dispatch a [`ViewEvent`] to the matching handler.
    pub fn handle_event<M: EditorModel, V: ViewMapper>(
        &mut self,
        model: &mut M,
        view: &V,
        event: &ViewEvent,
    ) -> Result<EventOutcome, InputError> {
        match event {
            ViewEvent::Mutations { records, hint } => self
                .handle_mutations(model, view, records, hint.as_ref())
                .map(EventOutcome::Mutations),
            ViewEvent::Keydown(key) => self
                .handle_keydown(model, key)
                .map(EventOutcome::Keydown),
            ViewEvent::SelectionChange => {
                Ok(EventOutcome::Selection(self.selection_changed(model)))
            }
            ViewEvent::CompositionStart => Ok(EventOutcome::Composition(self.composition_start())),
            ViewEvent::CompositionEnd => Ok(EventOutcome::Composition(self.composition_end())),
        }
    }
}
