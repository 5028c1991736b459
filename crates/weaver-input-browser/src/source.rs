//! Wiring a contenteditable root to an input [`EventChannel`].

use gloo_events::EventListener;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use weaver_input::{EventChannel, ViewEvent};

use crate::dom::window_selection_hint;
use crate::events::key_event_from_dom;
use crate::mutations::convert_records;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("failed to create mutation observer: {0}")]
    Observer(String),
    #[error("failed to observe editing root: {0}")]
    Observe(String),
}

type MutationCallback = Closure<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>;

/// Observes an editing root and emits its mutations, keydowns, selection
/// changes and composition events as [`ViewEvent`]s.
///
/// Everything is detached when the source is dropped.
pub struct DomInputSource {
    observer: web_sys::MutationObserver,
    channel: EventChannel<ViewEvent>,
    _on_mutations: MutationCallback,
    _listeners: Vec<EventListener>,
}

impl DomInputSource {
    pub fn attach(
        root: &web_sys::Element,
        channel: EventChannel<ViewEvent>,
    ) -> Result<Self, SourceError> {
        let on_mutations: MutationCallback = {
            let channel = channel.clone();
            Closure::new(move |records: js_sys::Array, _: web_sys::MutationObserver| {
                emit_mutations(&channel, &records);
            })
        };

        let observer = web_sys::MutationObserver::new(on_mutations.as_ref().unchecked_ref())
            .map_err(|e| SourceError::Observer(format!("{e:?}")))?;
        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_character_data(true);
        init.set_character_data_old_value(true);
        init.set_subtree(true);
        observer
            .observe_with_options(root, &init)
            .map_err(|e| SourceError::Observe(format!("{e:?}")))?;

        let keydown = {
            let channel = channel.clone();
            EventListener::new(root, "keydown", move |event| {
                if let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() {
                    channel.emit(&ViewEvent::Keydown(key_event_from_dom(event)));
                }
            })
        };
        let composition_start = {
            let channel = channel.clone();
            EventListener::new(root, "compositionstart", move |_| {
                channel.emit(&ViewEvent::CompositionStart);
            })
        };
        let composition_end = {
            let channel = channel.clone();
            EventListener::new(root, "compositionend", move |_| {
                channel.emit(&ViewEvent::CompositionEnd);
            })
        };

        let mut listeners = vec![keydown, composition_start, composition_end];
        // selectionchange only fires on the document.
        if let Some(document) = root.owner_document() {
            let channel = channel.clone();
            let root = root.clone();
            listeners.push(EventListener::new(&document, "selectionchange", move |_| {
                if selection_inside(&root) {
                    channel.emit(&ViewEvent::SelectionChange);
                }
            }));
        }

        tracing::debug!(root = %root.id(), "input source attached");
        Ok(Self {
            observer,
            channel,
            _on_mutations: on_mutations,
            _listeners: listeners,
        })
    }

    /// Deliver pending mutations now instead of waiting for the observer
    /// callback. Returns the number of records taken.
    pub fn flush(&self) -> u32 {
        let records = self.observer.take_records();
        let taken = records.length();
        if taken > 0 {
            emit_mutations(&self.channel, &records);
        }
        taken
    }

    /// Drop pending mutations, e.g. the ones caused by re-rendering the
    /// view from the model.
    pub fn discard_pending(&self) -> u32 {
        let taken = self.observer.take_records().length();
        if taken > 0 {
            tracing::trace!(taken, "discarded pending mutations");
        }
        taken
    }
}

impl Drop for DomInputSource {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

fn emit_mutations(channel: &EventChannel<ViewEvent>, records: &js_sys::Array) {
    let converted = convert_records(records);
    if converted.is_empty() {
        tracing::trace!(observed = records.length(), "no input mutations in flush");
        return;
    }
    channel.emit(&ViewEvent::Mutations {
        records: converted,
        hint: window_selection_hint(),
    });
}

fn selection_inside(root: &web_sys::Element) -> bool {
    let anchor = web_sys::window()
        .and_then(|window| window.get_selection().ok().flatten())
        .and_then(|selection| selection.anchor_node());
    anchor.is_some_and(|node| root.contains(Some(&node)))
}
