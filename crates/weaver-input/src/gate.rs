//! Keystroke gate.
//!
//! When a printable key is pressed over a non-collapsed selection, the
//! selected content has to go before the browser inserts the new character,
//! otherwise the mutation observer sees a replacement it cannot map cleanly.
//! The gate decides when that pre-deletion happens and keeps out of the way
//! while an IME composition is running.

use std::time::Duration;

use web_time::Instant;

/// Key code browsers report for keydowns that belong to an IME composition.
pub const COMPOSITION_KEY_CODE: u32 = 229;

/// Key codes that never produce text.
const SAFE_KEY_CODES: &[u32] = &[
    9,   // Tab
    16,  // Shift
    17,  // Ctrl
    18,  // Alt
    19,  // Pause
    20,  // CapsLock
    27,  // Escape
    33,  // PageUp
    34,  // PageDown
    35,  // End
    36,  // Home
    37,  // ArrowLeft
    38,  // ArrowUp
    39,  // ArrowRight
    40,  // ArrowDown
    45,  // Insert
    91,  // Meta / OS key
    93,  // Context menu
    144, // NumLock
    145, // ScrollLock
    173, // Mute
    174, // Volume down
    175, // Volume up
    176, // Next track
    177, // Previous track
    178, // Stop
    179, // Play/pause
    255, // Display brightness
];

/// F1 to F24.
const FUNCTION_KEYS: std::ops::RangeInclusive<u32> = 112..=135;

/// The parts of a keydown the gate looks at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: u32,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key_code: u32) -> Self {
        Self {
            key_code,
            ..Self::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn is_composition(&self) -> bool {
        self.key_code == COMPOSITION_KEY_CODE
    }
}

/// Whether `event` cannot insert text.
///
/// Ctrl and Meta combinations are shortcuts. Alt is not: AltGr combinations
/// produce characters on many layouts.
pub fn is_safe_keystroke(event: &KeyEvent) -> bool {
    event.ctrl
        || event.meta
        || SAFE_KEY_CODES.contains(&event.key_code)
        || FUNCTION_KEYS.contains(&event.key_code)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GateState {
    #[default]
    Idle,
    /// Between compositionstart and compositionend. Keydowns are ignored.
    Composing,
    /// The selection was removed on keydown; the browser's insertion has not
    /// been observed yet. The next keydown drops back to `Idle`.
    AwaitingMutation,
}

/// What the gate wants done with a keydown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// A composition is running (or just started). Leave it alone.
    Composing,
    /// The key cannot insert text.
    NonPrintable,
    /// Nothing selected, the browser's insertion maps cleanly.
    CollapsedSelection,
    /// Remove the selected content now.
    DeleteSelection,
}

#[derive(Clone, Debug)]
pub struct KeystrokeGate {
    state: GateState,
    composition_ended_at: Option<Instant>,
    grace: Duration,
}

impl Default for KeystrokeGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl KeystrokeGate {
    /// `grace` is how long after compositionend a composition keydown is
    /// still treated as part of the finished composition. Safari fires one.
    pub fn new(grace: Duration) -> Self {
        Self {
            state: GateState::Idle,
            composition_ended_at: None,
            grace,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn keydown(&mut self, event: &KeyEvent, selection_collapsed: bool) -> GateDecision {
        self.keydown_at(event, selection_collapsed, Instant::now())
    }

    pub fn keydown_at(
        &mut self,
        event: &KeyEvent,
        selection_collapsed: bool,
        now: Instant,
    ) -> GateDecision {
        if self.state == GateState::Composing {
            return GateDecision::Composing;
        }
        if self.state == GateState::AwaitingMutation {
            // The key produced no text (e.g. the browser cancelled it).
            tracing::debug!("no mutation since selection removal");
            self.transition(GateState::Idle);
        }

        if event.is_composition() {
            if self.just_ended_composition(now) {
                tracing::debug!("ignoring composition keydown right after compositionend");
                return GateDecision::NonPrintable;
            }
            self.transition(GateState::Composing);
            return GateDecision::Composing;
        }

        if is_safe_keystroke(event) {
            return GateDecision::NonPrintable;
        }
        if selection_collapsed {
            return GateDecision::CollapsedSelection;
        }
        GateDecision::DeleteSelection
    }

    /// The pre-deletion for a [`GateDecision::DeleteSelection`] went through.
    pub fn selection_deleted(&mut self) {
        self.transition(GateState::AwaitingMutation);
    }

    pub fn composition_start(&mut self) {
        self.transition(GateState::Composing);
    }

    pub fn composition_end(&mut self) {
        self.composition_end_at(Instant::now());
    }

    pub fn composition_end_at(&mut self, now: Instant) {
        self.composition_ended_at = Some(now);
        self.transition(GateState::Idle);
    }

    /// A mutation batch arrived.
    pub fn mutations_observed(&mut self) {
        if self.state == GateState::AwaitingMutation {
            self.transition(GateState::Idle);
        }
    }

    fn just_ended_composition(&self, now: Instant) -> bool {
        self.composition_ended_at
            .is_some_and(|ended| now.duration_since(ended) < self.grace)
    }

    fn transition(&mut self, to: GateState) {
        if self.state != to {
            tracing::debug!(from = ?self.state, ?to, "keystroke gate");
            self.state = to;
        }
    }
}
