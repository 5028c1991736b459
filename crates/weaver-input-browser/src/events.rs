//! Keyboard events from the DOM.

use weaver_input::KeyEvent;
use weaver_input::gate::COMPOSITION_KEY_CODE;

/// Key code and modifiers of a DOM keydown.
///
/// Keydowns flagged `isComposing` are reported with the composition key
/// code, since Safari delivers the real code for them.
pub fn key_event_from_dom(event: &web_sys::KeyboardEvent) -> KeyEvent {
    let key_code = if event.is_composing() {
        COMPOSITION_KEY_CODE
    } else {
        event.key_code()
    };

    let mut key = KeyEvent::new(key_code);
    if event.ctrl_key() {
        key = key.with_ctrl();
    }
    if event.meta_key() {
        key = key.with_meta();
    }
    if event.alt_key() {
        key = key.with_alt();
    }
    if event.shift_key() {
        key = key.with_shift();
    }
    key
}
