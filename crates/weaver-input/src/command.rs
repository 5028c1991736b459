//! The input command: the host's switch for typing.

/// Enable flag checked before any keydown or mutation is handled.
///
/// Hosts disable it for read-only mode or while another feature owns the
/// document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputCommand {
    enabled: bool,
}

impl Default for InputCommand {
    fn default() -> Self {
        Self::new(true)
    }
}

impl InputCommand {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::debug!(enabled, "input command toggled");
        }
        self.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_by_default() {
        let mut command = InputCommand::default();
        assert!(command.is_enabled());
        command.set_enabled(false);
        assert!(!command.is_enabled());
    }
}
