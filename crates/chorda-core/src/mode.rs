use crate::buffer::EditBuffer;
use crate::types::Mode;

/// Governs which interpretation completed chords receive.
///
/// Only two modes are ever reachable: semantic and one configured
/// alternate (phonemic or text). Leaving text mode folds any open literal
/// run into the buffer before the switch.
#[derive(Debug)]
pub struct ModeController {
    mode: Mode,
    alternate: Mode,
}

impl ModeController {
    pub fn new(alternate: Mode) -> Self {
        // Semantic cannot be its own alternate.
        let alternate = if alternate == Mode::Semantic {
            Mode::Phonemic
        } else {
            alternate
        };
        Self {
            mode: Mode::Semantic,
            alternate,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches to the given mode. Returns false when already there.
    pub fn force(&mut self, mode: Mode, buffer: &mut EditBuffer) -> bool {
        if self.mode == mode {
            return false;
        }
        if self.mode == Mode::Text {
            buffer.fold_run();
        }
        self.mode = mode;
        true
    }

    /// Cycles between semantic and the configured alternate.
    pub fn toggle(&mut self, buffer: &mut EditBuffer) -> Mode {
        let next = if self.mode == Mode::Semantic {
            self.alternate
        } else {
            Mode::Semantic
        };
        self.force(next, buffer);
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Unit;

    #[test]
    fn toggle_cycles_semantic_and_alternate() {
        let mut buffer = EditBuffer::new();
        let mut modes = ModeController::new(Mode::Text);
        assert_eq!(modes.mode(), Mode::Semantic);
        assert_eq!(modes.toggle(&mut buffer), Mode::Text);
        assert_eq!(modes.toggle(&mut buffer), Mode::Semantic);

        let mut modes = ModeController::new(Mode::Phonemic);
        assert_eq!(modes.toggle(&mut buffer), Mode::Phonemic);
    }

    #[test]
    fn semantic_alternate_falls_back_to_phonemic() {
        let mut buffer = EditBuffer::new();
        let mut modes = ModeController::new(Mode::Semantic);
        assert_eq!(modes.toggle(&mut buffer), Mode::Phonemic);
    }

    #[test]
    fn leaving_text_folds_the_open_run() {
        let mut buffer = EditBuffer::new();
        let mut modes = ModeController::new(Mode::Text);
        modes.toggle(&mut buffer);
        buffer.push_literal("hel");

        assert_eq!(modes.toggle(&mut buffer), Mode::Semantic);
        assert!(!buffer.run_in_progress());
        assert_eq!(buffer.unit_count(), 1);
        assert_eq!(buffer.pop_last(), Some(Unit::Literal("hel".into())));
    }

    #[test]
    fn forcing_the_current_mode_changes_nothing() {
        let mut buffer = EditBuffer::new();
        let mut modes = ModeController::new(Mode::Text);
        assert!(!modes.force(Mode::Semantic, &mut buffer));

        modes.toggle(&mut buffer);
        buffer.push_literal("ab");
        // An external request back to semantic folds exactly like the chord.
        assert!(modes.force(Mode::Semantic, &mut buffer));
        assert!(!buffer.run_in_progress());
        assert_eq!(buffer.unit_count(), 1);
    }
}
