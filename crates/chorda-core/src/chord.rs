use crate::keymap::{self, ClusterKey, Hand};
use crate::tables;
use crate::types::{ChordOutcome, Mode};
use tracing::trace;

/// Chord recognition state machine.
///
/// Tracks which cluster keys are physically held and which have been part of
/// the chord since it began. A chord starts on the first key-down while idle
/// and fires once every held key has been released, so keys may be rolled on
/// and off in any order. The fired result depends only on the accumulated
/// key set of each hand.
#[derive(Debug, Default)]
pub struct ChordEngine {
    held_left: u8,
    held_right: u8,
    chord_left: u8,
    chord_right: u8,
    active: bool,
}

impl ChordEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a cluster key press. Repeated downs for a held key (OS
    /// key-repeat) change nothing.
    pub fn key_down(&mut self, key: ClusterKey) {
        if !self.active {
            self.active = true;
            self.chord_left = 0;
            self.chord_right = 0;
        }
        match key.hand {
            Hand::Left => {
                self.held_left |= key.mask();
                self.chord_left |= key.mask();
            }
            Hand::Right => {
                self.held_right |= key.mask();
                self.chord_right |= key.mask();
            }
        }
    }

    /// Records a cluster key release. Returns the chord outcome when this
    /// release empties the held set. Releases of keys that never joined the
    /// chord (e.g. pressed before capture was enabled) are ignored.
    pub fn key_up(&mut self, key: ClusterKey, mode: Mode) -> Option<ChordOutcome> {
        let held = match key.hand {
            Hand::Left => &mut self.held_left,
            Hand::Right => &mut self.held_right,
        };
        if *held & key.mask() == 0 {
            return None;
        }
        *held &= !key.mask();

        if !self.active || self.held_left != 0 || self.held_right != 0 {
            return None;
        }
        self.active = false;
        let outcome = self.resolve(mode);
        trace!(
            "chord fired: left={:05b} right={:05b} -> {:?}",
            self.chord_left,
            self.chord_right,
            outcome
        );
        Some(outcome)
    }

    /// True while at least one chord key is held.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Drops any in-progress chord without firing.
    pub fn reset(&mut self) {
        self.held_left = 0;
        self.held_right = 0;
        self.chord_left = 0;
        self.chord_right = 0;
        self.active = false;
    }

    fn resolve(&self, mode: Mode) -> ChordOutcome {
        let pair = (self.chord_left, self.chord_right);
        // Control chords win over every mode-specific interpretation.
        match pair {
            tables::CONTROL_BACKSPACE => return ChordOutcome::Backspace,
            tables::CONTROL_ENTER => return ChordOutcome::Enter,
            tables::CONTROL_TOGGLE_MODE => return ChordOutcome::ToggleMode,
            tables::CONTROL_REFERENCE => return ChordOutcome::Reference,
            _ => {}
        }

        let (left, right) = pair;
        match mode {
            Mode::Semantic => match tables::semantic_token(left, right) {
                Some(token) => ChordOutcome::Token(token),
                None => ChordOutcome::Invalid,
            },
            Mode::Phonemic => {
                let mut fragment = String::new();
                if left != 0 {
                    match tables::consonant(left) {
                        Some(c) => fragment.push_str(c),
                        None => return ChordOutcome::Invalid,
                    }
                }
                if right != 0 {
                    match tables::vowel(right) {
                        Some(v) => fragment.push_str(v),
                        None => return ChordOutcome::Invalid,
                    }
                }
                if fragment.is_empty() {
                    ChordOutcome::Empty
                } else {
                    ChordOutcome::Phoneme(fragment)
                }
            }
            Mode::Text => {
                let mut run = String::new();
                for bit in keymap::left_bits(left) {
                    run.push(keymap::key_char(Hand::Left, bit));
                }
                for bit in keymap::right_bits(right) {
                    run.push(keymap::key_char(Hand::Right, bit));
                }
                ChordOutcome::Literal(run)
            }
        }
    }
}
