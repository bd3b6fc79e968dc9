use serde::{Deserialize, Serialize};

/// Direction of a raw key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Down,
    Up,
}

/// Modifier keys held at the time an event was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeldMods {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub win: bool,
}

impl HeldMods {
    pub const fn none() -> Self {
        Self {
            ctrl: false,
            shift: false,
            alt: false,
            win: false,
        }
    }

    /// True when a system-shortcut modifier is held. Shift does not count.
    pub const fn system_held(&self) -> bool {
        self.ctrl || self.alt || self.win
    }
}

/// One key event as delivered by the OS boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    /// Virtual-key code.
    pub vk: u16,
    pub edge: KeyEdge,
    /// Set for events synthesized by software, including our own output.
    pub injected: bool,
    pub mods: HeldMods,
}

/// Host-side effect to perform against the focused application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectOp {
    /// Type a literal string.
    Text(String),
    /// Send this many backspace keystrokes, paced individually.
    Backspace(u32),
    /// Ask the host to delete the word before the caret (Ctrl+Backspace).
    DeleteWord,
    /// Send a line break.
    Enter,
    /// Wait before the next op, in milliseconds.
    Delay(u64),
}

/// Verdict for one raw key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Let the event through to the focused application.
    Pass,
    /// Swallow the event.
    Suppress,
    /// Swallow the event and perform these host side effects.
    Inject(Vec<InjectOp>),
}

/// Result of a completed chord, classified against the mapping tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordOutcome {
    /// Semantic token, resolved from the static table.
    Token(&'static str),
    /// Phonemic fragment (consonant and/or vowel).
    Phoneme(String),
    /// Literal characters, one per chord key, text mode only.
    Literal(String),
    /// Delete the last buffered unit or run character.
    Backspace,
    /// Commit a line break.
    Enter,
    /// Switch between semantic and the configured alternate mode.
    ToggleMode,
    /// Show the reference card for the current mode.
    Reference,
    /// Keys held but the codes resolve to nothing; rejected.
    Invalid,
    /// Keys held but no side contributed a code.
    Empty,
}

/// Interpretation applied to completed chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Semantic,
    Phonemic,
    Text,
}

/// Feedback event for a host UI (tray, overlay, audio cue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    EnabledChanged(bool),
    ModeChanged(Mode),
    /// Current buffer rendering, updated on every mutation.
    BufferChanged(String),
    /// A chord resolved to nothing; candidate for an error tone.
    ChordRejected,
    ExpansionStarted,
    ExpansionFailed(String),
    /// Rendered reference card for the active mode.
    Reference(String),
}
