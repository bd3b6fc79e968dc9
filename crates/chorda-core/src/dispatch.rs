//! Event dispatch: the single-threaded owner of the chord engine, edit
//! buffer and mode state.
//!
//! One `Dispatcher` lives on the thread that receives OS key events. It
//! turns each raw event into a pass/suppress/inject verdict, feeds the
//! expansion worker on flush, and drains worker results via [`Dispatcher::pump`]
//! on the same thread.

use crate::buffer::{Deletion, EditBuffer, Unit};
use crate::chord::ChordEngine;
use crate::config::Settings;
use crate::expand::{ExpansionJob, ExpansionWorker, ServiceConfig};
use crate::keymap::{self, VK_BACK, VK_SPACE};
use crate::mode::ModeController;
use crate::tables;
use crate::types::{ChordOutcome, HookAction, InjectOp, KeyEdge, Mode, Notification, RawKeyEvent};
use tracing::{debug, info, warn};

pub type Waker = Box<dyn Fn() + Send + Sync>;
pub type Notifier = Box<dyn Fn(Notification) + Send>;

pub struct Dispatcher {
    engine: ChordEngine,
    buffer: EditBuffer,
    modes: ModeController,
    worker: ExpansionWorker,
    settings: Settings,
    enabled: bool,
    converting: bool,
    pending_chars: usize,
    notifier: Option<Notifier>,
}

impl Dispatcher {
    /// Builds a dispatcher with no waker; results are found by polling
    /// [`pump`](Self::pump).
    pub fn new(settings: Settings) -> Self {
        Self::with_waker(settings, None)
    }

    /// Builds a dispatcher whose expansion worker runs `waker` after each
    /// finished job, so the owning thread knows to call
    /// [`pump`](Self::pump). Capture starts disabled.
    pub fn with_waker(settings: Settings, waker: Option<Waker>) -> Self {
        let worker = ExpansionWorker::spawn(ServiceConfig::from(&settings), waker);
        Self {
            engine: ChordEngine::new(),
            buffer: EditBuffer::new(),
            modes: ModeController::new(settings.alternate_mode),
            worker,
            settings,
            enabled: false,
            converting: false,
            pending_chars: 0,
            notifier: None,
        }
    }

    pub fn set_notifier(&mut self, notifier: impl Fn(Notification) + Send + 'static) {
        self.notifier = Some(Box::new(notifier));
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn buffer_display(&self) -> String {
        self.buffer.display()
    }

    /// Decides what happens to one raw key event.
    pub fn on_event(&mut self, event: RawKeyEvent) -> HookAction {
        // Never touch our own injected output.
        if event.injected {
            return HookAction::Pass;
        }

        // The toggle hotkey works even while disabled.
        if event.vk == self.settings.toggle_vk
            && event.mods.alt
            && event.edge == KeyEdge::Down
        {
            self.set_enabled(!self.enabled);
            return HookAction::Suppress;
        }

        if !self.enabled {
            return HookAction::Pass;
        }

        if keymap::is_modifier_vk(event.vk) || keymap::is_passthrough_vk(event.vk) {
            return HookAction::Pass;
        }

        // Leave system shortcuts (Ctrl+C, Alt+Tab, Win+...) alone.
        if event.mods.system_held() {
            return HookAction::Pass;
        }

        if let Some(key) = keymap::vk_to_cluster(event.vk) {
            if self.converting {
                return HookAction::Suppress;
            }
            return match event.edge {
                KeyEdge::Down => {
                    self.engine.key_down(key);
                    HookAction::Suppress
                }
                KeyEdge::Up => match self.engine.key_up(key, self.modes.mode()) {
                    Some(outcome) => self.apply_outcome(outcome),
                    None => HookAction::Suppress,
                },
            };
        }

        if event.vk == VK_SPACE {
            if self.converting || event.edge == KeyEdge::Up {
                return HookAction::Suppress;
            }
            // In text mode the space bar extends the literal run; the flush
            // trigger is only reachable from the chord-producing modes.
            if self.modes.mode() == Mode::Text {
                return self.commit_literal(" ");
            }
            if !self.buffer.is_empty() {
                self.request_expansion();
            }
            return HookAction::Suppress;
        }

        if event.vk == VK_BACK {
            if self.modes.mode() == Mode::Text
                && !self.converting
                && event.edge == KeyEdge::Down
            {
                return self.delete_last();
            }
            return HookAction::Suppress;
        }

        // Everything else is swallowed while capture is on.
        HookAction::Suppress
    }

    /// Drains one finished expansion, returning the host ops that replace
    /// the typed-out buffer with the expanded text. Results arriving after
    /// a reset are dropped.
    pub fn pump(&mut self) -> Option<Vec<InjectOp>> {
        let result = self.worker.try_recv()?;
        if !self.converting {
            debug!("stale expansion result dropped");
            return None;
        }
        self.converting = false;
        let pending = std::mem::take(&mut self.pending_chars);
        match result {
            Ok(text) => {
                info!("expansion applied ({} chars)", text.chars().count());
                let mut ops = Vec::new();
                if pending > 0 {
                    ops.push(InjectOp::Backspace(pending as u32));
                    ops.push(InjectOp::Delay(self.settings.replace_delay_ms));
                }
                ops.push(InjectOp::Text(text));
                Some(ops)
            }
            Err(err) => {
                // The tokens already typed stay where they are.
                warn!("expansion failed: {}", err);
                self.notify(Notification::ExpansionFailed(err.to_string()));
                None
            }
        }
    }

    /// Enables or disables capture. Disabling resets every piece of state,
    /// even mid-chord or mid-flush.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            if self.modes.force(Mode::Semantic, &mut self.buffer) {
                self.notify(Notification::ModeChanged(Mode::Semantic));
            }
            self.engine.reset();
            self.buffer.clear();
            self.converting = false;
            self.pending_chars = 0;
        }
        info!("capture toggled: {}", enabled);
        self.notify(Notification::EnabledChanged(enabled));
    }

    /// External request (tray, hotkey) to return to semantic mode. Folds an
    /// open literal run exactly like the toggle chord does.
    pub fn force_semantic(&mut self) {
        if self.modes.force(Mode::Semantic, &mut self.buffer) {
            self.notify(Notification::ModeChanged(Mode::Semantic));
            self.notify(Notification::BufferChanged(self.buffer.display()));
        }
    }

    fn apply_outcome(&mut self, outcome: ChordOutcome) -> HookAction {
        match outcome {
            ChordOutcome::Token(token) => self.commit_unit(Unit::Token(token.to_string())),
            ChordOutcome::Phoneme(fragment) => self.commit_unit(Unit::Phoneme(fragment)),
            ChordOutcome::Literal(chars) => self.commit_literal(&chars),
            ChordOutcome::Backspace => self.delete_last(),
            ChordOutcome::Enter => HookAction::Inject(vec![InjectOp::Enter]),
            ChordOutcome::ToggleMode => {
                let mode = self.modes.toggle(&mut self.buffer);
                debug!("mode toggled: {:?}", mode);
                self.notify(Notification::ModeChanged(mode));
                self.notify(Notification::BufferChanged(self.buffer.display()));
                HookAction::Suppress
            }
            ChordOutcome::Reference => {
                let card = tables::reference_card(self.modes.mode());
                self.notify(Notification::Reference(card));
                HookAction::Suppress
            }
            ChordOutcome::Invalid => {
                debug!("chord rejected");
                self.notify(Notification::ChordRejected);
                HookAction::Suppress
            }
            ChordOutcome::Empty => HookAction::Suppress,
        }
    }

    /// Types a completed unit, separated from the previous one by a space.
    fn commit_unit(&mut self, unit: Unit) -> HookAction {
        let mut typed = String::new();
        if !self.buffer.is_empty() {
            typed.push(' ');
        }
        typed.push_str(unit.text());
        debug!("unit committed: {}", unit.text());
        self.buffer.append(unit);
        self.notify(Notification::BufferChanged(self.buffer.display()));
        HookAction::Inject(vec![InjectOp::Text(typed)])
    }

    /// Types literal characters into the in-progress run. The first
    /// character after completed units gets the separator.
    fn commit_literal(&mut self, chars: &str) -> HookAction {
        let mut typed = String::new();
        if !self.buffer.run_in_progress() && !self.buffer.is_empty() {
            typed.push(' ');
        }
        typed.push_str(chars);
        self.buffer.push_literal(chars);
        self.notify(Notification::BufferChanged(self.buffer.display()));
        HookAction::Inject(vec![InjectOp::Text(typed)])
    }

    fn delete_last(&mut self) -> HookAction {
        let action = match self.buffer.delete_last() {
            Deletion::Chars(count) => HookAction::Inject(vec![InjectOp::Backspace(count as u32)]),
            Deletion::PrevWord => HookAction::Inject(vec![InjectOp::DeleteWord]),
        };
        self.notify(Notification::BufferChanged(self.buffer.display()));
        action
    }

    fn request_expansion(&mut self) {
        let mode = self.modes.mode();
        let (text, chars) = self.buffer.flush();
        if chars == 0 {
            return;
        }
        let job = match mode {
            // The service takes phonemes as one continuous string.
            Mode::Phonemic => ExpansionJob::Phonemes {
                ipa: text.split_whitespace().collect::<String>(),
                lang: self.settings.language.clone(),
            },
            Mode::Semantic | Mode::Text => {
                ExpansionJob::Tokens(text.split_whitespace().map(str::to_string).collect())
            }
        };
        info!("expansion requested ({} chars)", chars);
        self.worker.submit(job);
        self.converting = true;
        self.pending_chars = chars;
        self.notify(Notification::ExpansionStarted);
        self.notify(Notification::BufferChanged(String::new()));
    }

    fn notify(&self, notification: Notification) {
        if let Some(ref notifier) = self.notifier {
            notifier(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{VK_A, VK_C, VK_D, VK_F, VK_K, VK_M, VK_OEM_1, VK_Q, VK_S, VK_SHIFT};
    use crate::types::HeldMods;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn echo_settings() -> Settings {
        Settings {
            endpoint: String::new(),
            ..Settings::default()
        }
    }

    fn enabled() -> Dispatcher {
        let mut dispatcher = Dispatcher::new(echo_settings());
        dispatcher.set_enabled(true);
        dispatcher
    }

    fn down(vk: u16) -> RawKeyEvent {
        RawKeyEvent {
            vk,
            edge: KeyEdge::Down,
            injected: false,
            mods: HeldMods::none(),
        }
    }

    fn up(vk: u16) -> RawKeyEvent {
        RawKeyEvent {
            vk,
            edge: KeyEdge::Up,
            injected: false,
            mods: HeldMods::none(),
        }
    }

    /// Presses and releases the keys together; returns the final action.
    fn chord(dispatcher: &mut Dispatcher, vks: &[u16]) -> HookAction {
        for &vk in vks {
            dispatcher.on_event(down(vk));
        }
        let mut last = HookAction::Suppress;
        for &vk in vks {
            last = dispatcher.on_event(up(vk));
        }
        last
    }

    fn text_ops(action: &HookAction) -> String {
        match action {
            HookAction::Inject(ops) => ops
                .iter()
                .filter_map(|op| match op {
                    InjectOp::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
            _ => String::new(),
        }
    }

    fn pump_wait(dispatcher: &mut Dispatcher) -> Vec<InjectOp> {
        for _ in 0..200 {
            if let Some(ops) = dispatcher.pump() {
                return ops;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("no expansion result arrived");
    }

    #[test]
    fn starts_disabled_and_passes_everything() {
        let mut dispatcher = Dispatcher::new(echo_settings());
        assert!(!dispatcher.is_enabled());
        assert_eq!(dispatcher.on_event(down(VK_A)), HookAction::Pass);
        assert_eq!(dispatcher.on_event(up(VK_A)), HookAction::Pass);
    }

    #[test]
    fn alt_hotkey_toggles_capture() {
        let mut dispatcher = Dispatcher::new(echo_settings());
        let toggle = RawKeyEvent {
            vk: VK_Q,
            edge: KeyEdge::Down,
            injected: false,
            mods: HeldMods {
                alt: true,
                ..HeldMods::none()
            },
        };
        assert_eq!(dispatcher.on_event(toggle), HookAction::Suppress);
        assert!(dispatcher.is_enabled());
        // Plain Q without Alt is just another suppressed key now.
        assert_eq!(dispatcher.on_event(down(VK_Q)), HookAction::Suppress);
        assert_eq!(dispatcher.on_event(toggle), HookAction::Suppress);
        assert!(!dispatcher.is_enabled());
    }

    #[test]
    fn injected_events_always_pass() {
        let mut dispatcher = enabled();
        let event = RawKeyEvent {
            injected: true,
            ..down(VK_A)
        };
        assert_eq!(dispatcher.on_event(event), HookAction::Pass);
    }

    #[test]
    fn semantic_chords_type_tokens_with_separators() {
        let mut dispatcher = enabled();
        let action = chord(&mut dispatcher, &[VK_A, VK_OEM_1]);
        assert_eq!(text_ops(&action), "MAKE");
        let action = chord(&mut dispatcher, &[VK_S, VK_OEM_1]);
        assert_eq!(text_ops(&action), " THIS");
        assert_eq!(dispatcher.buffer_display(), "MAKE THIS");
    }

    #[test]
    fn modifier_passthrough_and_shortcut_keys_pass() {
        let mut dispatcher = enabled();
        assert_eq!(dispatcher.on_event(down(VK_SHIFT)), HookAction::Pass);
        assert_eq!(dispatcher.on_event(down(0x1B)), HookAction::Pass); // Esc
        assert_eq!(dispatcher.on_event(down(0x74)), HookAction::Pass); // F5
        let ctrl_a = RawKeyEvent {
            mods: HeldMods {
                ctrl: true,
                ..HeldMods::none()
            },
            ..down(VK_A)
        };
        assert_eq!(dispatcher.on_event(ctrl_a), HookAction::Pass);
    }

    #[test]
    fn unrelated_keys_are_swallowed() {
        let mut dispatcher = enabled();
        assert_eq!(dispatcher.on_event(down(0x42)), HookAction::Suppress); // B
        assert_eq!(dispatcher.on_event(up(0x42)), HookAction::Suppress);
    }

    #[test]
    fn space_flushes_and_echo_replaces_the_buffer() {
        let mut dispatcher = enabled();
        chord(&mut dispatcher, &[VK_A, VK_OEM_1]); // MAKE
        chord(&mut dispatcher, &[VK_S, VK_OEM_1]); // THIS
        assert_eq!(dispatcher.on_event(down(VK_SPACE)), HookAction::Suppress);

        let ops = pump_wait(&mut dispatcher);
        assert_eq!(
            ops,
            vec![
                InjectOp::Backspace(9),
                InjectOp::Delay(dispatcher.settings().replace_delay_ms),
                InjectOp::Text("MAKE THIS".to_string()),
            ]
        );
        assert_eq!(dispatcher.buffer_display(), "");
    }

    #[test]
    fn space_with_an_empty_buffer_does_nothing() {
        let mut dispatcher = enabled();
        assert_eq!(dispatcher.on_event(down(VK_SPACE)), HookAction::Suppress);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(dispatcher.pump(), None);
    }

    #[test]
    fn chords_are_ignored_while_converting() {
        let mut dispatcher = enabled();
        chord(&mut dispatcher, &[VK_A, VK_OEM_1]);
        dispatcher.on_event(down(VK_SPACE));

        // In flight: chord keys are swallowed without reaching the engine.
        assert_eq!(dispatcher.on_event(down(VK_A)), HookAction::Suppress);
        assert_eq!(dispatcher.on_event(up(VK_A)), HookAction::Suppress);

        pump_wait(&mut dispatcher);
        // Cleared: chords work again.
        let action = chord(&mut dispatcher, &[VK_S, VK_OEM_1]);
        assert_eq!(text_ops(&action), "THIS");
    }

    #[test]
    fn backspace_chord_erases_the_last_unit() {
        let mut dispatcher = enabled();
        chord(&mut dispatcher, &[VK_A, VK_OEM_1]); // MAKE
        chord(&mut dispatcher, &[VK_S, VK_OEM_1]); // THIS
        let action = chord(&mut dispatcher, &[VK_C, VK_M]);
        assert_eq!(
            action,
            HookAction::Inject(vec![InjectOp::Backspace(5)]) // "THIS" + separator
        );
        assert_eq!(dispatcher.buffer_display(), "MAKE");
    }

    #[test]
    fn backspace_chord_on_empty_buffer_deletes_previous_word() {
        let mut dispatcher = enabled();
        let action = chord(&mut dispatcher, &[VK_C, VK_M]);
        assert_eq!(action, HookAction::Inject(vec![InjectOp::DeleteWord]));
    }

    #[test]
    fn enter_chord_keeps_the_buffer() {
        let mut dispatcher = enabled();
        chord(&mut dispatcher, &[VK_A, VK_OEM_1]); // MAKE
        let action = chord(&mut dispatcher, &[VK_C, VK_OEM_1]);
        assert_eq!(action, HookAction::Inject(vec![InjectOp::Enter]));
        assert_eq!(dispatcher.buffer_display(), "MAKE");
    }

    #[test]
    fn text_mode_types_literals_and_flushes_after_toggling_back() {
        let mut dispatcher = enabled();
        chord(&mut dispatcher, &[VK_S, VK_C, VK_M]); // toggle
        assert_eq!(dispatcher.mode(), Mode::Text);

        let action = chord(&mut dispatcher, &[VK_D]);
        assert_eq!(text_ops(&action), "d");
        let action = chord(&mut dispatcher, &[VK_A]);
        assert_eq!(text_ops(&action), "a"); // run continues, no separator
        assert_eq!(dispatcher.buffer_display(), "da▌");

        chord(&mut dispatcher, &[VK_S, VK_C, VK_M]); // back to semantic
        assert_eq!(dispatcher.mode(), Mode::Semantic);
        assert_eq!(dispatcher.buffer_display(), "da");

        let action = chord(&mut dispatcher, &[VK_A, VK_OEM_1]);
        assert_eq!(text_ops(&action), " MAKE");

        dispatcher.on_event(down(VK_SPACE));
        let ops = pump_wait(&mut dispatcher);
        assert_eq!(
            ops,
            vec![
                InjectOp::Backspace(7),
                InjectOp::Delay(dispatcher.settings().replace_delay_ms),
                InjectOp::Text("da MAKE".to_string()),
            ]
        );
    }

    #[test]
    fn text_mode_space_extends_the_run() {
        let mut dispatcher = enabled();
        chord(&mut dispatcher, &[VK_S, VK_C, VK_M]);
        chord(&mut dispatcher, &[VK_D]);
        let action = dispatcher.on_event(down(VK_SPACE));
        assert_eq!(
            action,
            HookAction::Inject(vec![InjectOp::Text(" ".to_string())])
        );
        let action = chord(&mut dispatcher, &[VK_A]);
        assert_eq!(text_ops(&action), "a");
        assert_eq!(dispatcher.buffer_display(), "d a▌");
    }

    #[test]
    fn text_mode_backspace_edits_the_run() {
        let mut dispatcher = enabled();
        chord(&mut dispatcher, &[VK_S, VK_C, VK_M]);
        chord(&mut dispatcher, &[VK_D]);
        chord(&mut dispatcher, &[VK_A]);

        let action = dispatcher.on_event(down(VK_BACK));
        assert_eq!(action, HookAction::Inject(vec![InjectOp::Backspace(1)]));
        let action = dispatcher.on_event(down(VK_BACK));
        assert_eq!(action, HookAction::Inject(vec![InjectOp::Backspace(1)]));
        // Buffer and run are both empty now.
        let action = dispatcher.on_event(down(VK_BACK));
        assert_eq!(action, HookAction::Inject(vec![InjectOp::DeleteWord]));
    }

    #[test]
    fn physical_backspace_is_dead_outside_text_mode() {
        let mut dispatcher = enabled();
        chord(&mut dispatcher, &[VK_A, VK_OEM_1]);
        assert_eq!(dispatcher.on_event(down(VK_BACK)), HookAction::Suppress);
        assert_eq!(dispatcher.buffer_display(), "MAKE");
    }

    #[test]
    fn invalid_chords_leave_the_buffer_alone() {
        let mut dispatcher = enabled();
        chord(&mut dispatcher, &[VK_A, VK_OEM_1]);
        let action = chord(&mut dispatcher, &[VK_A, VK_S, VK_D, VK_F, VK_C, VK_OEM_1]);
        assert_eq!(action, HookAction::Suppress);
        assert_eq!(dispatcher.buffer_display(), "MAKE");
    }

    #[test]
    fn disabling_resets_mode_buffer_and_chord_state() {
        let mut dispatcher = enabled();
        chord(&mut dispatcher, &[VK_S, VK_C, VK_M]); // into text mode
        chord(&mut dispatcher, &[VK_D]); // open run
        dispatcher.on_event(down(VK_A)); // chord in progress

        dispatcher.set_enabled(false);
        assert_eq!(dispatcher.mode(), Mode::Semantic);
        assert_eq!(dispatcher.buffer_display(), "");
        assert_eq!(dispatcher.on_event(up(VK_A)), HookAction::Pass);

        dispatcher.set_enabled(true);
        let action = chord(&mut dispatcher, &[VK_A, VK_OEM_1]);
        assert_eq!(text_ops(&action), "MAKE");
    }

    #[test]
    fn results_arriving_after_a_reset_are_dropped() {
        let mut dispatcher = enabled();
        chord(&mut dispatcher, &[VK_A, VK_OEM_1]);
        dispatcher.on_event(down(VK_SPACE));
        dispatcher.set_enabled(false);
        dispatcher.set_enabled(true);

        for _ in 0..50 {
            assert_eq!(dispatcher.pump(), None);
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn notifications_follow_the_session() {
        let seen: Arc<Mutex<Vec<Notification>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut dispatcher = Dispatcher::new(echo_settings());
        dispatcher.set_notifier(move |note| sink.lock().unwrap().push(note));

        dispatcher.set_enabled(true);
        chord(&mut dispatcher, &[VK_A, VK_OEM_1]); // MAKE
        chord(&mut dispatcher, &[VK_A, VK_S, VK_D, VK_F, VK_C, VK_OEM_1]); // invalid
        chord(&mut dispatcher, &[VK_C, VK_M, VK_K]); // reference
        chord(&mut dispatcher, &[VK_S, VK_C, VK_M]); // toggle mode
        dispatcher.force_semantic();

        let seen = seen.lock().unwrap();
        assert!(seen.contains(&Notification::EnabledChanged(true)));
        assert!(seen.contains(&Notification::BufferChanged("MAKE".to_string())));
        assert!(seen.contains(&Notification::ChordRejected));
        assert!(seen.contains(&Notification::ModeChanged(Mode::Text)));
        assert!(seen.contains(&Notification::ModeChanged(Mode::Semantic)));
        assert!(seen
            .iter()
            .any(|note| matches!(note, Notification::Reference(card) if card.contains("ACTIONS"))));
    }
}
