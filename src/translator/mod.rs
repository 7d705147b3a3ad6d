//! MIDI-to-action translation
//!
//! Maps note-on and control-change events to action chains, emulating
//! physical press/release semantics: each mapped note enters a hold buffer
//! with a duration, durations are decremented by measured elapsed time every
//! poll tick, and an expired entry synthesizes the chain's release form.
//!
//! A continuous controller (pedal) is latched on a threshold crossing instead
//! of entering the hold buffer, and one designated note toggles menu mode
//! after enough consecutive hits.

pub mod actions;


use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info};

use crate::midi::MidiEvent;
use actions::ActionChain;

/// Default hold for plain button chains
pub const DEFAULT_BUTTON_HOLD: Duration = Duration::from_millis(40);
/// Default hold for chains that move a stick
pub const DEFAULT_STICK_HOLD: Duration = Duration::from_millis(300);

/// Tunable policy for one translator session
#[derive(Debug, Clone)]
pub struct TranslatorSettings {
    /// Hold duration for button-only chains
    pub button_hold: Duration,
    /// Hold duration for stick-bearing chains
    pub stick_hold: Duration,
    /// CC values above this latch the pedal press
    pub pedal_threshold: u8,
    /// Chain emitted on the pedal's rising edge
    pub pedal_press: ActionChain,
    /// Chain emitted on the pedal's falling edge
    pub pedal_release: ActionChain,
    /// Note whose consecutive presses toggle menu mode
    pub menu_note: u8,
    /// Presses beyond this count flip the mode (n+1 consecutive hits toggle)
    pub menu_presses: u32,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            button_hold: DEFAULT_BUTTON_HOLD,
            stick_hold: DEFAULT_STICK_HOLD,
            pedal_threshold: 64,
            pedal_press: ActionChain::parse("hold b&&stick l center")
                .expect("default pedal press chain"),
            pedal_release: ActionChain::parse("release b&&stick l center")
                .expect("default pedal release chain"),
            menu_note: 48,
            menu_presses: 10,
        }
    }
}

/// Built-in note table for an e-drum kit
pub fn default_mapping() -> HashMap<u8, ActionChain> {
    let table = [
        (38, "hold a&&hold y"),
        (48, "hold x"),
        (42, "hold l&&hold zl"),
        (36, "hold r&&hold zr"),
        (51, "stick l h 3200&&stick r h 3200"),
        (55, "stick l h 848&&stick r h 848"),
        (45, "stick l up&&stick r up"),
        (41, "stick l down&&stick r down"),
    ];

    table
        .into_iter()
        .map(|(note, chain)| {
            (
                note,
                ActionChain::parse(chain).expect("default mapping chain"),
            )
        })
        .collect()
}

/// Translates polled MIDI events into action chains.
///
/// All state (mapping table, hold buffer, pedal latch, menu flag) is owned by
/// the instance; one translator serves one session.
pub struct MidiTranslator {
    mapping: HashMap<u8, ActionChain>,
    settings: TranslatorSettings,
    /// Remaining hold per tracked note, seconds. A present entry means the
    /// note is currently considered held.
    holds: HashMap<u8, f64>,
    pedal_latched: bool,
    menu_mode: bool,
    menu_counter: u32,
}

impl MidiTranslator {
    pub fn new(mapping: HashMap<u8, ActionChain>, settings: TranslatorSettings) -> Self {
        Self {
            mapping,
            settings,
            holds: HashMap::new(),
            pedal_latched: false,
            menu_mode: false,
            menu_counter: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_mapping(), TranslatorSettings::default())
    }

    pub fn menu_mode(&self) -> bool {
        self.menu_mode
    }

    /// True while the note is in the hold buffer
    pub fn is_held(&self, note: u8) -> bool {
        self.holds.contains_key(&note)
    }

    /// Advance one poll tick.
    ///
    /// Decrements every tracked hold by `elapsed`, then either translates the
    /// event or, on an idle tick, expires at most one hold. The returned
    /// chain is already menu-gated; `None` means nothing to dispatch.
    pub fn tick(&mut self, elapsed: Duration, event: Option<&MidiEvent>) -> Option<ActionChain> {
        let dt = elapsed.as_secs_f64();
        for remaining in self.holds.values_mut() {
            *remaining -= dt;
        }

        let emitted = match event {
            Some(MidiEvent::NoteOn { note, .. }) => self.on_note_on(*note),
            Some(MidiEvent::ControlChange { value, .. }) => self.on_control_change(*value),
            // Physical note-offs carry no information here; releases come
            // from the hold timer.
            Some(MidiEvent::NoteOff { .. }) => None,
            None => self.expire_one(),
        };

        let chain = emitted?;
        let chain = if self.menu_mode {
            chain.truncated()
        } else {
            chain
        };
        (!chain.is_empty()).then_some(chain)
    }

    /// Fold aliased notes onto their canonical mapping entry: 46 plays the
    /// same chain as 42, and a repeated 38 while 38 is still held does too.
    fn remap(&self, note: u8) -> u8 {
        if note == 46 || (note == 38 && self.holds.contains_key(&38)) {
            42
        } else {
            note
        }
    }

    fn on_note_on(&mut self, note: u8) -> Option<ActionChain> {
        let note = self.remap(note);
        self.bump_menu_counter(note);

        let chain = self.mapping.get(&note)?.clone();
        let hold = if chain.has_stick() {
            self.settings.stick_hold
        } else {
            self.settings.button_hold
        };
        // A re-press of a held note refreshes its timer; no duplicate
        // release is synthesized.
        self.holds.insert(note, hold.as_secs_f64());
        debug!("note {} held for {:?}", note, hold);
        Some(chain)
    }

    fn on_control_change(&mut self, value: u8) -> Option<ActionChain> {
        if value > self.settings.pedal_threshold && !self.pedal_latched {
            self.pedal_latched = true;
            return Some(self.settings.pedal_press.clone());
        }
        if value <= self.settings.pedal_threshold && self.pedal_latched {
            self.pedal_latched = false;
            return Some(self.settings.pedal_release.clone());
        }
        None
    }

    /// Remove one expired hold and synthesize its release chain
    fn expire_one(&mut self) -> Option<ActionChain> {
        let note = self
            .holds
            .iter()
            .find(|(_, remaining)| **remaining <= 0.0)
            .map(|(note, _)| *note)?;

        self.holds.remove(&note);
        let released = self.mapping.get(&note).map(ActionChain::released);
        debug!("note {} hold expired", note);
        released
    }

    fn bump_menu_counter(&mut self, note: u8) {
        if note == self.settings.menu_note {
            self.menu_counter += 1;
            if self.menu_counter > self.settings.menu_presses {
                self.menu_mode = !self.menu_mode;
                self.menu_counter = 0;
                info!(
                    "menu mode {}",
                    if self.menu_mode { "on" } else { "off" }
                );
            }
        } else {
            self.menu_counter = 0;
        }
    }
}
