//! Terminal modes (ANSI + DEC private).
//!
//! Models the mode bits that influence how the engine mutates the grid
//! (origin mode, autowrap, insert mode) and the flags the host application
//! branches on (mouse tracking, bracketed paste). Modes form a closed set
//! keyed by their ECMA-48 / DEC numbers; unknown numbers are ignored without
//! error and query as `None`, so growing the set never changes the public
//! contract.

use bitflags::bitflags;

bitflags! {
    /// DEC private mode flags (DECSET/DECRST, `CSI ? Pm h` / `CSI ? Pm l`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DecModes: u16 {
        /// DECCKM (mode 1): Application cursor keys.
        const APPLICATION_CURSOR = 1 << 0;
        /// DECOM (mode 6): Origin mode — cursor addressing relative to the scroll region.
        const ORIGIN = 1 << 1;
        /// DECAWM (mode 7): Auto-wrap at the right margin.
        const AUTOWRAP = 1 << 2;
        /// Mode 9: X10 mouse reporting (press only).
        const MOUSE_X10 = 1 << 3;
        /// DECTCEM (mode 25): Text cursor enable (visible).
        const CURSOR_VISIBLE = 1 << 4;
        /// Mode 1000: Normal mouse tracking (press + release).
        const MOUSE_BUTTON = 1 << 5;
        /// Mode 1002: Button-event tracking (press + release + drag motion).
        const MOUSE_CELL_MOTION = 1 << 6;
        /// Mode 1003: Any-event tracking (all motion).
        const MOUSE_ALL_MOTION = 1 << 7;
        /// Mode 1004: Focus event reporting.
        const FOCUS_EVENTS = 1 << 8;
        /// Mode 1006: SGR extended mouse coordinate encoding.
        const MOUSE_SGR = 1 << 9;
        /// Mode 1049: Alternate screen buffer.
        const ALT_SCREEN = 1 << 10;
        /// Mode 2004: Bracketed paste.
        const BRACKETED_PASTE = 1 << 11;
    }
}

bitflags! {
    /// ANSI standard mode flags (SM/RM, `CSI Pm h` / `CSI Pm l`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnsiModes: u8 {
        /// IRM (mode 4): Insert/Replace mode.
        const INSERT = 1 << 0;
        /// LNM (mode 20): Linefeed/Newline mode.
        const LINEFEED_NEWLINE = 1 << 1;
    }
}

/// The active mouse reporting protocol, highest granularity wins.
///
/// Exposed so the host's input router can decide whether to forward mouse
/// events to the child process instead of treating them as UI navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseTracking {
    /// Mode 9: press events only.
    X10,
    /// Mode 1000: press + release.
    ButtonPress,
    /// Mode 1002: press + release + drag motion.
    CellMotion,
    /// Mode 1003: all motion.
    AllMotion,
}

/// Combined mode state for one terminal instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modes {
    pub dec: DecModes,
    pub ansi: AnsiModes,
}

impl Modes {
    /// Construct default modes (typical xterm power-on defaults):
    /// DECAWM and DECTCEM on, everything else off.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dec: DecModes::AUTOWRAP | DecModes::CURSOR_VISIBLE,
            ansi: AnsiModes::empty(),
        }
    }

    /// Reset all modes to power-on defaults.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // ── Mode registration by number ─────────────────────────────────

    /// Set or clear a DEC private mode by number.
    /// Returns `false` (and changes nothing) for unrecognized numbers.
    pub fn set_dec_mode(&mut self, mode: u16, enabled: bool) -> bool {
        let Some(flag) = Self::dec_flag_for_mode(mode) else {
            return false;
        };
        self.dec.set(flag, enabled);
        true
    }

    /// Query a DEC private mode by number.
    ///
    /// `Some(state)` for recognized modes, `None` for unknown numbers.
    #[must_use]
    pub fn dec_mode(&self, mode: u16) -> Option<bool> {
        Self::dec_flag_for_mode(mode).map(|flag| self.dec.contains(flag))
    }

    /// Set or clear an ANSI standard mode by number.
    /// Returns `false` for unrecognized numbers.
    pub fn set_ansi_mode(&mut self, mode: u16, enabled: bool) -> bool {
        let Some(flag) = Self::ansi_flag_for_mode(mode) else {
            return false;
        };
        self.ansi.set(flag, enabled);
        true
    }

    fn dec_flag_for_mode(mode: u16) -> Option<DecModes> {
        let flag = match mode {
            1 => DecModes::APPLICATION_CURSOR,
            6 => DecModes::ORIGIN,
            7 => DecModes::AUTOWRAP,
            9 => DecModes::MOUSE_X10,
            25 => DecModes::CURSOR_VISIBLE,
            1000 => DecModes::MOUSE_BUTTON,
            1002 => DecModes::MOUSE_CELL_MOTION,
            1003 => DecModes::MOUSE_ALL_MOTION,
            1004 => DecModes::FOCUS_EVENTS,
            1006 => DecModes::MOUSE_SGR,
            1049 => DecModes::ALT_SCREEN,
            2004 => DecModes::BRACKETED_PASTE,
            _ => return None,
        };
        Some(flag)
    }

    fn ansi_flag_for_mode(mode: u16) -> Option<AnsiModes> {
        let flag = match mode {
            4 => AnsiModes::INSERT,
            20 => AnsiModes::LINEFEED_NEWLINE,
            _ => return None,
        };
        Some(flag)
    }

    // ── Engine-facing accessors ─────────────────────────────────────

    /// Whether origin mode (DECOM) is enabled.
    #[must_use]
    pub fn origin_mode(&self) -> bool {
        self.dec.contains(DecModes::ORIGIN)
    }

    /// Whether autowrap (DECAWM) is enabled.
    #[must_use]
    pub fn autowrap(&self) -> bool {
        self.dec.contains(DecModes::AUTOWRAP)
    }

    /// Whether the cursor is visible (DECTCEM).
    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.dec.contains(DecModes::CURSOR_VISIBLE)
    }

    /// Whether insert mode (IRM) is enabled.
    #[must_use]
    pub fn insert_mode(&self) -> bool {
        self.ansi.contains(AnsiModes::INSERT)
    }

    /// Whether linefeed/newline mode (LNM) is enabled.
    #[must_use]
    pub fn linefeed_newline(&self) -> bool {
        self.ansi.contains(AnsiModes::LINEFEED_NEWLINE)
    }

    // ── Host-facing accessors ───────────────────────────────────────

    /// The active mouse reporting protocol, if any.
    ///
    /// When a child enables several tracking modes, the highest-granularity
    /// one wins, matching how xterm resolves overlapping requests.
    #[must_use]
    pub fn mouse_tracking(&self) -> Option<MouseTracking> {
        if self.dec.contains(DecModes::MOUSE_ALL_MOTION) {
            Some(MouseTracking::AllMotion)
        } else if self.dec.contains(DecModes::MOUSE_CELL_MOTION) {
            Some(MouseTracking::CellMotion)
        } else if self.dec.contains(DecModes::MOUSE_BUTTON) {
            Some(MouseTracking::ButtonPress)
        } else if self.dec.contains(DecModes::MOUSE_X10) {
            Some(MouseTracking::X10)
        } else {
            None
        }
    }

    /// Whether any mouse reporting protocol is active.
    #[must_use]
    pub fn mouse_reporting_enabled(&self) -> bool {
        self.mouse_tracking().is_some()
    }

    /// Whether SGR extended mouse coordinates (mode 1006) are requested.
    #[must_use]
    pub fn mouse_sgr(&self) -> bool {
        self.dec.contains(DecModes::MOUSE_SGR)
    }

    /// Whether the alternate screen buffer was requested (mode 1049).
    ///
    /// Tracked as a flag only; this engine keeps a single screen buffer.
    #[must_use]
    pub fn alt_screen(&self) -> bool {
        self.dec.contains(DecModes::ALT_SCREEN)
    }

    /// Whether bracketed paste (mode 2004) is enabled.
    #[must_use]
    pub fn bracketed_paste(&self) -> bool {
        self.dec.contains(DecModes::BRACKETED_PASTE)
    }

    /// Whether focus event reporting (mode 1004) is enabled.
    #[must_use]
    pub fn focus_events(&self) -> bool {
        self.dec.contains(DecModes::FOCUS_EVENTS)
    }

    /// Whether application cursor keys (mode 1) are enabled.
    #[must_use]
    pub fn application_cursor(&self) -> bool {
        self.dec.contains(DecModes::APPLICATION_CURSOR)
    }
}
