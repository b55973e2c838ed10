//! VT/ANSI escape-sequence interpreter front end.
//!
//! A deterministic, byte-at-a-time state machine that turns an output byte
//! stream into a sequence of [`Action`]s for the terminal to apply. The
//! machine holds its position between `feed` calls, so a sequence split
//! across chunk boundaries resumes exactly where it left off.
//!
//! Malformed input is never an error: unknown finals, stray bytes, and
//! truncated sequences degrade to [`Action::Unsupported`] or to nothing at
//! all, and the machine always returns to a state where subsequent bytes are
//! interpreted normally. Real-world process output is not well-formed.

use smallvec::SmallVec;

/// Maximum number of CSI parameters retained; extras are dropped.
pub const MAX_PARAMS: usize = 16;

/// Maximum number of intermediate bytes retained.
const MAX_INTERMEDIATES: usize = 2;

/// Cap on buffered OSC payload bytes; the tail of an oversized payload is
/// discarded while the sequence is still consumed to its terminator.
const MAX_OSC_LEN: usize = 1024;

/// Cap on the raw-bytes capture of one in-flight sequence.
const MAX_SEQ_CAPTURE: usize = 1024;

/// Parameter list carried by parameterized actions.
pub type Params = SmallVec<[u16; MAX_PARAMS]>;

/// Interpreter output: one grid/cursor/mode mutation per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print a single character at the cursor.
    Print(char),
    /// Line feed (`\n`, also VT/FF).
    Newline,
    /// Carriage return (`\r`).
    CarriageReturn,
    /// Horizontal tab (`\t`).
    Tab,
    /// Backspace (`\x08`).
    Backspace,
    /// Bell (`\x07`).
    Bell,
    /// CUU: move cursor up (default 1).
    CursorUp(u16),
    /// CUD: move cursor down (default 1).
    CursorDown(u16),
    /// CUF: move cursor right (default 1).
    CursorRight(u16),
    /// CUB: move cursor left (default 1).
    CursorLeft(u16),
    /// CNL: move cursor down and to column 0.
    CursorNextLine(u16),
    /// CPL: move cursor up and to column 0.
    CursorPrevLine(u16),
    /// CHA: move cursor to an absolute column (0-indexed).
    CursorColumn(u16),
    /// VPA: move cursor to an absolute row (0-indexed).
    CursorRow(u16),
    /// CUP/HVP: move cursor to an absolute 0-indexed position.
    CursorPosition { row: u16, col: u16 },
    /// DECSTBM: set the scroll region. `top` is 0-indexed inclusive;
    /// `bottom` is 0-indexed exclusive when non-zero, 0 meaning full height
    /// (the parser does not know the grid size).
    SetScrollRegion { top: u16, bottom: u16 },
    /// SU: scroll the region up (default 1).
    ScrollUp(u16),
    /// SD: scroll the region down (default 1).
    ScrollDown(u16),
    /// IL: insert blank lines at the cursor row.
    InsertLines(u16),
    /// DL: delete lines at the cursor row.
    DeleteLines(u16),
    /// ICH: insert blank cells at the cursor column.
    InsertChars(u16),
    /// DCH: delete cells at the cursor column.
    DeleteChars(u16),
    /// ECH: erase cells at the cursor column.
    EraseChars(u16),
    /// ED 0/1/2.
    EraseInDisplay(u8),
    /// ED 3: clear the scrollback history.
    EraseScrollback,
    /// EL 0/1/2.
    EraseInLine(u8),
    /// SGR: apply graphic rendition parameters.
    Sgr(Params),
    /// DECSET (`CSI ? Pm h`).
    DecSet(Params),
    /// DECRST (`CSI ? Pm l`).
    DecRst(Params),
    /// SM (`CSI Pm h`).
    AnsiSet(Params),
    /// RM (`CSI Pm l`).
    AnsiRst(Params),
    /// DECSC / `CSI s`.
    SaveCursor,
    /// DECRC / `CSI u`.
    RestoreCursor,
    /// HTS (`ESC H`): set a tab stop at the cursor column.
    SetTabStop,
    /// TBC (`CSI Ps g`): clear tab stops (0 = at cursor, 3 = all).
    ClearTabStop(u16),
    /// CBT (`CSI Ps Z`): move back `count` tab stops.
    BackTab(u16),
    /// IND (`ESC D`): move down, scrolling at the region bottom.
    Index,
    /// RI (`ESC M`): move up, scrolling at the region top.
    ReverseIndex,
    /// NEL (`ESC E`): next line.
    NextLine,
    /// RIS (`ESC c`): full reset.
    FullReset,
    /// DECSTR (`CSI ! p`): soft reset.
    SoftReset,
    /// DECALN (`ESC # 8`): fill the screen with `E`.
    ScreenAlignment,
    /// OSC 0/2: set the window title.
    SetTitle(String),
    /// A complete sequence the interpreter recognizes as well-formed but does
    /// not implement. Carries the raw bytes; applied as a no-op.
    Unsupported(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Esc,
    EscIntermediate,
    Csi,
    Osc,
    OscEsc,
}

/// Byte-at-a-time VT/ANSI parser.
#[derive(Debug, Clone)]
pub struct Parser {
    state: State,
    /// Raw bytes of the in-flight sequence, for `Unsupported` capture.
    buf: Vec<u8>,
    params: Params,
    current: u32,
    param_started: bool,
    saw_separator: bool,
    /// The next finalized parameter is a colon subparameter and is dropped.
    next_is_sub: bool,
    /// `?` private-mode marker seen.
    private: bool,
    /// A `<`/`=`/`>` marker or intermediate overflow was seen; the sequence
    /// is consumed but dispatched as unsupported.
    nonstandard: bool,
    intermediates: SmallVec<[u8; MAX_INTERMEDIATES]>,
    osc: Vec<u8>,
    utf8_buf: [u8; 4],
    utf8_len: u8,
    utf8_need: u8,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser in the ground state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            buf: Vec::new(),
            params: SmallVec::new(),
            current: 0,
            param_started: false,
            saw_separator: false,
            next_is_sub: false,
            private: false,
            nonstandard: false,
            intermediates: SmallVec::new(),
            osc: Vec::new(),
            utf8_buf: [0; 4],
            utf8_len: 0,
            utf8_need: 0,
        }
    }

    /// Feed a chunk of bytes and collect the resulting actions.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Action> {
        let mut out = Vec::new();
        for &b in bytes {
            if let Some(action) = self.advance(b) {
                out.push(action);
            }
        }
        out
    }

    /// Advance the machine by one byte.
    ///
    /// Returns an action when a complete token is recognized.
    pub fn advance(&mut self, b: u8) -> Option<Action> {
        match self.state {
            State::Ground => self.advance_ground(b),
            State::Esc => self.advance_esc(b),
            State::EscIntermediate => self.advance_esc_intermediate(b),
            State::Csi => self.advance_csi(b),
            State::Osc => self.advance_osc(b),
            State::OscEsc => self.advance_osc_esc(b),
        }
    }

    // ── Ground ──────────────────────────────────────────────────────

    fn advance_ground(&mut self, b: u8) -> Option<Action> {
        if self.utf8_need > 0 {
            return self.advance_utf8(b);
        }
        match b {
            0x1b => {
                self.enter_esc();
                None
            }
            b'\n' | 0x0b | 0x0c => Some(Action::Newline),
            b'\r' => Some(Action::CarriageReturn),
            b'\t' => Some(Action::Tab),
            0x08 => Some(Action::Backspace),
            0x07 => Some(Action::Bell),
            0x20..=0x7e => Some(Action::Print(b as char)),
            0xc2..=0xdf => self.start_utf8(b, 2),
            0xe0..=0xef => self.start_utf8(b, 3),
            0xf0..=0xf4 => self.start_utf8(b, 4),
            // Remaining C0 controls, DEL, and invalid UTF-8 leaders.
            _ => None,
        }
    }

    fn start_utf8(&mut self, b: u8, need: u8) -> Option<Action> {
        self.utf8_buf[0] = b;
        self.utf8_len = 1;
        self.utf8_need = need;
        None
    }

    fn advance_utf8(&mut self, b: u8) -> Option<Action> {
        if (0x80..=0xbf).contains(&b) {
            self.utf8_buf[self.utf8_len as usize] = b;
            self.utf8_len += 1;
            if self.utf8_len < self.utf8_need {
                return None;
            }
            let len = self.utf8_len as usize;
            self.utf8_len = 0;
            self.utf8_need = 0;
            let ch = core::str::from_utf8(&self.utf8_buf[..len])
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or('\u{FFFD}');
            Some(Action::Print(ch))
        } else {
            // Truncated sequence: drop the partial and reinterpret this byte.
            self.utf8_len = 0;
            self.utf8_need = 0;
            self.advance_ground(b)
        }
    }

    // ── Escape ──────────────────────────────────────────────────────

    fn enter_esc(&mut self) {
        self.state = State::Esc;
        self.utf8_len = 0;
        self.utf8_need = 0;
        self.buf.clear();
        self.buf.push(0x1b);
        self.intermediates.clear();
    }

    fn advance_esc(&mut self, b: u8) -> Option<Action> {
        self.capture(b);
        match b {
            b'[' => {
                self.state = State::Csi;
                self.reset_csi();
                None
            }
            b']' => {
                self.state = State::Osc;
                self.osc.clear();
                None
            }
            0x20..=0x2f => {
                self.push_intermediate(b);
                self.state = State::EscIntermediate;
                None
            }
            b'7' => self.finish(Some(Action::SaveCursor)),
            b'8' => self.finish(Some(Action::RestoreCursor)),
            b'H' => self.finish(Some(Action::SetTabStop)),
            b'D' => self.finish(Some(Action::Index)),
            b'M' => self.finish(Some(Action::ReverseIndex)),
            b'E' => self.finish(Some(Action::NextLine)),
            b'c' => self.finish(Some(Action::FullReset)),
            0x1b => {
                self.enter_esc();
                None
            }
            0x18 | 0x1a => self.finish(None),
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => None,
            _ => {
                let seq = self.take_buf();
                self.finish(Some(Action::Unsupported(seq)))
            }
        }
    }

    fn advance_esc_intermediate(&mut self, b: u8) -> Option<Action> {
        self.capture(b);
        match b {
            0x20..=0x2f => {
                self.push_intermediate(b);
                None
            }
            0x30..=0x7e => {
                let action = self.dispatch_esc_intermediate(b);
                self.finish(action)
            }
            0x1b => {
                self.enter_esc();
                None
            }
            0x18 | 0x1a => self.finish(None),
            _ => None,
        }
    }

    fn dispatch_esc_intermediate(&mut self, final_byte: u8) -> Option<Action> {
        match (self.intermediates.as_slice(), final_byte) {
            ([b'#'], b'8') => Some(Action::ScreenAlignment),
            // Charset designation (ESC ( B and friends): consumed, no effect.
            ([b'(' | b')' | b'*' | b'+'], _) => None,
            _ => Some(Action::Unsupported(self.take_buf())),
        }
    }

    // ── CSI ─────────────────────────────────────────────────────────

    fn reset_csi(&mut self) {
        self.params.clear();
        self.current = 0;
        self.param_started = false;
        self.saw_separator = false;
        self.next_is_sub = false;
        self.private = false;
        self.nonstandard = false;
        self.intermediates.clear();
    }

    fn advance_csi(&mut self, b: u8) -> Option<Action> {
        self.capture(b);
        match b {
            b'0'..=b'9' => {
                self.current = self
                    .current
                    .saturating_mul(10)
                    .saturating_add(u32::from(b - b'0'))
                    .min(u32::from(u16::MAX));
                self.param_started = true;
                None
            }
            b';' => {
                self.finalize_param();
                self.saw_separator = true;
                self.next_is_sub = false;
                None
            }
            b':' => {
                self.finalize_param();
                self.saw_separator = true;
                self.next_is_sub = true;
                None
            }
            b'?' => {
                if self.params.is_empty() && !self.param_started {
                    self.private = true;
                } else {
                    self.nonstandard = true;
                }
                None
            }
            b'<' | b'=' | b'>' => {
                self.nonstandard = true;
                None
            }
            0x20..=0x2f => {
                self.push_intermediate(b);
                None
            }
            0x40..=0x7e => {
                if self.param_started {
                    self.finalize_param();
                } else if self.saw_separator {
                    self.push_param(0);
                }
                let action = self.dispatch_csi(b);
                self.finish(action)
            }
            0x18 | 0x1a => self.finish(None),
            0x1b => {
                self.enter_esc();
                None
            }
            _ => None,
        }
    }

    fn finalize_param(&mut self) {
        let value = if self.param_started {
            self.current as u16
        } else {
            0
        };
        self.push_param(value);
        self.current = 0;
        self.param_started = false;
    }

    fn push_param(&mut self, value: u16) {
        if self.next_is_sub {
            // Colon subparameters are dropped rather than misread as
            // independent parameters.
            self.next_is_sub = false;
            return;
        }
        if self.params.len() < MAX_PARAMS {
            self.params.push(value);
        }
    }

    fn dispatch_csi(&mut self, final_byte: u8) -> Option<Action> {
        if self.nonstandard {
            return Some(Action::Unsupported(self.take_buf()));
        }
        if self.private {
            let params = core::mem::take(&mut self.params);
            return match final_byte {
                b'h' => Some(Action::DecSet(params)),
                b'l' => Some(Action::DecRst(params)),
                _ => Some(Action::Unsupported(self.take_buf())),
            };
        }
        if !self.intermediates.is_empty() {
            return match (self.intermediates.as_slice(), final_byte) {
                ([b'!'], b'p') => Some(Action::SoftReset),
                _ => Some(Action::Unsupported(self.take_buf())),
            };
        }

        let count = self.count_or_one();
        match final_byte {
            b'A' => Some(Action::CursorUp(count)),
            b'B' => Some(Action::CursorDown(count)),
            b'C' => Some(Action::CursorRight(count)),
            b'D' => Some(Action::CursorLeft(count)),
            b'E' => Some(Action::CursorNextLine(count)),
            b'F' => Some(Action::CursorPrevLine(count)),
            b'G' => Some(Action::CursorColumn(count.saturating_sub(1))),
            b'd' => Some(Action::CursorRow(count.saturating_sub(1))),
            b'H' | b'f' => {
                // CUP/HVP are 1-indexed; 0 is treated as 1.
                let row = self.param(0).max(1) - 1;
                let col = self.param(1).max(1) - 1;
                Some(Action::CursorPosition { row, col })
            }
            b'J' => match self.param(0) {
                mode @ 0..=2 => Some(Action::EraseInDisplay(mode as u8)),
                3 => Some(Action::EraseScrollback),
                _ => Some(Action::Unsupported(self.take_buf())),
            },
            b'K' => match self.param(0) {
                mode @ 0..=2 => Some(Action::EraseInLine(mode as u8)),
                _ => Some(Action::Unsupported(self.take_buf())),
            },
            b'L' => Some(Action::InsertLines(count)),
            b'M' => Some(Action::DeleteLines(count)),
            b'@' => Some(Action::InsertChars(count)),
            b'P' => Some(Action::DeleteChars(count)),
            b'X' => Some(Action::EraseChars(count)),
            b'S' => Some(Action::ScrollUp(count)),
            b'T' => Some(Action::ScrollDown(count)),
            b'm' => Some(Action::Sgr(core::mem::take(&mut self.params))),
            b'h' => Some(Action::AnsiSet(core::mem::take(&mut self.params))),
            b'l' => Some(Action::AnsiRst(core::mem::take(&mut self.params))),
            b's' => Some(Action::SaveCursor),
            b'u' => Some(Action::RestoreCursor),
            b'g' => Some(Action::ClearTabStop(self.param(0))),
            b'Z' => Some(Action::BackTab(count)),
            b'r' => {
                let top = self.param(0).max(1) - 1;
                let bottom = self.param(1);
                Some(Action::SetScrollRegion { top, bottom })
            }
            _ => Some(Action::Unsupported(self.take_buf())),
        }
    }

    fn param(&self, index: usize) -> u16 {
        self.params.get(index).copied().unwrap_or(0)
    }

    fn count_or_one(&self) -> u16 {
        self.param(0).max(1)
    }

    // ── OSC ─────────────────────────────────────────────────────────

    fn advance_osc(&mut self, b: u8) -> Option<Action> {
        self.capture(b);
        match b {
            0x07 => {
                let action = self.dispatch_osc();
                self.finish(action)
            }
            0x1b => {
                self.state = State::OscEsc;
                None
            }
            _ => {
                if self.osc.len() < MAX_OSC_LEN {
                    self.osc.push(b);
                }
                None
            }
        }
    }

    fn advance_osc_esc(&mut self, b: u8) -> Option<Action> {
        self.capture(b);
        if b == b'\\' {
            let action = self.dispatch_osc();
            return self.finish(action);
        }
        // Not an ST terminator after all; the ESC and this byte are payload.
        if self.osc.len() + 1 < MAX_OSC_LEN {
            self.osc.push(0x1b);
            self.osc.push(b);
        }
        self.state = State::Osc;
        None
    }

    fn dispatch_osc(&mut self) -> Option<Action> {
        let payload = core::mem::take(&mut self.osc);
        let (code, rest) = match payload.iter().position(|&b| b == b';') {
            Some(idx) => (&payload[..idx], &payload[idx + 1..]),
            None => (payload.as_slice(), &[][..]),
        };
        match core::str::from_utf8(code).ok().and_then(|s| s.parse().ok()) {
            Some(0u16 | 2u16) => Some(Action::SetTitle(
                String::from_utf8_lossy(rest).into_owned(),
            )),
            // Other OSC families (hyperlinks, clipboard) are out of scope:
            // consumed and discarded.
            _ => Some(Action::Unsupported(self.take_buf())),
        }
    }

    // ── Shared plumbing ─────────────────────────────────────────────

    fn capture(&mut self, b: u8) {
        if self.buf.len() < MAX_SEQ_CAPTURE {
            self.buf.push(b);
        }
    }

    fn push_intermediate(&mut self, b: u8) {
        if self.intermediates.len() < MAX_INTERMEDIATES {
            self.intermediates.push(b);
        } else {
            self.nonstandard = true;
        }
    }

    fn finish(&mut self, action: Option<Action>) -> Option<Action> {
        self.state = State::Ground;
        self.buf.clear();
        action
    }

    fn take_buf(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(values: &[u16]) -> Params {
        values.iter().copied().collect()
    }

    #[test]
    fn printable_ascii_emits_print() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"hi"), vec![Action::Print('h'), Action::Print('i')]);
    }

    #[test]
    fn c0_controls_emit_actions() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\t\r\n\x08\x07"),
            vec![
                Action::Tab,
                Action::CarriageReturn,
                Action::Newline,
                Action::Backspace,
                Action::Bell,
            ]
        );
    }

    #[test]
    fn utf8_multibyte_prints_single_char() {
        let mut p = Parser::new();
        assert_eq!(p.feed("é".as_bytes()), vec![Action::Print('é')]);
        assert_eq!(p.feed("中".as_bytes()), vec![Action::Print('中')]);
        assert_eq!(p.feed("🦀".as_bytes()), vec![Action::Print('🦀')]);
    }

    #[test]
    fn utf8_split_across_feeds_resumes() {
        let mut p = Parser::new();
        let bytes = "中".as_bytes();
        assert!(p.feed(&bytes[..1]).is_empty());
        assert!(p.feed(&bytes[1..2]).is_empty());
        assert_eq!(p.feed(&bytes[2..]), vec![Action::Print('中')]);
    }

    #[test]
    fn truncated_utf8_does_not_eat_following_ascii() {
        let mut p = Parser::new();
        // Leading byte of a 3-byte sequence, then plain ASCII.
        assert_eq!(p.feed(b"\xe4ok"), vec![Action::Print('o'), Action::Print('k')]);
    }

    #[test]
    fn stray_continuation_bytes_are_dropped() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x80\xbfA"), vec![Action::Print('A')]);
    }

    #[test]
    fn csi_cursor_moves_decode_with_defaults() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[2A\x1b[B\x1b[3C\x1b[0D"),
            vec![
                Action::CursorUp(2),
                Action::CursorDown(1),
                Action::CursorRight(3),
                Action::CursorLeft(1),
            ]
        );
    }

    #[test]
    fn csi_cup_is_zero_indexed_and_defaults_to_origin() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[5;10H"),
            vec![Action::CursorPosition { row: 4, col: 9 }]
        );
        assert_eq!(
            p.feed(b"\x1b[H"),
            vec![Action::CursorPosition { row: 0, col: 0 }]
        );
        assert_eq!(
            p.feed(b"\x1b[0;0f"),
            vec![Action::CursorPosition { row: 0, col: 0 }]
        );
    }

    #[test]
    fn csi_empty_params_become_zero() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[;5H"),
            vec![Action::CursorPosition { row: 0, col: 4 }]
        );
    }

    #[test]
    fn csi_erase_modes() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b[2J"), vec![Action::EraseInDisplay(2)]);
        assert_eq!(p.feed(b"\x1b[J"), vec![Action::EraseInDisplay(0)]);
        assert_eq!(p.feed(b"\x1b[3J"), vec![Action::EraseScrollback]);
        assert_eq!(p.feed(b"\x1b[K"), vec![Action::EraseInLine(0)]);
        assert_eq!(p.feed(b"\x1b[1K"), vec![Action::EraseInLine(1)]);
    }

    #[test]
    fn csi_sgr_collects_params() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[1;31;48;5;10m"),
            vec![Action::Sgr(params(&[1, 31, 48, 5, 10]))]
        );
        assert_eq!(p.feed(b"\x1b[m"), vec![Action::Sgr(params(&[]))]);
    }

    #[test]
    fn csi_colon_subparams_are_dropped() {
        let mut p = Parser::new();
        // SGR 4:3 (curly underline): the subparameter must not leak through
        // as an independent parameter 3 (italic).
        assert_eq!(p.feed(b"\x1b[4:3m"), vec![Action::Sgr(params(&[4]))]);
    }

    #[test]
    fn csi_private_modes() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[?1000h"),
            vec![Action::DecSet(params(&[1000]))]
        );
        assert_eq!(
            p.feed(b"\x1b[?1000;1006l"),
            vec![Action::DecRst(params(&[1000, 1006]))]
        );
    }

    #[test]
    fn csi_ansi_modes() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b[4h"), vec![Action::AnsiSet(params(&[4]))]);
        assert_eq!(p.feed(b"\x1b[20l"), vec![Action::AnsiRst(params(&[20]))]);
    }

    #[test]
    fn csi_scroll_region_and_line_ops() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[2;4r\x1b[r\x1b[2S\x1b[T\x1b[3L\x1b[M\x1b[4@\x1b[P\x1b[2X"),
            vec![
                Action::SetScrollRegion { top: 1, bottom: 4 },
                Action::SetScrollRegion { top: 0, bottom: 0 },
                Action::ScrollUp(2),
                Action::ScrollDown(1),
                Action::InsertLines(3),
                Action::DeleteLines(1),
                Action::InsertChars(4),
                Action::DeleteChars(1),
                Action::EraseChars(2),
            ]
        );
    }

    #[test]
    fn csi_save_restore_cursor() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[s\x1b[u"),
            vec![Action::SaveCursor, Action::RestoreCursor]
        );
    }

    #[test]
    fn esc_short_sequences() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b7\x1b8\x1bD\x1bM\x1bE\x1bc"),
            vec![
                Action::SaveCursor,
                Action::RestoreCursor,
                Action::Index,
                Action::ReverseIndex,
                Action::NextLine,
                Action::FullReset,
            ]
        );
    }

    #[test]
    fn esc_charset_designation_is_consumed_silently() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b(BA"), vec![Action::Print('A')]);
        assert_eq!(p.feed(b"\x1b)0x"), vec![Action::Print('x')]);
    }

    #[test]
    fn esc_decaln() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b#8"), vec![Action::ScreenAlignment]);
    }

    #[test]
    fn tab_stop_sequences() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1bH\x1b[g\x1b[3g\x1b[2Z"),
            vec![
                Action::SetTabStop,
                Action::ClearTabStop(0),
                Action::ClearTabStop(3),
                Action::BackTab(2),
            ]
        );
    }

    #[test]
    fn csi_soft_reset() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b[!p"), vec![Action::SoftReset]);
    }

    #[test]
    fn osc_title_bel_terminated() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b]0;hello world\x07"),
            vec![Action::SetTitle("hello world".into())]
        );
        assert_eq!(
            p.feed(b"\x1b]2;two\x07"),
            vec![Action::SetTitle("two".into())]
        );
    }

    #[test]
    fn osc_title_st_terminated() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b]2;st title\x1b\\"),
            vec![Action::SetTitle("st title".into())]
        );
    }

    #[test]
    fn osc_unknown_code_is_unsupported() {
        let mut p = Parser::new();
        let actions = p.feed(b"\x1b]52;c;Zm9v\x07");
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], Action::Unsupported(_)));
    }

    #[test]
    fn unknown_csi_final_is_unsupported_and_recovers() {
        let mut p = Parser::new();
        let actions = p.feed(b"\x1b[5qA");
        assert_eq!(actions.len(), 2);
        assert!(matches!(
            &actions[0],
            Action::Unsupported(seq) if seq.as_slice() == b"\x1b[5q"
        ));
        assert_eq!(actions[1], Action::Print('A'));
    }

    #[test]
    fn unknown_esc_final_is_unsupported() {
        let mut p = Parser::new();
        let actions = p.feed(b"\x1bzB");
        assert!(matches!(&actions[0], Action::Unsupported(_)));
        assert_eq!(actions[1], Action::Print('B'));
    }

    #[test]
    fn sequence_split_across_feeds_resumes() {
        let mut p = Parser::new();
        assert!(p.feed(b"\x1b[").is_empty());
        assert!(p.feed(b"2;").is_empty());
        assert!(p.feed(b"3").is_empty());
        assert_eq!(
            p.feed(b"H"),
            vec![Action::CursorPosition { row: 1, col: 2 }]
        );
    }

    #[test]
    fn esc_restarts_an_unfinished_sequence() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[12\x1b[3A"),
            vec![Action::CursorUp(3)],
            "a fresh ESC abandons the unfinished CSI"
        );
    }

    #[test]
    fn can_aborts_a_sequence() {
        let mut p = Parser::new();
        assert_eq!(p.feed(b"\x1b[12\x18x"), vec![Action::Print('x')]);
    }

    #[test]
    fn excess_params_are_dropped_not_fatal() {
        let mut p = Parser::new();
        let mut seq = b"\x1b[".to_vec();
        seq.extend(b"1;".repeat(40));
        seq.push(b'm');
        let actions = p.feed(&seq);
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            Action::Sgr(params) => assert_eq!(params.len(), MAX_PARAMS),
            other => panic!("expected Sgr, got {other:?}"),
        }
    }

    #[test]
    fn huge_param_saturates() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[4294967295A"),
            vec![Action::CursorUp(u16::MAX)]
        );
    }

    #[test]
    fn mouse_mode_round_trip_sequences() {
        let mut p = Parser::new();
        assert_eq!(
            p.feed(b"\x1b[?1000h\x1b[?1000l\x1b[?1002h"),
            vec![
                Action::DecSet(params(&[1000])),
                Action::DecRst(params(&[1000])),
                Action::DecSet(params(&[1002])),
            ]
        );
    }

    #[test]
    fn oversized_osc_payload_is_bounded_and_consumed() {
        let mut p = Parser::new();
        let mut seq = b"\x1b]0;".to_vec();
        seq.extend(std::iter::repeat_n(b'x', MAX_OSC_LEN * 4));
        seq.push(0x07);
        seq.push(b'Z');
        let actions = p.feed(&seq);
        assert_eq!(actions.len(), 2);
        match &actions[0] {
            Action::SetTitle(title) => assert!(title.len() <= MAX_OSC_LEN),
            other => panic!("expected SetTitle, got {other:?}"),
        }
        assert_eq!(actions[1], Action::Print('Z'));
    }

    #[test]
    fn arbitrary_bytes_never_panic() {
        let mut p = Parser::new();
        for b in 0u8..=255 {
            let _ = p.advance(b);
        }
        // Interleave escape introducers with junk.
        let _ = p.feed(b"\x1b\x1b[\x1b]\x1b[?\xff\xfe\x00\x1b[99999999999m");
        // And confirm it still parses normally afterwards.
        let mut tail = p.feed(b"\x1b[2Jok");
        assert_eq!(tail.pop(), Some(Action::Print('k')));
    }
}
