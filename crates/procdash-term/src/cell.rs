//! Terminal cell: the fundamental unit of the grid.
//!
//! Each cell stores one display character together with its SGR attributes.
//! Cells are small `Copy` value types; a row is a fixed-length run of cells
//! and the grid owns them all.

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// SGR text attribute flags.
    ///
    /// Maps directly to the ECMA-48 / VT100 SGR parameter values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SgrFlags: u8 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const INVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

bitflags! {
    /// Cell-level flags that are orthogonal to SGR attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        /// This cell is the leading (left) cell of a wide (2-column) character.
        const WIDE_CHAR = 1 << 0;
        /// This cell is the trailing (right) continuation of a wide character.
        /// Its content is meaningless; rendering uses the leading cell.
        const WIDE_CONTINUATION = 1 << 1;
    }
}

/// Color representation for terminal cells.
///
/// Supports the standard terminal color model hierarchy:
/// default → 16 named → 256 indexed → 24-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Color {
    /// Terminal default (SGR 39 / SGR 49).
    #[default]
    Default,
    /// Named color index (0-15): standard 8 + bright 8.
    Named(u8),
    /// 256-color palette index (0-255).
    Indexed(u8),
    /// 24-bit true color.
    Rgb(u8, u8, u8),
}

/// SGR attributes applied to newly written cells: flags + fg/bg colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SgrAttrs {
    /// Flags travel as their raw bit pattern in serialized form.
    #[cfg_attr(feature = "serde", serde(with = "serde_bits::sgr_flags"))]
    pub flags: SgrFlags,
    pub fg: Color,
    pub bg: Color,
}

impl SgrAttrs {
    /// Reset all attributes to default (SGR 0).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a list of SGR parameters to these attributes.
    ///
    /// An empty parameter list means reset (a bare `CSI m`). Unrecognized
    /// codes are skipped; a malformed extended-color introducer (38/48)
    /// aborts the rest of the list rather than misreading its payload.
    pub fn apply_sgr(&mut self, params: &[u16]) {
        if params.is_empty() {
            self.reset();
            return;
        }
        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => self.reset(),
                1 => self.flags.insert(SgrFlags::BOLD),
                2 => self.flags.insert(SgrFlags::DIM),
                3 => self.flags.insert(SgrFlags::ITALIC),
                4 => self.flags.insert(SgrFlags::UNDERLINE),
                5 | 6 => self.flags.insert(SgrFlags::BLINK),
                7 => self.flags.insert(SgrFlags::INVERSE),
                8 => self.flags.insert(SgrFlags::HIDDEN),
                9 => self.flags.insert(SgrFlags::STRIKETHROUGH),
                22 => self.flags.remove(SgrFlags::BOLD | SgrFlags::DIM),
                23 => self.flags.remove(SgrFlags::ITALIC),
                24 => self.flags.remove(SgrFlags::UNDERLINE),
                25 => self.flags.remove(SgrFlags::BLINK),
                27 => self.flags.remove(SgrFlags::INVERSE),
                28 => self.flags.remove(SgrFlags::HIDDEN),
                29 => self.flags.remove(SgrFlags::STRIKETHROUGH),
                p @ 30..=37 => self.fg = Color::Named((p - 30) as u8),
                38 => match Self::extended_color(&params[i..]) {
                    Some((color, consumed)) => {
                        self.fg = color;
                        i += consumed;
                    }
                    None => return,
                },
                39 => self.fg = Color::Default,
                p @ 40..=47 => self.bg = Color::Named((p - 40) as u8),
                48 => match Self::extended_color(&params[i..]) {
                    Some((color, consumed)) => {
                        self.bg = color;
                        i += consumed;
                    }
                    None => return,
                },
                49 => self.bg = Color::Default,
                p @ 90..=97 => self.fg = Color::Named((p - 90 + 8) as u8),
                p @ 100..=107 => self.bg = Color::Named((p - 100 + 8) as u8),
                _ => {}
            }
            i += 1;
        }
    }

    /// Decode a 38/48 extended color payload.
    ///
    /// `params[0]` is the introducer itself. Returns the color and the number
    /// of *extra* parameters consumed beyond the introducer, or `None` if the
    /// payload is malformed.
    fn extended_color(params: &[u16]) -> Option<(Color, usize)> {
        match params.get(1)? {
            5 => {
                let idx = *params.get(2)?;
                Some((Color::Indexed(idx.min(255) as u8), 2))
            }
            2 => {
                let r = *params.get(2)?;
                let g = *params.get(3)?;
                let b = *params.get(4)?;
                Some((
                    Color::Rgb(r.min(255) as u8, g.min(255) as u8, b.min(255) as u8),
                    4,
                ))
            }
            _ => None,
        }
    }
}

/// A single cell in the terminal grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    /// The character content. A space for empty/erased cells.
    content: char,
    /// Display width of the content in terminal columns (0, 1, or 2).
    width: u8,
    /// Cell-level flags (wide char, continuation).
    #[cfg_attr(feature = "serde", serde(with = "serde_bits::cell_flags"))]
    pub flags: CellFlags,
    /// SGR text attributes.
    pub attrs: SgrAttrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            content: ' ',
            width: 1,
            flags: CellFlags::empty(),
            attrs: SgrAttrs::default(),
        }
    }
}

impl Cell {
    /// Create a new cell with the given character and default attributes.
    pub fn new(ch: char) -> Self {
        Self {
            content: ch,
            width: 1,
            flags: CellFlags::empty(),
            attrs: SgrAttrs::default(),
        }
    }

    /// Create a new cell with the given character, width, and attributes.
    pub fn with_attrs(ch: char, width: u8, attrs: SgrAttrs) -> Self {
        Self {
            content: ch,
            width,
            flags: CellFlags::empty(),
            attrs,
        }
    }

    /// Create a wide (2-column) character cell.
    ///
    /// Returns `(leading, continuation)`. The leading cell holds the
    /// character; the continuation cell is a placeholder.
    pub fn wide(ch: char, attrs: SgrAttrs) -> (Self, Self) {
        let leading = Self {
            content: ch,
            width: 2,
            flags: CellFlags::WIDE_CHAR,
            attrs,
        };
        let continuation = Self {
            content: ' ',
            width: 0,
            flags: CellFlags::WIDE_CONTINUATION,
            attrs,
        };
        (leading, continuation)
    }

    /// The character content of this cell.
    pub fn content(&self) -> char {
        self.content
    }

    /// The display width in terminal columns.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Whether this cell is the leading half of a wide character.
    pub fn is_wide(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CHAR)
    }

    /// Whether this cell is a continuation (trailing half) of a wide character.
    pub fn is_wide_continuation(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CONTINUATION)
    }

    /// Set the character content and display width.
    pub fn set_content(&mut self, ch: char, width: u8) {
        self.content = ch;
        self.width = width;
        self.flags
            .remove(CellFlags::WIDE_CHAR | CellFlags::WIDE_CONTINUATION);
    }

    /// Reset this cell to a blank space with the given background color.
    ///
    /// Used by erase operations (ED, EL, ECH) which fill with the current
    /// background color but reset all other attributes.
    pub fn erase(&mut self, bg: Color) {
        self.content = ' ';
        self.width = 1;
        self.flags = CellFlags::empty();
        self.attrs = SgrAttrs {
            bg,
            ..SgrAttrs::default()
        };
    }

    /// Reset this cell to a blank space with default attributes.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Bitset fields are serialized as their raw bit patterns, the same compact
/// encoding the dashboard uses for input-modifier bitsets.
#[cfg(feature = "serde")]
mod serde_bits {
    pub(super) mod sgr_flags {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        use crate::cell::SgrFlags;

        pub fn serialize<S: Serializer>(flags: &SgrFlags, serializer: S) -> Result<S::Ok, S::Error> {
            flags.bits().serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SgrFlags, D::Error> {
            Ok(SgrFlags::from_bits_truncate(u8::deserialize(deserializer)?))
        }
    }

    pub(super) mod cell_flags {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        use crate::cell::CellFlags;

        pub fn serialize<S: Serializer>(flags: &CellFlags, serializer: S) -> Result<S::Ok, S::Error> {
            flags.bits().serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CellFlags, D::Error> {
            Ok(CellFlags::from_bits_truncate(u8::deserialize(deserializer)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cell_is_space() {
        let cell = Cell::default();
        assert_eq!(cell.content(), ' ');
        assert_eq!(cell.width(), 1);
        assert_eq!(cell.attrs, SgrAttrs::default());
        assert!(!cell.is_wide());
        assert!(!cell.is_wide_continuation());
    }

    #[test]
    fn cell_erase_keeps_background_only() {
        let mut cell = Cell::with_attrs(
            'X',
            1,
            SgrAttrs {
                flags: SgrFlags::BOLD | SgrFlags::ITALIC,
                fg: Color::Named(1),
                bg: Color::Named(4),
            },
        );
        cell.erase(Color::Named(2));
        assert_eq!(cell.content(), ' ');
        assert_eq!(cell.attrs.flags, SgrFlags::empty());
        assert_eq!(cell.attrs.fg, Color::Default);
        assert_eq!(cell.attrs.bg, Color::Named(2));
    }

    #[test]
    fn wide_char_pair() {
        let attrs = SgrAttrs {
            flags: SgrFlags::BOLD,
            ..SgrAttrs::default()
        };
        let (lead, cont) = Cell::wide('中', attrs);
        assert!(lead.is_wide());
        assert_eq!(lead.width(), 2);
        assert_eq!(lead.content(), '中');
        assert!(cont.is_wide_continuation());
        assert_eq!(cont.width(), 0);
    }

    #[test]
    fn set_content_clears_wide_flags() {
        let (mut lead, _) = Cell::wide('中', SgrAttrs::default());
        lead.set_content('A', 1);
        assert!(!lead.is_wide());
        assert!(!lead.is_wide_continuation());
    }

    #[test]
    fn sgr_reset_restores_defaults() {
        let mut attrs = SgrAttrs {
            flags: SgrFlags::BOLD | SgrFlags::UNDERLINE,
            fg: Color::Rgb(255, 0, 0),
            bg: Color::Indexed(42),
        };
        attrs.apply_sgr(&[0]);
        assert_eq!(attrs, SgrAttrs::default());
    }

    #[test]
    fn sgr_empty_params_is_reset() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr(&[1, 31]);
        attrs.apply_sgr(&[]);
        assert_eq!(attrs, SgrAttrs::default());
    }

    #[test]
    fn sgr_basic_colors() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr(&[31, 44]);
        assert_eq!(attrs.fg, Color::Named(1));
        assert_eq!(attrs.bg, Color::Named(4));
        attrs.apply_sgr(&[39, 49]);
        assert_eq!(attrs.fg, Color::Default);
        assert_eq!(attrs.bg, Color::Default);
    }

    #[test]
    fn sgr_bright_colors() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr(&[91, 102]);
        assert_eq!(attrs.fg, Color::Named(9));
        assert_eq!(attrs.bg, Color::Named(10));
    }

    #[test]
    fn sgr_256_and_rgb_colors() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr(&[38, 5, 196]);
        assert_eq!(attrs.fg, Color::Indexed(196));
        attrs.apply_sgr(&[48, 2, 10, 20, 30]);
        assert_eq!(attrs.bg, Color::Rgb(10, 20, 30));
    }

    #[test]
    fn sgr_extended_color_then_more_params() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr(&[38, 5, 10, 1]);
        assert_eq!(attrs.fg, Color::Indexed(10));
        assert!(attrs.flags.contains(SgrFlags::BOLD));
    }

    #[test]
    fn sgr_malformed_extended_color_aborts() {
        let mut attrs = SgrAttrs::default();
        // 38 without a recognized sub-introducer: the rest is dropped.
        attrs.apply_sgr(&[38, 99, 1]);
        assert_eq!(attrs.fg, Color::Default);
        assert!(!attrs.flags.contains(SgrFlags::BOLD));
    }

    #[test]
    fn sgr_truncated_rgb_aborts() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr(&[38, 2, 10]);
        assert_eq!(attrs.fg, Color::Default);
    }

    #[test]
    fn sgr_clear_codes() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr(&[1, 2, 3, 4, 5, 7, 8, 9]);
        attrs.apply_sgr(&[22, 23, 24, 25, 27, 28, 29]);
        assert_eq!(attrs.flags, SgrFlags::empty());
    }

    #[test]
    fn sgr_unknown_codes_are_skipped() {
        let mut attrs = SgrAttrs::default();
        attrs.apply_sgr(&[99, 1, 12345]);
        assert!(attrs.flags.contains(SgrFlags::BOLD));
    }
}
