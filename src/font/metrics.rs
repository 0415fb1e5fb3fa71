//! Advance widths for the built-in faces, in 1/1000 em.
//!
//! Tables cover printable ASCII (U+0020..=U+007E). Everything else falls back
//! to a per-face default, with East Asian wide characters taking a full em.

/// Helvetica (AFM widths).
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold (AFM widths).
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// Times-Roman (AFM widths). Bold is approximated by scaling.
const TIMES: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // ' '..'/'
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, // '0'..'9'
    278, 278, 564, 564, 564, 444, 921, // ':'..'@'
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, // 'A'..'M'
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, // 'N'..'Z'
    333, 278, 333, 469, 500, 333, // '['..'`'
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, // 'a'..'m'
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, // 'n'..'z'
    480, 200, 480, 541, // '{'..'~'
];

/// Width metrics of one built-in face.
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    widths: Option<&'static [u16; 95]>,
    /// Used for every char when `widths` is None (monospace), and for
    /// non-ASCII chars otherwise.
    default_width: u16,
    /// Multiplier applied on top of the table (synthetic bold).
    scale: f64,
}

impl StandardFontMetrics {
    pub const HELVETICA: Self = Self {
        widths: Some(&HELVETICA),
        default_width: 556,
        scale: 1.0,
    };
    pub const HELVETICA_BOLD: Self = Self {
        widths: Some(&HELVETICA_BOLD),
        default_width: 611,
        scale: 1.0,
    };
    pub const TIMES: Self = Self {
        widths: Some(&TIMES),
        default_width: 500,
        scale: 1.0,
    };
    pub const TIMES_BOLD: Self = Self {
        widths: Some(&TIMES),
        default_width: 500,
        scale: 1.04,
    };
    pub const COURIER: Self = Self {
        widths: None,
        default_width: 600,
        scale: 1.0,
    };

    /// Advance width in 1/1000 em.
    pub fn units(&self, ch: char) -> f64 {
        let code = ch as u32;
        let base = match self.widths {
            Some(table) if (0x20..=0x7E).contains(&code) => table[(code - 0x20) as usize],
            _ if is_wide(ch) => 1000,
            _ => self.default_width,
        };
        base as f64 * self.scale
    }

    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.units(ch) / 1000.0 * font_size
    }

    pub fn measure_string(&self, text: &str, font_size: f64, letter_spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font_size) + letter_spacing)
            .sum()
    }
}

/// CJK ideographs, kana, hangul and fullwidth forms.
fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_lookup() {
        assert_eq!(StandardFontMetrics::HELVETICA.units(' '), 278.0);
        assert_eq!(StandardFontMetrics::HELVETICA.units('W'), 944.0);
        assert_eq!(StandardFontMetrics::HELVETICA_BOLD.units('m'), 889.0);
        assert_eq!(StandardFontMetrics::TIMES.units('a'), 444.0);
    }

    #[test]
    fn monospace_is_uniform() {
        let m = StandardFontMetrics::COURIER;
        assert_eq!(m.units('i'), m.units('W'));
    }

    #[test]
    fn wide_chars_take_a_full_em() {
        assert_eq!(StandardFontMetrics::HELVETICA.char_width('漢', 10.0), 10.0);
    }
}
