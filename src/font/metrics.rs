//! Advance widths for the standard PDF fonts, from the Adobe AFM files.
//!
//! Widths are in thousandths of an em. Only the printable ASCII range is
//! tabulated; a handful of common punctuation marks outside it are mapped
//! explicitly and everything else falls back to the family's default width.

/// Width metrics for one standard font face.
pub struct StandardFontMetrics {
    /// Widths for U+0020..=U+007E.
    ascii: &'static [u16; 95],
    default_width: u16,
}

impl StandardFontMetrics {
    /// Advance width of `ch` in thousandths of an em.
    pub fn width_units(&self, ch: char) -> u16 {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) {
            return self.ascii[(cp - 0x20) as usize];
        }
        match ch {
            // Bullet
            '\u{2022}' => self.bullet_width(),
            // En and em dashes
            '\u{2013}' => self.ascii[(b'_' - 0x20) as usize],
            '\u{2014}' => {
                if self.is_monospace() {
                    600
                } else {
                    1000
                }
            }
            // Curly quotes take the comma and straight double-quote widths
            '\u{2018}' | '\u{2019}' => self.ascii[(b',' - 0x20) as usize],
            '\u{201C}' | '\u{201D}' => self.ascii[(b'"' - 0x20) as usize],
            '\u{00A0}' => self.ascii[0],
            '\t' => self.ascii[0] * 4,
            _ => self.default_width,
        }
    }

    fn is_monospace(&self) -> bool {
        self.default_width == 600
    }

    fn bullet_width(&self) -> u16 {
        if self.is_monospace() {
            600
        } else {
            350
        }
    }

    /// Width of a character in points at `font_size`.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.width_units(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points at `font_size`.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_WIDTHS,
    default_width: 556,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_BOLD_WIDTHS,
    default_width: 556,
};

pub static COURIER: StandardFontMetrics = StandardFontMetrics {
    ascii: &[600; 95],
    default_width: 600,
};

#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    333, 333, 584, 584, 584, 611, 975,
    // A-Z
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    333, 278, 333, 584, 556, 333,
    // a-z
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    // { | } ~
    389, 280, 389, 584,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_space_width() {
        assert!((HELVETICA.char_width(' ', 12.0) - 3.336).abs() < 0.001);
    }

    #[test]
    fn courier_is_monospaced() {
        assert_eq!(COURIER.width_units('i'), COURIER.width_units('W'));
        assert!((COURIER.measure_string("abcde", 10.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn bold_is_wider_for_lowercase() {
        assert!(HELVETICA_BOLD.measure_string("bold", 10.0) > HELVETICA.measure_string("bold", 10.0));
    }

    #[test]
    fn unknown_chars_use_default_width() {
        assert_eq!(HELVETICA.width_units('\u{4E2D}'), 556);
        assert_eq!(HELVETICA.width_units('\u{2022}'), 350);
    }
}
