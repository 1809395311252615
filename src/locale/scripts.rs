//! OCR confusion tables per writing system, as `(source, target, weight)`.

/// Latin script: segmentation merges and splits, glyph swaps, lost diacritics.
pub const LATIN: &[(&str, &str, f64)] = &[
    ("rn", "m", 1.0),
    ("m", "rn", 0.6),
    ("cl", "d", 0.9),
    ("d", "cl", 0.4),
    ("vv", "w", 0.8),
    ("w", "vv", 0.4),
    ("ri", "n", 0.7),
    ("li", "h", 0.6),
    ("nn", "m", 0.5),
    ("0", "O", 0.8),
    ("O", "0", 0.8),
    ("1", "l", 0.8),
    ("l", "1", 0.8),
    ("1", "I", 0.6),
    ("I", "1", 0.6),
    ("5", "S", 0.5),
    ("S", "5", 0.5),
    ("8", "B", 0.5),
    ("B", "8", 0.5),
    ("e", "c", 0.4),
    ("c", "e", 0.4),
    ("n", "h", 0.4),
    ("h", "n", 0.4),
    ("u", "v", 0.3),
    ("v", "u", 0.3),
    ("ñ", "n", 1.0),
    ("á", "a", 1.0),
    ("é", "e", 1.0),
    ("í", "i", 1.0),
    ("ó", "o", 1.0),
    ("ú", "u", 1.0),
    ("ü", "u", 1.0),
];

/// Hebrew script: look-alike letter pairs plus digits read as letters.
pub const HEBREW: &[(&str, &str, f64)] = &[
    ("ר", "ד", 1.0),
    ("ד", "ר", 1.0),
    ("ה", "ח", 1.0),
    ("ח", "ה", 1.0),
    ("ב", "כ", 1.0),
    ("כ", "ב", 1.0),
    ("ו", "ז", 1.0),
    ("ז", "ו", 1.0),
    ("ג", "נ", 1.0),
    ("נ", "ג", 1.0),
    ("ע", "צ", 1.0),
    ("צ", "ע", 1.0),
    ("ם", "ס", 1.0),
    ("ס", "ם", 1.0),
    ("ת", "ח", 0.8),
    ("ח", "ת", 0.8),
    ("1", "ו", 0.5),
    ("0", "ס", 0.5),
    ("6", "ב", 0.5),
    ("9", "ף", 0.5),
];

/// Arabic glyphs sharing a base shape and differing only in dots. Within a
/// group every letter may be read as every other.
pub const ARABIC_GROUPS: &[(&[&str], f64)] = &[
    (&["ب", "ت", "ث", "ن", "ي"], 1.0),
    (&["ج", "ح", "خ"], 1.0),
    (&["د", "ذ"], 1.0),
    (&["ر", "ز"], 1.0),
    (&["س", "ش"], 1.0),
    (&["ص", "ض"], 1.0),
    (&["ط", "ظ"], 1.0),
    (&["ع", "غ"], 1.0),
    (&["ف", "ق"], 1.0),
];

/// Arabic pairs outside the dot groups, then tashkeel stripping.
pub const ARABIC: &[(&str, &str, f64)] = &[
    ("ه", "ة", 0.6),
    ("ة", "ه", 0.6),
    ("ى", "ي", 0.6),
    ("ي", "ى", 0.6),
    ("ا", "ل", 0.6),
    ("ل", "ا", 0.6),
    ("\u{064E}", "", 0.8),
    ("\u{064F}", "", 0.8),
    ("\u{0650}", "", 0.8),
    ("\u{0652}", "", 0.8),
    ("\u{0651}", "", 0.8),
    ("\u{064B}", "", 0.8),
    ("\u{064C}", "", 0.8),
    ("\u{064D}", "", 0.8),
];

/// Every ordered pair of distinct glyphs within each group, group by group.
pub fn expand_groups(groups: &[(&'static [&'static str], f64)]) -> Vec<(&'static str, &'static str, f64)> {
    let mut table = Vec::new();
    for &(glyphs, weight) in groups {
        for (i, &source) in glyphs.iter().enumerate() {
            for (j, &target) in glyphs.iter().enumerate() {
                if i != j {
                    table.push((source, target, weight));
                }
            }
        }
    }
    table
}
