//! Static stamp preset table.

/// A stamp glyph and the box size it is placed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampPreset {
    pub key: &'static str,
    pub glyph: &'static str,
    pub base_size: f64,
}

/// All stamps a `stamp` object may reference through its `stampKey`.
pub const STAMP_PRESETS: &[StampPreset] = &[
    StampPreset { key: "star", glyph: "\u{2605}", base_size: 48.0 },
    StampPreset { key: "check", glyph: "\u{2714}", base_size: 48.0 },
    StampPreset { key: "cross", glyph: "\u{2716}", base_size: 48.0 },
    StampPreset { key: "heart", glyph: "\u{2665}", base_size: 48.0 },
    StampPreset { key: "question", glyph: "?", base_size: 56.0 },
    StampPreset { key: "exclamation", glyph: "!", base_size: 56.0 },
    StampPreset { key: "thumbs-up", glyph: "\u{1F44D}", base_size: 56.0 },
    StampPreset { key: "smile", glyph: "\u{1F642}", base_size: 56.0 },
];

/// Resolve a stamp key. Unknown keys fall back to the first preset so that
/// stamps created by newer peers still render.
pub fn stamp_preset(key: &str) -> &'static StampPreset {
    STAMP_PRESETS
        .iter()
        .find(|preset| preset.key == key)
        .unwrap_or(&STAMP_PRESETS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_keys() {
        assert_eq!(stamp_preset("heart").glyph, "\u{2665}");
        assert_eq!(stamp_preset("does-not-exist").key, "star");
    }

    #[test]
    fn test_keys_are_unique() {
        for (i, a) in STAMP_PRESETS.iter().enumerate() {
            for b in &STAMP_PRESETS[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }
}
