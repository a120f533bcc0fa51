//! Hex colour parsing and sRGB transfer helpers.
//!
//! Gradient stops are written as sRGB hex strings in the config file but the
//! display pass blends in linear space, so every stop is decoded once here.

/// Parses `#rrggbb`, `rrggbb`, `#rgb` or `rgb` into 8-bit sRGB channels.
pub fn parse_hex_color(raw: &str) -> Result<[u8; 3], String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(format!("invalid colour '{raw}': expected hex digits"));
    }

    let channel = |text: &str| {
        u8::from_str_radix(text, 16).map_err(|err| format!("invalid colour '{raw}': {err}"))
    };

    match digits.len() {
        6 => Ok([
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        ]),
        3 => {
            let mut out = [0u8; 3];
            for (slot, ch) in out.iter_mut().zip(digits.chars()) {
                let nibble = channel(&ch.to_string())?;
                *slot = nibble * 17;
            }
            Ok(out)
        }
        other => Err(format!(
            "invalid colour '{raw}': expected 3 or 6 hex digits, found {other}"
        )),
    }
}

/// sRGB electro-optical transfer function for a single channel in `[0, 1]`.
pub fn srgb_to_linear(value: f32) -> f32 {
    let v = value.clamp(0.0, 1.0);
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Inverse of [`srgb_to_linear`].
pub fn linear_to_srgb(value: f32) -> f32 {
    let v = value.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

pub fn srgb8_to_linear(rgb: [u8; 3]) -> [f32; 3] {
    rgb.map(|c| srgb_to_linear(f32::from(c) / 255.0))
}

/// Convenience wrapper: hex string straight to linear RGB.
pub fn hex_to_linear(raw: &str) -> Result<[f32; 3], String> {
    parse_hex_color(raw).map(srgb8_to_linear)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_forms() {
        assert_eq!(parse_hex_color("#900000").unwrap(), [0x90, 0, 0]);
        assert_eq!(parse_hex_color("1a0000").unwrap(), [0x1a, 0, 0]);
        assert_eq!(parse_hex_color("#f80").unwrap(), [0xff, 0x88, 0x00]);
    }

    #[test]
    fn rejects_malformed_colours() {
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("red").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
    }

    #[test]
    fn transfer_functions_are_inverse() {
        for step in 0..=20 {
            let v = step as f32 / 20.0;
            let back = linear_to_srgb(srgb_to_linear(v));
            assert!((back - v).abs() < 1e-4, "{v} -> {back}");
        }
    }

    #[test]
    fn mid_grey_decodes_darker() {
        let linear = srgb8_to_linear([128, 128, 128]);
        assert!((linear[0] - 0.2158).abs() < 1e-3);
    }
}
