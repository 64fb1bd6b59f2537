//! Color parsing utilities
//!
//! Hex colors as written in the demo config: `RRGGBB`, `#RRGGBB`, `RGB`, `#RGB`.

/// Parse a hex color into 8-bit channels
///
/// Returns None on invalid input.
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ]),
        // Short form: F -> FF
        3 => Some([
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
        ]),
        _ => None,
    }
}

/// Parse a hex color into normalized RGB (0.0-1.0)
pub fn parse_hex_rgb(hex: &str) -> Option<[f32; 3]> {
    parse_hex_color(hex).map(|c| c.map(|v| f32::from(v) / 255.0))
}
