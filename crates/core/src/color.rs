//! Human-readable names for hex colors.
//!
//! Products carry their color as a hex string (`#000`, `#1e3a8a`). The cart
//! shows a basic color name next to the swatch, picked as the nearest entry
//! of a small palette.

/// The basic palette, as `(name, r, g, b)`.
const BASIC_PALETTE: &[(&str, u8, u8, u8)] = &[
    ("black", 0x00, 0x00, 0x00),
    ("blue", 0x00, 0x00, 0xff),
    ("cyan", 0x00, 0xff, 0xff),
    ("green", 0x00, 0x80, 0x00),
    ("teal", 0x00, 0x80, 0x80),
    ("turquoise", 0x40, 0xe0, 0xd0),
    ("indigo", 0x4b, 0x00, 0x82),
    ("gray", 0x80, 0x80, 0x80),
    ("purple", 0x80, 0x00, 0x80),
    ("brown", 0xa5, 0x2a, 0x2a),
    ("tan", 0xd2, 0xb4, 0x8c),
    ("violet", 0xee, 0x82, 0xee),
    ("beige", 0xf5, 0xf5, 0xdc),
    ("fuchsia", 0xff, 0x00, 0xff),
    ("gold", 0xff, 0xd7, 0x00),
    ("orange", 0xff, 0xa5, 0x00),
    ("pink", 0xff, 0xc0, 0xcb),
    ("red", 0xff, 0x00, 0x00),
    ("white", 0xff, 0xff, 0xff),
    ("yellow", 0xff, 0xff, 0x00),
];

/// Parse `#rgb` / `#rrggbb` (the `#` is optional).
#[must_use]
pub fn parse_hex(input: &str) -> Option<(u8, u8, u8)> {
    let hex = input.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let mut channels = hex
                .chars()
                .map(|c| c.to_digit(16).and_then(|d| u8::try_from(d * 17).ok()));
            Some((channels.next()??, channels.next()??, channels.next()??))
        }
        6 => Some((
            u8::from_str_radix(hex.get(0..2)?, 16).ok()?,
            u8::from_str_radix(hex.get(2..4)?, 16).ok()?,
            u8::from_str_radix(hex.get(4..6)?, 16).ok()?,
        )),
        _ => None,
    }
}

/// Nearest basic color name for a hex color, or `None` if it does not parse.
///
/// ```
/// use navdana_core::color::basic_name;
///
/// assert_eq!(basic_name("#000"), Some("black"));
/// assert_eq!(basic_name("#fe0101"), Some("red"));
/// assert_eq!(basic_name("maroon-ish"), None);
/// ```
#[must_use]
pub fn basic_name(hex: &str) -> Option<&'static str> {
    let (r, g, b) = parse_hex(hex)?;
    BASIC_PALETTE
        .iter()
        .min_by_key(|(_, pr, pg, pb)| {
            let dr = i32::from(r) - i32::from(*pr);
            let dg = i32::from(g) - i32::from(*pg);
            let db = i32::from(b) - i32::from(*pb);
            dr * dr + dg * dg + db * db
        })
        .map(|(name, ..)| *name)
}
