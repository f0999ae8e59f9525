use palette::{Hsl, IntoColor, Srgb};

/// 8-bit sRGB colour shared by the on-screen plot and the exporter.
pub type Rgb = Srgb<u8>;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Rgb::new(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// User colour list
// ---------------------------------------------------------------------------

/// Parse one colour: an SVG/CSS name (`"blue"`) or hex (`"#1f77b4"`).
pub fn parse_color(text: &str) -> Option<Rgb> {
    let text = text.trim();
    if text.starts_with('#') {
        return text.parse::<Rgb>().ok();
    }
    palette::named::from_str(&text.to_ascii_lowercase())
}

/// Parse a comma separated colour list.
///
/// Unknown entries are skipped. When nothing is usable, `fallback_len`
/// generated colours are returned instead so plotting never runs out.
pub fn parse_colors(text: &str, fallback_len: usize) -> Vec<Rgb> {
    let mut colors = Vec::new();
    for token in text.split(',').filter(|t| !t.trim().is_empty()) {
        match parse_color(token) {
            Some(c) => colors.push(c),
            None => log::warn!("Unknown colour '{}', skipped", token.trim()),
        }
    }
    if colors.is_empty() {
        colors = generate_palette(fallback_len.max(1));
    }
    colors
}

/// Colour of the `index`-th curve, cycling through `colors`.
pub fn color_for(colors: &[Rgb], index: usize) -> Rgb {
    if colors.is_empty() {
        return Rgb::new(128, 128, 128);
    }
    colors[index % colors.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_hex() {
        assert_eq!(parse_color("blue"), Some(Rgb::new(0, 0, 255)));
        assert_eq!(parse_color(" Red "), Some(Rgb::new(255, 0, 0)));
        assert_eq!(parse_color("#102030"), Some(Rgb::new(0x10, 0x20, 0x30)));
        assert_eq!(parse_color("notacolor"), None);
    }

    #[test]
    fn colors_cycle_by_index() {
        let colors = parse_colors("blue,red", 2);
        assert_eq!(colors.len(), 2);
        assert_eq!(color_for(&colors, 2), colors[0]);
        assert_eq!(color_for(&colors, 3), colors[1]);
    }

    #[test]
    fn unusable_list_falls_back_to_palette() {
        let colors = parse_colors("nope, ,", 3);
        assert_eq!(colors.len(), 3);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(5).len(), 5);
    }
}
