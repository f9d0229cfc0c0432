use ratatui::style::Color;

/// Parse `#RRGGBB` or `#RGB` into its channels
pub fn parse_hex(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }

    if hex.len() == 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some((r, g, b))
    } else if hex.len() == 3 {
        // Short format: #RGB -> #RRGGBB
        let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
        let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
        let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
        Some(((r << 4) | r, (g << 4) | g, (b << 4) | b))
    } else {
        None
    }
}

/// Parse `rgb(r, g, b)`
fn parse_rgb(s: &str) -> Option<(u8, u8, u8)> {
    let content = s.trim().strip_prefix("rgb(")?.strip_suffix(')')?;
    let parts: Vec<&str> = content.split(',').map(|p| p.trim()).collect();
    if parts.len() != 3 {
        return None;
    }
    Some((parts[0].parse().ok()?, parts[1].parse().ok()?, parts[2].parse().ok()?))
}

fn channels(s: &str) -> Option<(u8, u8, u8)> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "black" => Some((0, 0, 0)),
        "white" => Some((255, 255, 255)),
        _ => parse_hex(&s).or_else(|| parse_rgb(&s)),
    }
}

pub fn to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// A CSS color string as a terminal color. Unrecognized input gives `Reset`
/// so the terminal default shows through.
pub fn to_terminal_color(s: &str) -> Color {
    match channels(s) {
        Some((r, g, b)) => Color::Rgb(r, g, b),
        None => Color::Reset,
    }
}

/// Perceived brightness in 0.0..=1.0 (0.299 R + 0.587 G + 0.114 B)
fn brightness((r, g, b): (u8, u8, u8)) -> f64 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0
}

/// Text color readable on `background`: black on light, white on dark.
/// Unparsable backgrounds are treated as light.
pub fn contrast_color(background: &str) -> &'static str {
    match channels(background) {
        Some(rgb) if brightness(rgb) <= 0.5 => "#ffffff",
        _ => "#000000",
    }
}

/// Move each channel `percent` of the way towards white.
/// Invalid input gives `#ffffff`.
pub fn lighten(color: &str, percent: f64) -> String {
    let Some((r, g, b)) = parse_hex(color) else {
        return "#ffffff".to_string();
    };
    let amount = (percent / 100.0).clamp(0.0, 1.0);
    let mix = |c: u8| (c as f64 + (255.0 - c as f64) * amount).round() as u8;
    to_hex((mix(r), mix(g), mix(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(parse_hex("#3f51b5"), Some((0x3f, 0x51, 0xb5)));
        assert_eq!(parse_hex("#FFF"), Some((255, 255, 255)));
        assert_eq!(parse_hex("3f51b5"), None);
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
    }

    #[test]
    fn terminal_color_accepts_css_forms() {
        assert_eq!(to_terminal_color("#000"), Color::Rgb(0, 0, 0));
        assert_eq!(to_terminal_color("rgb(1, 2, 3)"), Color::Rgb(1, 2, 3));
        assert_eq!(to_terminal_color("White"), Color::Rgb(255, 255, 255));
        assert_eq!(to_terminal_color("papayawhip-ish"), Color::Reset);
    }

    #[test]
    fn contrast_picks_readable_text() {
        assert_eq!(contrast_color("#ffffff"), "#000000");
        assert_eq!(contrast_color("#000000"), "#ffffff");
        assert_eq!(contrast_color("#3f51b5"), "#ffffff");
        assert_eq!(contrast_color("#f9f9ff"), "#000000");
        assert_eq!(contrast_color("not a color"), "#000000");
    }

    #[test]
    fn lighten_moves_towards_white() {
        assert_eq!(lighten("#000000", 50.0), "#808080");
        assert_eq!(lighten("#3f51b5", 0.0), "#3f51b5");
        assert_eq!(lighten("#3f51b5", 100.0), "#ffffff");
        assert_eq!(lighten("nope", 20.0), "#ffffff");
    }
}
