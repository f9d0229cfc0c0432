use std::sync::LazyLock;

use regex::Regex;

use crate::models::{CustomSection, ElementPositions, Position};

pub const DEFAULT_SECTION_SPACING: f64 = 60.0;

const NUMBER: &str = r"(-?\d+(?:\.\d+)?)";

static TRANSLATE3D: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"translate3d\(\s*{NUMBER}px,\s*{NUMBER}px,\s*0px\s*\)")).unwrap()
});
static TRANSLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"translate\(\s*{NUMBER}px,\s*{NUMBER}px\s*\)")).unwrap());
// last two matrix components are the translation
static MATRIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"matrix\(.*,\s*{NUMBER},\s*{NUMBER}\s*\)")).unwrap());

/// Extract the offset from a CSS transform string.
///
/// Tries `translate3d(Xpx, Ypx, 0px)`, then `translate(Xpx, Ypx)`, then
/// `matrix(a, b, c, d, X, Y)`.
pub fn parse_transform(transform: &str) -> Option<Position> {
    [&*TRANSLATE3D, &*TRANSLATE, &*MATRIX]
        .into_iter()
        .find_map(|re| re.captures(transform))
        .and_then(|caps| {
            let x = caps[1].parse::<f64>().ok()?;
            let y = caps[2].parse::<f64>().ok()?;
            Some(Position::new(x, y))
        })
}

/// Record where a dragged element ended up.
///
/// An unparsable transform never overwrites a known offset; it only makes
/// sure the element has an entry.
pub fn record_drag_end(
    positions: &mut ElementPositions,
    element_id: &str,
    transform: &str,
) -> Position {
    match parse_transform(transform) {
        Some(position) => {
            positions.insert(element_id.to_string(), position);
            position
        }
        None => {
            log::debug!("Unrecognized transform '{}' for {}", transform, element_id);
            *positions.entry(element_id.to_string()).or_default()
        }
    }
}

/// Stack sections vertically in list order, keeping each one's x offset
pub fn restack_sections(
    positions: &mut ElementPositions,
    sections: &[CustomSection],
    spacing: f64,
) {
    for (index, section) in sections.iter().enumerate() {
        let entry = positions.entry(section.id.clone()).or_default();
        entry.y = index as f64 * spacing;
    }
}

pub fn transform_css(position: &Position) -> String {
    format!("translate3d({}px, {}px, 0px)", position.x, position.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_transform_form() {
        assert_eq!(
            parse_transform("translate3d(12px, -4.5px, 0px)"),
            Some(Position::new(12.0, -4.5))
        );
        assert_eq!(parse_transform("translate(3px, 7px)"), Some(Position::new(3.0, 7.0)));
        assert_eq!(
            parse_transform("matrix(1, 0, 0, 1, 25, -10)"),
            Some(Position::new(25.0, -10.0))
        );
        assert_eq!(parse_transform("rotate(45deg)"), None);
        assert_eq!(parse_transform(""), None);
    }

    #[test]
    fn drag_end_stores_parsed_offset() {
        let mut positions = ElementPositions::new();
        let pos = record_drag_end(&mut positions, "company-name", "translate3d(40px, 10px, 0px)");
        assert_eq!(pos, Position::new(40.0, 10.0));
        assert_eq!(positions["company-name"], Position::new(40.0, 10.0));
    }

    #[test]
    fn unparsable_drag_keeps_existing_offset() {
        let mut positions = ElementPositions::new();
        positions.insert("logo".into(), Position::new(5.0, 6.0));

        record_drag_end(&mut positions, "logo", "none");
        record_drag_end(&mut positions, "footer", "none");

        assert_eq!(positions["logo"], Position::new(5.0, 6.0));
        assert_eq!(positions["footer"], Position::new(0.0, 0.0));
    }

    #[test]
    fn restack_sets_y_by_index() {
        let sections = vec![
            CustomSection::new("A", "", "#fff"),
            CustomSection::new("B", "", "#fff"),
            CustomSection::new("C", "", "#fff"),
        ];
        let mut positions = ElementPositions::new();
        positions.insert(sections[1].id.clone(), Position::new(15.0, 999.0));

        restack_sections(&mut positions, &sections, DEFAULT_SECTION_SPACING);

        assert_eq!(positions[&sections[0].id], Position::new(0.0, 0.0));
        assert_eq!(positions[&sections[1].id], Position::new(15.0, 60.0));
        assert_eq!(positions[&sections[2].id], Position::new(0.0, 120.0));
    }

    #[test]
    fn css_uses_translate3d() {
        assert_eq!(transform_css(&Position::new(12.0, -4.5)), "translate3d(12px, -4.5px, 0px)");
    }
}
