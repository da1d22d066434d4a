//! Geographic coordinates as printed in the heritage list.
//!
//! Cells hold either degrees/minutes/seconds with a hemisphere word
//! (`48° 38′ 10″ nord, 1° 30′ 40″ ouest`, French or English initials) or a
//! decimal pair (`48.636, -1.511`). Both are reduced to decimal degrees.

use regex::{Regex, RegexBuilder};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether the point falls in metropolitan France or one of the overseas
    /// territories that hold listed sites.
    pub fn in_france(&self) -> bool {
        FRENCH_TERRITORIES
            .iter()
            .any(|area| area.contains(self.latitude, self.longitude))
    }
}

struct Area {
    latitude: (f64, f64),
    longitude: (f64, f64),
}

impl Area {
    const fn new(latitude: (f64, f64), longitude: (f64, f64)) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.latitude.0..=self.latitude.1).contains(&latitude)
            && (self.longitude.0..=self.longitude.1).contains(&longitude)
    }
}

const FRENCH_TERRITORIES: [Area; 6] = [
    // metropolitan France and Corsica
    Area::new((41.0, 51.0), (-5.0, 10.0)),
    // La Réunion
    Area::new((-25.0, -20.0), (55.0, 60.0)),
    // Guadeloupe and Martinique
    Area::new((14.0, 18.0), (-63.0, -60.0)),
    // New Caledonia
    Area::new((-23.0, -21.0), (164.0, 168.0)),
    // French Polynesia
    Area::new((-18.0, -8.0), (-141.0, -138.0)),
    // French Southern and Antarctic Lands
    Area::new((-50.0, -37.0), (50.0, 78.0)),
];

/// Converts degrees, minutes and seconds to decimal degrees. Southern and
/// western hemispheres are negative.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: char) -> f64 {
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    match hemisphere.to_ascii_uppercase() {
        'S' | 'O' | 'W' => -value,
        _ => value,
    }
}

pub struct CoordinateParser {
    dms: Regex,
    decimal: Regex,
}

impl CoordinateParser {
    pub fn new() -> Result<Self, regex::Error> {
        let dms = RegexBuilder::new(
            r#"(\d+(?:[.,]\d+)?)\s*°\s*(?:(\d+(?:[.,]\d+)?)\s*[′']\s*)?(?:(\d+(?:[.,]\d+)?)\s*[″"]\s*)?([NSEOW])"#,
        )
        .case_insensitive(true)
        .build()?;
        let decimal = Regex::new(r"-?\d+\.\d+")?;
        Ok(Self { dms, decimal })
    }

    /// Parses a coordinate cell. Returns `None` when neither notation yields a
    /// latitude and a longitude in range.
    pub fn parse(&self, raw: &str) -> Option<Position> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        self.parse_dms(raw)
            .or_else(|| self.parse_decimal(raw))
            .filter(|position| {
                position.latitude.abs() <= 90.0 && position.longitude.abs() <= 180.0
            })
    }

    fn parse_dms(&self, raw: &str) -> Option<Position> {
        let mut latitude = None;
        let mut longitude = None;
        for caps in self.dms.captures_iter(raw) {
            let number = |index: usize| {
                caps.get(index)
                    .map_or(Some(0.0), |m| m.as_str().replace(',', ".").parse().ok())
            };
            let hemisphere = caps.get(4)?.as_str().chars().next()?;
            let value = dms_to_decimal(number(1)?, number(2)?, number(3)?, hemisphere);
            match hemisphere.to_ascii_uppercase() {
                'N' | 'S' if latitude.is_none() => latitude = Some(value),
                'E' | 'O' | 'W' if longitude.is_none() => longitude = Some(value),
                _ => {}
            }
            if latitude.is_some() && longitude.is_some() {
                break;
            }
        }
        Some(Position::new(latitude?, longitude?))
    }

    fn parse_decimal(&self, raw: &str) -> Option<Position> {
        let mut values = self
            .decimal
            .find_iter(raw)
            .filter_map(|m| m.as_str().parse::<f64>().ok());
        Some(Position::new(values.next()?, values.next()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CoordinateParser {
        CoordinateParser::new().unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn converts_dms_with_hemisphere_sign() {
        assert!(close(dms_to_decimal(48.0, 51.0, 29.0, 'N'), 48.858_055));
        assert!(close(dms_to_decimal(1.0, 30.0, 0.0, 'O'), -1.5));
        assert!(close(dms_to_decimal(1.0, 30.0, 0.0, 'w'), -1.5));
        assert!(close(dms_to_decimal(21.0, 0.0, 0.0, 'S'), -21.0));
    }

    #[test]
    fn parses_french_dms_cell() {
        let position = parser()
            .parse("48° 38′ 10″ nord, 1° 30′ 40″ ouest")
            .unwrap();
        assert!(close(position.latitude, 48.636_111));
        assert!(close(position.longitude, -1.511_111));
    }

    #[test]
    fn parses_english_initials_and_missing_seconds() {
        let position = parser().parse("43° 36′ N 1° 26′ E").unwrap();
        assert!(close(position.latitude, 43.6));
        assert!(close(position.longitude, 1.433_333));
    }

    #[test]
    fn falls_back_to_decimal_pair() {
        let position = parser().parse("48.858, 2.294").unwrap();
        assert_eq!(position, Position::new(48.858, 2.294));
        let position = parser().parse("-21.115 55.536").unwrap();
        assert_eq!(position, Position::new(-21.115, 55.536));
    }

    #[test]
    fn rejects_incomplete_or_out_of_range_cells() {
        let parser = parser();
        assert_eq!(parser.parse(""), None);
        assert_eq!(parser.parse("48° 38′ 10″ nord"), None);
        assert_eq!(parser.parse("Bien en série"), None);
        assert_eq!(parser.parse("123.5, 2.0"), None);
    }

    #[test]
    fn france_includes_overseas_territories() {
        assert!(Position::new(48.858, 2.294).in_france());
        assert!(Position::new(-21.1, 55.5).in_france());
        assert!(Position::new(-22.0, 166.0).in_france());
        assert!(!Position::new(51.5, -0.12).in_france());
        assert!(!Position::new(40.4, -3.7).in_france());
    }
}
