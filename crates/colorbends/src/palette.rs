use std::fmt;

/// The shader's colour array has eight slots; extra colours are ignored.
pub const MAX_COLORS: usize = 8;

/// Linear RGB triple with each channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_byte = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("colour '{0}' must have 3 or 6 hex digits")]
    Length(String),
    #[error("colour '{0}' contains a non-hex digit")]
    Digit(String),
}

/// Parses `#rgb` or `#rrggbb`; the `#` is optional and case is ignored.
pub fn parse_hex_color(value: &str) -> Result<Rgb, ColorParseError> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(ColorParseError::Digit(value.to_string()));
    }

    let channel = |hex: &str| -> Result<f32, ColorParseError> {
        u8::from_str_radix(hex, 16)
            .map(|byte| f32::from(byte) / 255.0)
            .map_err(|_| ColorParseError::Digit(value.to_string()))
    };

    match digits.len() {
        3 => {
            let expanded: Vec<String> = digits.chars().map(|ch| format!("{ch}{ch}")).collect();
            Ok(Rgb::new(
                channel(&expanded[0])?,
                channel(&expanded[1])?,
                channel(&expanded[2])?,
            ))
        }
        6 => Ok(Rgb::new(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        _ => Err(ColorParseError::Length(value.to_string())),
    }
}

/// Parses a list of hex colours, keeping at most [`MAX_COLORS`].
pub fn parse_palette<S: AsRef<str>>(values: &[S]) -> Result<Vec<Rgb>, ColorParseError> {
    if values.len() > MAX_COLORS {
        tracing::warn!(
            provided = values.len(),
            kept = MAX_COLORS,
            "colour list exceeds shader capacity; truncating"
        );
    }
    values
        .iter()
        .take(MAX_COLORS)
        .map(|value| parse_hex_color(value.as_ref()))
        .collect()
}
