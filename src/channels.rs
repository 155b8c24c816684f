use std::str::FromStr;

use crate::error::{Error, Result};

/// Red, green, blue and white.
pub const CHANNEL_COUNT: usize = 4;

/// Intensities for one LED output, each nominally in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Channels([f32; CHANNEL_COUNT]);

impl Channels {
    pub const fn new(values: [f32; CHANNEL_COUNT]) -> Channels {
        Channels(values)
    }

    pub const fn zero() -> Channels {
        Channels([0.0; CHANNEL_COUNT])
    }

    pub fn values(&self) -> &[f32; CHANNEL_COUNT] {
        &self.0
    }

    pub fn scaled(&self, factor: f32) -> Channels {
        Channels(self.0.map(|v| v * factor))
    }

    /// Linear interpolation towards `other`; `f` is clamped to `[0, 1]`.
    pub fn lerp(&self, other: &Channels, f: f32) -> Channels {
        let f = f.clamp(0.0, 1.0);
        let mut result = [0.0; CHANNEL_COUNT];
        for i in 0..CHANNEL_COUNT {
            result[i] = self.0[i] * (1.0 - f) + other.0[i] * f;
        }

        Channels(result)
    }

    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }

    pub fn to_dmx(&self) -> [u8; CHANNEL_COUNT] {
        self.0.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Parses `#RRGGBB` or `#RRGGBBWW`. Without the white byte, white is off.
    pub fn from_hex(hex: &str) -> Result<Channels> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let well_formed = digits.len() == 6 || digits.len() == 8;
        if !well_formed || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidHexColor(hex.to_string()));
        }

        let rgb = palette::Srgb::<u8>::from_str(&digits[..6])?.into_format::<f32>();
        let white = match digits.get(6..) {
            Some(w) if !w.is_empty() => match u8::from_str_radix(w, 16) {
                Ok(w) => w as f32 / 255.0,
                Err(_) => return Err(Error::InvalidHexColor(hex.to_string())),
            },
            _ => 0.0,
        };

        Ok(Channels([rgb.red, rgb.green, rgb.blue, white]))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn nearly_equal(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    pub(crate) fn channels_nearly_equal(a: &Channels, b: &Channels) -> bool {
        a.values()
            .iter()
            .zip(b.values().iter())
            .all(|(a, b)| nearly_equal(*a, *b))
    }

    #[test]
    fn lerp_hits_both_ends_and_middle() {
        let from = Channels::zero();
        let to = Channels::new([1.0, 0.5, 0.0, 1.0]);

        assert_eq!(from.lerp(&to, 0.0), from);
        assert_eq!(from.lerp(&to, 1.0), to);
        assert!(channels_nearly_equal(
            &from.lerp(&to, 0.5),
            &Channels::new([0.5, 0.25, 0.0, 0.5])
        ));
    }

    #[test]
    fn lerp_clamps_fraction() {
        let from = Channels::new([0.2; CHANNEL_COUNT]);
        let to = Channels::new([0.8; CHANNEL_COUNT]);

        assert_eq!(from.lerp(&to, 1.7), to);
        assert_eq!(from.lerp(&to, -0.3), from);
    }

    #[test]
    fn validity() {
        assert!(Channels::new([0.0, 1.0, 0.5, 0.25]).is_valid());
        assert!(!Channels::new([1.1, 0.0, 0.0, 0.0]).is_valid());
        assert!(!Channels::new([f32::NAN, 0.0, 0.0, 0.0]).is_valid());
        assert!(!Channels::new([0.0, -0.01, 0.0, 0.0]).is_valid());
    }

    #[test]
    fn dmx_conversion_clamps() {
        assert_eq!(
            Channels::new([1.0, 0.0, 2.0, -1.0]).to_dmx(),
            [255, 0, 255, 0]
        );
        assert_eq!(Channels::new([0.5; CHANNEL_COUNT]).to_dmx(), [128; 4]);
    }

    #[test]
    fn parses_rgb_hex() {
        let orange = Channels::from_hex("#FF8000").unwrap();
        assert!(channels_nearly_equal(
            &orange,
            &Channels::new([1.0, 128.0 / 255.0, 0.0, 0.0])
        ));

        let green = Channels::from_hex("00ff00").unwrap();
        assert_eq!(green, Channels::new([0.0, 1.0, 0.0, 0.0]));
    }

    #[test]
    fn parses_rgbw_hex() {
        let white = Channels::from_hex("#000000FF").unwrap();
        assert_eq!(white, Channels::new([0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Channels::from_hex("#FFF").is_err());
        assert!(Channels::from_hex("#FF80001").is_err());
        assert!(Channels::from_hex("#GG0000").is_err());
        assert!(Channels::from_hex("#FF0000ZZ").is_err());
        assert!(Channels::from_hex("#+F+F+F+F").is_err());
        assert!(Channels::from_hex("+FF+FF+F").is_err());
        assert!(Channels::from_hex("#FF00-1").is_err());
    }
}
