use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::blur_error::SettingsError;
use crate::shared::constants::{DEFAULT_DOWN_SAMPLING, DEFAULT_RADIUS};

/// A packed `0xAARRGGBB` colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Argb(pub u32);

impl Argb {
    pub const TRANSPARENT: Argb = Argb(0);

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        self.0 as u8
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid colour {0:?}: expected #RRGGBB, #AARRGGBB or 0xAARRGGBB")]
pub struct ParseColorError(String);

impl FromStr for Argb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ParseColorError(s.to_string()))?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError(s.to_string()));
        }
        let value =
            u32::from_str_radix(hex, 16).map_err(|_| ParseColorError(s.to_string()))?;
        match hex.len() {
            6 => Ok(Argb(0xFF00_0000 | value)),
            8 => Ok(Argb(value)),
            _ => Err(ParseColorError(s.to_string())),
        }
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

impl TryFrom<String> for Argb {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Argb> for String {
    fn from(color: Argb) -> Self {
        color.to_string()
    }
}

/// Immutable-per-invocation blur parameters.
///
/// The struct is `Copy`: schedulers snapshot it when a request is created, so
/// later mutation never reaches a computation already in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlurSettings {
    radius: u32,
    down_sampling: u32,
    overlay_color: Argb,
    keep_down_sampling_size: bool,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            down_sampling: DEFAULT_DOWN_SAMPLING,
            overlay_color: Argb::TRANSPARENT,
            keep_down_sampling_size: false,
        }
    }
}

impl BlurSettings {
    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn down_sampling(&self) -> u32 {
        self.down_sampling
    }

    pub fn overlay_color(&self) -> Argb {
        self.overlay_color
    }

    pub fn keep_down_sampling_size(&self) -> bool {
        self.keep_down_sampling_size
    }

    pub fn set_radius(&mut self, radius: i32) -> Result<(), SettingsError> {
        if radius < 0 {
            return Err(SettingsError::InvalidRadius(radius));
        }
        self.radius = radius as u32;
        Ok(())
    }

    pub fn set_down_sampling(&mut self, down_sampling: i32) -> Result<(), SettingsError> {
        if down_sampling < 1 {
            return Err(SettingsError::InvalidDownSampling(down_sampling));
        }
        self.down_sampling = down_sampling as u32;
        Ok(())
    }

    pub fn set_overlay_color(&mut self, color: Argb) {
        self.overlay_color = color;
    }

    pub fn set_keep_down_sampling_size(&mut self, keep: bool) {
        self.keep_down_sampling_size = keep;
    }

    pub fn with_radius(mut self, radius: i32) -> Result<Self, SettingsError> {
        self.set_radius(radius)?;
        Ok(self)
    }

    pub fn with_down_sampling(mut self, down_sampling: i32) -> Result<Self, SettingsError> {
        self.set_down_sampling(down_sampling)?;
        Ok(self)
    }

    pub fn with_overlay_color(mut self, color: Argb) -> Self {
        self.overlay_color = color;
        self
    }

    pub fn with_keep_down_sampling_size(mut self, keep: bool) -> Self {
        self.keep_down_sampling_size = keep;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let settings = BlurSettings::default();
        assert_eq!(settings.radius(), 10);
        assert_eq!(settings.down_sampling(), 8);
        assert_eq!(settings.overlay_color(), Argb::TRANSPARENT);
        assert!(!settings.keep_down_sampling_size());
    }

    #[test]
    fn test_negative_radius_rejected_and_previous_kept() {
        let mut settings = BlurSettings::default();
        settings.set_radius(4).unwrap();
        assert_eq!(settings.set_radius(-1), Err(SettingsError::InvalidRadius(-1)));
        assert_eq!(settings.radius(), 4);
    }

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-3)]
    fn test_invalid_down_sampling_rejected(#[case] value: i32) {
        let mut settings = BlurSettings::default();
        settings.set_down_sampling(2).unwrap();
        assert_eq!(
            settings.set_down_sampling(value),
            Err(SettingsError::InvalidDownSampling(value))
        );
        assert_eq!(settings.down_sampling(), 2);
    }

    #[test]
    fn test_zero_radius_accepted() {
        let settings = BlurSettings::default().with_radius(0).unwrap();
        assert_eq!(settings.radius(), 0);
    }

    #[test]
    fn test_snapshot_is_independent_of_later_mutation() {
        let mut live = BlurSettings::default();
        let snapshot = live;
        live.set_radius(25).unwrap();
        assert_eq!(snapshot.radius(), 10);
    }

    #[rstest]
    #[case::rgb("#FF0000", 0xFFFF_0000)]
    #[case::argb("#40000000", 0x4000_0000)]
    #[case::hex_prefix("0x80112233", 0x8011_2233)]
    #[case::lowercase("#80aabbcc", 0x80AA_BBCC)]
    fn test_parse_color(#[case] input: &str, #[case] expected: u32) {
        assert_eq!(input.parse::<Argb>().unwrap(), Argb(expected));
    }

    #[rstest]
    #[case::no_prefix("FF0000")]
    #[case::bad_length("#12345")]
    #[case::not_hex("#GG000000")]
    #[case::sign_prefix("#+1234567")]
    #[case::inner_space("#12 34567")]
    fn test_parse_color_rejects(#[case] input: &str) {
        assert!(input.parse::<Argb>().is_err());
    }

    #[test]
    fn test_color_components() {
        let color = Argb(0x4011_2233);
        assert_eq!(color.alpha(), 0x40);
        assert_eq!(color.red(), 0x11);
        assert_eq!(color.green(), 0x22);
        assert_eq!(color.blue(), 0x33);
        assert_eq!(color.to_string(), "#40112233");
    }
}
