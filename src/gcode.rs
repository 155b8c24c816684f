use crate::channels::Channels;

/// What a G-code line means for the status lights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GcodeAction {
    /// `M150`: constant color on both sides.
    SetColor(Channels),
    /// `M109`/`M190`: waiting for the hotend or bed to heat up.
    Heating,
    /// `G0`/`G1`: moving, so any heat-up wait is over.
    Moving,
}

pub fn parse(cmd: &str) -> Option<GcodeAction> {
    let mut words = cmd.split_whitespace();
    let code = words.next()?.to_ascii_uppercase();

    match code.as_str() {
        "M150" => parse_m150(words).map(GcodeAction::SetColor),
        "M109" | "M190" => Some(GcodeAction::Heating),
        "G0" | "G1" => Some(GcodeAction::Moving),
        _ => None,
    }
}

/// `M150 R<0-255> U|G<0-255> B<0-255> W<0-255>`, missing components are 0.
fn parse_m150<'a>(words: impl Iterator<Item = &'a str>) -> Option<Channels> {
    let mut values = [0.0f32; 4];
    for word in words {
        let mut chars = word.chars();
        let index = match chars.next()?.to_ascii_uppercase() {
            'R' => 0,
            'U' | 'G' => 1,
            'B' => 2,
            'W' => 3,
            // Other parameters (P brightness, I index...) don't affect the color
            _ => continue,
        };

        match chars.as_str().parse::<f32>() {
            Ok(v) if v.is_finite() => values[index] = (v / 255.0).clamp(0.0, 1.0),
            _ => {
                log::warn!("Ignoring M150 with malformed parameter {word:?}");
                return None;
            }
        }
    }

    Some(Channels::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::tests::channels_nearly_equal;

    fn color(cmd: &str) -> Channels {
        match parse(cmd) {
            Some(GcodeAction::SetColor(color)) => color,
            other => panic!("{cmd:?} parsed as {other:?}"),
        }
    }

    #[test]
    fn m150_scales_to_unit_range() {
        assert_eq!(color("M150 R255 U0 B255 W255"), Channels::new([1.0, 0.0, 1.0, 1.0]));
        assert!(channels_nearly_equal(
            &color("M150 R51"),
            &Channels::new([0.2, 0.0, 0.0, 0.0])
        ));
    }

    #[test]
    fn m150_green_aliases() {
        let green = Channels::new([0.0, 1.0, 0.0, 0.0]);
        assert_eq!(color("M150 U255"), green);
        assert_eq!(color("M150 G255"), green);
    }

    #[test]
    fn m150_missing_white_is_off() {
        let c = color("M150 R255 U255 B255");
        assert_eq!(c, Channels::new([1.0, 1.0, 1.0, 0.0]));
        assert!(c.is_valid());
    }

    #[test]
    fn m150_out_of_range_is_clamped() {
        assert_eq!(color("M150 R999"), Channels::new([1.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn m150_ignores_unrelated_parameters() {
        assert_eq!(color("M150 P128 R255"), Channels::new([1.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn m150_rejects_malformed_values() {
        assert_eq!(parse("M150 Rred"), None);
        assert_eq!(parse("M150 R"), None);
    }

    #[test]
    fn heating_and_moving_commands() {
        assert_eq!(parse("M109 S210"), Some(GcodeAction::Heating));
        assert_eq!(parse("M190 S60"), Some(GcodeAction::Heating));
        assert_eq!(parse("G1 X10 Y10 E0.5"), Some(GcodeAction::Moving));
        assert_eq!(parse("M104 S210"), None);
        assert_eq!(parse("M1500"), None);
        assert_eq!(parse(""), None);
    }
}
