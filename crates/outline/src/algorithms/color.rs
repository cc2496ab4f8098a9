use image::Rgb;

/// Hue, saturation and brightness, each a fraction in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsb {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

impl Hsb {
    pub fn new(hue: f32, saturation: f32, brightness: f32) -> Self {
        Self {
            hue,
            saturation,
            brightness,
        }
    }

    pub fn from_rgb(rgb: Rgb<u8>) -> Self {
        let [r, g, b] = rgb.0;
        let cmax = r.max(g).max(b);
        let cmin = r.min(g).min(b);

        let brightness = f32::from(cmax) / 255.0;
        let saturation = if cmax != 0 {
            f32::from(cmax - cmin) / f32::from(cmax)
        } else {
            0.0
        };

        let hue = if saturation == 0.0 {
            0.0
        } else {
            let span = f32::from(cmax - cmin);
            let red_c = f32::from(cmax - r) / span;
            let green_c = f32::from(cmax - g) / span;
            let blue_c = f32::from(cmax - b) / span;
            let sector = if r == cmax {
                blue_c - green_c
            } else if g == cmax {
                2.0 + red_c - blue_c
            } else {
                4.0 + green_c - red_c
            };
            let hue = sector / 6.0;
            if hue < 0.0 { hue + 1.0 } else { hue }
        };

        Self {
            hue,
            saturation,
            brightness,
        }
    }

    pub fn to_rgb(self) -> Rgb<u8> {
        let v = self.brightness;
        if self.saturation == 0.0 {
            let c = to_channel(v);
            return Rgb([c, c, c]);
        }

        let h = (self.hue - self.hue.floor()) * 6.0;
        let f = h - h.floor();
        let p = v * (1.0 - self.saturation);
        let q = v * (1.0 - self.saturation * f);
        let t = v * (1.0 - self.saturation * (1.0 - f));

        let (r, g, b) = match h as u32 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            5 => (v, p, q),
            _ => (v, t, p),
        };
        Rgb([to_channel(r), to_channel(g), to_channel(b)])
    }
}

#[inline]
fn to_channel(fraction: f32) -> u8 {
    (fraction * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors() {
        let red = Hsb::from_rgb(Rgb([255, 0, 0]));
        assert_eq!(red, Hsb::new(0.0, 1.0, 1.0));

        let green = Hsb::from_rgb(Rgb([0, 255, 0]));
        assert!((green.hue - 1.0 / 3.0).abs() < 1e-6);

        let blue = Hsb::from_rgb(Rgb([0, 0, 255]));
        assert!((blue.hue - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_half_turn_is_cyan() {
        assert_eq!(Hsb::new(0.5, 1.0, 1.0).to_rgb(), Rgb([0, 255, 255]));
    }

    #[test]
    fn test_gray_has_no_saturation() {
        let gray = Hsb::from_rgb(Rgb([90, 90, 90]));
        assert_eq!(gray.saturation, 0.0);
        assert_eq!(gray.hue, 0.0);
        assert_eq!(gray.to_rgb(), Rgb([90, 90, 90]));
    }

    #[test]
    fn test_round_trip_within_one_step() {
        for r in (0..=255u16).step_by(15) {
            for g in (0..=255u16).step_by(17) {
                for b in (0..=255u16).step_by(51) {
                    let rgb = Rgb([r as u8, g as u8, b as u8]);
                    let back = Hsb::from_rgb(rgb).to_rgb();
                    for c in 0..3 {
                        let diff = (i16::from(rgb.0[c]) - i16::from(back.0[c])).abs();
                        assert!(diff <= 1, "{rgb:?} came back as {back:?}");
                    }
                }
            }
        }
    }
}
