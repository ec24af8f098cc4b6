use std::ops::Index;

/// Struct for representing colors.
///
/// All channels are normalized floats in `[0, 1]`. The type carries no
/// geometry; it exists at the interface between the tessellator's caller
/// and the rendering layer that consumes per-draw colors.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Returns a color value from red, green, blue u8 values. Alpha will be set to 255.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgbf(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Returns a color value from red, green, blue float values. Alpha will be set to 1.0.
    pub fn rgbf(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Returns a color value from red, green, blue and alpha u8 values.
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgbaf(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    /// Returns a color value from red, green, blue and alpha float values.
    pub fn rgbaf(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns color value specified by hue, saturation and lightness.
    /// HSL values are all in range [0..1], alpha will be set to 1.0.
    pub fn hsl(h: f32, s: f32, l: f32) -> Self {
        Self::hsla(h, s, l, 1.0)
    }

    /// Returns color value specified by hue, saturation, lightness and alpha.
    /// All values are in range [0..1]. Hue wraps around, saturation and
    /// lightness are clamped.
    pub fn hsla(h: f32, s: f32, l: f32, a: f32) -> Self {
        let mut h = h % 1.0;

        if h < 0.0 {
            h += 1.0;
        }

        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);

        let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let m1 = 2.0 * l - m2;

        Self {
            r: hue(h + 1.0 / 3.0, m1, m2).clamp(0.0, 1.0),
            g: hue(h, m1, m2).clamp(0.0, 1.0),
            b: hue(h - 1.0 / 3.0, m1, m2).clamp(0.0, 1.0),
            a,
        }
    }

    /// Returns color value specified by hex value. Eg. #bababa or #bababa00
    pub fn hex(raw_hex: &str) -> Self {
        let hex = raw_hex.trim_start_matches('#');

        if hex.len() == 8 {
            Self::rgba(
                hex_to_u8(&hex[0..2]),
                hex_to_u8(&hex[2..4]),
                hex_to_u8(&hex[4..6]),
                hex_to_u8(&hex[6..8]),
            )
        } else if hex.len() == 6 {
            Self::rgb(hex_to_u8(&hex[0..2]), hex_to_u8(&hex[2..4]), hex_to_u8(&hex[4..6]))
        } else {
            Self::rgb(0, 0, 0)
        }
    }

    /// Linear interpolation between two colors. `t` is clamped to [0..1].
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let it = 1.0 - t;

        Self {
            r: self.r * it + other.r * t,
            g: self.g * it + other.g * t,
            b: self.b * it + other.b * t,
            a: self.a * it + other.a * t,
        }
    }

    /// Returns the same color with the given alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Sets transparency of a color value.
    pub fn set_alpha(&mut self, a: u8) {
        self.set_alphaf(a as f32 / 255.0);
    }

    /// Sets transparency of a color value.
    pub fn set_alphaf(&mut self, a: f32) {
        self.a = a;
    }

    /// Scales the alpha channel, leaving the color channels as they are.
    /// Used when compositing a draw with a global opacity.
    pub fn mul_alpha(self, alpha: f32) -> Self {
        Self {
            a: self.a * alpha,
            ..self
        }
    }

    /// The color with its channels multiplied through by alpha.
    pub fn premultiplied(self) -> Self {
        Self {
            r: self.r * self.a,
            g: self.g * self.a,
            b: self.b * self.a,
            a: self.a,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }
}

/// Named colors, CSS values. Storage only.
impl Color {
    pub const INDIAN_RED: Self = Self::rgb8(205, 92, 92);
    pub const LIGHT_CORAL: Self = Self::rgb8(240, 128, 128);
    pub const SALMON: Self = Self::rgb8(250, 128, 114);
    pub const DARK_SALMON: Self = Self::rgb8(233, 150, 122);
    pub const LIGHT_SALMON: Self = Self::rgb8(255, 160, 122);
    pub const CRIMSON: Self = Self::rgb8(220, 20, 60);
    pub const RED: Self = Self::rgb8(255, 0, 0);
    pub const FIREBRICK: Self = Self::rgb8(178, 34, 34);
    pub const DARK_RED: Self = Self::rgb8(139, 0, 0);

    pub const PINK: Self = Self::rgb8(255, 192, 203);
    pub const LIGHT_PINK: Self = Self::rgb8(255, 182, 193);
    pub const HOT_PINK: Self = Self::rgb8(255, 105, 180);
    pub const DEEP_PINK: Self = Self::rgb8(255, 20, 147);
    pub const MEDIUM_VIOLET_RED: Self = Self::rgb8(199, 21, 133);
    pub const PALE_VIOLET_RED: Self = Self::rgb8(219, 112, 147);

    pub const WHITE: Self = Self::rgb8(255, 255, 255);
    pub const SNOW: Self = Self::rgb8(255, 250, 250);
    pub const HONEYDEW: Self = Self::rgb8(240, 255, 240);
    pub const MINT_CREAM: Self = Self::rgb8(245, 255, 250);
    pub const AZURE: Self = Self::rgb8(240, 255, 255);
    pub const ALICE_BLUE: Self = Self::rgb8(240, 248, 255);
    pub const GHOST_WHITE: Self = Self::rgb8(248, 248, 255);
    pub const WHITE_SMOKE: Self = Self::rgb8(245, 245, 245);
    pub const SEASHELL: Self = Self::rgb8(255, 245, 238);
    pub const BEIGE: Self = Self::rgb8(245, 245, 220);
    pub const OLD_LACE: Self = Self::rgb8(253, 245, 230);
    pub const FLORAL_WHITE: Self = Self::rgb8(255, 250, 240);
    pub const IVORY: Self = Self::rgb8(255, 255, 240);
    pub const ANTIQUE_WHITE: Self = Self::rgb8(250, 235, 215);
    pub const LINEN: Self = Self::rgb8(250, 240, 230);
    pub const LAVENDER_BLUSH: Self = Self::rgb8(255, 240, 245);
    pub const MISTY_ROSE: Self = Self::rgb8(255, 228, 225);

    pub const GAINSBORO: Self = Self::rgb8(220, 220, 220);
    pub const LIGHT_GRAY: Self = Self::rgb8(211, 211, 211);
    pub const SILVER: Self = Self::rgb8(192, 192, 192);
    pub const DARK_GRAY: Self = Self::rgb8(169, 169, 169);
    pub const GRAY: Self = Self::rgb8(128, 128, 128);
    pub const DIM_GRAY: Self = Self::rgb8(105, 105, 105);
    pub const LIGHT_SLATE_GRAY: Self = Self::rgb8(119, 136, 153);
    pub const SLATE_GRAY: Self = Self::rgb8(112, 128, 144);
    pub const DARK_SLATE_GRAY: Self = Self::rgb8(47, 79, 79);
    pub const BLACK: Self = Self::rgb8(0, 0, 0);
}

impl Default for Color {
    fn default() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        }
    }
}

impl Index<usize> for Color {
    type Output = f32;

    /// Channel access by index, 0..=3 for r, g, b, a.
    ///
    /// Panics on an out-of-range index. That is an out-of-contract API
    /// misuse, not a recoverable condition.
    fn index(&self, index: usize) -> &Self::Output {
        match index {
            0 => &self.r,
            1 => &self.g,
            2 => &self.b,
            3 => &self.a,
            _ => panic!("color channel index out of range: {index}"),
        }
    }
}

fn hue(mut h: f32, m1: f32, m2: f32) -> f32 {
    if h < 0.0 {
        h += 1.0;
    }
    if h > 1.0 {
        h -= 1.0;
    }

    if h < 1.0 / 6.0 {
        return m1 + (m2 - m1) * h * 6.0;
    }
    if h < 3.0 / 6.0 {
        return m2;
    }
    if h < 4.0 / 6.0 {
        return m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0;
    }

    m1
}

// Convert a hex string to decimal. Eg. "00" -> 0. "FF" -> 255.
fn hex_to_u8(hex_string: &str) -> u8 {
    u8::from_str_radix(hex_string, 16).unwrap_or(0)
}
