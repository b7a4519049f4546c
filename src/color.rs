/// An sRGB color with straight alpha, one byte per channel.
///
/// Paint operations carry colors in this form, and screenshots hand them back
/// the same way: painting `Color::rgb(200, 50, 50)` and reading the pixel
/// back yields `[200, 50, 50, 255]` up to rounding.
///
/// # Examples
///
/// ```
/// use opframe::Color;
///
/// let red = Color::rgb(255, 0, 0);
/// assert_eq!(red.to_array(), [255, 0, 0, 255]);
///
/// let semi_blue = Color::rgba(0, 0, 255, 128);
/// assert_eq!(semi_blue.normalize(), [0.0, 0.0, 1.0, 128.0 / 255.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub [u8; 4]);

impl Color {
    /// All channels zero. Windows clear to this color unless configured otherwise.
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// Channels scaled to `[0.0, 1.0]`, still sRGB encoded.
    pub fn normalize(&self) -> [f32; 4] {
        let [r, g, b, a] = self.0;
        [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ]
    }

    /// Color channels decoded to linear light; alpha is left linear as is.
    ///
    /// Render targets use an sRGB format, so shader outputs and clear values
    /// must be linear for the stored bytes to match the original color.
    pub fn to_linear(&self) -> [f32; 4] {
        let [r, g, b, a] = self.normalize();
        [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
    }

    pub fn to_array(&self) -> [u8; 4] {
        self.0
    }

    pub fn is_transparent(&self) -> bool {
        self.0[3] == 0
    }
}

impl From<[u8; 4]> for Color {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
