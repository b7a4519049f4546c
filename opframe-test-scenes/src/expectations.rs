use image::RgbaImage;

/// A single pixel-color expectation to validate after rendering.
pub struct PixelExpectation {
    pub x: u32,
    pub y: u32,
    pub expected: [u8; 4],
    /// Per-channel tolerance for comparison (default 3).
    pub tolerance: u8,
    /// Human-readable label for failure messages.
    pub label: &'static str,
}

impl PixelExpectation {
    pub fn new(x: u32, y: u32, r: u8, g: u8, b: u8, a: u8, label: &'static str) -> Self {
        Self {
            x,
            y,
            expected: [r, g, b, a],
            tolerance: 3,
            label,
        }
    }

    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Convenience: expect a fully opaque color.
    pub fn opaque(x: u32, y: u32, r: u8, g: u8, b: u8, label: &'static str) -> Self {
        Self::new(x, y, r, g, b, 255, label)
    }

    /// Convenience: expect a fully transparent pixel.
    pub fn transparent(x: u32, y: u32, label: &'static str) -> Self {
        Self::new(x, y, 0, 0, 0, 0, label)
    }
}

/// Validates pixel expectations against a screenshot.
///
/// Returns a list of human-readable failure descriptions. An empty list means
/// all expectations passed.
pub fn check_pixels(image: &RgbaImage, expectations: &[PixelExpectation]) -> Vec<String> {
    let (width, height) = image.dimensions();
    let mut failures = Vec::new();

    for expectation in expectations {
        let Some(actual) = image.get_pixel_checked(expectation.x, expectation.y) else {
            failures.push(format!(
                "[{}] pixel ({},{}) is outside canvas {}x{}",
                expectation.label, expectation.x, expectation.y, width, height,
            ));
            continue;
        };

        let tolerance = expectation.tolerance as i16;
        let matches = actual
            .0
            .iter()
            .zip(expectation.expected)
            .all(|(&actual, expected)| channel_matches(actual, expected, tolerance));

        if !matches {
            let [r, g, b, a] = expectation.expected;
            let [ar, ag, ab, aa] = actual.0;
            failures.push(format!(
                "[{}] pixel ({},{}) expected rgba({r},{g},{b},{a}) ±{} but got rgba({ar},{ag},{ab},{aa})",
                expectation.label, expectation.x, expectation.y, expectation.tolerance,
            ));
        }
    }

    failures
}

fn channel_matches(actual: u8, expected: u8, tolerance: i16) -> bool {
    let diff = (actual as i16) - (expected as i16);
    diff.abs() <= tolerance
}
