use cgmath::Vector3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgb {
    inner: Vector3<u8>,
}

macro_rules! strip_comment {
    ($line:expr) => {{
        let trimmed = $line.trim();
        let comment = trimmed.find("//");

        if let Some(c) = comment {
            trimmed[0..c].trim()
        } else {
            trimmed
        }
    }}
}

impl Rgb {
    pub fn r(&self) -> u8 {
        self.inner.x
    }

    pub fn g(&self) -> u8 {
        self.inner.y
    }

    pub fn b(&self) -> u8 {
        self.inner.z
    }

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            inner: Vector3::new(r, g ,b)
        }
    }

    /// Parses `r, g, b` with an optional trailing `// comment`.
    /// Returns `None` on missing or out of range components
    pub fn parse(line: &str) -> Option<Self> {
        let line = strip_comment!(line);
        let mut split = line.split(',');

        let r = split.next()?.trim().parse().ok()?;
        let g = split.next()?.trim().parse().ok()?;
        let b = split.next()?.trim().parse().ok()?;

        Some(Self::new(r, g, b))
    }

    pub fn to_gpu_values(&self) -> [f32; 3] {
        [
            self.r() as f32 / 255.0,
            self.g() as f32 / 255.0,
            self.b() as f32 / 255.0,
        ]
    }
}

pub fn mix_colors_linear(color1: &Rgb, color2: &Rgb, ratio: f32) -> Rgb {
    let inv_ratio = 1.0 - ratio;

    Rgb::new(
        ((color1.r() as f32 * ratio) + (color2.r() as f32 * inv_ratio)) as u8,
        ((color1.g() as f32 * ratio) + (color2.g() as f32 * inv_ratio)) as u8,
        ((color1.b() as f32 * ratio) + (color2.b() as f32 * inv_ratio)) as u8,
    )
}

impl Default for Rgb {
    fn default() -> Self {
        Self::new(255, 255, 255)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(value: [u8; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

#[test]
fn test_color_parse() {
    let s = "254, 255, 255";
    let parsed = Rgb::parse(s).unwrap();
    assert_eq!(parsed, Rgb::new(254, 255, 255));

    let s = "254,  255,      10   // comment";
    let parsed = Rgb::parse(s).unwrap();
    assert_eq!(parsed, Rgb::new(254, 255, 10));
}

#[test]
fn test_color_parse_rejects_garbage() {
    assert!(Rgb::parse("254, 300, 1").is_none());
    assert!(Rgb::parse("12, 13").is_none());
    assert!(Rgb::parse("red, green, blue").is_none());
}

#[test]
fn test_mix_colors() {
    let mixed = mix_colors_linear(&Rgb::new(200, 100, 0), &Rgb::new(0, 0, 0), 0.5);
    assert_eq!(mixed, Rgb::new(100, 50, 0));
}
