use ini::Ini;
use thiserror::Error;
use std::{io, path::Path};

use crate::rgb::Rgb;

#[derive(Error, Debug)]
pub enum SkinParseError {
    #[error("parsing .ini file: `{0}`")]
    ParseError(#[from] ini::Error),
    #[error("reading skin.ini: `{0}`")]
    Io(#[from] io::Error),
    #[error("couldn't find a required field `{0}`")]
    MissingRequiredField(String)
}

impl SkinParseError {
    pub fn field(name: &str) -> Self {
        Self::MissingRequiredField(name.to_owned())
    }
}

/// osu! skins support up to 8 combo colours
const MAX_COMBO_COLOURS: usize = 8;

#[derive(Debug)]
pub struct Colours {
    pub combo_colors: Vec<Rgb>,
    pub slider_border: Rgb,
    pub slider_body: Option<Rgb>,
}

#[derive(Debug)]
pub struct General {
    pub name: String,
    pub author: String
}

#[derive(Debug)]
pub struct SkinIni {
    pub general: General,
    pub colours: Colours,
}

impl SkinIni {
    pub fn parse(bytes: &[u8]) -> Result<Self, SkinParseError> {
        let ini = Ini::read_from(&mut io::Cursor::new(bytes))?;

        // General
        let name = ini.get_from(Some("General"), "Name").ok_or(SkinParseError::field("Name"))?;
        let author = ini.get_from(Some("General"), "Author").unwrap_or_default();

        let general = General {
            name: name.to_owned(),
            author: author.to_owned(),
        };

        // Colours
        let slider_border = ini.get_from(Some("Colours"), "SliderBorder")
            .and_then(Rgb::parse)
            .unwrap_or_default();

        let slider_body = ini.get_from(Some("Colours"), "SliderTrackOverride")
            .and_then(Rgb::parse);

        let mut combo_colors: Vec<Rgb> = (1..=MAX_COMBO_COLOURS)
            .filter_map(|i| ini.get_from(Some("Colours"), format!("Combo{i}").as_str()))
            .filter_map(Rgb::parse)
            .collect();

        if combo_colors.is_empty() {
            combo_colors.push(Rgb::default())
        }

        let colours = Colours {
            slider_border,
            slider_body,
            combo_colors,
        };

        Ok(Self {
            general,
            colours,
        })
    }

    /// Looks for `skin.ini` / `Skin.ini` inside the skin directory,
    /// falls back to the default skin when there's none or it's broken
    pub fn from_dir(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let ini_path = ["skin.ini", "Skin.ini"]
            .iter()
            .map(|name| path.join(name))
            .find(|p| p.exists());

        let Some(ini_path) = ini_path else {
            return Self::default();
        };

        std::fs::read(&ini_path)
            .map_err(SkinParseError::from)
            .and_then(|bytes| Self::parse(&bytes))
            .inspect_err(|e| tracing::warn!("Failed to load {}: {e}", ini_path.display()))
            .unwrap_or_default()
    }

    /// Colour for the n-th combo, wrapping around the configured ones
    pub fn combo_color(&self, colour_index: usize) -> Rgb {
        let colors = &self.colours.combo_colors;

        if colors.is_empty() {
            return Rgb::default();
        }

        colors[colour_index % colors.len()]
    }
}

impl Default for SkinIni {
    fn default() -> Self {
        let general = General {
            name: "Default".to_owned(),
            author: "486c".to_owned()
        };

        let colours = Colours {
            combo_colors: vec![
                Rgb::new(255, 192, 0),
                Rgb::new(0, 202, 0),
                Rgb::new(18, 124, 255),
                Rgb::new(242, 24, 57),
            ],
            slider_border: Rgb::new(255, 255, 255),
            slider_body: None,
        };

        Self {
            colours,
            general,
        }
    }
}

#[test]
fn test_skin_combo_colours() {
    let ini = b"[General]\nName: test\n\n[Colours]\nCombo1: 10,20,30\nCombo2: 40,50,60 // second\nCombo3: broken\n";
    let skin = SkinIni::parse(ini).unwrap();

    assert_eq!(skin.general.name, "test");
    assert_eq!(skin.colours.combo_colors.len(), 2);
    assert_eq!(skin.combo_color(3), Rgb::new(40, 50, 60));
    assert_eq!(skin.colours.slider_border, Rgb::default());
}

#[test]
fn test_skin_missing_name() {
    let ini = b"[Colours]\nCombo1: 10,20,30\n";
    let err = SkinIni::parse(ini).unwrap_err();
    assert!(matches!(err, SkinParseError::MissingRequiredField(field) if field == "Name"));
}
