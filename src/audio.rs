/// One-shot sound events, playback is up to whoever receives them
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Object got activated (note hit, slider head, spinner start)
    Activate,
    /// Slider was let go before finishing
    SliderBreak,
    /// Slider ball reached a repeat point and turned around
    SliderBounce,
    Miss,
}

impl Cue {
    /// Default skin sample name for this cue
    pub fn sample_name(&self) -> &'static str {
        match self {
            Cue::Activate => "normal-hitnormal",
            Cue::SliderBreak => "sliderbreak",
            Cue::SliderBounce => "normal-hitclap",
            Cue::Miss => "combobreak",
        }
    }
}

pub trait CueSink {
    fn play(&mut self, cue: Cue);
}

impl CueSink for Vec<Cue> {
    fn play(&mut self, cue: Cue) {
        self.push(cue);
    }
}

/// Discards everything
impl CueSink for () {
    fn play(&mut self, _cue: Cue) {}
}
