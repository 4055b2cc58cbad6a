use cgmath::Vector2;

/// Per frame state of a single logical key
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum KeyState {
    #[default]
    Idle,
    /// Went down this frame
    Pressed,
    /// Down since an earlier frame
    Held,
    /// Went up this frame
    Released,
}

impl KeyState {
    /// State for the next frame given whether the key is physically down
    pub fn next(self, down: bool) -> Self {
        match (self.is_down(), down) {
            (false, true) => Self::Pressed,
            (true, true) => Self::Held,
            (true, false) => Self::Released,
            (false, false) => Self::Idle,
        }
    }

    #[inline]
    pub fn is_down(self) -> bool {
        matches!(self, Self::Pressed | Self::Held)
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct KeyboardState {
    pub k1: KeyState,
    pub k2: KeyState,
    pub m1: KeyState,
    pub m2: KeyState,
}

impl KeyboardState {
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    fn all(&self) -> [KeyState; 4] {
        [self.k1, self.k2, self.m1, self.m2]
    }
}

/// Raw up/down flags for every logical key
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct KeysDown {
    pub k1: bool,
    pub k2: bool,
    pub m1: bool,
    pub m2: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OsuInput {
    /// Cursor position in playfield units, same space as object positions
    pub pos: Vector2<f64>,

    /// Keys state for this frame
    pub keys: KeyboardState,
}

impl Default for OsuInput {
    fn default() -> Self {
        Self {
            pos: Vector2::new(0.0, 0.0),
            keys: KeyboardState::empty(),
        }
    }
}

impl OsuInput {
    /// Returns only if there's a key that went down this frame
    pub fn is_key_hit_no_hold(&self) -> bool {
        self.keys.all().iter().any(|x| *x == KeyState::Pressed)
    }

    /// Any key is down, freshly pressed or not
    pub fn is_keys_hold(&self) -> bool {
        self.keys.all().iter().any(|x| x.is_down())
    }

    pub fn is_key_released(&self) -> bool {
        self.keys.all().iter().any(|x| *x == KeyState::Released)
    }
}

/// Turns raw samples (cursor position + keys down) into per frame
/// [`OsuInput`] with press/hold/release transitions
#[derive(Debug, Default)]
pub struct InputTracker {
    current: OsuInput,
}

impl InputTracker {
    pub fn set_cursor_pos(&mut self, pos: Vector2<f64>) {
        self.current.pos = pos;
    }

    /// Advances all keys by one frame
    pub fn frame(&mut self, down: KeysDown) -> &OsuInput {
        let keys = &mut self.current.keys;

        keys.k1 = keys.k1.next(down.k1);
        keys.k2 = keys.k2.next(down.k2);
        keys.m1 = keys.m1.next(down.m1);
        keys.m2 = keys.m2.next(down.m2);

        &self.current
    }

    pub fn current(&self) -> &OsuInput {
        &self.current
    }
}

#[test]
fn test_key_state_transitions() {
    let mut tracker = InputTracker::default();

    let down = KeysDown { k1: true, ..Default::default() };
    let up = KeysDown::default();

    assert!(tracker.frame(down).is_key_hit_no_hold());

    let input = tracker.frame(down);
    assert!(!input.is_key_hit_no_hold());
    assert!(input.is_keys_hold());
    assert_eq!(input.keys.k1, KeyState::Held);

    let input = tracker.frame(up);
    assert!(input.is_key_released());
    assert!(!input.is_keys_hold());

    assert_eq!(tracker.frame(up).keys.k1, KeyState::Idle);
}

#[test]
fn test_second_key_counts_as_fresh_press() {
    let mut tracker = InputTracker::default();

    tracker.frame(KeysDown { k1: true, ..Default::default() });
    let input = tracker.frame(KeysDown { k1: true, k2: true, ..Default::default() });

    assert!(input.is_key_hit_no_hold());
}
