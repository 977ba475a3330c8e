use glam::Vec2;

/// Pixel scroll deltas (touchpads) are converted to wheel lines at this rate.
pub const PIXELS_PER_LINE: f32 = 20.0;

/// Input as seen by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub elapsed: f32,
    /// Pointer position in physical pixels, origin top-left.
    pub pointer: Vec2,
    pub grab_held: bool,
    /// Wheel lines scrolled since the previous frame; positive is away from the viewer.
    pub scroll_delta: f32,
}

/// Accumulates platform input events between frames.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pointer: Vec2,
    grab_held: bool,
    scroll_lines: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_grab_button(&mut self, pressed: bool) {
        if pressed != self.grab_held {
            tracing::trace!(pressed, "grab button");
        }
        self.grab_held = pressed;
    }

    pub fn grab_held(&self) -> bool {
        self.grab_held
    }

    pub fn scroll_lines(&mut self, lines: f32) {
        self.scroll_lines += lines;
    }

    pub fn scroll_pixels(&mut self, pixels: f32) {
        self.scroll_lines += pixels / PIXELS_PER_LINE;
    }

    pub fn set_pointer(&mut self, pointer: Vec2) {
        self.pointer = pointer;
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Drop held buttons, e.g. when the window loses focus and release
    /// events may never arrive.
    pub fn release_all(&mut self) {
        self.grab_held = false;
    }

    /// Snapshot the current state for one frame, consuming accumulated scroll.
    pub fn take_frame(&mut self, elapsed: f32) -> FrameInput {
        FrameInput {
            elapsed,
            pointer: self.pointer,
            grab_held: self.grab_held,
            scroll_delta: std::mem::take(&mut self.scroll_lines),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_is_consumed_once() {
        let mut input = InputState::new();
        input.scroll_lines(1.0);
        input.scroll_lines(2.0);
        assert_eq!(input.take_frame(0.016).scroll_delta, 3.0);
        assert_eq!(input.take_frame(0.016).scroll_delta, 0.0);
    }

    #[test]
    fn pixel_scroll_converts_to_lines() {
        let mut input = InputState::new();
        input.scroll_pixels(40.0);
        input.scroll_lines(-0.5);
        assert_eq!(input.take_frame(0.0).scroll_delta, 1.5);
    }

    #[test]
    fn button_is_level_triggered() {
        let mut input = InputState::new();
        input.set_grab_button(true);
        assert!(input.take_frame(0.0).grab_held);
        assert!(input.take_frame(0.0).grab_held);
        input.set_grab_button(false);
        assert!(!input.take_frame(0.0).grab_held);
    }

    #[test]
    fn release_all_drops_the_grab() {
        let mut input = InputState::new();
        input.set_grab_button(true);
        input.release_all();
        assert!(!input.grab_held());
    }

    #[test]
    fn frame_carries_pointer_and_elapsed() {
        let mut input = InputState::new();
        input.set_pointer(Vec2::new(500.0, 300.0));
        let frame = input.take_frame(0.25);
        assert_eq!(frame.pointer, Vec2::new(500.0, 300.0));
        assert_eq!(frame.elapsed, 0.25);
    }
}
