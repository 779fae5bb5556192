use egui::Pos2;

/// Loading affordance shown while an image is in flight.
pub trait ActivityIndicator {
    fn show(&mut self);
    fn hide(&mut self);
    fn is_visible(&self) -> bool;
    /// Keeps the indicator centered on the content view
    fn center(&self) -> Pos2;
    fn set_center(&mut self, center: Pos2);
}

/// Braille spinner painted by the egui item view.
#[derive(Debug, Clone, Default)]
pub struct SpinnerIndicator {
    visible: bool,
    center: Pos2,
}

const SPINNER_CHARS: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

impl SpinnerIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spinner glyph for the given time in seconds.
    pub fn frame_glyph(time: f64) -> &'static str {
        let idx = ((time * 10.0) as usize) % SPINNER_CHARS.len();
        SPINNER_CHARS[idx]
    }
}

impl ActivityIndicator for SpinnerIndicator {
    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn center(&self) -> Pos2 {
        self.center
    }

    fn set_center(&mut self, center: Pos2) {
        self.center = center;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_cycles() {
        assert_eq!(SpinnerIndicator::frame_glyph(0.0), "⠋");
        assert_eq!(SpinnerIndicator::frame_glyph(0.1), "⠙");
        assert_eq!(SpinnerIndicator::frame_glyph(1.0), "⠋");
    }
}
