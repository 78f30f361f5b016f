//! Button input: logical level reads and falling-edge detection.
//!
//! The button is wired active-low with the line pulled up, so a physical
//! reading of 0 means pressed. Edge detection is a two-state machine over the
//! last observed level; only the released→pressed transition reports an edge,
//! which is what makes a held button register exactly one mode flip.

use thiserror::Error;

/// Debounced logical level of the button line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Line pulled up: button released.
    High,
    /// Line grounded: button pressed.
    Low,
}

/// GPIO read failure on the button line. Fatal: the controller cannot
/// continue without its input signal.
#[derive(Debug, Error)]
#[error("button input error: {0}")]
pub struct InputError(pub String);

/// Reports the current logical state of the page-toggle button.
pub trait InputSource {
    fn read_level(&mut self) -> Result<Level, InputError>;
}

/// Two-state edge tracker: {RELEASED, PRESSED}.
///
/// `falling_edge` reports true exactly once per High→Low transition. The
/// initial state is High (released), so a button already held at startup
/// registers a single press on the first poll.
#[derive(Debug)]
pub struct EdgeDetector {
    last: Level,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self { last: Level::High }
    }

    /// Feed one sampled level; true when this sample is a press edge.
    pub fn falling_edge(&mut self, level: Level) -> bool {
        let fell = self.last == Level::High && level == Level::Low;
        self.last = level;
        fell
    }
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Stand-in input for development mode: the button is never pressed.
pub struct Unwired;

impl InputSource for Unwired {
    fn read_level(&mut self) -> Result<Level, InputError> {
        Ok(Level::High)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(detector: &mut EdgeDetector, levels: &[Level]) -> usize {
        levels
            .iter()
            .filter(|&&level| detector.falling_edge(level))
            .count()
    }

    #[test]
    fn test_single_press_single_edge() {
        use Level::*;
        let mut d = EdgeDetector::new();
        assert_eq!(edges(&mut d, &[High, High, Low, High]), 1);
    }

    #[test]
    fn test_held_button_fires_once() {
        use Level::*;
        let mut d = EdgeDetector::new();
        assert_eq!(edges(&mut d, &[High, Low, Low, Low, Low, Low]), 1);
    }

    #[test]
    fn test_release_is_not_an_edge() {
        use Level::*;
        let mut d = EdgeDetector::new();
        d.falling_edge(Low);
        assert_eq!(edges(&mut d, &[High, High, High]), 0);
    }

    #[test]
    fn test_press_release_press() {
        use Level::*;
        let mut d = EdgeDetector::new();
        assert_eq!(edges(&mut d, &[Low, Low, High, Low, High, Low]), 3);
    }

    #[test]
    fn test_pressed_at_startup_counts() {
        // Pull-up wiring: the detector assumes released before the first poll
        let mut d = EdgeDetector::new();
        assert!(d.falling_edge(Level::Low));
    }
}
