//! Traits for backends.

use crate::transition::Visual;

/// The host UI toolkit, as far as the frame is concerned.
///
/// All methods have empty defaults; `()` is a headless backend that ignores everything.
pub trait Backend: Send + Sync {
    /// Inserts a visual into the content root at the given position (0 is the bottom).
    fn insert_visual(&self, index: usize, visual: &Visual) {
        let _ = (index, visual);
    }

    /// Removes a visual from the content root.
    fn remove_visual(&self, visual: &Visual) {
        let _ = visual;
    }

    /// Enables or disables input on the content root.
    ///
    /// Input is disabled for the duration of every navigation.
    fn set_hit_test_visible(&self, visible: bool) {
        let _ = visible;
    }

    /// Shows or hides the system back button.
    ///
    /// Only called if automatic back-button handling is enabled.
    fn set_back_button_visible(&self, visible: bool) {
        let _ = visible;
    }

    /// Closes the hosting window.
    ///
    /// Called when a screen finishes and there is nothing to go back to.
    fn close(&self) {}
}

/// Headless backend.
impl Backend for () {}
