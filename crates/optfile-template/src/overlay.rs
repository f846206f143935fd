//! Background overlay file provider seam
//!
//! Overlay files come from an external bookkeeping service. The patcher only
//! sees this trait and treats an empty answer as a hard failure.

/// Supplies background-event file identifiers
pub trait OverlayProvider {
    /// Overlay files for this job, empty when none are available
    fn overlay_files(&self) -> Vec<String>;
}

impl OverlayProvider for Vec<String> {
    fn overlay_files(&self) -> Vec<String> {
        self.clone()
    }
}

impl OverlayProvider for [String] {
    fn overlay_files(&self) -> Vec<String> {
        self.to_vec()
    }
}

impl<F> OverlayProvider for F
where
    F: Fn() -> Vec<String>,
{
    fn overlay_files(&self) -> Vec<String> {
        self()
    }
}

/// Provider for jobs without overlay
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverlay;

impl OverlayProvider for NoOverlay {
    fn overlay_files(&self) -> Vec<String> {
        Vec::new()
    }
}
