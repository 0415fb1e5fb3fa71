//! # Measurement
//!
//! Pagination needs the rendered height of candidate content before it is
//! committed to a page. A [`LayoutBackend`] answers that question; the
//! [`MeasurementWorkspace`] owns the backend and the candidate currently
//! attached to it, and guarantees the candidate slot is empty again once a
//! pagination run is over, whether it finished or failed.
//!
//! [`NativeBackend`] is the built-in box-model backend. Hosts with a real
//! rendering engine can implement [`LayoutBackend`] over it instead.

pub mod native;

pub use native::NativeBackend;

use crate::dom::Element;
use crate::error::{FolioError, Result};
use crate::model::Block;

/// Renders content at page width and reports its size.
pub trait LayoutBackend {
    /// Outer height in px, vertical margins included, of `element` laid out
    /// as a direct child of the page content container.
    fn measure(&mut self, element: &Element) -> Result<f64>;

    /// Rendered `(width, height)` of an `<img>`. A broken image is `(0, 0)`.
    fn image_box(&mut self, img: &Element) -> Result<(f64, f64)>;

    /// Load the given image sources so later measurements see final sizes.
    fn preload_images(&mut self, sources: &[String]);

    /// Width of the page content area in px.
    fn content_width(&self) -> f64;

    /// Forget any per-run state. Called whenever a run ends.
    fn reset(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkspaceState {
    Ready,
    Released,
}

/// Owner of the layout backend and the single candidate slot.
pub struct MeasurementWorkspace<B: LayoutBackend> {
    backend: B,
    candidate: Option<Element>,
    state: WorkspaceState,
    runs: u64,
}

impl<B: LayoutBackend> MeasurementWorkspace<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            candidate: None,
            state: WorkspaceState::Ready,
            runs: 0,
        }
    }

    /// Start a run. The returned guard clears the workspace when dropped.
    pub fn acquire(&mut self) -> Result<WorkspaceGuard<'_, B>> {
        if self.state == WorkspaceState::Released {
            return Err(FolioError::WorkspaceUnavailable(
                "the measurement workspace has been released".to_string(),
            ));
        }
        self.runs += 1;
        log::trace!("measurement workspace acquired (run {})", self.runs);
        Ok(WorkspaceGuard { workspace: self })
    }

    /// Tear the workspace down. Every later `acquire` fails.
    pub fn release(&mut self) {
        self.clear();
        self.state = WorkspaceState::Released;
        log::debug!("measurement workspace released after {} runs", self.runs);
    }

    pub fn is_released(&self) -> bool {
        self.state == WorkspaceState::Released
    }

    /// True while no candidate is attached.
    pub fn is_clear(&self) -> bool {
        self.candidate.is_none()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn clear(&mut self) {
        self.candidate = None;
        self.backend.reset();
    }
}

/// Access to the workspace for the duration of one run.
pub struct WorkspaceGuard<'a, B: LayoutBackend> {
    workspace: &'a mut MeasurementWorkspace<B>,
}

impl<B: LayoutBackend> WorkspaceGuard<'_, B> {
    /// Attach `element` as the candidate, measure it and detach it again.
    pub fn measure(&mut self, element: &Element) -> Result<f64> {
        let ws = &mut *self.workspace;
        if ws.candidate.is_some() {
            return Err(FolioError::WorkspaceUnavailable(
                "a candidate is already attached".to_string(),
            ));
        }
        let candidate = ws.candidate.insert(element.clone());
        let height = ws.backend.measure(candidate);
        ws.candidate = None;
        height
    }

    pub fn image_box(&mut self, img: &Element) -> Result<(f64, f64)> {
        self.workspace.backend.image_box(img)
    }

    /// Wait for every image the blocks reference.
    pub fn prepare(&mut self, blocks: &[Block]) {
        let sources: Vec<String> = blocks
            .iter()
            .flat_map(|b| b.element().image_sources())
            .collect();
        if !sources.is_empty() {
            log::debug!("preloading {} image(s)", sources.len());
            self.workspace.backend.preload_images(&sources);
        }
    }

    pub fn content_width(&self) -> f64 {
        self.workspace.backend.content_width()
    }
}

impl<B: LayoutBackend> Drop for WorkspaceGuard<'_, B> {
    fn drop(&mut self) {
        self.workspace.clear();
        log::trace!("measurement workspace reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports a fixed height per element and counts resets.
    struct FixedBackend {
        height: f64,
        resets: usize,
        fail: bool,
    }

    impl LayoutBackend for FixedBackend {
        fn measure(&mut self, _element: &Element) -> Result<f64> {
            if self.fail {
                return Err(FolioError::WorkspaceUnavailable("boom".to_string()));
            }
            Ok(self.height)
        }

        fn image_box(&mut self, _img: &Element) -> Result<(f64, f64)> {
            Ok((0.0, 0.0))
        }

        fn preload_images(&mut self, _sources: &[String]) {}

        fn content_width(&self) -> f64 {
            100.0
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    fn workspace(fail: bool) -> MeasurementWorkspace<FixedBackend> {
        MeasurementWorkspace::new(FixedBackend {
            height: 42.0,
            resets: 0,
            fail,
        })
    }

    #[test]
    fn measure_detaches_candidate() {
        let mut ws = workspace(false);
        {
            let mut guard = ws.acquire().unwrap();
            assert_eq!(guard.measure(&Element::new("p")).unwrap(), 42.0);
        }
        assert!(ws.is_clear());
        assert_eq!(ws.backend().resets, 1);
    }

    #[test]
    fn failed_measurement_still_clears() {
        let mut ws = workspace(true);
        {
            let mut guard = ws.acquire().unwrap();
            assert!(guard.measure(&Element::new("p")).is_err());
        }
        assert!(ws.is_clear());
        assert_eq!(ws.backend().resets, 1);
    }

    #[test]
    fn released_workspace_cannot_be_acquired() {
        let mut ws = workspace(false);
        ws.release();
        assert!(ws.is_released());
        assert!(matches!(ws.acquire(), Err(FolioError::WorkspaceUnavailable(_))));
    }

    #[test]
    fn workspace_is_reusable_across_runs() {
        let mut ws = workspace(false);
        for _ in 0..3 {
            let mut guard = ws.acquire().unwrap();
            guard.measure(&Element::new("p")).unwrap();
        }
        assert_eq!(ws.backend().resets, 3);
    }
}
