//! Presentation boundary of the carousel.

use tracing::debug;

use crate::options::Transition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideRole {
    Active,
    Prev,
    Next,
    Hidden,
}

/// Which controls the view should create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub arrows: bool,
    /// Number of dot indicators; zero when dots are off.
    pub dots: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowState {
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideFrame {
    pub id: String,
    pub role: SlideRole,
    pub loaded: bool,
    /// Sources of images that are ready to display.
    pub image_sources: Vec<String>,
}

/// Everything a view needs to draw the carousel at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub current_slide: usize,
    pub transition: Transition,
    pub animate: bool,
    pub slides: Vec<SlideFrame>,
    /// One flag per dot, true for the active one. Empty when dots are off.
    pub dots: Vec<bool>,
    pub arrows: Option<ArrowState>,
}

impl Frame {
    pub fn role_of(&self, index: usize) -> Option<SlideRole> {
        self.slides.get(index).map(|slide| slide.role)
    }
}

pub trait CarouselView: Send {
    fn mount(&mut self, controls: Controls);
    fn render(&mut self, frame: &Frame);
    fn unmount(&mut self);
}

/// A view that only logs what it would draw.
#[derive(Debug, Default)]
pub struct TracingView {
    label: String,
}

impl TracingView {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl CarouselView for TracingView {
    fn mount(&mut self, controls: Controls) {
        debug!(
            carousel = %self.label,
            arrows = controls.arrows,
            dots = controls.dots,
            "carousel: controls mounted"
        );
    }

    fn render(&mut self, frame: &Frame) {
        debug!(
            carousel = %self.label,
            current = frame.current_slide,
            animate = frame.animate,
            "carousel: frame rendered"
        );
    }

    fn unmount(&mut self) {
        debug!(carousel = %self.label, "carousel: controls unmounted");
    }
}
