use tokio::{sync::broadcast, time::Instant};
use tracing::{debug, warn};

use crate::{
    command::{CarouselCommand, Key},
    options::{CarouselOptions, OptionsPatch, Transition},
    slide::Slide,
    view::{ArrowState, CarouselView, Controls, Frame, SlideFrame, SlideRole},
};

const SWIPE_THRESHOLD_PX: f64 = 50.0;
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideChange {
    pub current_slide: usize,
    pub previous_slide: usize,
    pub total_slides: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarouselEvent {
    SlideChanged(SlideChange),
    Destroyed,
}

/// Carousel state machine.
///
/// Time is read from `tokio::time`, so a paused test clock drives the
/// transition window and the autoplay deadline.
pub struct Carousel {
    options: CarouselOptions,
    slides: Vec<Slide>,
    current: usize,
    transitioning_until: Option<Instant>,
    autoplay_deadline: Option<Instant>,
    hovered: bool,
    document_hidden: bool,
    controls: Controls,
    view: Box<dyn CarouselView>,
    events: broadcast::Sender<CarouselEvent>,
}

impl Carousel {
    pub fn new(
        slides: Vec<Slide>,
        options: CarouselOptions,
        mut view: Box<dyn CarouselView>,
    ) -> Self {
        let mut slides = slides;
        for (index, slide) in slides.iter_mut().enumerate() {
            slide.adopt(index);
            if index == 0 || !options.lazy_load {
                slide.load();
            }
        }
        if slides.is_empty() {
            warn!("carousel: no slides found");
        }

        let controls = controls_for(&options, slides.len());
        view.mount(controls);

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut carousel = Self {
            options,
            slides,
            current: 0,
            transitioning_until: None,
            autoplay_deadline: None,
            hovered: false,
            document_hidden: false,
            controls,
            view,
            events,
        };
        carousel.arm_autoplay();
        carousel.render(carousel.current, false);
        debug!(slides = carousel.slides.len(), "carousel: initialized");
        carousel
    }

    pub fn current_slide(&self) -> usize {
        self.current
    }

    pub fn total_slides(&self) -> usize {
        self.slides.len()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn options(&self) -> &CarouselOptions {
        &self.options
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning_until
            .is_some_and(|until| Instant::now() < until)
    }

    pub fn autoplay_deadline(&self) -> Option<Instant> {
        self.autoplay_deadline
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CarouselEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<CarouselEvent> {
        self.events.clone()
    }

    /// Applies one input. Returns whether the current slide changed.
    pub fn dispatch(&mut self, command: CarouselCommand) -> bool {
        match command {
            CarouselCommand::Next => self.next(),
            CarouselCommand::Previous => self.previous(),
            CarouselCommand::GoTo(index) => self.go_to_slide(index),
            CarouselCommand::Show(index) => self.show_slide(index),
            CarouselCommand::AutoplayTick => self.autoplay_tick(),
            CarouselCommand::PointerEnter => {
                self.pointer_enter();
                false
            }
            CarouselCommand::PointerLeave => {
                self.pointer_leave();
                false
            }
            CarouselCommand::DocumentHidden(hidden) => {
                self.set_document_hidden(hidden);
                false
            }
            CarouselCommand::Swipe { start_x, end_x } => self.swipe(start_x, end_x),
            CarouselCommand::Key(key) => self.key(key),
            CarouselCommand::UpdateOptions(patch) => {
                self.update_options(&patch);
                false
            }
        }
    }

    pub fn next(&mut self) -> bool {
        if self.is_transitioning() || self.slides.is_empty() {
            return false;
        }
        let last = self.slides.len() - 1;
        let target = match self.current {
            current if current < last => current + 1,
            _ if self.options.infinite => 0,
            _ => last,
        };
        target != self.current && self.go_to_slide(target)
    }

    pub fn previous(&mut self) -> bool {
        if self.is_transitioning() || self.slides.is_empty() {
            return false;
        }
        let target = match self.current {
            0 if self.options.infinite => self.slides.len() - 1,
            0 => 0,
            current => current - 1,
        };
        target != self.current && self.go_to_slide(target)
    }

    /// Animated move to `index`; ignored when out of range, already current, or
    /// while another transition is running.
    pub fn go_to_slide(&mut self, index: usize) -> bool {
        self.transition_to(index, true)
    }

    /// Immediate move to `index` that is allowed during a transition window.
    pub fn show_slide(&mut self, index: usize) -> bool {
        self.transition_to(index, false)
    }

    /// Fires when the autoplay deadline has passed.
    pub fn poll_autoplay(&mut self) -> bool {
        match self.autoplay_deadline {
            Some(deadline) if Instant::now() >= deadline => self.autoplay_tick(),
            _ => false,
        }
    }

    pub fn autoplay_tick(&mut self) -> bool {
        if !self.autoplay_eligible() {
            return false;
        }
        self.autoplay_deadline = None;
        self.arm_autoplay();
        self.next()
    }

    pub fn pointer_enter(&mut self) {
        if !self.options.pause_on_hover {
            return;
        }
        self.hovered = true;
        self.autoplay_deadline = None;
    }

    pub fn pointer_leave(&mut self) {
        if !self.hovered {
            return;
        }
        self.hovered = false;
        self.arm_autoplay();
    }

    pub fn set_document_hidden(&mut self, hidden: bool) {
        self.document_hidden = hidden;
        if hidden {
            self.autoplay_deadline = None;
        } else {
            self.arm_autoplay();
        }
    }

    /// A horizontal swipe from `start_x` to `end_x`; leftward swipes advance.
    pub fn swipe(&mut self, start_x: f64, end_x: f64) -> bool {
        if !self.options.swipe_enabled {
            return false;
        }
        let distance = start_x - end_x;
        if distance.abs() <= SWIPE_THRESHOLD_PX {
            return false;
        }
        if distance > 0.0 {
            self.next()
        } else {
            self.previous()
        }
    }

    pub fn key(&mut self, key: Key) -> bool {
        if !self.options.keyboard_enabled {
            return false;
        }
        match key {
            Key::ArrowLeft => self.previous(),
            Key::ArrowRight => self.next(),
            Key::Home => self.go_to_slide(0),
            Key::End => match self.slides.len().checked_sub(1) {
                Some(last) => self.go_to_slide(last),
                None => false,
            },
        }
    }

    pub fn update_options(&mut self, patch: &OptionsPatch) {
        self.options.apply(patch);
        if !self.options.pause_on_hover {
            self.hovered = false;
        }
        match patch.auto_play {
            Some(false) => self.autoplay_deadline = None,
            _ => self.arm_autoplay(),
        }

        let controls = controls_for(&self.options, self.slides.len());
        if controls != self.controls {
            self.view.unmount();
            self.view.mount(controls);
            self.controls = controls;
        }
        self.render(self.current, false);
    }

    /// Cancels autoplay, unmounts the view and hands the slides back.
    pub fn destroy(mut self) -> Vec<Slide> {
        self.autoplay_deadline = None;
        self.view.unmount();
        let _ = self.events.send(CarouselEvent::Destroyed);
        debug!(slides = self.slides.len(), "carousel: destroyed");
        std::mem::take(&mut self.slides)
    }

    fn transition_to(&mut self, index: usize, animate: bool) -> bool {
        if index >= self.slides.len() || index == self.current {
            return false;
        }
        if animate && self.is_transitioning() {
            return false;
        }

        let previous = self.current;
        self.current = index;
        if animate {
            self.transitioning_until = Some(Instant::now() + self.options.transition_duration);
        }
        if self.slides[index].load() {
            debug!(slide = index, "carousel: lazy content loaded");
        }

        self.render(previous, animate);
        self.autoplay_deadline = None;
        self.arm_autoplay();

        let change = SlideChange {
            current_slide: index,
            previous_slide: previous,
            total_slides: self.slides.len(),
        };
        let _ = self.events.send(CarouselEvent::SlideChanged(change));
        debug!(from = previous, to = index, animate, "carousel: slide changed");
        true
    }

    fn autoplay_eligible(&self) -> bool {
        self.options.auto_play
            && !self.options.auto_play_interval.is_zero()
            && self.slides.len() > 1
            && !self.hovered
            && !self.document_hidden
    }

    fn arm_autoplay(&mut self) {
        if !self.autoplay_eligible() {
            self.autoplay_deadline = None;
            return;
        }
        if self.autoplay_deadline.is_none() {
            self.autoplay_deadline = Some(Instant::now() + self.options.auto_play_interval);
        }
    }

    fn render(&mut self, previous: usize, animate: bool) {
        let frame = self.frame(previous, animate);
        self.view.render(&frame);
    }

    fn frame(&self, previous: usize, animate: bool) -> Frame {
        let total = self.slides.len();
        let slides = self
            .slides
            .iter()
            .enumerate()
            .map(|(index, slide)| SlideFrame {
                id: slide.id().to_string(),
                role: role_for(self.options.transition, index, self.current, previous, total),
                loaded: slide.is_loaded(),
                image_sources: slide
                    .images()
                    .iter()
                    .filter_map(|image| image.src().map(str::to_string))
                    .collect(),
            })
            .collect();

        let dots = (0..self.controls.dots)
            .map(|index| index == self.current)
            .collect();
        let arrows = self.controls.arrows.then(|| ArrowState {
            prev_disabled: !self.options.infinite && self.current == 0,
            next_disabled: !self.options.infinite && self.current + 1 == total,
        });

        Frame {
            current_slide: self.current,
            transition: self.options.transition,
            animate,
            slides,
            dots,
            arrows,
        }
    }
}

fn controls_for(options: &CarouselOptions, total: usize) -> Controls {
    let multiple = total > 1;
    Controls {
        arrows: options.show_arrows && multiple,
        dots: if options.show_dots && multiple { total } else { 0 },
    }
}

fn role_for(
    transition: Transition,
    index: usize,
    current: usize,
    previous: usize,
    total: usize,
) -> SlideRole {
    if index == current {
        return SlideRole::Active;
    }
    if transition == Transition::Fade {
        return SlideRole::Hidden;
    }
    if index == previous {
        return if current > previous {
            SlideRole::Prev
        } else {
            SlideRole::Next
        };
    }
    let last = total.saturating_sub(1);
    if index + 1 == current || (current == 0 && index == last) {
        SlideRole::Prev
    } else if index == current + 1 || (current == last && index == 0) {
        SlideRole::Next
    } else {
        SlideRole::Hidden
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
