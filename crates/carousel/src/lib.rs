//! Slideshow state machine with autoplay, swipe and keyboard input.
//!
//! [`Carousel`] is synchronous and owns no presentation; frames go out through a
//! [`CarouselView`]. [`CarouselRuntime`] drives one carousel from a tokio task.

mod command;
mod controller;
pub mod error;
mod options;
mod runtime;
mod slide;
pub mod view;

pub use command::{CarouselCommand, Key};
pub use controller::{Carousel, CarouselEvent, SlideChange};
pub use error::{CarouselError, ParseTransitionError};
pub use options::{CarouselOptions, OptionsPatch, Transition};
pub use runtime::{CarouselHandle, CarouselRuntime};
pub use slide::{LazyImage, Slide};
pub use view::{ArrowState, CarouselView, Controls, Frame, SlideFrame, SlideRole, TracingView};
