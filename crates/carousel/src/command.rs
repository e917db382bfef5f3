use crate::options::OptionsPatch;

/// Keyboard keys the carousel reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Home,
    End,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` name; other keys yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowLeft" => Some(Self::ArrowLeft),
            "ArrowRight" => Some(Self::ArrowRight),
            "Home" => Some(Self::Home),
            "End" => Some(Self::End),
            _ => None,
        }
    }
}

/// Every input a carousel accepts, in one queueable form.
#[derive(Debug, Clone, PartialEq)]
pub enum CarouselCommand {
    Next,
    Previous,
    GoTo(usize),
    /// Moves without starting a transition window.
    Show(usize),
    AutoplayTick,
    PointerEnter,
    PointerLeave,
    DocumentHidden(bool),
    Swipe { start_x: f64, end_x: f64 },
    Key(Key),
    UpdateOptions(OptionsPatch),
}
