use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transition style: {0}")]
pub struct ParseTransitionError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CarouselError {
    #[error("carousel runtime has stopped")]
    Stopped,
}
