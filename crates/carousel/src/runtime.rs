use std::future::pending;

use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::debug;

use crate::{
    command::{CarouselCommand, Key},
    controller::{Carousel, CarouselEvent},
    error::CarouselError,
    options::OptionsPatch,
    slide::Slide,
};

const QUEUE_CAPACITY: usize = 64;

enum Request {
    Command {
        command: CarouselCommand,
        reply: oneshot::Sender<bool>,
    },
    Position {
        reply: oneshot::Sender<(usize, usize)>,
    },
    Destroy {
        reply: oneshot::Sender<Vec<Slide>>,
    },
}

/// Runs a [`Carousel`] on a tokio task that owns it and its autoplay timer.
pub struct CarouselRuntime;

impl CarouselRuntime {
    pub fn spawn(carousel: Carousel) -> CarouselHandle {
        let (requests, queue) = mpsc::channel(QUEUE_CAPACITY);
        let events = carousel.event_sender();
        let task = tokio::spawn(run(carousel, queue));
        CarouselHandle {
            requests,
            events,
            task,
        }
    }
}

/// Async front of a running carousel. Dropping it stops the carousel.
pub struct CarouselHandle {
    requests: mpsc::Sender<Request>,
    events: broadcast::Sender<CarouselEvent>,
    task: JoinHandle<()>,
}

impl CarouselHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<CarouselEvent> {
        self.events.subscribe()
    }

    pub async fn dispatch(&self, command: CarouselCommand) -> Result<bool, CarouselError> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Command { command, reply }).await?;
        response.await.map_err(|_| CarouselError::Stopped)
    }

    pub async fn next(&self) -> Result<bool, CarouselError> {
        self.dispatch(CarouselCommand::Next).await
    }

    pub async fn previous(&self) -> Result<bool, CarouselError> {
        self.dispatch(CarouselCommand::Previous).await
    }

    pub async fn go_to_slide(&self, index: usize) -> Result<bool, CarouselError> {
        self.dispatch(CarouselCommand::GoTo(index)).await
    }

    pub async fn pointer_enter(&self) -> Result<(), CarouselError> {
        self.dispatch(CarouselCommand::PointerEnter).await.map(drop)
    }

    pub async fn pointer_leave(&self) -> Result<(), CarouselError> {
        self.dispatch(CarouselCommand::PointerLeave).await.map(drop)
    }

    pub async fn set_document_hidden(&self, hidden: bool) -> Result<(), CarouselError> {
        self.dispatch(CarouselCommand::DocumentHidden(hidden))
            .await
            .map(drop)
    }

    pub async fn swipe(&self, start_x: f64, end_x: f64) -> Result<bool, CarouselError> {
        self.dispatch(CarouselCommand::Swipe { start_x, end_x }).await
    }

    pub async fn key(&self, key: Key) -> Result<bool, CarouselError> {
        self.dispatch(CarouselCommand::Key(key)).await
    }

    pub async fn update_options(&self, patch: OptionsPatch) -> Result<(), CarouselError> {
        self.dispatch(CarouselCommand::UpdateOptions(patch))
            .await
            .map(drop)
    }

    pub async fn current_slide(&self) -> Result<usize, CarouselError> {
        self.position().await.map(|(current, _)| current)
    }

    pub async fn total_slides(&self) -> Result<usize, CarouselError> {
        self.position().await.map(|(_, total)| total)
    }

    /// Stops the task and returns the slides it adopted.
    pub async fn destroy(self) -> Result<Vec<Slide>, CarouselError> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Destroy { reply }).await?;
        let slides = response.await.map_err(|_| CarouselError::Stopped)?;
        let _ = self.task.await;
        Ok(slides)
    }

    async fn position(&self) -> Result<(usize, usize), CarouselError> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Position { reply }).await?;
        response.await.map_err(|_| CarouselError::Stopped)
    }

    async fn send(&self, request: Request) -> Result<(), CarouselError> {
        self.requests
            .send(request)
            .await
            .map_err(|_| CarouselError::Stopped)
    }
}

async fn run(mut carousel: Carousel, mut queue: mpsc::Receiver<Request>) {
    loop {
        let deadline = carousel.autoplay_deadline();
        tokio::select! {
            request = queue.recv() => match request {
                Some(Request::Command { command, reply }) => {
                    let _ = reply.send(carousel.dispatch(command));
                }
                Some(Request::Position { reply }) => {
                    let _ = reply.send((carousel.current_slide(), carousel.total_slides()));
                }
                Some(Request::Destroy { reply }) => {
                    let _ = reply.send(carousel.destroy());
                    return;
                }
                None => {
                    debug!("carousel: all handles dropped");
                    carousel.destroy();
                    return;
                }
            },
            () = wait_until(deadline) => {
                carousel.poll_autoplay();
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
