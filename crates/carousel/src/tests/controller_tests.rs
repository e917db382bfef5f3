use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{sync::broadcast::error::TryRecvError, time::advance};

use super::*;
use crate::slide::LazyImage;

#[derive(Default)]
struct ViewLog {
    mounts: Vec<Controls>,
    frames: Vec<Frame>,
    unmounts: usize,
}

#[derive(Clone, Default)]
struct RecordingView(Arc<Mutex<ViewLog>>);

impl RecordingView {
    fn last_frame(&self) -> Frame {
        self.0
            .lock()
            .expect("log")
            .frames
            .last()
            .cloned()
            .expect("a frame was rendered")
    }

    fn frame_count(&self) -> usize {
        self.0.lock().expect("log").frames.len()
    }

    fn roles(&self) -> Vec<SlideRole> {
        self.last_frame()
            .slides
            .iter()
            .map(|slide| slide.role)
            .collect()
    }
}

impl CarouselView for RecordingView {
    fn mount(&mut self, controls: Controls) {
        self.0.lock().expect("log").mounts.push(controls);
    }

    fn render(&mut self, frame: &Frame) {
        self.0.lock().expect("log").frames.push(frame.clone());
    }

    fn unmount(&mut self) {
        self.0.lock().expect("log").unmounts += 1;
    }
}

fn slides(count: usize) -> Vec<Slide> {
    (0..count)
        .map(|index| {
            Slide::new(format!("project-{index}"))
                .with_image(LazyImage::deferred(format!("img/project-{index}.webp")))
        })
        .collect()
}

fn carousel(count: usize, options: CarouselOptions) -> (Carousel, RecordingView) {
    let view = RecordingView::default();
    let carousel = Carousel::new(slides(count), options, Box::new(view.clone()));
    (carousel, view)
}

fn finite() -> CarouselOptions {
    CarouselOptions {
        infinite: false,
        ..CarouselOptions::default()
    }
}

const WINDOW: Duration = Duration::from_millis(500);

#[tokio::test(start_paused = true)]
async fn construction_renders_first_slide_without_announcing_it() {
    let (carousel, view) = carousel(4, CarouselOptions::default());
    let mut events = carousel.subscribe();

    assert_eq!(carousel.current_slide(), 0);
    assert_eq!(carousel.total_slides(), 4);
    assert!(!carousel.is_transitioning());
    assert_eq!(
        view.0.lock().expect("log").mounts,
        vec![Controls {
            arrows: true,
            dots: 4
        }]
    );

    let frame = view.last_frame();
    assert!(!frame.animate);
    assert_eq!(frame.dots, vec![true, false, false, false]);
    assert_eq!(
        view.roles(),
        vec![
            SlideRole::Active,
            SlideRole::Next,
            SlideRole::Hidden,
            SlideRole::Prev
        ]
    );
    assert!(frame.slides[0].loaded);
    assert_eq!(frame.slides[0].image_sources, vec!["img/project-0.webp"]);
    assert!(!frame.slides[1].loaded);
    assert!(frame.slides[1].image_sources.is_empty());
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn next_wraps_around_when_infinite() {
    let (mut carousel, _view) = carousel(4, CarouselOptions::default());
    let mut visited = Vec::new();
    for _ in 0..4 {
        assert!(carousel.next());
        visited.push(carousel.current_slide());
        advance(WINDOW).await;
    }
    assert_eq!(visited, vec![1, 2, 3, 0]);

    assert!(carousel.previous());
    assert_eq!(carousel.current_slide(), 3);
}

#[tokio::test(start_paused = true)]
async fn finite_carousel_stops_at_both_ends() {
    let (mut carousel, view) = carousel(3, finite());
    let mut events = carousel.subscribe();

    assert!(!carousel.previous());
    assert_eq!(
        view.last_frame().arrows,
        Some(ArrowState {
            prev_disabled: true,
            next_disabled: false
        })
    );

    assert!(carousel.show_slide(2));
    events.try_recv().expect("change event");
    let frames = view.frame_count();

    assert!(!carousel.next());
    assert_eq!(carousel.current_slide(), 2);
    assert_eq!(view.frame_count(), frames);
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(
        view.last_frame().arrows,
        Some(ArrowState {
            prev_disabled: false,
            next_disabled: true
        })
    );
}

#[tokio::test(start_paused = true)]
async fn going_to_the_current_slide_changes_nothing() {
    let (mut carousel, view) = carousel(3, CarouselOptions::default());
    let mut events = carousel.subscribe();
    let deadline = carousel.autoplay_deadline();
    let frames = view.frame_count();

    advance(Duration::from_millis(100)).await;
    assert!(!carousel.go_to_slide(0));
    assert!(!carousel.go_to_slide(7));

    assert_eq!(carousel.current_slide(), 0);
    assert_eq!(view.frame_count(), frames);
    assert_eq!(carousel.autoplay_deadline(), deadline);
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn second_animated_move_is_rejected_inside_the_window() {
    let (mut carousel, _view) = carousel(5, CarouselOptions::default());
    let mut events = carousel.subscribe();

    assert!(carousel.go_to_slide(2));
    assert!(carousel.is_transitioning());
    assert!(!carousel.go_to_slide(3));
    assert!(!carousel.next());

    advance(Duration::from_millis(499)).await;
    assert!(!carousel.next());

    advance(Duration::from_millis(1)).await;
    assert!(!carousel.is_transitioning());
    assert!(carousel.go_to_slide(3));

    assert_eq!(
        events.try_recv(),
        Ok(CarouselEvent::SlideChanged(SlideChange {
            current_slide: 2,
            previous_slide: 0,
            total_slides: 5
        }))
    );
    assert_eq!(
        events.try_recv(),
        Ok(CarouselEvent::SlideChanged(SlideChange {
            current_slide: 3,
            previous_slide: 2,
            total_slides: 5
        }))
    );
}

#[tokio::test(start_paused = true)]
async fn unanimated_move_bypasses_the_window() {
    let (mut carousel, view) = carousel(4, CarouselOptions::default());
    assert!(carousel.go_to_slide(1));
    assert!(carousel.show_slide(3));
    assert_eq!(carousel.current_slide(), 3);
    assert!(!view.last_frame().animate);
}

#[tokio::test(start_paused = true)]
async fn target_slide_loads_its_deferred_images_once() {
    let (mut carousel, view) = carousel(3, CarouselOptions::default());
    assert!(!carousel.slides()[2].is_loaded());
    assert!(carousel.slides()[2].images()[0].is_deferred());

    assert!(carousel.go_to_slide(2));
    let slide = &carousel.slides()[2];
    assert!(slide.is_loaded());
    assert_eq!(slide.images()[0].src(), Some("img/project-2.webp"));
    assert!(!slide.images()[0].is_deferred());
    assert_eq!(
        view.last_frame().slides[2].image_sources,
        vec!["img/project-2.webp"]
    );
    assert!(!carousel.slides()[1].is_loaded());
}

#[tokio::test(start_paused = true)]
async fn eager_loading_materializes_every_slide_up_front() {
    let options = CarouselOptions {
        lazy_load: false,
        ..CarouselOptions::default()
    };
    let (carousel, _view) = carousel(3, options);
    assert!(carousel.slides().iter().all(Slide::is_loaded));
}

#[tokio::test(start_paused = true)]
async fn slide_roles_follow_direction_and_wrap() {
    let (mut carousel, view) = carousel(4, CarouselOptions::default());

    assert!(carousel.show_slide(2));
    assert!(carousel.show_slide(1));
    assert_eq!(
        view.roles(),
        vec![
            SlideRole::Prev,
            SlideRole::Active,
            SlideRole::Next,
            SlideRole::Hidden
        ]
    );

    assert!(carousel.show_slide(3));
    assert_eq!(
        view.roles(),
        vec![
            SlideRole::Next,
            SlideRole::Prev,
            SlideRole::Prev,
            SlideRole::Active
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn fade_hides_everything_but_the_current_slide() {
    let options = CarouselOptions {
        transition: Transition::Fade,
        ..CarouselOptions::default()
    };
    let (mut carousel, view) = carousel(4, options);
    assert!(carousel.go_to_slide(2));
    assert_eq!(
        view.roles(),
        vec![
            SlideRole::Hidden,
            SlideRole::Hidden,
            SlideRole::Active,
            SlideRole::Hidden
        ]
    );
    assert_eq!(view.last_frame().transition, Transition::Fade);
}

#[tokio::test(start_paused = true)]
async fn swipes_beyond_the_threshold_navigate() {
    let (mut carousel, _view) = carousel(4, CarouselOptions::default());

    assert!(!carousel.swipe(200.0, 150.0));
    assert!(!carousel.swipe(150.0, 200.0));

    assert!(carousel.swipe(200.0, 149.0));
    assert_eq!(carousel.current_slide(), 1);
    advance(WINDOW).await;

    assert!(carousel.swipe(100.0, 180.0));
    assert_eq!(carousel.current_slide(), 0);
    advance(WINDOW).await;

    carousel.update_options(&OptionsPatch {
        swipe_enabled: Some(false),
        ..OptionsPatch::default()
    });
    assert!(!carousel.swipe(300.0, 0.0));
}

#[tokio::test(start_paused = true)]
async fn keyboard_moves_between_slides() {
    let (mut carousel, _view) = carousel(5, CarouselOptions::default());

    assert!(carousel.key(Key::End));
    assert_eq!(carousel.current_slide(), 4);
    advance(WINDOW).await;
    assert!(carousel.key(Key::Home));
    assert_eq!(carousel.current_slide(), 0);
    advance(WINDOW).await;
    assert!(carousel.key(Key::ArrowLeft));
    assert_eq!(carousel.current_slide(), 4);
    advance(WINDOW).await;
    assert!(carousel.key(Key::ArrowRight));
    assert_eq!(carousel.current_slide(), 0);
    advance(WINDOW).await;

    carousel.update_options(&OptionsPatch {
        keyboard_enabled: Some(false),
        ..OptionsPatch::default()
    });
    assert!(!carousel.key(Key::End));
    assert_eq!(Key::from_name("Escape"), None);
    assert_eq!(Key::from_name("Home"), Some(Key::Home));
}

#[tokio::test(start_paused = true)]
async fn autoplay_ticks_advance_and_rearm() {
    let (mut carousel, _view) = carousel(3, CarouselOptions::default());
    let start = Instant::now();
    assert_eq!(
        carousel.autoplay_deadline(),
        Some(start + Duration::from_millis(4000))
    );

    advance(Duration::from_millis(3999)).await;
    assert!(!carousel.poll_autoplay());

    advance(Duration::from_millis(1)).await;
    assert!(carousel.poll_autoplay());
    assert_eq!(carousel.current_slide(), 1);
    assert_eq!(
        carousel.autoplay_deadline(),
        Some(start + Duration::from_millis(8000))
    );
}

#[tokio::test(start_paused = true)]
async fn navigation_restarts_the_autoplay_interval() {
    let (mut carousel, _view) = carousel(3, CarouselOptions::default());
    advance(Duration::from_millis(3000)).await;
    assert!(carousel.go_to_slide(2));
    assert_eq!(
        carousel.autoplay_deadline(),
        Some(Instant::now() + Duration::from_millis(4000))
    );
}

#[tokio::test(start_paused = true)]
async fn autoplay_never_arms_without_enough_slides() {
    let (single, _) = carousel(1, CarouselOptions::default());
    assert_eq!(single.autoplay_deadline(), None);

    let (mut empty, view) = carousel(0, CarouselOptions::default());
    assert_eq!(empty.autoplay_deadline(), None);
    assert_eq!(
        view.0.lock().expect("log").mounts,
        vec![Controls::default()]
    );
    assert!(!empty.next());
    assert!(!empty.previous());
    assert!(!empty.key(Key::End));
    assert!(!empty.go_to_slide(0));
}

#[tokio::test(start_paused = true)]
async fn zero_interval_keeps_autoplay_disarmed() {
    let options = CarouselOptions {
        auto_play_interval: Duration::ZERO,
        ..CarouselOptions::default()
    };
    let (mut carousel, _view) = carousel(3, options);
    assert_eq!(carousel.autoplay_deadline(), None);
    assert!(!carousel.autoplay_tick());

    advance(WINDOW).await;
    assert!(carousel.next());
    assert_eq!(carousel.autoplay_deadline(), None);
    assert!(!carousel.poll_autoplay());
    assert_eq!(carousel.current_slide(), 1);
}

#[tokio::test(start_paused = true)]
async fn hover_and_hidden_document_pause_independently() {
    let (mut carousel, _view) = carousel(3, CarouselOptions::default());

    carousel.pointer_enter();
    assert_eq!(carousel.autoplay_deadline(), None);
    carousel.set_document_hidden(true);
    carousel.pointer_leave();
    assert_eq!(carousel.autoplay_deadline(), None);

    advance(Duration::from_millis(250)).await;
    carousel.set_document_hidden(false);
    assert_eq!(
        carousel.autoplay_deadline(),
        Some(Instant::now() + Duration::from_millis(4000))
    );

    carousel.pointer_enter();
    assert!(carousel.go_to_slide(1));
    assert_eq!(carousel.autoplay_deadline(), None);
    assert!(!carousel.autoplay_tick());
}

#[tokio::test(start_paused = true)]
async fn hover_is_ignored_unless_pause_on_hover() {
    let options = CarouselOptions {
        pause_on_hover: false,
        ..CarouselOptions::default()
    };
    let (mut carousel, _view) = carousel(3, options);
    carousel.pointer_enter();
    assert!(carousel.autoplay_deadline().is_some());
}

#[tokio::test(start_paused = true)]
async fn option_updates_toggle_autoplay_and_remount_controls() {
    let (mut carousel, view) = carousel(3, CarouselOptions::default());

    carousel.update_options(&OptionsPatch {
        auto_play: Some(false),
        ..OptionsPatch::default()
    });
    assert_eq!(carousel.autoplay_deadline(), None);
    assert!(!carousel.autoplay_tick());

    carousel.update_options(&OptionsPatch {
        auto_play: Some(true),
        auto_play_interval: Some(1000),
        show_dots: Some(false),
        ..OptionsPatch::default()
    });
    assert_eq!(
        carousel.autoplay_deadline(),
        Some(Instant::now() + Duration::from_millis(1000))
    );

    let log = view.0.lock().expect("log");
    assert_eq!(log.unmounts, 1);
    assert_eq!(
        log.mounts.last(),
        Some(&Controls {
            arrows: true,
            dots: 0
        })
    );
    assert!(log.frames.last().expect("frame").dots.is_empty());
}

#[tokio::test(start_paused = true)]
async fn commands_route_to_the_same_transitions() {
    let (mut carousel, _view) = carousel(4, CarouselOptions::default());

    assert!(carousel.dispatch(CarouselCommand::GoTo(2)));
    assert!(!carousel.dispatch(CarouselCommand::Next));
    assert!(carousel.dispatch(CarouselCommand::Show(3)));
    advance(WINDOW).await;
    assert!(carousel.dispatch(CarouselCommand::Key(Key::Home)));
    advance(WINDOW).await;
    assert!(carousel.dispatch(CarouselCommand::Swipe {
        start_x: 0.0,
        end_x: 90.0
    }));
    assert_eq!(carousel.current_slide(), 3);
    assert!(!carousel.dispatch(CarouselCommand::PointerEnter));
    assert_eq!(carousel.autoplay_deadline(), None);
}

#[tokio::test(start_paused = true)]
async fn destroy_returns_slides_and_notifies() {
    let (mut carousel, view) = carousel(3, CarouselOptions::default());
    let mut events = carousel.subscribe();
    assert!(carousel.go_to_slide(1));
    let _ = events.try_recv();

    let returned = carousel.destroy();
    assert_eq!(returned.len(), 3);
    assert_eq!(returned[1].id(), "project-1");
    assert_eq!(returned[1].index(), 1);
    assert!(returned[1].is_loaded());
    assert_eq!(events.try_recv(), Ok(CarouselEvent::Destroyed));
    assert_eq!(view.0.lock().expect("log").unmounts, 1);
}
