use std::{str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ParseTransitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    #[default]
    Slide,
    Fade,
}

impl FromStr for Transition {
    type Err = ParseTransitionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "slide" => Ok(Self::Slide),
            "fade" => Ok(Self::Fade),
            other => Err(ParseTransitionError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselOptions {
    pub auto_play: bool,
    pub auto_play_interval: Duration,
    pub show_arrows: bool,
    pub show_dots: bool,
    pub infinite: bool,
    pub transition: Transition,
    pub transition_duration: Duration,
    pub pause_on_hover: bool,
    pub swipe_enabled: bool,
    pub keyboard_enabled: bool,
    pub lazy_load: bool,
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self {
            auto_play: true,
            auto_play_interval: Duration::from_millis(4000),
            show_arrows: true,
            show_dots: true,
            infinite: true,
            transition: Transition::Slide,
            transition_duration: Duration::from_millis(500),
            pause_on_hover: true,
            swipe_enabled: true,
            keyboard_enabled: true,
            lazy_load: true,
        }
    }
}

impl CarouselOptions {
    /// Builds options from `data-*` attributes of a slideshow container.
    ///
    /// Keys may be given with or without the `data-` prefix. A boolean flag is
    /// off only for the literal `"false"`; values that do not parse are ignored.
    pub fn from_data_attributes<'a>(
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut options = Self::default();
        for (name, value) in attributes {
            let name = name.strip_prefix("data-").unwrap_or(name);
            match name {
                "autoplay" => options.auto_play = value != "false",
                "interval" => {
                    if let Some(interval) = parse_millis(value) {
                        options.auto_play_interval = interval;
                    }
                }
                "transition" => {
                    if let Ok(transition) = value.parse() {
                        options.transition = transition;
                    }
                }
                "arrows" => options.show_arrows = value != "false",
                "dots" => options.show_dots = value != "false",
                "infinite" => options.infinite = value != "false",
                _ => {}
            }
        }
        options
    }

    pub fn apply(&mut self, patch: &OptionsPatch) {
        if let Some(auto_play) = patch.auto_play {
            self.auto_play = auto_play;
        }
        if let Some(interval) = patch.auto_play_interval.filter(|ms| *ms > 0) {
            self.auto_play_interval = Duration::from_millis(interval);
        }
        if let Some(show_arrows) = patch.show_arrows {
            self.show_arrows = show_arrows;
        }
        if let Some(show_dots) = patch.show_dots {
            self.show_dots = show_dots;
        }
        if let Some(infinite) = patch.infinite {
            self.infinite = infinite;
        }
        if let Some(transition) = patch.transition {
            self.transition = transition;
        }
        if let Some(duration) = patch.transition_duration {
            self.transition_duration = Duration::from_millis(duration);
        }
        if let Some(pause_on_hover) = patch.pause_on_hover {
            self.pause_on_hover = pause_on_hover;
        }
        if let Some(swipe_enabled) = patch.swipe_enabled {
            self.swipe_enabled = swipe_enabled;
        }
        if let Some(keyboard_enabled) = patch.keyboard_enabled {
            self.keyboard_enabled = keyboard_enabled;
        }
        if let Some(lazy_load) = patch.lazy_load {
            self.lazy_load = lazy_load;
        }
    }
}

/// Partial option update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsPatch {
    pub auto_play: Option<bool>,
    /// Milliseconds.
    pub auto_play_interval: Option<u64>,
    pub show_arrows: Option<bool>,
    pub show_dots: Option<bool>,
    pub infinite: Option<bool>,
    pub transition: Option<Transition>,
    /// Milliseconds.
    pub transition_duration: Option<u64>,
    pub pause_on_hover: Option<bool>,
    pub swipe_enabled: Option<bool>,
    pub keyboard_enabled: Option<bool>,
    pub lazy_load: Option<bool>,
}

fn parse_millis(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
#[path = "tests/options_tests.rs"]
mod tests;
