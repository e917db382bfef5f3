//! Which navigation link to highlight for a scroll position.

const ACTIVE_OFFSET_PX: f64 = 100.0;
const CHECK_LINE_RATIO: f64 = 0.35;
const BOTTOM_SLACK_PX: f64 = 2.0;
const NAVBAR_SCROLLED_PX: f64 = 50.0;
const NAVBAR_HEIGHT_PX: f64 = 70.0;
const CONTACT_SECTION: &str = "contact";

/// A page section in document coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBounds {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl SectionBounds {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_y: f64,
    pub height: f64,
    pub document_height: f64,
}

/// Section containing the point 100px below the top of the viewport.
/// Later sections win when bounds overlap.
pub fn active_section(sections: &[SectionBounds], scroll_y: f64) -> Option<&str> {
    let probe = scroll_y + ACTIVE_OFFSET_PX;
    sections
        .iter()
        .rev()
        .find(|section| probe >= section.top && probe < section.bottom())
        .map(|section| section.id.as_str())
}

/// Section to highlight once scrolling settles.
///
/// At the very end of the page `contact` is forced. Otherwise the section
/// spanning the check line (35% down the viewport) wins, falling back to the
/// section whose top is nearest to that line.
pub fn sync_active_section<'a>(
    sections: &'a [SectionBounds],
    viewport: &Viewport,
) -> Option<&'a str> {
    if viewport.height + viewport.scroll_y >= viewport.document_height - BOTTOM_SLACK_PX {
        return Some(CONTACT_SECTION);
    }

    let check_y = viewport.height * CHECK_LINE_RATIO;
    let spanning = sections.iter().rev().find(|section| {
        let top = section.top - viewport.scroll_y;
        let bottom = section.bottom() - viewport.scroll_y;
        top <= check_y && bottom >= check_y
    });
    if let Some(section) = spanning {
        return Some(section.id.as_str());
    }

    let mut nearest: Option<(&SectionBounds, f64)> = None;
    for section in sections {
        let distance = (section.top - viewport.scroll_y - check_y).abs();
        if nearest.map_or(true, |(_, best)| distance < best) {
            nearest = Some((section, distance));
        }
    }
    nearest.map(|(section, _)| section.id.as_str())
}

pub fn navbar_scrolled(scroll_y: f64) -> bool {
    scroll_y > NAVBAR_SCROLLED_PX
}

/// Scroll position that puts a section just below the fixed navbar.
pub fn scroll_target(section: &SectionBounds) -> f64 {
    section.top - NAVBAR_HEIGHT_PX
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
