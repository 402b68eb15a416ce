//! Helpers for the read-only post viewer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::bridge::Bridge;
use crate::registry::{BridgeEvent, EventName, Subscription, listener};

/// Average reading speed used for estimates.
pub const WORDS_PER_MINUTE: usize = 150;

/// Estimated minutes to read `html`. Tags are ignored; empty content is 0.
pub fn reading_time(html: &str) -> usize {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let words = text.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE)
}

/// Accent colours the parent platform lets users pick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PageColor {
    #[default]
    Lavender,
    Coral,
    Teal,
    WarmPink,
    Blue,
    Purple,
}

impl PageColor {
    /// Parse a parent colour name. Names are case-sensitive; anything
    /// unknown falls back to lavender.
    pub fn from_name(name: &str) -> Self {
        match name {
            "CORAL" => PageColor::Coral,
            "TEAL" => PageColor::Teal,
            "WARMPINK" => PageColor::WarmPink,
            "BLUE" => PageColor::Blue,
            "PURPLE" => PageColor::Purple,
            _ => PageColor::Lavender,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PageColor::Lavender => "LAVENDER",
            PageColor::Coral => "CORAL",
            PageColor::Teal => "TEAL",
            PageColor::WarmPink => "WARMPINK",
            PageColor::Blue => "BLUE",
            PageColor::Purple => "PURPLE",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            PageColor::Lavender => "#A47BB9",
            PageColor::Coral => "#E08D79",
            PageColor::Teal => "#5C9EAD",
            PageColor::WarmPink => "#D46BA3",
            PageColor::Blue => "#779ECB",
            PageColor::Purple => "#8859A3",
        }
    }
}

/// Hex colour for a parent colour name.
pub fn hex_for_page_color(name: &str) -> &'static str {
    PageColor::from_name(name).hex()
}

/// How far through the article the reader is, in percent.
///
/// `content_top` and `content_height` describe the article in document
/// coordinates. Returns `None` when the article fits in the viewport.
pub fn reading_progress(
    scroll_top: f64,
    content_top: f64,
    content_height: f64,
    viewport_height: f64,
) -> Option<f64> {
    let scrollable = content_height - viewport_height;
    if scrollable <= 0.0 {
        return None;
    }
    let read = (scroll_top - content_top) / scrollable * 100.0;
    Some(read.clamp(0.0, 100.0))
}

/// Accent colour for the viewer, kept in sync with the parent.
///
/// Starts as coral until the parent says otherwise.
pub struct ViewerTheme {
    color: Rc<Cell<PageColor>>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl Default for ViewerTheme {
    fn default() -> Self {
        Self {
            color: Rc::new(Cell::new(PageColor::Coral)),
            subscriptions: RefCell::new(Vec::new()),
        }
    }
}

impl ViewerTheme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self) -> PageColor {
        self.color.get()
    }

    pub fn accent_hex(&self) -> &'static str {
        self.color().hex()
    }

    /// Follow the user's colour from snapshots and preference updates.
    pub fn attach(&self, bridge: &dyn Bridge) {
        self.detach();

        let color = self.color.clone();
        let on_init = bridge.on(
            EventName::InitData,
            listener(move |event| {
                if let BridgeEvent::InitData(snapshot) = event {
                    if let Some(name) = &snapshot.preferred_color {
                        color.set(PageColor::from_name(name));
                    }
                }
                Ok(())
            }),
        );

        // after initData, so a colour on the user wins over the snapshot's
        let color = self.color.clone();
        let on_user = bridge.on(
            EventName::UserData,
            listener(move |event| {
                if let Some(name) = event.user().and_then(|user| user.preferred_color.as_ref()) {
                    color.set(PageColor::from_name(name));
                }
                Ok(())
            }),
        );

        let color = self.color.clone();
        let on_preferences = bridge.on(
            EventName::Preferences,
            listener(move |event| {
                if let BridgeEvent::Preferences(update) = event {
                    if let Some(name) = &update.preferred_color {
                        tracing::debug!(color = %name, "accent colour changed");
                        color.set(PageColor::from_name(name));
                    }
                }
                Ok(())
            }),
        );

        *self.subscriptions.borrow_mut() = vec![on_init, on_user, on_preferences];
    }

    pub fn detach(&self) {
        for subscription in self.subscriptions.borrow_mut().drain(..) {
            subscription.unsubscribe();
        }
    }
}
