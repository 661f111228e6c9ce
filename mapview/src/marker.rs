//! Point annotations and their tooltips.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    icons::{Icon, IconError, IconSlot},
    position::{InvalidPosition, Position, validate},
};

/// Identity of a marker, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

impl MarkerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MarkerError {
    #[error(transparent)]
    Position(#[from] InvalidPosition),

    #[error(transparent)]
    Icon(#[from] IconError),
}

/// Label showing marker's title, toggled by tapping the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tooltip {
    text: String,
    visible: bool,
}

impl Tooltip {
    fn new(text: String) -> Self {
        Self {
            text,
            visible: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

#[derive(Debug, Clone)]
pub struct Marker {
    id: MarkerId,
    title: String,
    description: String,
    position: Position,
    icon: IconSlot,
    tooltip: Option<Tooltip>,
}

impl Marker {
    /// New marker with the default glyph. Title and description may be empty.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        position: Position,
    ) -> Result<Self, MarkerError> {
        Ok(Self {
            id: MarkerId::next(),
            title: title.into(),
            description: description.into(),
            position: validate(position)?,
            icon: IconSlot::new(Icon::default()),
            tooltip: None,
        })
    }

    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icon.set_icon(icon);
        self
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn icon(&self) -> &IconSlot {
        &self.icon
    }

    pub(crate) fn icon_mut(&mut self) -> &mut IconSlot {
        &mut self.icon
    }

    /// Tooltip, once the marker is attached to a view.
    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn is_tooltip_visible(&self) -> bool {
        self.tooltip.as_ref().is_some_and(Tooltip::is_visible)
    }

    pub fn set_tooltip_visible(&mut self) {
        self.set_tooltip_visibility(true);
    }

    pub fn set_tooltip_invisible(&mut self) {
        self.set_tooltip_visibility(false);
    }

    fn set_tooltip_visibility(&mut self, visible: bool) {
        if let Some(tooltip) = &mut self.tooltip {
            tooltip.visible = visible;
        }
    }

    /// Bind a hidden tooltip to the title. Happens once, when the marker is attached.
    pub(crate) fn attach_tooltip(&mut self) {
        if self.tooltip.is_none() {
            self.tooltip = Some(Tooltip::new(self.title.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::lat_lon;

    #[test]
    fn markers_get_distinct_ids() {
        let a = Marker::new("a", "", lat_lon(0., 0.)).unwrap();
        let b = Marker::new("a", "", lat_lon(0., 0.)).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn position_is_validated() {
        assert!(matches!(
            Marker::new("", "", lat_lon(100., 0.)),
            Err(MarkerError::Position(_))
        ));
    }

    #[test]
    fn tooltip_is_hidden_and_bound_to_title() {
        let mut marker = Marker::new("Zoo", "Animals", lat_lon(51.1, 17.07)).unwrap();
        assert!(marker.tooltip().is_none());

        // Nothing to show before attaching.
        marker.set_tooltip_visible();
        assert!(!marker.is_tooltip_visible());

        marker.attach_tooltip();
        assert_eq!("Zoo", marker.tooltip().unwrap().text());
        assert!(!marker.is_tooltip_visible());

        marker.set_tooltip_visible();
        assert!(marker.is_tooltip_visible());
        marker.set_tooltip_invisible();
        assert!(!marker.is_tooltip_visible());
    }

    #[test]
    fn default_icon_is_the_stroked_marker() {
        let marker = Marker::new("", "", lat_lon(0., 0.)).unwrap();
        assert_eq!(&Icon::named("markerstroked"), marker.icon().icon());
        assert!(marker.icon().image().is_none());
    }
}
