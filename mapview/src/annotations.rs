//! Markers attached to a view, and the overlay which owns them.

use std::sync::Arc;

use crate::{
    clustering::ClusteringConfig,
    marker::{Marker, MarkerId},
    overlays::{Hit, MarkerOverlay, OverlayEntry, OverlayStack},
    position::Position,
    tiles::Redraw,
};

/// Reactions to gestures on markers. Implement it to replace the default behavior, which shows
/// the tooltip on tap and only consumes long presses.
///
/// Returning `false` leaves the gesture to the layers below, e.g. [`crate::MapEvents`].
pub trait MarkerGestures {
    /// Returns whether the tap was consumed.
    fn on_tap(&mut self, marker: &mut Marker, redraw: &dyn Redraw) -> bool {
        marker.set_tooltip_visible();
        redraw.request_redraw();
        true
    }

    /// Returns whether the long press was consumed.
    fn on_long_press(&mut self, _marker: &mut Marker, _redraw: &dyn Redraw) -> bool {
        true
    }

    /// Tap on a glyph merging several markers.
    fn on_cluster_tap(&mut self, _members: &[MarkerId], _redraw: &dyn Redraw) -> bool {
        true
    }

    /// Long press on a glyph merging several markers.
    fn on_cluster_long_press(&mut self, _members: &[MarkerId], _redraw: &dyn Redraw) -> bool {
        true
    }
}

/// [`MarkerGestures`] with nothing overridden.
pub struct DefaultMarkerGestures;

impl MarkerGestures for DefaultMarkerGestures {}

/// Markers are kept aside until the first one arrives, then they all move into a dedicated
/// overlay, for good.
#[derive(Debug)]
pub enum AnnotationState<'a> {
    Pending(&'a [Marker]),
    Materialized(&'a MarkerOverlay),
}

pub struct AnnotationRegistry {
    pending: Vec<Marker>,
    overlay: Option<MarkerOverlay>,
    clustering: ClusteringConfig,
    gestures: Box<dyn MarkerGestures>,
    redraw: Arc<dyn Redraw>,
}

impl AnnotationRegistry {
    pub fn new(clustering: ClusteringConfig, redraw: Arc<dyn Redraw>) -> Self {
        Self {
            pending: Vec::new(),
            overlay: None,
            clustering,
            gestures: Box::new(DefaultMarkerGestures),
            redraw,
        }
    }

    pub fn state(&self) -> AnnotationState<'_> {
        match &self.overlay {
            Some(overlay) => AnnotationState::Materialized(overlay),
            None => AnnotationState::Pending(&self.pending),
        }
    }

    /// Clustering settings. Changing them affects only an overlay which is not there yet.
    pub fn clustering(&self) -> &ClusteringConfig {
        &self.clustering
    }

    pub fn clustering_mut(&mut self) -> &mut ClusteringConfig {
        &mut self.clustering
    }

    pub fn set_gestures(&mut self, gestures: impl MarkerGestures + 'static) {
        self.gestures = Box::new(gestures);
    }

    /// Dedicated overlay, once materialized.
    pub fn overlay(&self) -> Option<&MarkerOverlay> {
        self.overlay.as_ref()
    }

    pub fn markers(&self) -> &[Marker] {
        match &self.overlay {
            Some(overlay) => overlay.markers(),
            None => &self.pending,
        }
    }

    pub fn len(&self) -> usize {
        self.markers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers().is_empty()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers().iter().find(|m| m.id() == id)
    }

    pub fn marker_mut(&mut self, id: MarkerId) -> Option<&mut Marker> {
        marker_in(&mut self.pending, self.overlay.as_mut(), id)
    }

    /// Attach the marker, along with a hidden tooltip placed above the marker layer. The first
    /// marker materializes the overlay. Returns the stored marker.
    pub fn add(&mut self, mut marker: Marker, overlays: &mut OverlayStack) -> &mut Marker {
        marker.attach_tooltip();
        self.redraw.request_redraw();

        let tooltip = OverlayEntry::Tooltip(marker.id());
        let overlay = self.materialize(overlays);
        overlays.push(tooltip);
        overlay.push(marker)
    }

    /// Move pending markers into a new overlay, unless it is already there.
    fn materialize(&mut self, overlays: &mut OverlayStack) -> &mut MarkerOverlay {
        let Self {
            pending,
            overlay,
            clustering,
            ..
        } = self;

        overlay.get_or_insert_with(|| {
            let overlay = MarkerOverlay::materialize(clustering, std::mem::take(pending));
            log::debug!("Materialized {:?} overlay.", overlay.entry());
            overlays.push(overlay.entry());
            overlay
        })
    }

    /// Topmost marker or cluster at `position`.
    pub fn hit_test(&self, position: Position, zoom: f64) -> Option<Hit> {
        self.overlay()?.hit_test(position, zoom)
    }

    /// Dispatch a tap on given hit to the [`MarkerGestures`].
    pub fn on_tap(&mut self, hit: &Hit) -> bool {
        let Self {
            pending,
            overlay,
            gestures,
            redraw,
            ..
        } = self;

        match hit {
            Hit::Marker(id) => match marker_in(pending, overlay.as_mut(), *id) {
                Some(marker) => gestures.on_tap(marker, redraw.as_ref()),
                None => false,
            },
            Hit::Cluster(members) => gestures.on_cluster_tap(members, redraw.as_ref()),
        }
    }

    /// Dispatch a long press on given hit to the [`MarkerGestures`].
    pub fn on_long_press(&mut self, hit: &Hit) -> bool {
        let Self {
            pending,
            overlay,
            gestures,
            redraw,
            ..
        } = self;

        match hit {
            Hit::Marker(id) => marker_in(pending, overlay.as_mut(), *id)
                .is_some_and(|marker| gestures.on_long_press(marker, redraw.as_ref())),
            Hit::Cluster(members) => gestures.on_cluster_long_press(members, redraw.as_ref()),
        }
    }
}

fn marker_in<'a>(
    pending: &'a mut [Marker],
    overlay: Option<&'a mut MarkerOverlay>,
    id: MarkerId,
) -> Option<&'a mut Marker> {
    match overlay {
        Some(overlay) => overlay.marker_mut(id),
        None => pending.iter_mut().find(|m| m.id() == id),
    }
}
