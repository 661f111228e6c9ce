//! Overlays drawn on top of the tiles, and hit-testing against them.

use crate::{
    clustering::{Cluster, ClusteringConfig, Size, clusters},
    marker::{Marker, MarkerId},
    mercator::project,
    position::Position,
};

/// Entry of the [`OverlayStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEntry {
    /// Map-level tap and long press handling.
    Events,

    /// Markers drawn one by one.
    Markers,

    /// Markers merged into clusters.
    Clusters,

    /// Tooltip of given marker.
    Tooltip(MarkerId),
}

/// Ordered overlays. Later entries are drawn on top and hit-tested first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OverlayStack {
    entries: Vec<OverlayEntry>,
}

impl OverlayStack {
    pub fn push(&mut self, entry: OverlayEntry) {
        self.entries.push(entry);
    }

    /// Entries in drawing order.
    pub fn entries(&self) -> &[OverlayEntry] {
        &self.entries
    }

    /// Entries in hit-testing order.
    pub fn top_down(&self) -> impl Iterator<Item = &OverlayEntry> {
        self.entries.iter().rev()
    }
}

/// What was under the finger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    Marker(MarkerId),
    Cluster(Vec<MarkerId>),
}

/// Plain collection of markers with hit-testing.
#[derive(Debug)]
pub struct ItemizedOverlay {
    markers: Vec<Marker>,
    hit_area: Size,
}

/// Markers merged into clusters, according to the config captured when this overlay was built.
#[derive(Debug)]
pub struct ClusteringOverlay {
    markers: Vec<Marker>,
    config: ClusteringConfig,
}

impl ClusteringOverlay {
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }
}

/// The overlay owning all markers of a view.
#[derive(Debug)]
pub enum MarkerOverlay {
    Itemized(ItemizedOverlay),
    Clustering(ClusteringOverlay),
}

impl MarkerOverlay {
    /// Build the overlay variant selected by `config`, seeded with `markers`.
    pub(crate) fn materialize(config: &ClusteringConfig, markers: Vec<Marker>) -> Self {
        if config.enabled {
            if !config.capture_area_covers_footprint() {
                log::warn!(
                    "Cluster capture area {:?} is smaller than marker footprint {:?}.",
                    config.cluster_capture_area,
                    config.marker_footprint
                );
            }

            Self::Clustering(ClusteringOverlay {
                markers,
                config: config.clone(),
            })
        } else {
            Self::Itemized(ItemizedOverlay {
                markers,
                hit_area: config.marker_footprint,
            })
        }
    }

    pub fn entry(&self) -> OverlayEntry {
        match self {
            Self::Itemized(_) => OverlayEntry::Markers,
            Self::Clustering(_) => OverlayEntry::Clusters,
        }
    }

    pub fn markers(&self) -> &[Marker] {
        match self {
            Self::Itemized(overlay) => &overlay.markers,
            Self::Clustering(overlay) => &overlay.markers,
        }
    }

    fn markers_vec(&mut self) -> &mut Vec<Marker> {
        match self {
            Self::Itemized(overlay) => &mut overlay.markers,
            Self::Clustering(overlay) => &mut overlay.markers,
        }
    }

    pub(crate) fn marker_mut(&mut self, id: MarkerId) -> Option<&mut Marker> {
        self.markers_vec().iter_mut().find(|m| m.id() == id)
    }

    pub(crate) fn push(&mut self, marker: Marker) -> &mut Marker {
        let markers = self.markers_vec();
        let index = markers.len();
        markers.push(marker);
        &mut markers[index]
    }

    /// Glyphs to draw at `zoom`, bottom first. Without clustering, every marker is its own.
    pub fn clusters(&self, zoom: f64) -> Vec<Cluster> {
        match self {
            Self::Itemized(overlay) => overlay
                .markers
                .iter()
                .map(|marker| Cluster {
                    members: vec![marker.id()],
                    position: marker.position(),
                })
                .collect(),
            Self::Clustering(overlay) => clusters(&overlay.markers, &overlay.config, zoom),
        }
    }

    fn hit_area(&self) -> Size {
        match self {
            Self::Itemized(overlay) => overlay.hit_area,
            Self::Clustering(overlay) => overlay.config.marker_footprint,
        }
    }

    /// Topmost glyph covering `position` at `zoom`.
    pub fn hit_test(&self, position: Position, zoom: f64) -> Option<Hit> {
        let tapped = project(position, zoom);
        let hit_area = self.hit_area();

        self.clusters(zoom)
            .into_iter()
            .rev()
            .find(|cluster| hit_area.contains(project(cluster.position, zoom), tapped))
            .map(|cluster| {
                if let [single] = cluster.members[..] {
                    Hit::Marker(single)
                } else {
                    Hit::Cluster(cluster.members)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::lat_lon;

    fn marker(lat: f64, lon: f64) -> Marker {
        Marker::new("", "", lat_lon(lat, lon)).unwrap()
    }

    #[test]
    fn stack_is_hit_tested_from_the_top() {
        let mut stack = OverlayStack::default();
        stack.push(OverlayEntry::Events);
        stack.push(OverlayEntry::Markers);

        assert_eq!(
            vec![&OverlayEntry::Markers, &OverlayEntry::Events],
            stack.top_down().collect::<Vec<_>>()
        );
    }

    #[test]
    fn config_selects_overlay_variant() {
        let mut config = ClusteringConfig::default();
        let overlay = MarkerOverlay::materialize(&config, Vec::new());
        assert_eq!(OverlayEntry::Markers, overlay.entry());

        config.enabled = true;
        let overlay = MarkerOverlay::materialize(&config, Vec::new());
        assert_eq!(OverlayEntry::Clusters, overlay.entry());
    }

    #[test]
    fn topmost_marker_is_hit() {
        let config = ClusteringConfig::default();
        let mut overlay = MarkerOverlay::materialize(&config, vec![marker(51.1, 17.0)]);
        let top = overlay.push(marker(51.1, 17.0001)).id();

        assert_eq!(Some(Hit::Marker(top)), overlay.hit_test(lat_lon(51.1, 17.0), 16.));
        assert_eq!(None, overlay.hit_test(lat_lon(51.2, 17.0), 16.));
    }

    #[test]
    fn clusters_are_hit_as_a_whole() {
        let config = ClusteringConfig {
            enabled: true,
            ..Default::default()
        };
        let overlay = MarkerOverlay::materialize(
            &config,
            vec![marker(51.10, 17.00), marker(51.11, 17.02)],
        );

        let ids = overlay.markers().iter().map(Marker::id).collect::<Vec<_>>();
        assert_eq!(Some(Hit::Cluster(ids)), overlay.hit_test(lat_lon(51.105, 17.01), 8.));
    }
}
