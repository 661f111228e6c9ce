//! Merging nearby markers into cluster glyphs.

use crate::{
    marker::{Marker, MarkerId},
    mercator::project,
    position::{Pixels, Position},
};

/// Width and height, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether `point` lies within this size, centered at `center`.
    pub(crate) fn contains(&self, center: Pixels, point: Pixels) -> bool {
        (point.x() - center.x()).abs() <= self.width / 2.
            && (point.y() - center.y()).abs() <= self.height / 2.
    }
}

/// Controls whether and how markers are clustered. Read once, when the first marker is added.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringConfig {
    pub enabled: bool,

    /// Place the cluster glyph in the centroid of its members, rather than at its first member.
    pub gravity_center_positioning: bool,

    /// Draw cluster glyphs on top of single markers.
    pub cluster_above_others: bool,

    /// Area occupied by a single marker (or cluster) glyph.
    pub marker_footprint: Size,

    /// Window around a cluster in which markers are merged into it. Should not be smaller than
    /// the footprint, but it is not enforced.
    pub cluster_capture_area: Size,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gravity_center_positioning: true,
            cluster_above_others: false,
            marker_footprint: Size::new(100., 100.),
            cluster_capture_area: Size::new(150., 150.),
        }
    }
}

impl ClusteringConfig {
    pub(crate) fn capture_area_covers_footprint(&self) -> bool {
        self.cluster_capture_area.width >= self.marker_footprint.width
            && self.cluster_capture_area.height >= self.marker_footprint.height
    }
}

/// One drawable glyph: either a single marker or several merged ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub members: Vec<MarkerId>,
    pub position: Position,
}

impl Cluster {
    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

/// Group markers whose projections fall within the capture area of a group's first member,
/// then order the groups for drawing (last is on top).
pub(crate) fn clusters(markers: &[Marker], config: &ClusteringConfig, zoom: f64) -> Vec<Cluster> {
    let mut groups: Vec<(Pixels, Vec<&Marker>)> = Vec::new();

    for marker in markers {
        let projected = project(marker.position(), zoom);

        if let Some((_, group)) = groups
            .iter_mut()
            .find(|(seed, _)| config.cluster_capture_area.contains(*seed, projected))
        {
            group.push(marker);
        } else {
            groups.push((projected, vec![marker]));
        }
    }

    let (mut singles, merged): (Vec<_>, Vec<_>) = groups
        .into_iter()
        .map(|(_, members)| Cluster {
            members: members.iter().map(|m| m.id()).collect(),
            position: if config.gravity_center_positioning {
                center(members.iter().map(|m| m.position()))
            } else {
                members[0].position()
            },
        })
        .partition(Cluster::is_single);

    if config.cluster_above_others {
        singles.extend(merged);
        singles
    } else {
        merged.into_iter().chain(singles).collect()
    }
}

fn center(positions: impl ExactSizeIterator<Item = Position>) -> Position {
    let count = positions.len();
    if count == 0 {
        Position::default()
    } else {
        positions.fold(Position::default(), |acc, p| acc + p) / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::lat_lon;
    use approx::assert_relative_eq;

    fn markers() -> Vec<Marker> {
        vec![
            Marker::new("a", "", lat_lon(51.10, 17.00)).unwrap(),
            Marker::new("b", "", lat_lon(51.11, 17.02)).unwrap(),
            Marker::new("c", "", lat_lon(52.23, 21.01)).unwrap(),
        ]
    }

    fn ids(clusters: &[Cluster]) -> Vec<Vec<MarkerId>> {
        clusters.iter().map(|c| c.members.clone()).collect()
    }

    #[test]
    fn default_config() {
        let config = ClusteringConfig::default();
        assert!(!config.enabled);
        assert!(config.gravity_center_positioning);
        assert!(!config.cluster_above_others);
        assert_eq!(Size::new(100., 100.), config.marker_footprint);
        assert_eq!(Size::new(150., 150.), config.cluster_capture_area);
        assert!(config.capture_area_covers_footprint());
    }

    #[test]
    fn close_markers_merge_at_low_zoom_only() {
        let markers = markers();
        let config = ClusteringConfig::default();

        let far = clusters(&markers, &config, 8.);
        assert_eq!(
            vec![vec![markers[0].id(), markers[1].id()], vec![markers[2].id()]],
            ids(&far)
        );

        let near = clusters(&markers, &config, 16.);
        assert_eq!(3, near.len());
        assert!(near.iter().all(Cluster::is_single));
    }

    #[test]
    fn everything_merges_at_zoom_zero() {
        let markers = markers();
        let all = clusters(&markers, &ClusteringConfig::default(), 0.);
        assert_eq!(1, all.len());
        assert_eq!(3, all[0].members.len());
    }

    #[test]
    fn cluster_is_placed_in_the_centroid_or_at_first_member() {
        let markers = markers();
        let mut config = ClusteringConfig::default();

        let cluster = &clusters(&markers, &config, 8.)[0];
        assert_relative_eq!(cluster.position.y(), 51.105, max_relative = 1e-12);
        assert_relative_eq!(cluster.position.x(), 17.01, max_relative = 1e-12);

        config.gravity_center_positioning = false;
        let cluster = &clusters(&markers, &config, 8.)[0];
        assert_eq!(markers[0].position(), cluster.position);
    }

    #[test]
    fn clusters_can_be_drawn_above_single_markers() {
        let markers = markers();
        let mut config = ClusteringConfig::default();

        let below = clusters(&markers, &config, 8.);
        assert!(!below.first().unwrap().is_single());

        config.cluster_above_others = true;
        let above = clusters(&markers, &config, 8.);
        assert!(!above.last().unwrap().is_single());
    }

    #[test]
    fn footprint_larger_than_capture_area_is_detected() {
        let config = ClusteringConfig {
            marker_footprint: Size::new(200., 50.),
            ..Default::default()
        };
        assert!(!config.capture_area_covers_footprint());
    }
}
