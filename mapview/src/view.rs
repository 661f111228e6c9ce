//! The map view: current tile source, markers and the gestures reaching them.

use std::sync::Arc;

use crate::{
    annotations::{AnnotationRegistry, MarkerGestures},
    clustering::{ClusteringConfig, Size},
    controller::MapSourceController,
    geojson::{DocumentParser, GeoJsonParser, PointFeature},
    icons::{BundledIcons, DEFAULT_MARKER_GLYPH, Icon, IconError, IconResolver, LoadTicket},
    io::{Command, Fetch, HttpFetch, HttpOptions, Job},
    loader::{Loader, RemoteIconError},
    marker::{Marker, MarkerError, MarkerId},
    overlays::{OverlayEntry, OverlayStack},
    position::{Position, lat_lon},
    resolver::{EXAMPLE_MAP_ID, InvalidIdentifier, MAPBOX_BASE_URL, Resolver},
    sources::TileSourceDescriptor,
    tiles::{Redraw, TileLayer},
};

pub struct MapViewOptions {
    /// Source shown right after construction. Any identifier [`Resolver`] understands.
    pub default_source: String,

    /// Hosting service short map IDs are resolved against.
    pub service_base_url: String,

    /// Glyph of markers created by the view, e.g. out of a document.
    pub default_marker_glyph: String,

    pub clustering: ClusteringConfig,

    pub http: HttpOptions,
}

impl Default for MapViewOptions {
    fn default() -> Self {
        Self {
            default_source: EXAMPLE_MAP_ID.to_owned(),
            service_base_url: MAPBOX_BASE_URL.to_owned(),
            default_marker_glyph: DEFAULT_MARKER_GLYPH.to_owned(),
            clustering: ClusteringConfig::default(),
            http: HttpOptions::default(),
        }
    }
}

/// Taps and long presses which did not hit any marker.
pub trait MapEvents {
    fn on_tap(&mut self, _position: Position) {}
    fn on_long_press(&mut self, _position: Position) {}
}

/// [`MapEvents`] ignoring everything.
pub struct NoMapEvents;

impl MapEvents for NoMapEvents {}

/// Map view. Lives on the UI thread; results of background loads reach it only through
/// [`MapView::process_commands`].
pub struct MapView {
    sources: MapSourceController,
    annotations: AnnotationRegistry,
    overlays: OverlayStack,
    icons: Box<dyn IconResolver>,
    events: Box<dyn MapEvents>,
    loader: Loader,
    default_marker_glyph: String,
    redraw: Arc<dyn Redraw>,
}

impl MapView {
    /// Create the view and show the default source.
    pub fn new(
        options: MapViewOptions,
        tile_layer: impl TileLayer + 'static,
        redraw: Arc<dyn Redraw>,
    ) -> Result<Self, InvalidIdentifier> {
        let sources = MapSourceController::new(
            &options.default_source,
            Resolver::with_base_url(options.service_base_url),
            Box::new(tile_layer),
            redraw.clone(),
        )?;

        let mut overlays = OverlayStack::default();
        overlays.push(OverlayEntry::Events);

        Ok(Self {
            sources,
            annotations: AnnotationRegistry::new(options.clustering, redraw.clone()),
            overlays,
            icons: Box::new(BundledIcons::default()),
            events: Box::new(NoMapEvents),
            loader: Loader::new(
                Arc::new(HttpFetch::new(options.http)),
                Arc::new(GeoJsonParser),
                redraw.clone(),
            ),
            default_marker_glyph: options.default_marker_glyph,
            redraw,
        })
    }

    pub fn with_icons(mut self, icons: impl IconResolver + 'static) -> Self {
        self.icons = Box::new(icons);
        self
    }

    pub fn with_fetch(mut self, fetch: impl Fetch + 'static) -> Self {
        self.loader.set_fetch(Arc::new(fetch));
        self
    }

    pub fn with_parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.loader.set_parser(Arc::new(parser));
        self
    }

    pub fn set_map_events(&mut self, events: impl MapEvents + 'static) {
        self.events = Box::new(events);
    }

    pub fn set_marker_gestures(&mut self, gestures: impl MarkerGestures + 'static) {
        self.annotations.set_gestures(gestures);
    }

    /// Currently displayed source.
    pub fn source(&self) -> Arc<TileSourceDescriptor> {
        self.sources.current()
    }

    /// See [`MapSourceController::set_source`].
    pub fn set_source(&mut self, identifier: &str) -> Result<(), InvalidIdentifier> {
        self.sources.set_source(identifier)
    }

    /// See [`MapSourceController::switch_layer`].
    pub fn switch_layer(&mut self, identifier: &str) -> Result<(), InvalidIdentifier> {
        self.sources.switch_layer(identifier)
    }

    #[deprecated(note = "use `switch_layer` instead")]
    pub fn add_layer(&mut self, identifier: &str) -> Result<(), InvalidIdentifier> {
        self.switch_layer(identifier)
    }

    /// Attach the marker. Its icon is resolved first, and a glyph which cannot be resolved is an
    /// error.
    pub fn add_marker(&mut self, mut marker: Marker) -> Result<&Marker, MarkerError> {
        marker.icon_mut().resolve(self.icons.as_mut())?;
        Ok(self.annotations.add(marker, &mut self.overlays))
    }

    /// Create a marker with the default glyph and attach it.
    pub fn create_marker(
        &mut self,
        lat: f64,
        lon: f64,
        title: &str,
        text: &str,
    ) -> Result<&Marker, MarkerError> {
        let marker = self.build_marker(title.to_owned(), text.to_owned(), lat_lon(lat, lon))?;
        Ok(self.annotations.add(marker, &mut self.overlays))
    }

    fn build_marker(
        &mut self,
        title: String,
        description: String,
        position: Position,
    ) -> Result<Marker, MarkerError> {
        let mut marker = Marker::new(title, description, position)?
            .with_icon(Icon::named(&self.default_marker_glyph));
        marker.icon_mut().resolve(self.icons.as_mut())?;
        Ok(marker)
    }

    /// Change the icon of an attached marker. Returns `false` if there is no such marker.
    pub fn set_marker_icon(&mut self, id: MarkerId, icon: Icon) -> Result<bool, IconError> {
        let Some(marker) = self.annotations.marker_mut(id) else {
            return Ok(false);
        };

        marker.icon_mut().replace(icon, self.icons.as_mut())?;
        self.redraw.request_redraw();
        Ok(true)
    }

    /// Fetch a GeoJSON document in the background and add its points as markers, once
    /// [`Self::process_commands`] picks it up. Failures are only logged.
    pub fn load_markers_from_document_url(&mut self, url: &str) {
        self.loader.submit(Job::Document {
            url: url.to_owned(),
        });
    }

    /// Add points of a GeoJSON document as markers. A document which does not parse is logged
    /// and ignored. Returns number of added markers.
    pub fn load_markers_from_document_string(&mut self, json: &str) -> Result<usize, MarkerError> {
        match self.loader.parser().parse(json) {
            Ok(features) => self.add_features(features),
            Err(error) => {
                log::warn!("JSON parsed was invalid: {error}. Continuing without it.");
                Ok(0)
            }
        }
    }

    /// All markers are built before any is added, so a failure leaves the view untouched.
    fn add_features(&mut self, features: Vec<PointFeature>) -> Result<usize, MarkerError> {
        let markers = features
            .into_iter()
            .map(|f| self.build_marker(f.title, f.description, f.position))
            .collect::<Result<Vec<_>, _>>()?;

        let count = markers.len();
        for marker in markers {
            self.annotations.add(marker, &mut self.overlays);
        }
        Ok(count)
    }

    /// Download an image in the background and make it the icon of given marker. Only the most
    /// recent request for a marker takes effect. Returns `false` if there is no such marker.
    pub fn load_marker_icon_from_url(&mut self, id: MarkerId, url: &str) -> bool {
        let Some(marker) = self.annotations.marker_mut(id) else {
            log::warn!("Cannot load icon of unknown marker {id:?}.");
            return false;
        };

        let ticket = marker.icon_mut().begin_load();
        self.loader.submit(Job::Icon {
            marker: id,
            ticket,
            url: url.to_owned(),
        });
        true
    }

    /// Apply results of background loads. Call it from the UI thread, e.g. every frame. All
    /// pending results are applied; the first marker error is returned.
    pub fn process_commands(&mut self) -> Result<(), MarkerError> {
        let mut outcome = Ok(());

        for command in self.loader.drain() {
            match command {
                Command::Document {
                    url,
                    result: Ok(features),
                } => match self.add_features(features) {
                    Ok(count) => log::debug!("Loaded {count} markers from '{url}'."),
                    Err(error) => {
                        log::error!("Could not create markers from '{url}': {error}.");
                        outcome = outcome.and(Err(error));
                    }
                },
                Command::Document {
                    url,
                    result: Err(error),
                } => {
                    log::warn!(
                        "Could not load markers from '{url}': {error}. Continuing without them."
                    );
                }
                Command::Icon {
                    marker,
                    ticket,
                    url,
                    result,
                } => self.apply_icon(marker, ticket, &url, result),
            }
        }

        outcome
    }

    fn apply_icon(
        &mut self,
        id: MarkerId,
        ticket: LoadTicket,
        url: &str,
        result: Result<Arc<egui::ColorImage>, RemoteIconError>,
    ) {
        let Some(marker) = self.annotations.marker_mut(id) else {
            log::debug!("Marker {id:?} is gone, dropping icon from '{url}'.");
            return;
        };

        match result {
            Ok(image) => {
                if marker.icon_mut().complete_load(ticket, image) {
                    self.redraw.request_redraw();
                } else {
                    log::debug!("Discarding outdated icon from '{url}'.");
                }
            }
            Err(error) => {
                log::warn!("Could not load icon from '{url}': {error}.");
                marker.icon_mut().abandon_load(ticket);
            }
        }
    }

    /// Dispatch a tap at `position`, seen at `zoom`. Returns whether it was consumed.
    pub fn single_tap(&mut self, position: Position, zoom: f64) -> bool {
        for entry in self.overlays.top_down() {
            match entry {
                OverlayEntry::Markers | OverlayEntry::Clusters => {
                    if let Some(hit) = self.annotations.hit_test(position, zoom)
                        && self.annotations.on_tap(&hit)
                    {
                        return true;
                    }
                }
                OverlayEntry::Tooltip(_) => {}
                OverlayEntry::Events => {
                    self.events.on_tap(position);
                    return true;
                }
            }
        }

        false
    }

    /// Dispatch a long press at `position`, seen at `zoom`. Returns whether it was consumed.
    pub fn long_press(&mut self, position: Position, zoom: f64) -> bool {
        for entry in self.overlays.top_down() {
            match entry {
                OverlayEntry::Markers | OverlayEntry::Clusters => {
                    if let Some(hit) = self.annotations.hit_test(position, zoom)
                        && self.annotations.on_long_press(&hit)
                    {
                        return true;
                    }
                }
                OverlayEntry::Tooltip(_) => {}
                OverlayEntry::Events => {
                    // Forwarded, but left for others.
                    self.events.on_long_press(position);
                    return false;
                }
            }
        }

        false
    }

    pub fn markers(&self) -> &[Marker] {
        self.annotations.markers()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.annotations.marker(id)
    }

    pub fn marker_count(&self) -> usize {
        self.annotations.len()
    }

    pub fn annotations(&self) -> &AnnotationRegistry {
        &self.annotations
    }

    pub fn overlays(&self) -> &OverlayStack {
        &self.overlays
    }

    pub fn clustering(&self) -> &ClusteringConfig {
        self.annotations.clustering()
    }

    pub fn is_clustering_enabled(&self) -> bool {
        self.clustering().enabled
    }

    pub fn set_clustering_enabled(&mut self, enabled: bool) {
        self.annotations.clustering_mut().enabled = enabled;
    }

    pub fn is_gravity_center_positioning(&self) -> bool {
        self.clustering().gravity_center_positioning
    }

    pub fn set_gravity_center_positioning(&mut self, value: bool) {
        self.annotations.clustering_mut().gravity_center_positioning = value;
    }

    pub fn is_cluster_above_others(&self) -> bool {
        self.clustering().cluster_above_others
    }

    pub fn set_cluster_above_others(&mut self, value: bool) {
        self.annotations.clustering_mut().cluster_above_others = value;
    }

    pub fn marker_footprint(&self) -> Size {
        self.clustering().marker_footprint
    }

    pub fn set_marker_footprint(&mut self, size: Size) {
        self.annotations.clustering_mut().marker_footprint = size;
    }

    pub fn cluster_capture_area(&self) -> Size {
        self.clustering().cluster_capture_area
    }

    pub fn set_cluster_capture_area(&mut self, size: Size) {
        self.annotations.clustering_mut().cluster_capture_area = size;
    }
}
