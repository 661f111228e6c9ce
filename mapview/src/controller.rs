//! Ownership of the view's current tile source.

use std::sync::Arc;

use crate::{
    resolver::{InvalidIdentifier, LAYER_ZOOM_BOUNDS, Resolver},
    sources::TileSourceDescriptor,
    tiles::{Redraw, TileLayer},
};

/// Keeps exactly one current [`TileSourceDescriptor`] and hands replacements to the tile layer.
/// Replacement is all-or-nothing: on failure the previous source stays.
pub struct MapSourceController {
    current: Arc<TileSourceDescriptor>,
    resolver: Resolver,
    tile_layer: Box<dyn TileLayer>,
    redraw: Arc<dyn Redraw>,
}

impl MapSourceController {
    /// Resolve `default_source` and give it to the layer. Nothing is drawn yet, so no redraw is
    /// requested.
    pub fn new(
        default_source: &str,
        resolver: Resolver,
        mut tile_layer: Box<dyn TileLayer>,
        redraw: Arc<dyn Redraw>,
    ) -> Result<Self, InvalidIdentifier> {
        let current = Arc::new(resolver.resolve(default_source)?);
        tile_layer.set_tile_source(current.clone());

        Ok(Self {
            current,
            resolver,
            tile_layer,
            redraw,
        })
    }

    /// Currently displayed source.
    pub fn current(&self) -> Arc<TileSourceDescriptor> {
        self.current.clone()
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve and adopt `identifier`. Empty identifier keeps whatever is displayed now.
    pub fn set_source(&mut self, identifier: &str) -> Result<(), InvalidIdentifier> {
        if identifier.is_empty() {
            log::trace!("Empty source identifier, keeping '{}'.", self.current.name());
            return Ok(());
        }

        let source = Arc::new(self.resolver.resolve(identifier)?);
        log::debug!("Switching tile source to '{}'.", source.url_template());

        self.current = source.clone();
        self.tile_layer.set_tile_source(source);
        self.redraw.request_redraw();
        Ok(())
    }

    /// Switch to another layer. Unlike [`Self::set_source`], this always swaps and redraws, even
    /// for the same identifier, names the source after the identifier, and limits zoom to
    /// [`LAYER_ZOOM_BOUNDS`]. The source goes straight into the running tile provider.
    pub fn switch_layer(&mut self, identifier: &str) -> Result<(), InvalidIdentifier> {
        let (min_zoom, max_zoom) = LAYER_ZOOM_BOUNDS;
        let source = Arc::new(self.resolver.resolve(identifier)?.relabeled(
            identifier.to_owned(),
            min_zoom,
            max_zoom,
        ));
        log::debug!("Switching layer to '{identifier}'.");

        self.current = source.clone();
        self.tile_layer.tile_provider().set_tile_source(source);
        self.redraw.request_redraw();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        resolver::EXAMPLE_MAP_ID,
        sources::TileSource,
        testing::{RecordingTileLayer, RedrawCounter},
    };

    fn controller(
        default_source: &str,
    ) -> (MapSourceController, RecordingTileLayer, Arc<RedrawCounter>) {
        let layer = RecordingTileLayer::default();
        let redraw = Arc::new(RedrawCounter::default());
        let controller = MapSourceController::new(
            default_source,
            Resolver::default(),
            Box::new(layer.clone()),
            redraw.clone(),
        )
        .unwrap();
        (controller, layer, redraw)
    }

    #[test]
    fn default_source_is_adopted_without_redraw() {
        let (controller, layer, redraw) = controller(EXAMPLE_MAP_ID);

        assert_eq!(
            "http://a.tiles.mapbox.com/v3/examples.map-z2effxa8/",
            controller.current().url_template()
        );
        assert_eq!(1, layer.adopted.lock().unwrap().len());
        assert_eq!(0, redraw.count());
    }

    #[test]
    fn default_source_can_be_injected() {
        let (controller, _, _) = controller("http://localhost/{z}/{x}/{y}.png");
        assert_eq!("http://localhost/", controller.current().url_template());
    }

    #[test]
    fn invalid_default_source_is_an_error() {
        let result = MapSourceController::new(
            "notanid",
            Resolver::default(),
            Box::new(RecordingTileLayer::default()),
            Arc::new(RedrawCounter::default()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_source_is_ignored() {
        let (mut controller, layer, redraw) = controller(EXAMPLE_MAP_ID);
        let before = controller.current();

        controller.set_source("").unwrap();
        controller.set_source("").unwrap();

        assert!(Arc::ptr_eq(&before, &controller.current()));
        assert_eq!(1, layer.adopted.lock().unwrap().len());
        assert_eq!(0, redraw.count());
    }

    #[test]
    fn setting_source_replaces_it_and_redraws() {
        let (mut controller, layer, redraw) = controller(EXAMPLE_MAP_ID);

        controller.set_source("brunosan.map-cyglrrfu").unwrap();

        let current = controller.current();
        assert_eq!(
            "http://a.tiles.mapbox.com/v3/brunosan.map-cyglrrfu/",
            current.url_template()
        );
        assert_eq!(current.url_template(), current.name());
        assert!(Arc::ptr_eq(&current, layer.adopted.lock().unwrap().last().unwrap()));
        assert_eq!(1, redraw.count());
    }

    #[test]
    fn failed_source_change_keeps_previous_one() {
        let (mut controller, layer, redraw) = controller(EXAMPLE_MAP_ID);
        let before = controller.current();

        assert_eq!(
            Err(InvalidIdentifier::MissingSeparator("notanid".to_owned())),
            controller.set_source("notanid")
        );
        assert!(controller.switch_layer("").is_err());

        assert!(Arc::ptr_eq(&before, &controller.current()));
        assert_eq!(1, layer.adopted.lock().unwrap().len());
        assert!(layer.provider.pushed.lock().unwrap().is_empty());
        assert_eq!(0, redraw.count());
    }

    #[test]
    fn switching_layer_is_unconditional() {
        let (mut controller, layer, redraw) = controller(EXAMPLE_MAP_ID);

        controller.switch_layer("examples.map-vyofok3q").unwrap();
        let first = controller.current();
        controller.switch_layer("examples.map-vyofok3q").unwrap();
        let second = controller.current();

        assert_eq!(2, redraw.count());
        assert_eq!(first.url_template(), second.url_template());
        assert!(!Arc::ptr_eq(&first, &second));

        // Layers go straight to the provider.
        assert_eq!(2, layer.provider.pushed.lock().unwrap().len());
        assert_eq!(1, layer.adopted.lock().unwrap().len());
    }

    #[test]
    fn switched_layer_has_narrow_zoom_and_is_named_after_identifier() {
        let (mut controller, _, _) = controller(EXAMPLE_MAP_ID);

        controller.switch_layer("examples.map-zgrqqx0w").unwrap();

        let current = controller.current();
        assert_eq!("examples.map-zgrqqx0w", current.name());
        assert_eq!((1, 16), (current.min_zoom(), current.max_zoom()));
        assert_eq!(
            "http://a.tiles.mapbox.com/v3/examples.map-zgrqqx0w/",
            current.url_template()
        );
    }
}
