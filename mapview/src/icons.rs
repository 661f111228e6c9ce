//! Marker icons: named glyphs bundled with the crate, or images supplied by the caller.

use std::{collections::HashMap, io::Cursor, num::NonZeroUsize, sync::Arc};

use egui::ColorImage;
use image::{
    ImageError, ImageReader, Limits,
    error::{LimitError, LimitErrorKind},
};
use lru::LruCache;

/// Glyph markers get when nothing else was requested.
pub const DEFAULT_MARKER_GLYPH: &str = "markerstroked";

/// Glyph resources are stored in double density.
const RESOURCE_SUFFIX: &str = "182x.png";

/// Name of the resource holding given glyph.
pub fn resource_name(glyph: &str) -> String {
    format!("{glyph}{RESOURCE_SUFFIX}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Icon {
    /// Glyph resolved by an [`IconResolver`].
    Named(String),

    /// Ready to use image.
    Image(Arc<ColorImage>),
}

impl Icon {
    pub fn named(glyph: impl Into<String>) -> Self {
        Self::Named(glyph.into())
    }
}

impl Default for Icon {
    fn default() -> Self {
        Self::named(DEFAULT_MARKER_GLYPH)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum IconError {
    #[error("Resource not found: '{0}'")]
    NotFound(String),

    #[error(transparent)]
    Decode(ImageError),

    #[error("out of memory while decoding '{0}'")]
    OutOfMemory(String),
}

impl IconError {
    fn from_image_error(resource: &str, error: ImageError) -> Self {
        match error {
            ImageError::Limits(ref limit) if is_out_of_memory(limit) => {
                Self::OutOfMemory(resource.to_owned())
            }
            other => Self::Decode(other),
        }
    }
}

fn is_out_of_memory(error: &LimitError) -> bool {
    matches!(error.kind(), LimitErrorKind::InsufficientMemory)
}

/// Turns glyph names into images.
pub trait IconResolver {
    fn resolve(&mut self, glyph: &str) -> Result<Arc<ColorImage>, IconError>;
}

/// Decode PNG (or any other enabled format) into egui's [`ColorImage`].
pub fn decode(bytes: &[u8], limits: Limits) -> Result<ColorImage, ImageError> {
    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    reader.limits(limits);

    let image = reader.decode()?.to_rgba8();
    let pixels = image.as_flat_samples();
    Ok(ColorImage::from_rgba_unmultiplied(
        [image.width() as _, image.height() as _],
        pixels.as_slice(),
    ))
}

/// Decode an icon downloaded from somewhere, see [`crate::MapView::load_marker_icon_from_url`].
pub(crate) fn decode_remote(url: &str, bytes: &[u8]) -> Result<ColorImage, IconError> {
    decode(bytes, Limits::default()).map_err(|error| {
        let error = IconError::from_image_error(url, error);
        if let IconError::OutOfMemory(_) = error {
            log::error!("Ran out of memory while decoding icon from '{url}'.");
        }
        error
    })
}

/// Glyphs compiled into the binary, decoded on first use and kept in a small cache.
pub struct BundledIcons {
    resources: HashMap<String, &'static [u8]>,
    cache: LruCache<String, Arc<ColorImage>>,
    limits: Limits,
}

impl Default for BundledIcons {
    fn default() -> Self {
        let mut icons = Self::empty();
        icons.insert(
            &resource_name(DEFAULT_MARKER_GLYPH),
            include_bytes!("../assets/markerstroked182x.png"),
        );
        icons
    }
}

impl BundledIcons {
    /// No glyphs at all, not even the default one.
    pub fn empty() -> Self {
        // Just arbitrary value which seemed right.
        #[allow(clippy::unwrap_used)]
        let cache_size = NonZeroUsize::new(32).unwrap();

        Self {
            resources: HashMap::new(),
            cache: LruCache::new(cache_size),
            limits: Limits::default(),
        }
    }

    /// Add (or replace) a resource, e.g. `"rail182x.png"`.
    pub fn insert(&mut self, resource: &str, bytes: &'static [u8]) {
        self.resources.insert(resource.to_owned(), bytes);
        self.cache.pop(resource);
    }

    /// Limits applied while decoding glyphs.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Drop every decoded glyph, they can be decoded again.
    fn relieve_memory_pressure(&mut self) {
        log::debug!("Dropping {} cached icons.", self.cache.len());
        self.cache.clear();
    }
}

impl IconResolver for BundledIcons {
    fn resolve(&mut self, glyph: &str) -> Result<Arc<ColorImage>, IconError> {
        let resource = resource_name(glyph);
        let Some(bytes) = self.resources.get(&resource).copied() else {
            return Err(IconError::NotFound(resource));
        };

        let limits = self.limits.clone();
        let result = self
            .cache
            .try_get_or_insert(resource.clone(), || {
                decode(bytes, limits).map(Arc::new)
            })
            .cloned()
            .map_err(|error| IconError::from_image_error(&resource, error));

        if let Err(IconError::OutOfMemory(_)) = result {
            log::error!("Ran out of memory while decoding '{resource}'.");
            self.relieve_memory_pressure();
        }

        result
    }
}

/// Ticket of an icon load. Only the most recently issued one may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Icon of a marker, together with its resolved image.
#[derive(Debug, Clone, Default)]
pub struct IconSlot {
    icon: Icon,
    image: Option<Arc<ColorImage>>,
    issued: u64,
    pending: Option<LoadTicket>,
}

impl IconSlot {
    pub(crate) fn new(icon: Icon) -> Self {
        let mut slot = Self::default();
        slot.set_icon(icon);
        slot
    }

    pub fn icon(&self) -> &Icon {
        &self.icon
    }

    /// Image to draw, if already resolved.
    pub fn image(&self) -> Option<&Arc<ColorImage>> {
        self.image.as_ref()
    }

    /// Whether a remote load is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Replace the icon. Any load in flight is forgotten.
    pub(crate) fn set_icon(&mut self, icon: Icon) {
        self.image = match &icon {
            Icon::Image(image) => Some(image.clone()),
            Icon::Named(_) => None,
        };
        self.icon = icon;
        self.pending = None;
    }

    /// Resolve a named icon if it was not yet.
    pub(crate) fn resolve(&mut self, resolver: &mut dyn IconResolver) -> Result<(), IconError> {
        if let (None, Icon::Named(glyph)) = (&self.image, &self.icon) {
            self.image = Some(resolver.resolve(glyph)?);
        }
        Ok(())
    }

    /// Switch to another icon, resolving it right away. On failure the slot stays as it was.
    pub(crate) fn replace(
        &mut self,
        icon: Icon,
        resolver: &mut dyn IconResolver,
    ) -> Result<(), IconError> {
        let image = match &icon {
            Icon::Named(glyph) => resolver.resolve(glyph)?,
            Icon::Image(image) => image.clone(),
        };

        self.icon = icon;
        self.image = Some(image);
        self.pending = None;
        Ok(())
    }

    pub(crate) fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        let ticket = LoadTicket(self.issued);
        self.pending = Some(ticket);
        ticket
    }

    /// Apply loaded image, unless a newer load was started meanwhile. Returns whether the image
    /// was taken.
    pub(crate) fn complete_load(&mut self, ticket: LoadTicket, image: Arc<ColorImage>) -> bool {
        if self.pending != Some(ticket) {
            return false;
        }

        self.icon = Icon::Image(image.clone());
        self.image = Some(image);
        self.pending = None;
        true
    }

    pub(crate) fn abandon_load(&mut self, ticket: LoadTicket) {
        if self.pending == Some(ticket) {
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(side: usize) -> Arc<ColorImage> {
        Arc::new(ColorImage::from_rgba_unmultiplied(
            [side, side],
            &vec![255; side * side * 4],
        ))
    }

    #[test]
    fn default_glyph_is_bundled() {
        let mut icons = BundledIcons::default();
        let image = icons.resolve(DEFAULT_MARKER_GLYPH).unwrap();

        assert_eq!([36, 45], image.size);
        assert_eq!(1, icons.cached());

        // Second time it comes from the cache.
        let again = icons.resolve(DEFAULT_MARKER_GLYPH).unwrap();
        assert!(Arc::ptr_eq(&image, &again));
    }

    #[test]
    fn missing_glyph_is_not_found() {
        let mut icons = BundledIcons::default();
        let error = icons.resolve("rail").unwrap_err();
        assert!(matches!(error, IconError::NotFound(resource) if resource == "rail182x.png"));
    }

    #[test]
    fn garbage_does_not_decode() {
        let mut icons = BundledIcons::empty();
        icons.insert("broken182x.png", b"definitely not a png");
        assert!(matches!(
            icons.resolve("broken"),
            Err(IconError::Decode(_))
        ));
    }

    #[test]
    fn insufficient_memory_is_recognized() {
        let error = IconError::from_image_error(
            "x",
            ImageError::Limits(LimitError::from_kind(LimitErrorKind::InsufficientMemory)),
        );
        assert!(matches!(error, IconError::OutOfMemory(resource) if resource == "x"));

        let error = IconError::from_image_error(
            "x",
            ImageError::Limits(LimitError::from_kind(LimitErrorKind::DimensionError)),
        );
        assert!(matches!(error, IconError::Decode(_)));
    }

    #[test]
    fn named_icon_is_resolved_once() {
        let mut icons = BundledIcons::default();
        let mut slot = IconSlot::new(Icon::default());
        assert!(slot.image().is_none());

        slot.resolve(&mut icons).unwrap();
        assert!(slot.image().is_some());

        let mut nothing = BundledIcons::empty();
        slot.resolve(&mut nothing).unwrap();
    }

    #[test]
    fn only_latest_load_completes() {
        let mut slot = IconSlot::new(Icon::default());

        let first = slot.begin_load();
        let second = slot.begin_load();
        assert!(slot.is_loading());

        assert!(slot.complete_load(second, image(2)));
        assert!(!slot.complete_load(first, image(1)));
        assert_eq!([2, 2], slot.image().unwrap().size);
        assert!(!slot.is_loading());
    }

    #[test]
    fn failed_replacement_keeps_previous_icon() {
        let mut icons = BundledIcons::default();
        let mut slot = IconSlot::new(Icon::default());
        slot.resolve(&mut icons).unwrap();

        assert!(slot.replace(Icon::named("rail"), &mut icons).is_err());
        assert_eq!(&Icon::default(), slot.icon());
        assert!(slot.image().is_some());

        slot.replace(Icon::Image(image(4)), &mut icons).unwrap();
        assert_eq!([4, 4], slot.image().unwrap().size);
    }

    #[test]
    fn changing_icon_forgets_pending_load() {
        let mut slot = IconSlot::new(Icon::default());
        let ticket = slot.begin_load();

        slot.set_icon(Icon::Image(image(3)));
        assert!(!slot.complete_load(ticket, image(1)));
        assert_eq!([3, 3], slot.image().unwrap().size);
    }
}
