// firewatch_core/src/surface.rs

//! The rendering substrate the coordinator issues layer commands to.
//!
//! A `MapSurface` only holds rendering handles. All business state (which
//! handle is the user marker, which belong to hazards) lives in the
//! coordinator.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{MapBounds, MapConfig};
use crate::geo::haversine_meters;
use crate::types::LatLng;

/// Opaque reference to a layer owned by the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LayerHandle(pub u64);

/// Which marker icon to draw. The surface decides what each looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconSpec {
    User,
    Fire,
    ReportedFire,
    ResponseTeam,
    Hydrant { operational: bool },
    SharedLocation,
}

/// Stroke and fill for circle overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleStyle {
    pub color: String,
    pub fill_opacity: f64,
    pub weight: f64,
}

impl CircleStyle {
    /// The blue, mostly transparent accuracy overlay around the user marker.
    pub fn accuracy() -> Self {
        Self {
            color: "#3b82f6".to_string(),
            fill_opacity: 0.1,
            weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewOptions {
    pub animate: bool,
}

/// Commands the coordinator issues to the rendering engine.
pub trait MapSurface: Send + Sync {
    fn add_marker(&mut self, position: LatLng, icon: IconSpec) -> LayerHandle;

    fn add_circle(&mut self, center: LatLng, radius_meters: f64, style: &CircleStyle) -> LayerHandle;

    /// Removing an unknown handle is a no-op.
    fn remove_layer(&mut self, handle: LayerHandle);

    fn set_lat_lng(&mut self, handle: LayerHandle, position: LatLng);

    fn set_radius(&mut self, handle: LayerHandle, meters: f64);

    fn set_view(&mut self, center: LatLng, zoom: u8, options: ViewOptions);

    fn bind_popup(&mut self, handle: LayerHandle, html: String);

    fn has_layer(&self, handle: LayerHandle) -> bool;

    fn distance_meters(&self, a: LatLng, b: LatLng) -> f64 {
        haversine_meters(a, b)
    }

    /// Re-measures the container after a resize.
    fn invalidate_size(&mut self);
}

// =========================================================================
// == In-Memory Surface ==
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Marker(IconSpec),
    Circle { radius_meters: f64, style: CircleStyle },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub position: LatLng,
    pub popup: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
}

/// Everything an [`InMemoryMap`] currently shows.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    next_handle: u64,
    layers: BTreeMap<LayerHandle, Layer>,
    view: Option<MapView>,
    bounds: Option<MapBounds>,
    min_zoom: u8,
    max_zoom: u8,
    size_invalidations: u32,
}

impl LayerRegistry {
    pub fn layers(&self) -> impl Iterator<Item = (&LayerHandle, &Layer)> {
        self.layers.iter()
    }

    pub fn layer(&self, handle: LayerHandle) -> Option<&Layer> {
        self.layers.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn count_markers(&self, icon: IconSpec) -> usize {
        self.layers
            .values()
            .filter(|layer| layer.kind == LayerKind::Marker(icon))
            .count()
    }

    pub fn count_circles(&self) -> usize {
        self.layers
            .values()
            .filter(|layer| matches!(layer.kind, LayerKind::Circle { .. }))
            .count()
    }

    pub fn view(&self) -> Option<MapView> {
        self.view
    }

    pub fn size_invalidations(&self) -> u32 {
        self.size_invalidations
    }
}

/// A headless map surface that keeps every layer in memory.
///
/// Clones share the same registry, so a host (or a test) can keep one clone
/// for inspection while the coordinator owns another.
#[derive(Debug, Clone)]
pub struct InMemoryMap {
    registry: Arc<Mutex<LayerRegistry>>,
}

impl Default for InMemoryMap {
    fn default() -> Self {
        Self::from_config(&MapConfig::default())
    }
}

impl InMemoryMap {
    /// Builds a surface honouring the configured zoom range and bounds.
    pub fn from_config(config: &MapConfig) -> Self {
        let registry = LayerRegistry {
            bounds: config.bounds,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            ..LayerRegistry::default()
        };
        Self {
            registry: Arc::new(Mutex::new(registry)),
        }
    }

    /// A copy of the current registry contents.
    pub fn snapshot(&self) -> LayerRegistry {
        self.registry.lock().clone()
    }

    pub fn layer(&self, handle: LayerHandle) -> Option<Layer> {
        self.registry.lock().layers.get(&handle).cloned()
    }

    pub fn layer_count(&self) -> usize {
        self.registry.lock().layers.len()
    }

    pub fn count_markers(&self, icon: IconSpec) -> usize {
        self.registry.lock().count_markers(icon)
    }

    pub fn count_circles(&self) -> usize {
        self.registry.lock().count_circles()
    }

    pub fn view(&self) -> Option<MapView> {
        self.registry.lock().view
    }
}

impl MapSurface for InMemoryMap {
    fn add_marker(&mut self, position: LatLng, icon: IconSpec) -> LayerHandle {
        insert_layer(&self.registry, LayerKind::Marker(icon), position)
    }

    fn add_circle(&mut self, center: LatLng, radius_meters: f64, style: &CircleStyle) -> LayerHandle {
        let kind = LayerKind::Circle {
            radius_meters,
            style: style.clone(),
        };
        insert_layer(&self.registry, kind, center)
    }

    fn remove_layer(&mut self, handle: LayerHandle) {
        self.registry.lock().layers.remove(&handle);
    }

    fn set_lat_lng(&mut self, handle: LayerHandle, position: LatLng) {
        if let Some(layer) = self.registry.lock().layers.get_mut(&handle) {
            layer.position = position;
        }
    }

    fn set_radius(&mut self, handle: LayerHandle, meters: f64) {
        if let Some(layer) = self.registry.lock().layers.get_mut(&handle) {
            if let LayerKind::Circle { radius_meters, .. } = &mut layer.kind {
                *radius_meters = meters;
            }
        }
    }

    fn set_view(&mut self, center: LatLng, zoom: u8, _options: ViewOptions) {
        let mut registry = self.registry.lock();
        let center = match registry.bounds {
            Some(bounds) => bounds.clamp(center),
            None => center,
        };
        let zoom = if registry.max_zoom >= registry.min_zoom {
            zoom.clamp(registry.min_zoom, registry.max_zoom)
        } else {
            zoom
        };
        registry.view = Some(MapView { center, zoom });
    }

    fn bind_popup(&mut self, handle: LayerHandle, html: String) {
        if let Some(layer) = self.registry.lock().layers.get_mut(&handle) {
            layer.popup = Some(html);
        }
    }

    fn has_layer(&self, handle: LayerHandle) -> bool {
        self.registry.lock().layers.contains_key(&handle)
    }

    fn invalidate_size(&mut self) {
        self.registry.lock().size_invalidations += 1;
    }
}

fn insert_layer(registry: &Mutex<LayerRegistry>, kind: LayerKind, position: LatLng) -> LayerHandle {
    let mut registry = registry.lock();
    registry.next_handle += 1;
    let handle = LayerHandle(registry.next_handle);
    registry.layers.insert(
        handle,
        Layer {
            kind,
            position,
            popup: None,
        },
    );
    handle
}
