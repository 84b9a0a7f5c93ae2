// firewatch_core/src/prelude.rs

// --- Core Contracts (what a host implements) ---
pub use crate::location::{LocationEvent, LocationSource, RequestOptions, RequestTicket, SubscriptionHandle, WatchSlot};
pub use crate::snapshot::SnapshotBackend;
pub use crate::surface::MapSurface;
pub use crate::ui::UiBinding;

// --- Core Data Structures ---
pub use crate::hazards::{HazardConfig, HazardPoint, HazardSet};
pub use crate::hydrants::Hydrant;
pub use crate::snapshot::{HandoffToken, LocationSnapshot};
pub use crate::types::{LatLng, Position, Severity, Timestamp};
pub use crate::ui::{Control, ControlState, Notification, NotificationLevel, StatusUpdate};

// --- The Coordinator ---
pub use crate::config::CoordinatorConfig;
pub use crate::coordinator::{
    CoordinatorParts, CoordinatorStats, LocationShare, MarkerLifecycleCoordinator, SessionPhase,
};

// --- Concrete Implementations ---
pub use crate::location::NoGeolocation;
pub use crate::snapshot::{DeviceTag, FileBackend, MemoryBackend, SnapshotStore};
pub use crate::surface::InMemoryMap;

// --- Errors ---
pub use crate::error::{ActionError, HandoffError, InvalidSetting, LocationError, StorageError};
