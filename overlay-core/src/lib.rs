//! Platform-free engine behind the dashboard's popovers: viewport-aware
//! placement, a shared overlay mount point with self-healing guards, and a
//! reference-counted page scroll lock.

pub mod config;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod geometry;
pub mod guards;
pub mod host;
pub mod popover;
pub mod registry;
pub mod render;
pub mod scroll_lock;
pub mod services;

pub use config::{GuardPolicy, OverlayConfig};
pub use error::{HostError, OverlayError};
pub use geometry::{compute_position, ComputedPosition, Placement, PlacementConfig, Rect, Viewport};
pub use guards::{GuardKind, GuardNote, GuardStats};
pub use host::{
    DomHost, Element, MutationCallback, MutationRecord, ObserveOptions, Priority, TriggerRef,
};
pub use popover::{
    CloseReason, DismissEvent, PopoverController, PopoverOptions, PropagationControl, Transition,
    ViewportEvent,
};
pub use registry::OverlayRootRegistry;
pub use render::{ContentStyle, RenderPlan};
pub use scroll_lock::{ScrollLockCounter, ScrollLockGuard, ScrollLockState};
pub use services::OverlayServices;
