//! Folio Core Library
//!
//! Document model, store, snapping and interaction logic for the Folio page
//! editor. Nothing here depends on a UI toolkit or a renderer.

pub mod assets;
pub mod color;
pub mod ids;
pub mod interaction;
pub mod model;
pub mod snap;
pub mod store;
pub mod text;
pub mod view;
pub mod workspace;

pub use assets::{AssetLibrary, AssetPayload, UploadedAsset, UploadedFile};
pub use color::RgbaColor;
pub use ids::{AssetId, ElementId, IdGenerator, PageId, RandomIds, SequentialIds};
pub use interaction::{InteractionConfig, InteractionEngine, InteractionError, InteractionState, InteractionUpdate};
pub use model::{DocumentPage, DocumentState, ElementKind, ElementType, ElementUpdate, ModelError, PageElement};
pub use snap::{Guide, GuideAxis, SnapResult, SnapTarget, SnapTargetKind, snap_to_guides};
pub use store::{DocumentStore, SubscriptionId};
pub use text::{TextDirection, detect_direction, effective_align, markup_to_plain_text};
pub use view::ViewTransform;
pub use workspace::{DropData, KeyCommand, Workspace};
