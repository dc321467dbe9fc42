//! Application state for the farm dashboard
//!
//! A single [`StateStore`] owns an immutable [`AppState`] snapshot. Every
//! change is an [`Action`]; applying one yields the next state plus the
//! collections it replaced. Subscribers react to those changes, the main
//! one being [`PersistenceSubscriber`], which writes each changed collection
//! to a [`KeyValueStore`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use farm_state::{Action, FileKeyValueStore, StateStore};
//! use sustainability::Farm;
//!
//! let kv = Arc::new(FileKeyValueStore::open("./farm-data").await?);
//! let store = StateStore::load(kv).await?;
//! store.dispatch(Action::AddFarm(Farm::new(0, "North Field", "corn"))).await?;
//! ```

pub mod action;
pub mod records;
pub mod state;
pub mod storage;
pub mod store;
pub mod transfer;

pub use action::Action;
pub use records::{
    CropEventKind, CropPlanEvent, Identified, Issue, Livestock, LivestockKind, PlanItem, PlanKind,
    PlanStatus, Task, TrackerKind, TrackerRecord,
};
pub use state::{AppState, Collection, Result, StateError};
pub use storage::{
    get_or_default, load_state, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore,
    PersistenceSubscriber, StorageError,
};
pub use store::{StateStore, StateSubscriber};
pub use transfer::{CropPlanExport, ExportEnvelope, EXPORT_VERSION};
