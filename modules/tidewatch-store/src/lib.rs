//! Persistence and publish boundaries.
//!
//! The pipeline talks to storage through narrow async traits; the concrete
//! backend is an external collaborator. The in-memory implementations here
//! provide the conditional-insert semantics the pipeline depends on
//! (insert-if-absent for posts, atomic create-or-return-existing for alert
//! suppression) and back both tests and single-process deployments.

pub mod memory;
pub mod publish;
pub mod traits;

pub use memory::{MemoryAlertStore, MemoryHotspotStore, MemoryReportStore, MemorySignalStore, MemoryUserStore};
pub use publish::{EventPublisher, LogPublisher, NoopPublisher};
pub use traits::{
    AlertCreate, AlertStore, CreateOutcome, HotspotStore, ReportStore, SignalStore, UserStore,
};
