//! Client-side page transitions for multi-page sites.
//!
//! A [`Router`] fetches the destination document of a navigation, extracts a
//! [`Snapshot`] of its swappable regions, and applies that snapshot to the
//! live document: layout regions, the page root, head content, and scripts
//! that must run again. Snapshots are cached per URL and concurrent fetches
//! of one URL share a single request.
//!
//! The host supplies the live document ([`LiveDocument`]), the window and
//! its session history ([`Window`]), the transport ([`glue_net::Network`])
//! and a local spawner for background prefetches. [`headless`] provides
//! in-memory implementations.

pub mod apply;
pub mod cache;
pub mod config;
pub mod events;
pub mod extract;
pub mod hash;
pub mod headless;
pub mod host;
pub mod router;
pub mod snapshot;


pub use cache::PendingSnapshot;
pub use cache::SnapshotCache;
pub use cache::SnapshotFetcher;
pub use config::RouterConfig;
pub use events::ListenerId;
pub use events::NavigationEvents;
pub use headless::SessionHistory;
pub use host::DocumentView;
pub use host::LiveDocument;
pub use host::Window;
pub use router::NavigateOptions;
pub use router::PopStateOutcome;
pub use router::Router;
pub use snapshot::ElementDescriptor;
pub use snapshot::Snapshot;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}
