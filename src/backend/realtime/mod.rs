//! Real-time Delivery Module
//!
//! Live connection bookkeeping and fan-out for room sessions.
//!
//! # Architecture
//!
//! - **`connection`** - `ConnectionHandle`, the registry's view of one live
//!   connection, and its bounded outbound queue
//! - **`registry`** - `ConnectionRegistry`, connections grouped by room and user
//! - **`broadcast`** - concurrent per-peer delivery with a write timeout
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── connection.rs   - Connection handles and outbound frames
//! ├── registry.rs     - Room -> user -> connection map
//! └── broadcast.rs    - Fan-out and broadcast reports
//! ```
//!
//! The registry is constructed once at startup and shared through `AppState`;
//! there is no global connection map.

/// Connection handles
pub mod connection;

/// Connection registry
pub mod registry;

/// Fan-out helpers
pub mod broadcast;

pub use broadcast::BroadcastReport;
pub use connection::{CloseReason, ConnectionHandle, ConnectionId, Outbound, SendError};
pub use registry::ConnectionRegistry;
