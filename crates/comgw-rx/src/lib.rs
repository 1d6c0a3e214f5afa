//! comgw-rx - Receive dispatcher of the COM gateway
//!
//! Accepts received PDUs and runs their signal processing either in the
//! reception context or in the periodic receive main function.
//!
//! # Architecture
//!
//! ```text
//!  rx_indication(handle, payload)
//!          │
//!          ├── immediate ──► signals ──► notifications (after unlock) ──► router
//!          │
//!          └── deferred ──► DeferredPduSlot ──► event queue
//!                                                   │
//!  main_function_rx(id)  ◄──────────────────────────┘
//!          │  drain queue, or full scan after an overrun
//!          └──► signals ──► notifications ──► router
//! ```

pub mod dispatcher;
pub mod report;
mod sink;
pub mod slot;

pub use dispatcher::{RxDispatcher, IMMEDIATE_CACHE_CAPACITY};
pub use report::{RxCycleReport, ScanStrategy};
pub use slot::DeferredPduSlot;
