//! # Flightline Test Suite
//!
//! Cross-crate integration flows.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── bus_flows.rs       # module registration, priority dispatch, multicast isolation
//! │   ├── detector_flows.rs  # detector → bus → modules, edge semantics end to end
//! │   └── runtime_flows.rs   # host runtime, tick loop, metrics
//! └── benches/
//!     └── dispatch_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p fl-tests
//!
//! # By flow
//! cargo test -p fl-tests integration::detector_flows::
//!
//! # Benchmarks
//! cargo bench -p fl-tests
//! ```

pub mod integration;
