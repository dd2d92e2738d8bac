//! Integration flows across the bus, the detector and the host runtime.

pub mod bus_flows;
pub mod detector_flows;
pub mod runtime_flows;
