// Device API client modules
//
// Status, IO, tank and action endpoints of a DFP/TFP device. All reads
// return the unwrapped `attributes` map; the envelope is stripped before
// the caller sees it.

pub mod client;
pub mod models;
pub mod status;

pub use client::DeviceClient;
