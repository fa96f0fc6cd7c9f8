//! Topology discovery and register access for AXI-style SoC backplanes.
//!
//! The crate decodes the enumeration ROM exposed by the interconnect into a
//! topology table, then brokers access to every discovered unit through one of
//! several host transports while keeping reset and bus-timeout handling
//! bounded.
pub mod soc;
