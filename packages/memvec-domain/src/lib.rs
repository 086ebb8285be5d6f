pub mod entities;
pub mod fingerprint;
pub mod graph;
pub mod memory;
pub mod qualification;
