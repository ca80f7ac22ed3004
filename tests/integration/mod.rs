//! Integration tests for the Marginalia journal companion

mod delta_protocol;
mod indexing;
mod orchestration_modes;
mod session_cycles;
