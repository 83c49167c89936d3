//! Capture Engine - Territorial Control for Capture-Area Rounds

pub mod capture;
pub mod core;
