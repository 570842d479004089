// src/models/mod.rs

pub mod legacy;
pub mod quiz;
pub mod session;
