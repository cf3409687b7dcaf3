// src/models/mod.rs

pub mod exam;
pub mod submission;
pub mod user;
