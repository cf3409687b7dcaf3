// src/controllers/mod.rs

pub mod auth;
pub mod authoring;
pub mod dashboard;
pub mod exam_taking;
pub mod management;
