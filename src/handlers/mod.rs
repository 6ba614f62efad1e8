// src/handlers/mod.rs

pub mod assignments;
pub mod attempts;
pub mod auth;
pub mod questions;
