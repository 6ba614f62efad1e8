// src/attempt/mod.rs

//! Assignment attempt flow: grading, mastery progression and the
//! student-facing shaping of block content.

pub mod content;
pub mod controller;
pub mod grading;
pub mod progression;
pub mod results;

pub use controller::{AttemptController, AttemptSession, AttemptView};
