//! Intake Wizard — client onboarding flow with file uploads and webhook hand-off.

pub mod api;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod onboarding;
pub mod submission;
pub mod upload;
