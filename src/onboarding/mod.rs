//! Onboarding wizard — step catalog, answer model, navigation and submission.
//!
//! A client walks a fixed sequence of steps. The engine in [`manager`] holds
//! the position and the answers; [`state`] decides where forward and backward
//! lead; [`payload`] shapes the answers for the automation webhook.

pub mod manager;
pub mod model;
pub mod payload;
pub mod review;
pub mod routes;
pub mod state;
pub mod steps;

pub use manager::{Wizard, WizardView};
pub use model::{AnswerSet, Field, FieldKind, FieldValue, FileReference, normalize_hex_color};
pub use payload::SubmissionPayload;
pub use review::{Progress, ReviewSummary};
pub use routes::{WizardState, wizard_routes};
pub use state::Direction;
pub use steps::{Requirement, Step, StepCatalog, StepKind};
