// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod alert;
pub mod coordinate;
pub mod event;
pub mod report;

pub use alert::AlertState;
pub use coordinate::{BoundingBox, Coordinate};
pub use event::{ChatEvent, Command, WebhookBody};
pub use report::{Artifact, ArtifactKind, ReportCategory, ReportSession, SubmitOutcome};
