// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// clipscan-capture — Coordinates permission, capture, optional crop, and
// upload for one document at a time, and reports every step to the host UI
// as events.

pub mod coordinator;
pub mod events;
pub mod state;

pub use coordinator::{CaptureCoordinator, CaptureCoordinatorBuilder, CaptureOutcome};
pub use events::{CaptureEvent, CaptureObserver, spawn_observer};
pub use state::{CapturePhase, CaptureState};
