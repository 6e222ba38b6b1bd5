// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — wires the CLI to the clipscan backend crates.
//
// Configuration persistence, data directories, and the file-backed camera
// the headless host uses in place of a device camera.

pub mod data_dir;
pub mod file_camera;
pub mod settings;
