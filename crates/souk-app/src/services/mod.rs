// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: bridges the presentation layer to the catalog crates.
//
// Each service wraps catalog APIs in the shape the screens consume: async,
// infallible for reads, returning data ready to display.

pub mod app_services;
pub mod data_dir;
