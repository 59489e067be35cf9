// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Souk.

use thiserror::Error;

/// Top-level error type for all Souk operations.
#[derive(Debug, Error)]
pub enum SoukError {
    // -- Store queries --
    #[error("query source failed: {0}")]
    QuerySource(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("could not decode store rows: {0}")]
    Decode(String),

    // -- Realtime --
    #[error("subscription failed: {0}")]
    Subscription(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SoukError>;
