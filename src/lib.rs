// Copyright 2026 Ratewatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ratewatch library — scheduled scraping of bank and exchange-office
//! currency-rate pages into an append-only rate history.
//!
//! This library crate exposes the core modules for integration testing.

pub mod adapters;
pub mod config;
pub mod currency;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod probe;
pub mod renderer;
pub mod scheduler;
pub mod store;
