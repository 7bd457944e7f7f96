// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::bool_assert_comparison)]

pub mod classify;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod executor;
pub mod report;
pub mod reporter;
pub mod runner;
pub mod scanner;
pub mod stats;
pub mod suite;
pub mod transfer;
