//! Test utilities for ClassHub integration tests
//!
//! The fixture wires every singleton (coherency store, audit trail,
//! notification capture, scripted directory) to in-memory collaborators so
//! each test runs fully isolated.

#![allow(dead_code)]

pub mod fixture;
