// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Acting-principal resolution
//!
//! Every audit record carries the identifier of whoever triggered the
//! operation. Interactive frontends supply a resolver backed by their sign-in
//! state; background jobs run without one and fall back to the system
//! identifier.

/// Identifier recorded when no interactive principal is available.
pub const SYSTEM_PRINCIPAL: &str = "system";

/// Supplies the identifier of the acting principal, when one exists.
pub trait PrincipalResolver: Send + Sync {
    fn current(&self) -> Option<String>;
}

/// Resolver pinned to a single identifier, e.g. the signed-in administrator.
pub struct FixedPrincipal(pub String);

impl PrincipalResolver for FixedPrincipal {
    fn current(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Resolver for non-interactive contexts; always defers to the system
/// identifier.
pub struct SystemPrincipal;

impl PrincipalResolver for SystemPrincipal {
    fn current(&self) -> Option<String> {
        None
    }
}
