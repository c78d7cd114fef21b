//! Common test infrastructure
//!
//! Spawns throwaway axum servers that play the role of the graph API.
//! Each test builds its own router with exactly the behavior it needs.

#![allow(dead_code)]

mod server;

pub use server::MockServer;

/// Test user credentials accepted by the mock login route.
pub const TEST_USER: &str = "testuser";
pub const TEST_PASS: &str = "testpass123";

/// Access token accepted by the mock token-exchange route.
pub const TEST_ACCESS_TOKEN: &str = "test_access_token";

/// Session token issued by the mock auth routes.
pub const TEST_SESSION_TOKEN: &str = "mocked_session_token";

/// Workspace used by search tests.
pub const TEST_WORKSPACE: &str = "123e4567-e89b-12d3-a456-426614174000";
