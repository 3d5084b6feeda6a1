//! Tests run against a deployment: backend on 127.0.0.1:8081, web front end on 127.0.0.1:8080.
//! Enabled with the `system_tests` feature.

#[cfg(all(test, feature = "system_tests"))]
mod system_tests;
