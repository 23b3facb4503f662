//! Shared test utilities for cfms-db unit tests.
