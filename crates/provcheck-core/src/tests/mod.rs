//! Shared test infrastructure.
//!
//! `mocks` provides a scripted remote client; `properties` exercises the
//! lifecycle guarantees end to end against it.
