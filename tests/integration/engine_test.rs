//! Conversation engine integration tests
//!
//! End-to-end orchestration against the in-memory store, the mock generation
//! provider and the in-memory retrieval index.

#![allow(dead_code)]

mod common;
mod conversations;
mod invariants;
mod messages;
