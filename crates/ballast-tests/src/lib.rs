//! End-to-end and adversarial test suite for the Ballast pool.
//!
//! Integration tests live in `tests/`; they drive the ledger and the
//! service through realistic sequences and check the accounting invariants
//! across crates.

pub mod helpers;
