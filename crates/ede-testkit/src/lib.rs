//! # EDE Testkit
//!
//! Testing utilities for EDE.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: deterministic parties and a [`LedgerBuilder`] that runs
//!   the five operations against a growing ledger
//! - **Generators**: Proptest strategies for property-based testing
//! - **Golden vectors**: pinned canonical encodings and a reference scenario
//!
//! ## Test Fixtures
//!
//! ```rust
//! use ede_core::SubstrateClass;
//! use ede_testkit::fixtures::{FlowOptions, LedgerBuilder, TestParty};
//!
//! let human = TestParty::new("human", 0x0a, SubstrateClass::HPlus, 10_000);
//! let system = TestParty::new("system", 0x05, SubstrateClass::So, 5_000);
//!
//! let mut ledger = LedgerBuilder::new();
//! ledger.register(&human).unwrap();
//! ledger.register(&system).unwrap();
//! let channel = ledger.authorize(&human, &system, 1_000).unwrap();
//! ledger.flow(&channel, &human, &system, 500, FlowOptions::default()).unwrap();
//! assert_eq!(ledger.csl().len(), 4);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ede_testkit::generators::{registration_from_params, RegistrationParams};
//!
//! proptest! {
//!     #[test]
//!     fn registration_id_is_deterministic(params: RegistrationParams) {
//!         let a = registration_from_params(&params).unwrap();
//!         let b = registration_from_params(&params).unwrap();
//!         prop_assert_eq!(a.id, b.id);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{end_to_end_scenario, FlowOptions, LedgerBuilder, Scenario, TestParty};
pub use generators::{registration_from_params, RegistrationParams, SettlementParams};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
