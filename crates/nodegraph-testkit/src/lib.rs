//! # Nodegraph Kernel Testkit
//!
//! Testing utilities for the Nodegraph Kernel.
//!
//! ## Overview
//!
//! - **Fixtures**: deterministic parties and an engine that advances its
//!   own height
//! - **Generators**: proptest strategies for calls and call scripts
//!
//! ## Test Fixtures
//!
//! ```rust
//! use nodegraph_testkit::fixtures::TestFixture;
//!
//! let mut fixture = TestFixture::new();
//! let node = fixture.mint(0, "topic");
//! assert_eq!(fixture.engine.owner_of(node).unwrap(), fixture.address(0));
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use nodegraph_testkit::generators::script;
//!
//! proptest! {
//!     #[test]
//!     fn never_panics(steps in script(32)) {
//!         let mut fixture = nodegraph_testkit::TestFixture::new();
//!         for step in steps {
//!             let _ = fixture.call_with_value(step.party, step.call, step.value);
//!         }
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{parties, Party, TestFixture};
pub use generators::{script, Step};
