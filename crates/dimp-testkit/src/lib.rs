//! # dimp-testkit
//!
//! Testing utilities for the DIMP pipeline.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a shared-world setup (directory + cache + packer) with
//!   one-call user and device enrollment
//! - **Generators**: proptest strategies for identifiers, content and key
//!   bundles
//!
//! ## Test Fixtures
//!
//! ```rust
//! use dimp_testkit::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let alice = fixture.enroll_user("alice");
//! let bob = fixture.enroll_user("bob");
//!
//! let msg = fixture.instant(&alice, &bob, "hello");
//! let reliable = fixture.packer().pack(&msg, None).unwrap().unwrap();
//! let opened = fixture.packer().unpack(&reliable, &bob).unwrap().unwrap();
//! assert_eq!(opened.content, msg.content);
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{TestFixture, TIME};
