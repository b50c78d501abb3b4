// #![deny(missing_docs)]
// #![deny(warnings)]

//! Test execution reporting for Allure-compatible tooling.
//!
//! The crate records the structure and outcome of a test run (containers,
//! tests, fixtures, steps, attachments) and persists finished results as
//! files an external report renderer picks up. The heart of it is
//! [`Lifecycle`]: integrations drive it through a strict
//! start/update/stop/write protocol, and it keeps track of what is
//! currently running on every logical thread, notifies registered
//! observers around each transition, and never lets an internal failure
//! escape into the instrumented test code.

extern crate chrono;
extern crate serde_derive;
extern crate uuid;

#[macro_use]
extern crate log;

#[macro_use]
extern crate derive_builder;

macro_rules! lock {
    ($name: expr) => {
        match $name.lock() {
            Ok(locked) => locked,
            Err(poisoned) => poisoned.into_inner(),
        }
    };
}

pub mod io;
pub mod lifecycle;
pub mod model;

pub use crate::lifecycle::hooks::{HooksNotifier, LifecycleHooks};
pub use crate::lifecycle::Lifecycle;
