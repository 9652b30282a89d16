// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! FMI 2.0 co-simulation surface.
//!
//! [`FmuInstance`] implements the slave semantics; [`ffi`] exposes the
//! standard C entry points from the cdylib; [`logger`] forwards `log`
//! records to the host callback.

pub mod ffi;
pub mod logger;
mod slave;

pub use logger::HostLogger;
pub use slave::{strip_file_url, FmuInstance};

/// FMI 2.0 status codes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fmi2Status {
    Ok = 0,
    Warning = 1,
    Discard = 2,
    Error = 3,
    Fatal = 4,
    Pending = 5,
}
