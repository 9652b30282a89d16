// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Bridge from the `log` facade to the FMI host callback.
//!
//! The slave registers a [`HostLogger`] at instantiation; from then on
//! every `log` record emitted by the crate is forwarded to the simulation
//! master. Severity mapping follows the FMI convention for a healthy
//! slave: `Info` reports status OK, `Warn` and `Error` both report
//! Warning (a fatal condition surfaces through the function return codes,
//! not through log severity).

use std::ffi::{c_char, c_int, c_void, CString};

use parking_lot::RwLock;

/// The FMI 2.0 callback logger signature (printf-style varargs; the
/// bridge always passes a fully formatted message and no arguments).
pub type Fmi2CallbackLogger = unsafe extern "C" fn(
    component_environment: *mut c_void,
    instance_name: *const c_char,
    status: c_int,
    category: *const c_char,
    message: *const c_char,
    ...
);

/// A captured host logging callback.
#[derive(Clone)]
pub struct HostLogger {
    callback: Fmi2CallbackLogger,
    component_environment: *mut c_void,
    instance_name: CString,
}

// The component environment pointer is owned by the master and valid for
// the lifetime of the instance; the bridge only passes it back.
unsafe impl Send for HostLogger {}
unsafe impl Sync for HostLogger {}

impl HostLogger {
    pub fn new(
        callback: Fmi2CallbackLogger,
        component_environment: *mut c_void,
        instance_name: &str,
    ) -> Self {
        Self {
            callback,
            component_environment,
            instance_name: CString::new(instance_name.replace('\0', " ")).unwrap_or_default(),
        }
    }

    /// Forward one message to the master.
    pub fn log(&self, status: c_int, category: &str, message: &str) {
        let Ok(category) = CString::new(category) else {
            return;
        };
        let Ok(message) = CString::new(message.replace('\0', " ")) else {
            return;
        };
        unsafe {
            (self.callback)(
                self.component_environment,
                self.instance_name.as_ptr(),
                status,
                category.as_ptr(),
                message.as_ptr(),
            );
        }
    }
}

struct FmiLogDispatcher {
    sink: RwLock<Option<(HostLogger, String)>>,
}

static DISPATCHER: FmiLogDispatcher = FmiLogDispatcher {
    sink: RwLock::new(None),
};

impl log::Log for FmiLogDispatcher {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let sink = self.sink.read();
        let Some((host, name)) = sink.as_ref() else {
            return;
        };
        let (status, category) = match record.level() {
            log::Level::Info => (0, "logAll"),
            _ => (1, "logStatusWarning"),
        };
        host.log(
            status,
            category,
            &format!("[{}] {}", name, record.args()),
        );
    }

    fn flush(&self) {}
}

/// Install (or replace) the host logger the dispatcher forwards to.
///
/// The global `log` logger is set on first use; later calls only swap the
/// sink, so repeated instantiation in one process is fine.
pub fn register_host_logger(host: HostLogger, name: &str) {
    let _ = log::set_logger(&DISPATCHER);
    *DISPATCHER.sink.write() = Some((host, name.to_string()));
}

/// Detach the host logger; subsequent records are dropped.
pub fn clear_host_logger() {
    *DISPATCHER.sink.write() = None;
}
