// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! FMI 2.0 co-simulation C entry points.
//!
//! # Safety
//!
//! Every function follows the FMI calling convention: the component is a
//! pointer previously returned by `fmi2Instantiate`, array parameters
//! carry `nvr` elements, strings are NUL-terminated. Panics never cross
//! the ABI; any internal failure logs through the host callback and
//! returns `fmi2Error`.

#![allow(non_snake_case, non_camel_case_types, clippy::missing_safety_doc)]

use std::ffi::{c_char, c_int, c_uint, c_void, CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::logger::{Fmi2CallbackLogger, HostLogger};
use super::slave::FmuInstance;
use super::Fmi2Status;

pub type fmi2Component = *mut c_void;
pub type fmi2ComponentEnvironment = *mut c_void;
pub type fmi2FMUstate = *mut c_void;
pub type fmi2String = *const c_char;
pub type fmi2Real = f64;
pub type fmi2Integer = c_int;
pub type fmi2Boolean = c_int;
pub type fmi2ValueReference = c_uint;
pub type fmi2Status = Fmi2Status;

pub const fmi2True: fmi2Boolean = 1;
pub const fmi2False: fmi2Boolean = 0;

/// Callback table handed over by the master.
#[repr(C)]
pub struct fmi2CallbackFunctions {
    pub logger: Option<Fmi2CallbackLogger>,
    pub allocateMemory: Option<unsafe extern "C" fn(usize, usize) -> *mut c_void>,
    pub freeMemory: Option<unsafe extern "C" fn(*mut c_void)>,
    pub stepFinished: Option<unsafe extern "C" fn(fmi2ComponentEnvironment, fmi2Status)>,
    pub componentEnvironment: fmi2ComponentEnvironment,
}

/// The object behind an `fmi2Component`.
struct InstanceHandle {
    instance: FmuInstance,
    logger: Option<HostLogger>,
    /// Backing storage for the pointers handed out by `fmi2GetString`.
    string_stash: Vec<CString>,
}

impl InstanceHandle {
    fn report(&self, error: &crate::FmuError) {
        if let Some(logger) = &self.logger {
            logger.log(
                Fmi2Status::Error as c_int,
                "logStatusError",
                &error.to_string(),
            );
        } else {
            log::error!("{}", error);
        }
    }
}

unsafe fn borrow<'a>(c: fmi2Component) -> Option<&'a mut InstanceHandle> {
    (c as *mut InstanceHandle).as_mut()
}

unsafe fn cstr<'a>(s: fmi2String) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

/// Run a fallible operation against the component, translating the
/// outcome into an FMI status.
unsafe fn guarded<F>(c: fmi2Component, op: F) -> fmi2Status
where
    F: FnOnce(&mut InstanceHandle) -> crate::Result<()>,
{
    if borrow(c).is_none() {
        return Fmi2Status::Error;
    }
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let Some(handle) = borrow(c) else {
            return Err(crate::FmuError::Config("null component".into()));
        };
        op(handle)
    }));
    match outcome {
        Ok(Ok(())) => Fmi2Status::Ok,
        Ok(Err(e)) => {
            if let Some(handle) = borrow(c) {
                handle.report(&e);
            }
            Fmi2Status::Error
        }
        Err(_) => Fmi2Status::Fatal,
    }
}

#[no_mangle]
pub extern "C" fn fmi2GetTypesPlatform() -> fmi2String {
    c"default".as_ptr()
}

#[no_mangle]
pub extern "C" fn fmi2GetVersion() -> fmi2String {
    c"2.0".as_ptr()
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetDebugLogging(
    c: fmi2Component,
    _loggingOn: fmi2Boolean,
    _nCategories: usize,
    _categories: *const fmi2String,
) -> fmi2Status {
    if c.is_null() {
        Fmi2Status::Error
    } else {
        Fmi2Status::Ok
    }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2Instantiate(
    instanceName: fmi2String,
    _fmuType: c_int,
    fmuGUID: fmi2String,
    fmuResourceLocation: fmi2String,
    functions: *const fmi2CallbackFunctions,
    _visible: fmi2Boolean,
    _loggingOn: fmi2Boolean,
) -> fmi2Component {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let name = cstr(instanceName)?.to_string();
        let guid = cstr(fmuGUID)?.to_string();
        let location = cstr(fmuResourceLocation)?.to_string();
        let logger = functions.as_ref().and_then(|f| {
            f.logger
                .map(|cb| HostLogger::new(cb, f.componentEnvironment, &name))
        });

        match FmuInstance::instantiate(&name, &guid, &location, logger.clone()) {
            Ok(instance) => Some(Box::new(InstanceHandle {
                instance,
                logger,
                string_stash: Vec::new(),
            })),
            Err(e) => {
                if let Some(host) = &logger {
                    host.log(
                        Fmi2Status::Fatal as c_int,
                        "logStatusFatal",
                        &e.to_string(),
                    );
                }
                None
            }
        }
    }));
    match result {
        Ok(Some(handle)) => Box::into_raw(handle) as fmi2Component,
        _ => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2FreeInstance(c: fmi2Component) {
    if c.is_null() {
        return;
    }
    super::logger::clear_host_logger();
    drop(Box::from_raw(c as *mut InstanceHandle));
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetupExperiment(
    c: fmi2Component,
    _toleranceDefined: fmi2Boolean,
    _tolerance: fmi2Real,
    startTime: fmi2Real,
    _stopTimeDefined: fmi2Boolean,
    _stopTime: fmi2Real,
) -> fmi2Status {
    guarded(c, |handle| {
        handle.instance.setup_experiment(startTime);
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn fmi2EnterInitializationMode(c: fmi2Component) -> fmi2Status {
    guarded(c, |handle| handle.instance.enter_initialization_mode())
}

#[no_mangle]
pub unsafe extern "C" fn fmi2ExitInitializationMode(c: fmi2Component) -> fmi2Status {
    guarded(c, |handle| handle.instance.exit_initialization_mode())
}

#[no_mangle]
pub unsafe extern "C" fn fmi2Terminate(c: fmi2Component) -> fmi2Status {
    guarded(c, |handle| handle.instance.terminate())
}

#[no_mangle]
pub unsafe extern "C" fn fmi2Reset(c: fmi2Component) -> fmi2Status {
    guarded(c, |handle| handle.instance.reset())
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetReal(
    c: fmi2Component,
    vr: *const fmi2ValueReference,
    nvr: usize,
    value: *mut fmi2Real,
) -> fmi2Status {
    guarded(c, |handle| {
        let vrs = std::slice::from_raw_parts(vr, nvr);
        let out = std::slice::from_raw_parts_mut(value, nvr);
        handle.instance.get_real(vrs, out)
    })
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetReal(
    c: fmi2Component,
    vr: *const fmi2ValueReference,
    nvr: usize,
    value: *const fmi2Real,
) -> fmi2Status {
    guarded(c, |handle| {
        let vrs = std::slice::from_raw_parts(vr, nvr);
        let values = std::slice::from_raw_parts(value, nvr);
        handle.instance.set_real(vrs, values)
    })
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetInteger(
    c: fmi2Component,
    vr: *const fmi2ValueReference,
    nvr: usize,
    value: *mut fmi2Integer,
) -> fmi2Status {
    guarded(c, |handle| {
        let vrs = std::slice::from_raw_parts(vr, nvr);
        let out = std::slice::from_raw_parts_mut(value, nvr);
        handle.instance.get_integer(vrs, out)
    })
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetInteger(
    c: fmi2Component,
    vr: *const fmi2ValueReference,
    nvr: usize,
    value: *const fmi2Integer,
) -> fmi2Status {
    guarded(c, |handle| {
        let vrs = std::slice::from_raw_parts(vr, nvr);
        let values = std::slice::from_raw_parts(value, nvr);
        handle.instance.set_integer(vrs, values)
    })
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetBoolean(
    c: fmi2Component,
    vr: *const fmi2ValueReference,
    nvr: usize,
    value: *mut fmi2Boolean,
) -> fmi2Status {
    guarded(c, |handle| {
        let vrs = std::slice::from_raw_parts(vr, nvr);
        let out = std::slice::from_raw_parts_mut(value, nvr);
        let mut buffer = vec![false; nvr];
        handle.instance.get_boolean(vrs, &mut buffer)?;
        for (slot, v) in out.iter_mut().zip(buffer) {
            *slot = if v { fmi2True } else { fmi2False };
        }
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetBoolean(
    c: fmi2Component,
    vr: *const fmi2ValueReference,
    nvr: usize,
    value: *const fmi2Boolean,
) -> fmi2Status {
    guarded(c, |handle| {
        let vrs = std::slice::from_raw_parts(vr, nvr);
        let values: Vec<bool> = std::slice::from_raw_parts(value, nvr)
            .iter()
            .map(|v| *v != fmi2False)
            .collect();
        handle.instance.set_boolean(vrs, &values)
    })
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetString(
    c: fmi2Component,
    vr: *const fmi2ValueReference,
    nvr: usize,
    value: *mut fmi2String,
) -> fmi2Status {
    guarded(c, |handle| {
        let vrs = std::slice::from_raw_parts(vr, nvr);
        let out = std::slice::from_raw_parts_mut(value, nvr);
        let mut buffer = vec![String::new(); nvr];
        handle.instance.get_string(vrs, &mut buffer)?;
        // The stash keeps the pointers alive until the next FMI call.
        handle.string_stash.clear();
        for (slot, s) in out.iter_mut().zip(buffer) {
            let stored = CString::new(s.replace('\0', " ")).unwrap_or_default();
            handle.string_stash.push(stored);
            *slot = handle
                .string_stash
                .last()
                .map_or(std::ptr::null(), |c| c.as_ptr());
        }
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetString(
    c: fmi2Component,
    vr: *const fmi2ValueReference,
    nvr: usize,
    value: *const fmi2String,
) -> fmi2Status {
    guarded(c, |handle| {
        let vrs = std::slice::from_raw_parts(vr, nvr);
        let raw = std::slice::from_raw_parts(value, nvr);
        let owned: Vec<String> = raw
            .iter()
            .map(|s| cstr(*s).unwrap_or_default().to_string())
            .collect();
        let views: Vec<&str> = owned.iter().map(String::as_str).collect();
        handle.instance.set_string(vrs, &views)
    })
}

#[no_mangle]
pub unsafe extern "C" fn fmi2DoStep(
    c: fmi2Component,
    currentCommunicationPoint: fmi2Real,
    communicationStepSize: fmi2Real,
    _noSetFMUStatePriorToCurrentPoint: fmi2Boolean,
) -> fmi2Status {
    guarded(c, |handle| {
        handle
            .instance
            .do_step(currentCommunicationPoint, communicationStepSize)
    })
}

#[no_mangle]
pub unsafe extern "C" fn fmi2CancelStep(c: fmi2Component) -> fmi2Status {
    // Steps complete synchronously; there is never anything to cancel.
    if c.is_null() {
        Fmi2Status::Error
    } else {
        Fmi2Status::Discard
    }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetStatus(
    _c: fmi2Component,
    _kind: c_int,
    _value: *mut fmi2Status,
) -> fmi2Status {
    Fmi2Status::Discard
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetRealStatus(
    _c: fmi2Component,
    _kind: c_int,
    _value: *mut fmi2Real,
) -> fmi2Status {
    Fmi2Status::Discard
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetIntegerStatus(
    _c: fmi2Component,
    _kind: c_int,
    _value: *mut fmi2Integer,
) -> fmi2Status {
    Fmi2Status::Discard
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetBooleanStatus(
    _c: fmi2Component,
    _kind: c_int,
    _value: *mut fmi2Boolean,
) -> fmi2Status {
    Fmi2Status::Discard
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetStringStatus(
    _c: fmi2Component,
    _kind: c_int,
    _value: *mut fmi2String,
) -> fmi2Status {
    Fmi2Status::Discard
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetFMUstate(
    _c: fmi2Component,
    _state: *mut fmi2FMUstate,
) -> fmi2Status {
    Fmi2Status::Error
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetFMUstate(_c: fmi2Component, _state: fmi2FMUstate) -> fmi2Status {
    Fmi2Status::Error
}

#[no_mangle]
pub unsafe extern "C" fn fmi2FreeFMUstate(
    _c: fmi2Component,
    _state: *mut fmi2FMUstate,
) -> fmi2Status {
    Fmi2Status::Error
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SerializedFMUstateSize(
    _c: fmi2Component,
    _state: fmi2FMUstate,
    _size: *mut usize,
) -> fmi2Status {
    Fmi2Status::Error
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SerializeFMUstate(
    _c: fmi2Component,
    _state: fmi2FMUstate,
    _data: *mut c_char,
    _size: usize,
) -> fmi2Status {
    Fmi2Status::Error
}

#[no_mangle]
pub unsafe extern "C" fn fmi2DeSerializeFMUstate(
    _c: fmi2Component,
    _data: *const c_char,
    _size: usize,
    _state: *mut fmi2FMUstate,
) -> fmi2Status {
    Fmi2Status::Error
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetDirectionalDerivative(
    _c: fmi2Component,
    _unknown_refs: *const fmi2ValueReference,
    _n_unknown: usize,
    _known_refs: *const fmi2ValueReference,
    _n_known: usize,
    _dv_known: *const fmi2Real,
    _dv_unknown: *mut fmi2Real,
) -> fmi2Status {
    Fmi2Status::Error
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetRealInputDerivatives(
    _c: fmi2Component,
    _vr: *const fmi2ValueReference,
    _nvr: usize,
    _order: *const fmi2Integer,
    _value: *const fmi2Real,
) -> fmi2Status {
    Fmi2Status::Error
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetRealOutputDerivatives(
    _c: fmi2Component,
    _vr: *const fmi2ValueReference,
    _nvr: usize,
    _order: *const fmi2Integer,
    _value: *mut fmi2Real,
) -> fmi2Status {
    Fmi2Status::Error
}
