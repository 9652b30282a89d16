// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Co-simulation slave instance.
//!
//! One instance maps directly onto the C functions of the FMI standard.
//! It owns the data mapper and the pub/sub topology; every `Get*`/`Set*`
//! forwards to the mapper, and each `DoStep` publishes all inputs before
//! draining all subscriptions, so a reader can never observe an output
//! from the same step.

use std::path::{Path, PathBuf};

use crate::config;
use crate::fmu::logger::HostLogger;
use crate::mapper::DataMapper;
use crate::pubsub::DynamicPubSub;
use crate::{FmuError, Result};

/// Strip the `file://` scheme from the resource location the master hands
/// over. Windows hosts pass `file:///C:/...`.
pub fn strip_file_url(url: &str) -> PathBuf {
    let prefix = if cfg!(target_os = "windows") {
        "file:///"
    } else {
        "file://"
    };
    PathBuf::from(url.strip_prefix(prefix).unwrap_or(url))
}

/// Co-simulation slave for the DDS bridge.
pub struct FmuInstance {
    time: f64,
    name: String,
    resource_path: PathBuf,
    mapper: DataMapper,
    pubsub: DynamicPubSub,
    logger: Option<HostLogger>,
}

impl FmuInstance {
    /// Instantiate the slave.
    ///
    /// The GUID from the model description header must equal the UUID
    /// recomputed over the unpacked configuration files; a mismatch fails
    /// before any middleware entity exists.
    pub fn instantiate(
        instance_name: &str,
        fmu_guid: &str,
        fmu_resource_location: &str,
        logger: Option<HostLogger>,
    ) -> Result<Self> {
        let resource_path = strip_file_url(fmu_resource_location);
        let fmu_base = resource_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                FmuError::Config(format!(
                    "resource location has no parent: {}",
                    resource_path.display()
                ))
            })?;
        let computed = config::generate_uuid(&config::uuid_files(&fmu_base, true), &[])?;
        if computed != fmu_guid {
            return Err(FmuError::GuidMismatch {
                expected: fmu_guid.to_string(),
                computed,
            });
        }

        let mut instance = Self {
            time: 0.0,
            name: instance_name.to_string(),
            resource_path,
            mapper: DataMapper::new(),
            pubsub: DynamicPubSub::new(),
            logger,
        };
        instance.reset()?;
        Ok(instance)
    }

    /// Reset internal time and rebuild mapper and topology from the
    /// resources.
    pub fn reset(&mut self) -> Result<()> {
        self.time = 0.0;
        self.mapper.reset(&self.resource_path)?;
        self.pubsub.reset(
            &self.resource_path,
            &self.mapper,
            &self.name,
            self.logger.as_ref(),
        )?;
        Ok(())
    }

    pub fn setup_experiment(&mut self, t_start: f64) {
        self.time = t_start;
    }

    pub fn enter_initialization_mode(&mut self) -> Result<()> {
        Ok(())
    }

    /// Key parameters set during initialization take effect here.
    pub fn exit_initialization_mode(&mut self) -> Result<()> {
        self.pubsub.init_key_filters(&self.mapper)
    }

    /// Advance time, publish all inputs, then drain all subscriptions.
    pub fn do_step(&mut self, current_communication_point: f64, step_size: f64) -> Result<()> {
        self.time = current_communication_point + step_size;
        self.pubsub.write(&self.mapper)?;
        self.pubsub.take(&mut self.mapper)?;
        Ok(())
    }

    pub fn terminate(&mut self) -> Result<()> {
        Ok(())
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_real(&mut self, vrs: &[u32], values: &[f64]) -> Result<()> {
        for (vr, value) in vrs.iter().zip(values) {
            self.mapper.set_double(*vr, *value)?;
        }
        Ok(())
    }

    pub fn get_real(&self, vrs: &[u32], values: &mut [f64]) -> Result<()> {
        for (vr, out) in vrs.iter().zip(values.iter_mut()) {
            *out = self.mapper.get_double(*vr)?;
        }
        Ok(())
    }

    pub fn set_integer(&mut self, vrs: &[u32], values: &[i32]) -> Result<()> {
        for (vr, value) in vrs.iter().zip(values) {
            self.mapper.set_int(*vr, *value)?;
        }
        Ok(())
    }

    pub fn get_integer(&self, vrs: &[u32], values: &mut [i32]) -> Result<()> {
        for (vr, out) in vrs.iter().zip(values.iter_mut()) {
            *out = self.mapper.get_int(*vr)?;
        }
        Ok(())
    }

    pub fn set_boolean(&mut self, vrs: &[u32], values: &[bool]) -> Result<()> {
        for (vr, value) in vrs.iter().zip(values) {
            self.mapper.set_bool(*vr, *value)?;
        }
        Ok(())
    }

    pub fn get_boolean(&self, vrs: &[u32], values: &mut [bool]) -> Result<()> {
        for (vr, out) in vrs.iter().zip(values.iter_mut()) {
            *out = self.mapper.get_bool(*vr)?;
        }
        Ok(())
    }

    pub fn set_string(&mut self, vrs: &[u32], values: &[&str]) -> Result<()> {
        for (vr, value) in vrs.iter().zip(values) {
            self.mapper.set_string(*vr, value)?;
        }
        Ok(())
    }

    pub fn get_string(&self, vrs: &[u32], values: &mut [String]) -> Result<()> {
        for (vr, out) in vrs.iter().zip(values.iter_mut()) {
            *out = self.mapper.get_string(*vr)?;
        }
        Ok(())
    }
}
