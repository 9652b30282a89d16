// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Topics and content-filtered topics.

use std::sync::Arc;

use parking_lot::RwLock;

use super::filter::{ContentFilter, ContentFilterFactory, FilterSampleInfo};
use super::{DdsError, Guid, QoS};
use crate::dynamic::{SerializedPayload, WirePubSubType};

/// A named, typed channel.
#[derive(Debug)]
pub struct Topic {
    name: String,
    type_name: String,
    qos: QoS,
}

impl Topic {
    pub(super) fn new(name: impl Into<String>, type_name: impl Into<String>, qos: QoS) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            qos,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn qos(&self) -> &QoS {
        &self.qos
    }
}

/// A virtual topic deriving from a real one via a filter class.
///
/// Parameter updates re-run the factory, so a filter instance observes
/// either the previous registration or the complete new one, never a torn
/// intermediate state.
pub struct ContentFilteredTopic {
    name: String,
    related: Arc<Topic>,
    filter_class_name: String,
    expression: String,
    parameters: RwLock<Vec<String>>,
    factory: Arc<dyn ContentFilterFactory>,
    support: Arc<WirePubSubType>,
    instance: RwLock<Arc<dyn ContentFilter>>,
}

impl ContentFilteredTopic {
    pub(super) fn new(
        name: impl Into<String>,
        related: Arc<Topic>,
        filter_class_name: impl Into<String>,
        expression: impl Into<String>,
        parameters: Vec<String>,
        factory: Arc<dyn ContentFilterFactory>,
        support: Arc<WirePubSubType>,
    ) -> Result<Self, DdsError> {
        let filter_class_name = filter_class_name.into();
        let instance = factory.create_content_filter(
            &filter_class_name,
            related.type_name(),
            &support,
            &parameters,
        )?;
        Ok(Self {
            name: name.into(),
            related,
            filter_class_name,
            expression: expression.into(),
            parameters: RwLock::new(parameters),
            factory,
            support,
            instance: RwLock::new(instance),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn related_topic(&self) -> &Arc<Topic> {
        &self.related
    }

    pub fn filter_class_name(&self) -> &str {
        &self.filter_class_name
    }

    pub fn filter_expression(&self) -> &str {
        &self.expression
    }

    pub fn expression_parameters(&self) -> Vec<String> {
        self.parameters.read().clone()
    }

    /// Replace the expression parameters, re-running the filter factory.
    pub fn set_expression_parameters(&self, parameters: Vec<String>) -> Result<(), DdsError> {
        let instance = self.factory.create_content_filter(
            &self.filter_class_name,
            self.related.type_name(),
            &self.support,
            &parameters,
        )?;
        *self.instance.write() = instance;
        *self.parameters.write() = parameters;
        Ok(())
    }

    /// Evaluate the filter for a candidate payload.
    pub(super) fn evaluate(&self, payload: &SerializedPayload, reader_guid: &Guid) -> bool {
        let info = FilterSampleInfo {
            payload_length: payload.len(),
        };
        self.instance.read().evaluate(payload, &info, reader_guid)
    }
}

impl std::fmt::Debug for ContentFilteredTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentFilteredTopic")
            .field("name", &self.name)
            .field("related", &self.related.name())
            .field("class", &self.filter_class_name)
            .field("parameters", &*self.parameters.read())
            .finish()
    }
}
