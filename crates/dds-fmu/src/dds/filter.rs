// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Content filter contracts.
//!
//! A filter is evaluated on the serialized payload before a sample enters
//! a reader's history. `evaluate` must never fail: every internal error
//! rejects the sample and nothing else.

use std::sync::Arc;

use super::{DdsError, Guid};
use crate::dynamic::{SerializedPayload, WirePubSubType};

/// Per-sample information handed to a filter alongside the payload.
#[derive(Debug, Clone, Default)]
pub struct FilterSampleInfo {
    /// Bytes of the serialized payload.
    pub payload_length: usize,
}

/// Sample admission predicate.
pub trait ContentFilter: Send + Sync {
    /// `true` keeps the sample for the reader identified by `reader_guid`,
    /// `false` drops it.
    fn evaluate(
        &self,
        payload: &SerializedPayload,
        info: &FilterSampleInfo,
        reader_guid: &Guid,
    ) -> bool;
}

/// Factory registered on the participant under a filter class name.
///
/// Creation runs both when a content-filtered topic is first created and
/// whenever its expression parameters change; the factory may hand out the
/// same filter instance each time and only update its registrations.
pub trait ContentFilterFactory: Send + Sync {
    fn create_content_filter(
        &self,
        filter_class_name: &str,
        type_name: &str,
        type_support: &Arc<WirePubSubType>,
        expression_parameters: &[String],
    ) -> Result<Arc<dyn ContentFilter>, DdsError>;

    fn delete_content_filter(
        &self,
        _filter_class_name: &str,
        _filter: Arc<dyn ContentFilter>,
    ) -> Result<(), DdsError> {
        Ok(())
    }
}
