// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Wire-side dynamic types and data.
//!
//! This is the representation the middleware serializes: writers encode a
//! [`WireData`] buffer to CDR before delivery, readers and the key filter
//! decode payloads back into one. Wire types are built from structured
//! types by the converter ([`crate::convert`]); arrays arrive flattened
//! with their extents collected outermost-first, structs keep their `@key`
//! member annotations, unions keep their IDL label values.

mod cdr;
mod data;
mod support;
mod types;

pub use cdr::{decode_wire, encode_wire, WireCdrError};
pub use data::{WireData, WireValue};
pub use support::{SerializedPayload, TypeSupportOptions, WirePubSubType};
pub use types::{WireKind, WireLiteral, WireMember, WireType, WireUnionCase};
