// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Little-endian CDR encoding and decoding of wire data.

use std::fmt;
use std::sync::Arc;

use super::data::{WireData, WireValue};
use super::types::{WireKind, WireType};

/// Errors for wire CDR operations.
#[derive(Debug)]
pub enum WireCdrError {
    BufferTooSmall { need: usize, have: usize },
    InvalidData(String),
    TypeMismatch { expected: String, found: String },
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for WireCdrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall { need, have } => {
                write!(f, "buffer too small: need {} bytes, have {}", need, have)
            }
            Self::InvalidData(msg) => write!(f, "invalid data: {}", msg),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            Self::Utf8(e) => write!(f, "UTF-8 error: {}", e),
        }
    }
}

impl std::error::Error for WireCdrError {}

impl From<std::string::FromUtf8Error> for WireCdrError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Utf8(e)
    }
}

/// Encode a wire buffer to CDR bytes.
pub fn encode_wire(data: &WireData) -> Result<Vec<u8>, WireCdrError> {
    let mut encoder = Encoder { buffer: Vec::new() };
    encoder.encode(data.value(), &data.ty().kind)?;
    Ok(encoder.buffer)
}

/// Decode CDR bytes into a fresh wire buffer of the given type.
pub fn decode_wire(bytes: &[u8], ty: &Arc<WireType>) -> Result<WireData, WireCdrError> {
    let mut decoder = Decoder { bytes, offset: 0 };
    let value = decoder.decode(&ty.kind)?;
    let mut data = WireData::new(ty);
    data.set_value(value);
    Ok(data)
}

struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    fn align(&mut self, alignment: usize) {
        let padding = (alignment - (self.buffer.len() % alignment)) % alignment;
        self.buffer.extend(std::iter::repeat(0u8).take(padding));
    }

    fn mismatch(kind: &WireKind, value: &WireValue) -> WireCdrError {
        WireCdrError::TypeMismatch {
            expected: format!("{:?}", kind),
            found: format!("{:?}", value),
        }
    }

    fn encode(&mut self, value: &WireValue, kind: &WireKind) -> Result<(), WireCdrError> {
        match (kind, value) {
            (WireKind::Bool, WireValue::Bool(v)) => self.buffer.push(u8::from(*v)),
            (WireKind::Char, WireValue::Char(v)) | (WireKind::U8, WireValue::U8(v)) => {
                self.buffer.push(*v);
            }
            (WireKind::I8, WireValue::I8(v)) => self.buffer.push(*v as u8),
            (WireKind::I16, WireValue::I16(v)) => {
                self.align(2);
                self.buffer.extend(&v.to_le_bytes());
            }
            (WireKind::U16, WireValue::U16(v)) => {
                self.align(2);
                self.buffer.extend(&v.to_le_bytes());
            }
            (WireKind::I32, WireValue::I32(v)) => {
                self.align(4);
                self.buffer.extend(&v.to_le_bytes());
            }
            (WireKind::U32, WireValue::U32(v)) => {
                self.align(4);
                self.buffer.extend(&v.to_le_bytes());
            }
            (WireKind::I64, WireValue::I64(v)) => {
                self.align(8);
                self.buffer.extend(&v.to_le_bytes());
            }
            (WireKind::U64, WireValue::U64(v)) => {
                self.align(8);
                self.buffer.extend(&v.to_le_bytes());
            }
            (WireKind::F32, WireValue::F32(v)) => {
                self.align(4);
                self.buffer.extend(&v.to_le_bytes());
            }
            (WireKind::F64, WireValue::F64(v)) => {
                self.align(8);
                self.buffer.extend(&v.to_le_bytes());
            }
            (WireKind::Str { bound }, WireValue::Str(s)) => {
                if let Some(max) = bound {
                    if s.len() > *max as usize {
                        return Err(WireCdrError::InvalidData("string exceeds bound".into()));
                    }
                }
                self.align(4);
                let bytes = s.as_bytes();
                // Length includes the NUL terminator.
                self.buffer.extend(&((bytes.len() + 1) as u32).to_le_bytes());
                self.buffer.extend(bytes);
                self.buffer.push(0);
            }
            (WireKind::Enum(_), WireValue::Enum(v)) => {
                self.align(4);
                self.buffer.extend(&v.to_le_bytes());
            }
            (WireKind::Struct(members), WireValue::Struct(values)) => {
                if members.len() != values.len() {
                    return Err(WireCdrError::InvalidData(format!(
                        "struct arity mismatch: {} members, {} values",
                        members.len(),
                        values.len()
                    )));
                }
                for (member, value) in members.iter().zip(values) {
                    self.encode(value, &member.ty.kind)?;
                }
            }
            (WireKind::Array { element, dims }, WireValue::Array(values)) => {
                let expected = WireType::flat_len(dims);
                if values.len() != expected {
                    return Err(WireCdrError::InvalidData(format!(
                        "array length mismatch: expected {}, got {}",
                        expected,
                        values.len()
                    )));
                }
                for value in values {
                    self.encode(value, &element.kind)?;
                }
            }
            (
                WireKind::Union { discriminator, cases },
                WireValue::Union { discriminator: disc, case, value },
            ) => {
                self.encode_discriminator(*disc, &discriminator.kind)?;
                let selected = cases.get(*case).ok_or_else(|| {
                    WireCdrError::InvalidData(format!("union case {} out of range", case))
                })?;
                self.encode(value, &selected.ty.kind)?;
            }
            (kind, value) => return Err(Self::mismatch(kind, value)),
        }
        Ok(())
    }

    fn encode_discriminator(&mut self, disc: i64, kind: &WireKind) -> Result<(), WireCdrError> {
        match kind {
            WireKind::Bool => self.buffer.push(u8::from(disc != 0)),
            WireKind::Char | WireKind::U8 => self.buffer.push(disc as u8),
            WireKind::I8 => self.buffer.push(disc as i8 as u8),
            WireKind::I16 | WireKind::U16 => {
                self.align(2);
                self.buffer.extend(&(disc as i16).to_le_bytes());
            }
            WireKind::I32 | WireKind::U32 | WireKind::Enum(_) => {
                self.align(4);
                self.buffer.extend(&(disc as i32).to_le_bytes());
            }
            WireKind::I64 | WireKind::U64 => {
                self.align(8);
                self.buffer.extend(&disc.to_le_bytes());
            }
            other => {
                return Err(WireCdrError::InvalidData(format!(
                    "unsupported discriminator kind {:?}",
                    other
                )))
            }
        }
        Ok(())
    }
}

struct Decoder<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    fn align(&mut self, alignment: usize) {
        self.offset = (self.offset + alignment - 1) & !(alignment - 1);
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], WireCdrError> {
        if self.offset + count > self.bytes.len() {
            return Err(WireCdrError::BufferTooSmall {
                need: count,
                have: self.bytes.len().saturating_sub(self.offset),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    fn u32_le(&mut self) -> Result<u32, WireCdrError> {
        self.align(4);
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn decode(&mut self, kind: &WireKind) -> Result<WireValue, WireCdrError> {
        match kind {
            WireKind::Bool => Ok(WireValue::Bool(self.take(1)?[0] != 0)),
            WireKind::Char => Ok(WireValue::Char(self.take(1)?[0])),
            WireKind::U8 => Ok(WireValue::U8(self.take(1)?[0])),
            WireKind::I8 => Ok(WireValue::I8(self.take(1)?[0] as i8)),
            WireKind::I16 => {
                self.align(2);
                let b = self.take(2)?;
                Ok(WireValue::I16(i16::from_le_bytes([b[0], b[1]])))
            }
            WireKind::U16 => {
                self.align(2);
                let b = self.take(2)?;
                Ok(WireValue::U16(u16::from_le_bytes([b[0], b[1]])))
            }
            WireKind::I32 => {
                self.align(4);
                let b = self.take(4)?;
                Ok(WireValue::I32(i32::from_le_bytes([b[0], b[1], b[2], b[3]])))
            }
            WireKind::U32 => Ok(WireValue::U32(self.u32_le()?)),
            WireKind::I64 => {
                self.align(8);
                let b = self.take(8)?;
                Ok(WireValue::I64(i64::from_le_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ])))
            }
            WireKind::U64 => {
                self.align(8);
                let b = self.take(8)?;
                Ok(WireValue::U64(u64::from_le_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ])))
            }
            WireKind::F32 => {
                self.align(4);
                let b = self.take(4)?;
                Ok(WireValue::F32(f32::from_le_bytes([b[0], b[1], b[2], b[3]])))
            }
            WireKind::F64 => {
                self.align(8);
                let b = self.take(8)?;
                Ok(WireValue::F64(f64::from_le_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ])))
            }
            WireKind::Str { .. } => {
                let len = self.u32_le()? as usize;
                if len == 0 {
                    return Ok(WireValue::Str(String::new()));
                }
                let bytes = self.take(len)?;
                let end = if bytes[len - 1] == 0 { len - 1 } else { len };
                Ok(WireValue::Str(String::from_utf8(bytes[..end].to_vec())?))
            }
            WireKind::Enum(_) => Ok(WireValue::Enum(self.u32_le()?)),
            WireKind::Struct(members) => {
                let mut values = Vec::with_capacity(members.len());
                for member in members {
                    values.push(self.decode(&member.ty.kind)?);
                }
                Ok(WireValue::Struct(values))
            }
            WireKind::Array { element, dims } => {
                let count = WireType::flat_len(dims);
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(self.decode(&element.kind)?);
                }
                Ok(WireValue::Array(values))
            }
            WireKind::Union { discriminator, cases } => {
                let disc = self.decode_discriminator(&discriminator.kind)?;
                match WireKind::union_case_by_discriminator(cases, disc) {
                    Some((idx, case)) => {
                        let inner = self.decode(&case.ty.kind)?;
                        Ok(WireValue::Union {
                            discriminator: disc,
                            case: idx,
                            value: Box::new(inner),
                        })
                    }
                    None => Err(WireCdrError::InvalidData(format!(
                        "no union case for discriminator {}",
                        disc
                    ))),
                }
            }
        }
    }

    fn decode_discriminator(&mut self, kind: &WireKind) -> Result<i64, WireCdrError> {
        let value = match kind {
            WireKind::Bool | WireKind::Char | WireKind::U8 => i64::from(self.take(1)?[0]),
            WireKind::I8 => i64::from(self.take(1)?[0] as i8),
            WireKind::I16 => {
                self.align(2);
                let b = self.take(2)?;
                i64::from(i16::from_le_bytes([b[0], b[1]]))
            }
            WireKind::U16 => {
                self.align(2);
                let b = self.take(2)?;
                i64::from(u16::from_le_bytes([b[0], b[1]]))
            }
            WireKind::I32 | WireKind::U32 | WireKind::Enum(_) => {
                self.align(4);
                let b = self.take(4)?;
                i64::from(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            }
            WireKind::I64 | WireKind::U64 => {
                self.align(8);
                let b = self.take(8)?;
                i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            }
            other => {
                return Err(WireCdrError::InvalidData(format!(
                    "unsupported discriminator kind {:?}",
                    other
                )))
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::types::{WireLiteral, WireMember, WireUnionCase};

    fn member(name: &str, ty: WireType) -> WireMember {
        WireMember {
            name: name.into(),
            ty: Arc::new(ty),
            is_key: false,
        }
    }

    #[test]
    fn roundtrip_mixed_struct() {
        let ty = Arc::new(WireType::new(
            "Mixed",
            WireKind::Struct(vec![
                member("b", WireType::new("boolean", WireKind::Bool)),
                member("u", WireType::new("uint32", WireKind::U32)),
                member("d", WireType::new("double", WireKind::F64)),
                member("s", WireType::new("string", WireKind::Str { bound: None })),
            ]),
        ));
        let mut data = WireData::new(&ty);
        data.set_value(WireValue::Struct(vec![
            WireValue::Bool(true),
            WireValue::U32(77),
            WireValue::F64(-0.5),
            WireValue::Str("hello".into()),
        ]));
        let bytes = encode_wire(&data).expect("encode");
        let back = decode_wire(&bytes, &ty).expect("decode");
        assert_eq!(back.value(), data.value());
    }

    #[test]
    fn roundtrip_flattened_array() {
        let ty = Arc::new(WireType::new(
            "Grid",
            WireKind::Array {
                element: Arc::new(WireType::new("uint16", WireKind::U16)),
                dims: vec![2, 3],
            },
        ));
        let mut data = WireData::new(&ty);
        data.set_value(WireValue::Array(
            (0u16..6).map(WireValue::U16).collect(),
        ));
        let bytes = encode_wire(&data).expect("encode");
        let back = decode_wire(&bytes, &ty).expect("decode");
        assert_eq!(back.value(), data.value());
    }

    #[test]
    fn roundtrip_union_with_enum_discriminator() {
        let color = Arc::new(WireType::new(
            "Color",
            WireKind::Enum(vec![
                WireLiteral { name: "A".into(), value: 0 },
                WireLiteral { name: "B".into(), value: 1 },
            ]),
        ));
        let ty = Arc::new(WireType::new(
            "Choice",
            WireKind::Union {
                discriminator: color,
                cases: vec![
                    WireUnionCase {
                        name: "x".into(),
                        labels: vec![0],
                        is_default: false,
                        ty: Arc::new(WireType::new("double", WireKind::F64)),
                    },
                    WireUnionCase {
                        name: "y".into(),
                        labels: vec![1],
                        is_default: false,
                        ty: Arc::new(WireType::new("uint32", WireKind::U32)),
                    },
                ],
            },
        ));
        let mut data = WireData::new(&ty);
        data.set_value(WireValue::Union {
            discriminator: 1,
            case: 1,
            value: Box::new(WireValue::U32(42)),
        });
        let bytes = encode_wire(&data).expect("encode");
        let back = decode_wire(&bytes, &ty).expect("decode");
        assert_eq!(back.value(), data.value());
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let ty = Arc::new(WireType::new(
            "W",
            WireKind::Struct(vec![member("v", WireType::new("uint64", WireKind::U64))]),
        ));
        let data = WireData::new(&ty);
        let bytes = encode_wire(&data).expect("encode");
        assert!(decode_wire(&bytes[..4], &ty).is_err());
    }

    #[test]
    fn alignment_matches_cdr() {
        // u8 then u32: three padding bytes in between.
        let ty = Arc::new(WireType::new(
            "Pad",
            WireKind::Struct(vec![
                member("a", WireType::new("uint8", WireKind::U8)),
                member("b", WireType::new("uint32", WireKind::U32)),
            ]),
        ));
        let mut data = WireData::new(&ty);
        data.set_value(WireValue::Struct(vec![
            WireValue::U8(1),
            WireValue::U32(2),
        ]));
        let bytes = encode_wire(&data).expect("encode");
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[4..], &2u32.to_le_bytes());
    }
}
