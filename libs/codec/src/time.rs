//! Semantic wrapper codecs for points in time and elapsed durations.
//!
//! Both share the wire format of a 64-bit signed integer and only differ
//! in the runtime type presented to callers. Size queries delegate to the
//! wrapped integer codec unchanged, so further semantic types can follow
//! this pattern without touching the struct/array machinery.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::encodings::{Builder, TypeCodec};
use crate::error::{CodecError, CodecResult};
use crate::value::{RuntimeType, Value};

/// Unix-timestamp codec: i64 seconds on the wire, `DateTime<Utc>` in memory
pub struct TimestampCodec {
    int_codec: Arc<dyn TypeCodec>,
}

impl TimestampCodec {
    pub fn new(builder: &Builder) -> Self {
        Self {
            int_codec: builder.int64(),
        }
    }
}

impl TypeCodec for TimestampCodec {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        let ts = match value {
            Value::Timestamp(ts) => ts,
            other => {
                return Err(CodecError::invalid_type(
                    "unix timestamp",
                    "timestamp",
                    other.kind_name(),
                ))
            }
        };
        self.int_codec.encode(&Value::I64(ts.timestamp()), into)
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let (value, rest) = self.int_codec.decode(encoded)?;
        let Value::I64(secs) = value else {
            return Ok((value, rest));
        };
        let ts: DateTime<Utc> = Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
            CodecError::invalid_encoding(format!("{secs} is out of range for a unix timestamp"))
        })?;
        Ok((Value::Timestamp(ts), rest))
    }

    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::Timestamp
    }

    fn size(&self, elements: usize) -> CodecResult<usize> {
        self.int_codec.size(elements)
    }

    fn fixed_size(&self) -> Option<usize> {
        self.int_codec.fixed_size()
    }
}

/// Duration codec: i64 nanoseconds on the wire, `chrono::Duration` in memory
pub struct DurationCodec {
    int_codec: Arc<dyn TypeCodec>,
}

impl DurationCodec {
    pub fn new(builder: &Builder) -> Self {
        Self {
            int_codec: builder.int64(),
        }
    }
}

impl TypeCodec for DurationCodec {
    fn encode(&self, value: &Value, into: &mut Vec<u8>) -> CodecResult<()> {
        let dur = match value {
            Value::Duration(dur) => dur,
            other => {
                return Err(CodecError::invalid_type(
                    "duration",
                    "duration",
                    other.kind_name(),
                ))
            }
        };
        let nanos = dur.num_nanoseconds().ok_or_else(|| {
            CodecError::invalid_type("duration", "at most i64 nanoseconds", "overflowing duration")
        })?;
        self.int_codec.encode(&Value::I64(nanos), into)
    }

    fn decode<'a>(&self, encoded: &'a [u8]) -> CodecResult<(Value, &'a [u8])> {
        let (value, rest) = self.int_codec.decode(encoded)?;
        let Value::I64(nanos) = value else {
            return Ok((value, rest));
        };
        Ok((Value::Duration(Duration::nanoseconds(nanos)), rest))
    }

    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::Duration
    }

    fn size(&self, elements: usize) -> CodecResult<usize> {
        self.int_codec.size(elements)
    }

    fn fixed_size(&self) -> Option<usize> {
        self.int_codec.fixed_size()
    }
}
