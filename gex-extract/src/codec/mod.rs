//! Record encoders
//!
//! One [`Encoder`] per [`DataFormat`]. Both walk the `Serialize` impls in
//! [`schema`], so the formats differ in bytes only.

mod json;
mod msgpack;
pub mod schema;

pub use json::JsonEncoder;
pub use msgpack::MsgPackEncoder;

use crate::record::FunctionRecord;
use gex_common::{DataFormat, ExtractError};

pub trait Encoder {
    fn format(&self) -> DataFormat;

    fn encode(&self, record: &FunctionRecord) -> Result<Vec<u8>, ExtractError>;
}

pub fn encoder_for(format: DataFormat) -> Box<dyn Encoder> {
    match format {
        DataFormat::Json => Box::new(JsonEncoder::default()),
        DataFormat::MsgPack => Box::new(MsgPackEncoder),
    }
}

/// Decode an encoded record into a generic JSON value.
pub fn decode_to_json(format: DataFormat, bytes: &[u8]) -> Result<serde_json::Value, ExtractError> {
    match format {
        DataFormat::Json => {
            serde_json::from_slice(bytes).map_err(|e| ExtractError::encode(format, e))
        }
        DataFormat::MsgPack => rmp_serde::from_slice(bytes).map_err(|e| ExtractError::encode(format, e)),
    }
}
