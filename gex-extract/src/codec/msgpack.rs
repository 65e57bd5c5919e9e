use super::Encoder;
use crate::record::FunctionRecord;
use gex_common::{DataFormat, ExtractError};

/// MessagePack with named fields, so maps carry the same keys as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackEncoder;

impl Encoder for MsgPackEncoder {
    fn format(&self) -> DataFormat {
        DataFormat::MsgPack
    }

    fn encode(&self, record: &FunctionRecord) -> Result<Vec<u8>, ExtractError> {
        rmp_serde::to_vec_named(record).map_err(|e| ExtractError::encode(DataFormat::MsgPack, e))
    }
}
