use super::Encoder;
use crate::record::FunctionRecord;
use gex_common::{DataFormat, ExtractError};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder {
    pub pretty: bool,
}

impl Encoder for JsonEncoder {
    fn format(&self) -> DataFormat {
        DataFormat::Json
    }

    fn encode(&self, record: &FunctionRecord) -> Result<Vec<u8>, ExtractError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(record)
        } else {
            serde_json::to_vec(record)
        };
        bytes.map_err(|e| ExtractError::encode(DataFormat::Json, e))
    }
}
