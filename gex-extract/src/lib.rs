//! GIMPLE Extractor - Extraction engine
//!
//! Turns one compiled function of the host IR into a serialized record:
//! the [`classify`] module renders tree nodes as value token streams, the
//! [`statement`] module extracts GIMPLE statements, the [`assembler`]
//! collects a whole [`FunctionRecord`] and the [`codec`] and [`sink`]
//! modules encode it and write it under the output root.

pub mod assembler;
pub mod classify;
pub mod codec;
pub mod pipeline;
pub mod record;
pub mod sink;
pub mod statement;
pub mod value;

pub use assembler::Assembler;
pub use classify::Classifier;
pub use codec::{decode_to_json, encoder_for, Encoder, JsonEncoder, MsgPackEncoder};
pub use pipeline::{encode_function, extract_function, extract_snapshot};
pub use record::{
    ArgVariable, BlockRecord, FunctionRecord, LocalVariable, PhiIncoming, PhiRecord, SsaVariable,
};
pub use sink::FileSink;
pub use statement::{Statement, StatementArgs, StatementExtractor};
pub use value::{NodeMeta, NodeValue, Payload, Value};
