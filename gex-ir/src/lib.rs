//! GIMPLE Extractor - Host IR model
//!
//! Plain-data model of the host compiler state the extractor reads: tree
//! nodes in an arena, GIMPLE statements, functions with their control-flow
//! graph, and the snapshot format host adapters exchange.

pub mod builder;
pub mod function;
pub mod gimple;
pub mod internal_fn;
pub mod snapshot;
pub mod target;
pub mod tree;
pub mod tree_code;

pub use builder::TreeBuilder;
pub use function::{BasicBlock, Edge, EdgeFlags, FunctionIr, ENTRY_BLOCK, EXIT_BLOCK};
pub use gimple::{
    Gimple, GimpleAsm, GimpleAssign, GimpleBind, GimpleCall, GimpleCode, GimpleCond, GimpleGoto,
    GimpleKind, GimpleLabel, GimpleOther, GimplePhi, GimpleReturn, GimpleSwitch, GimpleTry, PhiArg,
    TryKind,
};
pub use internal_fn::InternalFn;
pub use snapshot::HostSnapshot;
pub use target::TargetSizes;
pub use tree::{
    BuiltinFunction, CallInfo, ClobberKind, ConstructorElt, ConstructorInfo, DeclInfo, IntCst,
    MemRefInfo, PredictInfo, RealCst, RealValue, SsaNameInfo, Tree, TreeArena, TreeData, TreeId,
    TreeListNode, TypeInfo, TypeQuals, VectorCst,
};
pub use tree_code::{TreeCode, TreeCodeClass};
