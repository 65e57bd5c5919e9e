use serde::{Deserialize, Serialize};

/// Internal function called by a call without a callee expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternalFn {
    Unique,
    GoaccLoop,
    GoaccReduction,
    AsanMark,
    /// Any other internal function, by its host name (`ADD_OVERFLOW`, ...).
    Other(String),
}

const UNIQUE_CODES: &[&str] = &[
    "UNSPEC",
    "OACC_FORK",
    "OACC_JOIN",
    "OACC_HEAD_MARK",
    "OACC_TAIL_MARK",
    "OACC_PRIVATE",
];
const GOACC_LOOP_CODES: &[&str] = &["CHUNKS", "STEP", "OFFSET", "BOUND"];
const GOACC_REDUCTION_CODES: &[&str] = &["SETUP", "INIT", "FINI", "TEARDOWN"];
const ASAN_MARK_FLAGS: &[&str] = &["POISON", "UNPOISON"];

impl InternalFn {
    pub fn name(&self) -> &str {
        match self {
            InternalFn::Unique => "UNIQUE",
            InternalFn::GoaccLoop => "GOACC_LOOP",
            InternalFn::GoaccReduction => "GOACC_REDUCTION",
            InternalFn::AsanMark => "ASAN_MARK",
            InternalFn::Other(name) => name,
        }
    }

    /// Symbolic names of the first argument, indexed by its value. Empty
    /// for functions whose first argument is an ordinary operand.
    pub fn first_arg_names(&self) -> &'static [&'static str] {
        match self {
            InternalFn::Unique => UNIQUE_CODES,
            InternalFn::GoaccLoop => GOACC_LOOP_CODES,
            InternalFn::GoaccReduction => GOACC_REDUCTION_CODES,
            InternalFn::AsanMark => ASAN_MARK_FLAGS,
            InternalFn::Other(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_arg_names() {
        assert_eq!(InternalFn::GoaccLoop.first_arg_names()[1], "STEP");
        assert!(InternalFn::Other("ADD_OVERFLOW".into()).first_arg_names().is_empty());
        assert_eq!(InternalFn::Other("ADD_OVERFLOW".into()).name(), "ADD_OVERFLOW");
    }
}
