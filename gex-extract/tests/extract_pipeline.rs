use gex_common::{DataFormat, ExtractConfig, ExtractError, SourceLocation};
use gex_extract::{decode_to_json, encode_function, extract_function, extract_snapshot};
use gex_ir::{
    BasicBlock, Edge, FunctionIr, Gimple, GimpleAssign, GimpleCond, GimpleKind, GimplePhi,
    GimpleReturn, HostSnapshot, PhiArg, TargetSizes, TreeBuilder, TreeCode,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as Json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A source tree with `clamp.c` (5 lines) and a snapshot of
///
/// ```c
/// int clamp (int x)     // lines 10..=12
/// {
///   bb2: _1 = x_2(D) + 1; if (_1 > 0) goto bb3; else goto bb4;
///   bb3: _3 = -_1;
///   bb4: _4 = PHI <_1(2), _3(3)>; return _4;
/// }
/// ```
struct Fixture {
    dir: TempDir,
    snapshot: HostSnapshot,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        let source = src.join("clamp.c");
        fs::write(&source, "one\ntwo\nthree\nfour\nfive\n").unwrap();
        let filename = fs::canonicalize(&source).unwrap().display().to_string();

        let mut b = TreeBuilder::new();
        let int = b.int_type();
        let fn_ty = b.function_type(int, vec![int]);
        let decl = b.function_decl("clamp", fn_ty);
        let x = b.parm_decl("x", int);
        let tmp1 = b.ssa_name(None, int, 1);
        let x2 = b.default_def(x, 2);
        let tmp3 = b.ssa_name(None, int, 3);
        let tmp4 = b.ssa_name(None, int, 4);
        let one = b.int_cst(int, 1);
        let zero = b.int_cst(int, 0);
        let neg = b.unary(TreeCode::NegateExpr, int, tmp1);
        let trees = b.finish();

        let at = |line| SourceLocation::new(&filename, line, 3);
        let mut func = FunctionIr::new("clamp", decl);
        func.start_location = Some(at(10));
        func.end_location = Some(at(12));
        func.arguments = vec![x];
        func.ssa_names = vec![None, Some(tmp1), Some(x2), Some(tmp3), Some(tmp4)];
        func.in_ssa = true;
        func.entry_successors = vec![Edge::fallthru(2)];

        let mut bb2 =
            BasicBlock::new(2).with_successors(vec![Edge::true_value(3), Edge::false_value(4)]);
        bb2.push(
            Gimple::new(GimpleKind::Assign(GimpleAssign {
                rhs_code: TreeCode::PlusExpr,
                lhs: Some(tmp1),
                rhs: vec![Some(x2), Some(one)],
            }))
            .with_location(at(11)),
        );
        bb2.push(Gimple::new(GimpleKind::Cond(GimpleCond {
            code: TreeCode::GtExpr,
            lhs: Some(tmp1),
            rhs: Some(zero),
            true_label: None,
            false_label: None,
        })));

        let mut bb3 = BasicBlock::new(3).with_successors(vec![Edge::fallthru(4)]);
        bb3.push(Gimple::new(GimpleKind::Assign(GimpleAssign {
            rhs_code: TreeCode::NegateExpr,
            lhs: Some(tmp3),
            rhs: vec![Some(neg)],
        })));

        let mut bb4 = BasicBlock::new(4).with_successors(vec![Edge::fallthru(1)]);
        bb4.push_phi(GimplePhi {
            result: Some(tmp4),
            args: vec![
                PhiArg {
                    def: Some(tmp1),
                    src: 2,
                    location: Some(at(11)),
                },
                PhiArg {
                    def: Some(tmp3),
                    src: 3,
                    location: None,
                },
            ],
        });
        bb4.push(Gimple::new(GimpleKind::Return(GimpleReturn { retval: Some(tmp4) })));
        func.blocks = vec![bb2, bb3, bb4];

        let snapshot = HostSnapshot::new(TargetSizes::LP64, trees, vec![func]);
        Fixture { dir, snapshot }
    }

    fn config(&self, format: DataFormat) -> ExtractConfig {
        ExtractConfig::new(self.dir.path().join("src"), self.dir.path().join("out"), format)
    }

    fn encode(&self, format: DataFormat) -> Json {
        let func = &self.snapshot.functions[0];
        let bytes = encode_function(
            &self.config(format),
            &self.snapshot.trees,
            self.snapshot.target,
            func,
        )
        .unwrap()
        .expect("function is in scope");
        decode_to_json(format, &bytes).unwrap()
    }
}

/// Same keys and array lengths at every level.
fn assert_same_shape(a: &Json, b: &Json, at: &str) {
    match (a, b) {
        (Json::Object(a), Json::Object(b)) => {
            let keys_a: Vec<&String> = a.keys().collect();
            let keys_b: Vec<&String> = b.keys().collect();
            assert_eq!(keys_a, keys_b, "keys differ at {}", at);
            for (key, value) in a {
                assert_same_shape(value, &b[key], &format!("{}.{}", at, key));
            }
        }
        (Json::Array(a), Json::Array(b)) => {
            assert_eq!(a.len(), b.len(), "lengths differ at {}", at);
            for (i, (x, y)) in a.iter().zip(b).enumerate() {
                assert_same_shape(x, y, &format!("{}[{}]", at, i));
            }
        }
        (a, b) => assert_eq!(a, b, "values differ at {}", at),
    }
}

#[test]
fn test_source_lines_past_end_of_file() {
    let out = Fixture::new().encode(DataFormat::Json);
    let info = &out["function_info"];
    assert_eq!(info["fn_start_line_no"], json!(10));
    assert_eq!(info["fn_end_line_no"], json!(12));
    assert_eq!(info["fn_source_lines"], json!({"10": "", "11": "", "12": ""}));
    assert_eq!(info["fn_name"], json!("clamp"));
    assert!(info["fn_filename"].as_str().unwrap().ends_with("clamp.c"));
}

#[test]
fn test_envelope_keys() {
    let out = Fixture::new().encode(DataFormat::Json);
    let mut keys: Vec<&String> = out.as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["basicblocks", "function_info", "gimples"]);

    let arg = &out["function_info"]["fn_args"][0];
    let mut keys: Vec<&String> = arg.as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["arg", "var_declaration", "var_def", "var_ssa_name_var", "var_type"]
    );
    let ssa = out["function_info"]["fn_ssa_variables"].as_array().unwrap();
    assert_eq!(ssa.len(), 3);
}

#[test]
fn test_assignment_with_two_operands() {
    let out = Fixture::new().encode(DataFormat::Json);
    let negate = &out["gimples"][2];
    assert_eq!(negate["gimple_code"], json!("gimple_assign"));
    assert_eq!(negate["gimple_num_ops"], json!(2));
    let args = &negate["args"];
    assert_eq!(args["gassign_subcode"], json!("negate_expr"));
    assert_eq!(args["gassign_has_rhs_arg1"], json!(true));
    assert_eq!(args["gassign_has_rhs_arg2"], json!(false));
    assert_eq!(args["gassign_has_rhs_arg3"], json!(false));
    assert_eq!(args["gassign_rhs_arg2"], json!({}));
    assert_eq!(args["gassign_rhs_arg3"], json!({}));
}

#[test]
fn test_cond_edges() {
    let fixture = Fixture::new();
    let out = fixture.encode(DataFormat::Json);
    let cond = &out["gimples"][1];
    assert_eq!(cond["gimple_code"], json!("gimple_cond"));
    assert_eq!(cond["basic_block_edges"], json!([3, 4]));
    assert_eq!(cond["args"]["goto_true_edge"], json!(3));
    assert_eq!(cond["args"]["else_goto_false_edge"], json!(4));
    assert_eq!(cond["args"]["gcond_has_goto_true_edge"], json!(true));

    let mut fixture = fixture;
    fixture.snapshot.functions[0].blocks[0].successors = vec![Edge::true_value(3), Edge::fallthru(4)];
    let out = fixture.encode(DataFormat::Json);
    let args = &out["gimples"][1]["args"];
    assert_eq!(args["goto_true_edge"], json!(3));
    assert_eq!(args["gcond_has_else_goto_false_edge"], json!(false));
    assert_eq!(args["else_goto_false_edge"], json!(-1));
}

#[test]
fn test_phi_incoming_matches_predecessors() {
    let fixture = Fixture::new();
    let func = &fixture.snapshot.functions[0];
    let out = fixture.encode(DataFormat::Json);
    let blocks = out["basicblocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 3);
    let phi = &blocks[2]["phis"][0];
    let incoming = phi["gimple_phi_rhs_list"].as_array().unwrap();
    assert_eq!(incoming.len(), func.predecessor_count(4));
    assert_eq!(incoming[0]["line"], json!(11));
    assert_eq!(incoming[1]["line"], json!(-1));
    assert_eq!(incoming[1]["basic_block_src_index"], json!(3));
}

#[test]
fn test_json_and_msgpack_share_one_shape() {
    let fixture = Fixture::new();
    let json_out = fixture.encode(DataFormat::Json);
    let msgpack_out = fixture.encode(DataFormat::MsgPack);
    assert_same_shape(&json_out, &msgpack_out, "$");
}

#[test]
fn test_extract_snapshot_writes_files() {
    let fixture = Fixture::new();
    let config = fixture.config(DataFormat::MsgPack);
    let written = extract_snapshot(&config, &fixture.snapshot, &[]).unwrap();
    let expected = fixture.dir.path().join("out").join("clamp_c").join("clamp.msgpack");
    assert_eq!(written, vec![expected.clone()]);

    let bytes = fs::read(&expected).unwrap();
    let decoded = decode_to_json(DataFormat::MsgPack, &bytes).unwrap();
    assert_eq!(decoded["function_info"]["fn_name"], json!("clamp"));

    let filtered = extract_snapshot(&config, &fixture.snapshot, &["other".to_string()]).unwrap();
    assert!(filtered.is_empty());
}

#[test]
fn test_out_of_scope_function_is_skipped() {
    let fixture = Fixture::new();
    let elsewhere = TempDir::new().unwrap();
    let config = ExtractConfig::new(elsewhere.path(), elsewhere.path().join("out"), DataFormat::Json);
    let func = &fixture.snapshot.functions[0];
    let written =
        extract_function(&config, &fixture.snapshot.trees, fixture.snapshot.target, func).unwrap();
    assert_eq!(written, None);
    assert!(!Path::new(&elsewhere.path().join("out")).exists());
}

#[test]
fn test_invalid_snapshot_is_rejected() {
    let mut fixture = Fixture::new();
    fixture.snapshot.functions[0].blocks[2].phis[0].args.pop();
    let config = fixture.config(DataFormat::Json);
    let err = extract_snapshot(&config, &fixture.snapshot, &[]).unwrap_err();
    assert!(matches!(err, ExtractError::Invariant { .. }));
}
