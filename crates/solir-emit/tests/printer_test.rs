use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use solir_core::{
    builder::OpBuilder, CmpPredicate, FunctionType, InstBuilder, Location, Module, SolOp, Type,
};
use solir_emit::{print_module, EmitterConfig, Emitter, SolirEmitter};

/// `sol.contract @C { func.func @f(i8) -> i8 { return a + 1 } }`
fn increment_module(location: Location) -> Module {
    let mut module = Module::default();
    let mut b = OpBuilder::new(&mut module);
    b.set_location(location);
    let (_, body) = b.container(SolOp::Contract, "C").unwrap();
    b.set_insertion_point_to_end(body);
    let (_, entry) = b
        .func(
            "f",
            FunctionType {
                inputs: vec![Type::Int(8)],
                results: vec![Type::Int(8)],
            },
        )
        .unwrap();
    b.set_insertion_point_to_end(entry);
    let arg = b.block_args(entry)[0];
    let cell = b.alloca_cell(Type::Int(8)).unwrap();
    b.store_cell(arg, cell).unwrap();
    let loaded = b.load_cell(cell).unwrap();
    let one = b.int_const(1, Type::Int(8)).unwrap();
    let sum = b.addi(loaded, one).unwrap();
    b.func_return(vec![sum]).unwrap();
    module
}

#[test]
fn test_print_high_level_module() {
    let module = increment_module(Location::Unknown);
    let output = print_module(&module, &EmitterConfig::default()).unwrap();

    insta::assert_snapshot!(output, @r###"
    module {
      "sol.contract"() ({
        "func.func"() ({
        ^bb0(%0: i8):
          %1 = "memref.alloca"() : () -> memref<i8>
          "memref.store"(%0, %1) : (i8, memref<i8>) -> ()
          %2 = "memref.load"(%1) : (memref<i8>) -> i8
          %3 = "arith.constant"() {value = 1 : i8} : () -> i8
          %4 = "arith.addi"(%2, %3) : (i8, i8) -> i8
          "func.return"(%4) : (i8) -> ()
        }) {sym_name = "f", function_type = (i8) -> i8} : () -> ()
      }) {sym_name = "C"} : () -> ()
    }
    "###);
}

#[test]
fn test_print_branches_and_blocks() {
    let mut module = Module::default();
    let mut b = OpBuilder::new(&mut module);
    let (func, entry) = b
        .llvm_func(
            "main",
            FunctionType {
                inputs: vec![Type::i256()],
                results: vec![],
            },
            "external",
            true,
        )
        .unwrap();
    let entry = entry.unwrap();
    let then_block = b.append_block(func, 0, vec![]).unwrap();
    let else_block = b.append_block(func, 0, vec![]).unwrap();
    b.set_insertion_point_to_end(entry);
    let arg = b.block_args(entry)[0];
    let one = b.llvm_constant(BigInt::from(1), Type::i256()).unwrap();
    let is_one = b.llvm_icmp(CmpPredicate::Eq, arg, one).unwrap();
    b.llvm_cond_br(is_one, then_block, else_block).unwrap();
    for block in [then_block, else_block] {
        b.set_insertion_point_to_end(block);
        b.llvm_unreachable().unwrap();
    }

    let output = SolirEmitter::default().print(&module).unwrap();
    let expected = r#"module {
  "llvm.func"() ({
  ^bb0(%0: i256):
    %1 = "llvm.mlir.constant"() {value = 1 : i256} : () -> i256
    %2 = "llvm.icmp"(%0, %1) {predicate = "eq"} : (i256, i256) -> i1
    "llvm.cond_br"(%2)[^bb1, ^bb2] : (i1) -> ()
  ^bb1:
    "llvm.unreachable"() : () -> ()
  ^bb2:
    "llvm.unreachable"() : () -> ()
  }) {sym_name = "main", function_type = (i256) -> (), linkage = "external"} : () -> ()
}
"#;
    assert_eq!(output, expected);
}

#[test]
fn test_numbering_restarts_per_function() {
    let mut module = Module::default();
    for name in ["first", "second"] {
        let mut b = OpBuilder::new(&mut module);
        let (_, entry) = b
            .func(
                name,
                FunctionType {
                    inputs: vec![Type::Int(8)],
                    results: vec![Type::Int(8)],
                },
            )
            .unwrap();
        b.set_insertion_point_to_end(entry);
        let arg = b.block_args(entry)[0];
        b.func_return(vec![arg]).unwrap();
    }

    let output = SolirEmitter::default().print(&module).unwrap();
    assert_eq!(output.matches("^bb0(%0: i8):").count(), 2);
    assert_eq!(output.matches("\"func.return\"(%0) : (i8) -> ()").count(), 2);
}

#[test]
fn test_debug_info_prints_locations() {
    let module = increment_module(Location::file_line_col("C.sol", 2, 5));
    let config = EmitterConfig::default().with_debug_info(true);
    let output = print_module(&module, &config).unwrap();

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.first(), Some(&"module {"));
    assert_eq!(lines.last(), Some(&"} loc(unknown)"));
    for line in &lines[1..lines.len() - 1] {
        if line.trim_start().starts_with('^') || line.ends_with("({") {
            continue;
        }
        assert!(line.ends_with("loc(\"C.sol\":2:5)"), "no location on {:?}", line);
    }
}

#[test]
fn test_entry_block_headers_on_request() {
    let module = increment_module(Location::Unknown);
    let config = EmitterConfig {
        print_entry_block_headers: true,
        ..EmitterConfig::default()
    };
    let output = print_module(&module, &config).unwrap();
    assert!(output.contains("  \"sol.contract\"() ({\n  ^bb0:\n"), "{}", output);
}

#[test]
fn test_colored_op_names() {
    colored::control::set_override(true);
    let module = increment_module(Location::Unknown);
    let output = print_module(&module, &EmitterConfig::default().with_colors(true)).unwrap();
    colored::control::unset_override();

    assert!(output.contains("\u{1b}["));
    assert!(output.contains("arith.addi"));
}

#[test]
fn test_emit_to_string_uses_plain_defaults() {
    let module = increment_module(Location::Unknown);
    let emitter = SolirEmitter::new(EmitterConfig::default().with_debug_info(true));
    let output = emitter.emit_to_string(&module).unwrap();
    assert!(output.starts_with("module {\n  \"sol.contract\"()"));
    assert!(output.ends_with("} loc(unknown)\n"));
}
