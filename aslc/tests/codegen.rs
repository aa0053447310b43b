//! Whole-pipeline tests: build a tree the way the parser would, compile,
//! and check the emitted subroutines instruction by instruction.

use aslc::{compile, Stage};
use ast::{
    BasicType, BinOp, Expr, Function, LeftExpr, ParamDecl, Program, Stmnt, TypeSpec, UnOp, VarDecl,
};

fn int() -> TypeSpec {
    TypeSpec::basic(BasicType::Int)
}

fn float() -> TypeSpec {
    TypeSpec::basic(BasicType::Float)
}

fn main_with(decls: Vec<VarDecl>, body: Vec<Stmnt>) -> Program {
    Program::new(vec![Function::new("main", vec![], None, decls, body)])
}

fn emit(program: &Program) -> asm::Program {
    let result = compile(program, Stage::Codegen);
    assert!(result.errors.is_empty(), "unexpected semantic errors");
    result.program.expect("codegen stage emits a program")
}

fn body_of<'a>(program: &'a asm::Program, name: &str) -> Vec<String> {
    program
        .subroutines()
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no subroutine '{name}'"))
        .instructions()
        .iter()
        .map(|i| i.to_string())
        .collect()
}

#[test]
fn integer_addition_into_scalar() {
    let tree = main_with(
        vec![VarDecl::new(["x"], int())],
        vec![Stmnt::assign(
            LeftExpr::ident("x"),
            Expr::binary(BinOp::Add, Expr::int("1"), Expr::int("2")),
        )],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        [
            "ILOAD %1, 1",
            "ILOAD %2, 2",
            "ADD %3, %1, %2",
            "LOAD x, %3",
            "RETURN",
        ],
    );
}

#[test]
fn mixed_arithmetic_coerces_the_integer_side() {
    let tree = main_with(
        vec![VarDecl::new(["x"], float())],
        vec![Stmnt::assign(
            LeftExpr::ident("x"),
            Expr::binary(BinOp::Add, Expr::int("1"), Expr::float("2.0")),
        )],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        [
            "ILOAD %1, 1",
            "FLOAD %2, 2.0",
            "FLOAT %3, %1",
            "FADD %4, %3, %2",
            "LOAD x, %4",
            "RETURN",
        ],
    );
}

#[test]
fn if_with_else_uses_one_label_suffix() {
    let tree = main_with(
        vec![VarDecl::new(["a", "b", "x"], int())],
        vec![Stmnt::If {
            cond: Expr::binary(BinOp::Lt, Expr::ident("a"), Expr::ident("b")),
            then: vec![Stmnt::assign(LeftExpr::ident("x"), Expr::int("1"))],
            r#else: Some(vec![Stmnt::assign(LeftExpr::ident("x"), Expr::int("2"))]),
        }],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        [
            "LT %1, a, b",
            "FJUMP %1, else1",
            "ILOAD %2, 1",
            "LOAD x, %2",
            "UJUMP endif1",
            "LABEL else1",
            "ILOAD %3, 2",
            "LOAD x, %3",
            "LABEL endif1",
            "RETURN",
        ],
    );
}

#[test]
fn if_without_else_jumps_straight_to_endif() {
    let tree = main_with(
        vec![VarDecl::new(["a", "x"], int())],
        vec![Stmnt::If {
            cond: Expr::binary(BinOp::Lt, Expr::ident("a"), Expr::int("0")),
            then: vec![Stmnt::assign(LeftExpr::ident("x"), Expr::int("1"))],
            r#else: None,
        }],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        [
            "ILOAD %1, 0",
            "LT %2, a, %1",
            "FJUMP %2, endif1",
            "ILOAD %3, 1",
            "LOAD x, %3",
            "LABEL endif1",
            "RETURN",
        ],
    );
}

#[test]
fn while_loop_skeleton() {
    let tree = main_with(
        vec![VarDecl::new(["i", "n"], int())],
        vec![Stmnt::While {
            cond: Expr::binary(BinOp::Lt, Expr::ident("i"), Expr::ident("n")),
            body: vec![Stmnt::assign(
                LeftExpr::ident("i"),
                Expr::binary(BinOp::Add, Expr::ident("i"), Expr::int("1")),
            )],
        }],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        [
            "LABEL while1",
            "LT %1, i, n",
            "FJUMP %1, endwhile1",
            "ILOAD %2, 1",
            "ADD %3, i, %2",
            "LOAD i, %3",
            "UJUMP while1",
            "LABEL endwhile1",
            "RETURN",
        ],
    );
}

#[test]
fn array_assignment_expands_to_a_copy_loop() {
    let tree = main_with(
        vec![VarDecl::new(["a", "b"], TypeSpec::array(3, BasicType::Int))],
        vec![Stmnt::assign(LeftExpr::ident("a"), Expr::ident("b"))],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        [
            "ILOAD %1, 0",
            "ILOAD %2, 1",
            "ILOAD %3, 3",
            "LABEL while1",
            "LT %4, %1, %3",
            "FJUMP %4, endwhile1",
            "LOADX %5, b, %1",
            "XLOAD a, %1, %5",
            "ADD %1, %1, %2",
            "UJUMP while1",
            "LABEL endwhile1",
            "RETURN",
        ],
    );
}

#[test]
fn write_string_keeps_the_quoted_lexeme() {
    let tree = main_with(vec![], vec![Stmnt::write_string("\"hi\\n\"")]);
    let code = emit(&tree);
    assert_eq!(body_of(&code, "main"), ["WRITES \"hi\\n\"", "RETURN"]);
}

#[test]
fn modulo_expands_to_div_mul_sub() {
    let tree = main_with(
        vec![VarDecl::new(["x", "a", "b"], int())],
        vec![Stmnt::assign(
            LeftExpr::ident("x"),
            Expr::binary(BinOp::Mod, Expr::ident("a"), Expr::ident("b")),
        )],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        [
            "DIV %1, a, b",
            "MUL %2, b, %1",
            "SUB %3, a, %2",
            "LOAD x, %3",
            "RETURN",
        ],
    );
}

#[test]
fn greater_than_swaps_the_comparison() {
    let tree = main_with(
        vec![VarDecl::new(["x"], TypeSpec::basic(BasicType::Bool)), VarDecl::new(["a", "b"], int())],
        vec![Stmnt::assign(
            LeftExpr::ident("x"),
            Expr::binary(BinOp::Gt, Expr::ident("a"), Expr::ident("b")),
        )],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        ["LT %1, b, a", "LOAD x, %1", "RETURN"],
    );
}

#[test]
fn not_equal_is_eq_then_not() {
    let tree = main_with(
        vec![VarDecl::new(["x"], TypeSpec::basic(BasicType::Bool)), VarDecl::new(["a", "b"], float())],
        vec![Stmnt::assign(
            LeftExpr::ident("x"),
            Expr::binary(BinOp::Neq, Expr::ident("a"), Expr::ident("b")),
        )],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        ["FEQ %1, a, b", "NOT %2, %1", "LOAD x, %2", "RETURN"],
    );
}

#[test]
fn unary_operators_copy_or_negate_into_a_temp() {
    let tree = main_with(
        vec![
            VarDecl::new(["x", "a"], int()),
            VarDecl::new(["p"], TypeSpec::basic(BasicType::Bool)),
            VarDecl::new(["q"], TypeSpec::basic(BasicType::Bool)),
        ],
        vec![
            Stmnt::assign(LeftExpr::ident("x"), Expr::unary(UnOp::Neg, Expr::ident("a"))),
            Stmnt::assign(LeftExpr::ident("x"), Expr::unary(UnOp::Plus, Expr::ident("a"))),
            Stmnt::assign(LeftExpr::ident("p"), Expr::unary(UnOp::Not, Expr::ident("q"))),
        ],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        [
            "NEG %1, a",
            "LOAD x, %1",
            "ILOAD %2, a",
            "LOAD x, %2",
            "NOT %3, q",
            "LOAD p, %3",
            "RETURN",
        ],
    );
}

#[test]
fn literals_load_by_kind() {
    let tree = main_with(
        vec![
            VarDecl::new(["b"], TypeSpec::basic(BasicType::Bool)),
            VarDecl::new(["c"], TypeSpec::basic(BasicType::Char)),
        ],
        vec![
            Stmnt::assign(LeftExpr::ident("b"), Expr::boolean(true)),
            Stmnt::assign(LeftExpr::ident("b"), Expr::boolean(false)),
            Stmnt::assign(LeftExpr::ident("c"), Expr::character("'z'")),
            Stmnt::assign(LeftExpr::ident("c"), Expr::character("'\\n'")),
        ],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        [
            "ILOAD %1, 1",
            "LOAD b, %1",
            "ILOAD %2, 0",
            "LOAD b, %2",
            "CHLOAD %3, z",
            "LOAD c, %3",
            // escapes pass through, only the delimiters go
            "CHLOAD %4, \\n",
            "LOAD c, %4",
            "RETURN",
        ],
    );
}

#[test]
fn indexed_read_and_store_scale_by_element_size() {
    let tree = main_with(
        vec![
            VarDecl::new(["a"], TypeSpec::array(4, BasicType::Int)),
            VarDecl::new(["x", "i"], int()),
        ],
        vec![
            // x = a[i];
            Stmnt::assign(LeftExpr::ident("x"), Expr::index("a", Expr::ident("i"))),
            // a[i] = x;
            Stmnt::assign(LeftExpr::index("a", Expr::ident("i")), Expr::ident("x")),
        ],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        [
            "ILOAD %1, 1",
            "MUL %2, i, %1",
            "LOADX %3, a, %2",
            "LOAD x, %3",
            "ILOAD %4, 1",
            "MUL %5, i, %4",
            "XLOAD a, %5, x",
            "RETURN",
        ],
    );
}

#[test]
fn read_dispatches_on_the_target_type() {
    let tree = main_with(
        vec![
            VarDecl::new(["f"], float()),
            VarDecl::new(["c"], TypeSpec::basic(BasicType::Char)),
            VarDecl::new(["a"], TypeSpec::array(2, BasicType::Int)),
        ],
        vec![
            Stmnt::Read(LeftExpr::ident("f")),
            Stmnt::Read(LeftExpr::ident("c")),
            Stmnt::Read(LeftExpr::index("a", Expr::int("0"))),
        ],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        [
            "READF %1",
            "LOAD f, %1",
            "READC %2",
            "LOAD c, %2",
            "ILOAD %3, 0",
            "ILOAD %4, 1",
            "MUL %5, %3, %4",
            "READI %6",
            "XLOAD a, %5, %6",
            "RETURN",
        ],
    );
}

#[test]
fn write_dispatches_on_the_expression_type() {
    let tree = main_with(
        vec![
            VarDecl::new(["f"], float()),
            VarDecl::new(["c"], TypeSpec::basic(BasicType::Char)),
            VarDecl::new(["i"], int()),
        ],
        vec![
            Stmnt::WriteExpr(Expr::ident("f")),
            Stmnt::WriteExpr(Expr::ident("c")),
            Stmnt::WriteExpr(Expr::ident("i")),
        ],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        ["WRITEF f", "WRITEC c", "WRITEI i", "RETURN"],
    );
}

#[test]
fn return_coerces_into_the_result_slot() {
    let tree = Program::new(vec![Function::new(
        "half",
        vec![],
        Some(float()),
        vec![],
        vec![Stmnt::Return(Some(Expr::int("1")))],
    )]);
    let code = emit(&tree);
    let subr = &code.subroutines()[0];
    let params: Vec<_> = subr.params().iter().map(|p| p.name.clone()).collect();
    assert_eq!(params, ["_result"]);
    assert_eq!(
        body_of(&code, "half"),
        [
            "ILOAD %1, 1",
            "FLOAT %2, %1",
            "LOAD _result, %2",
            "RETURN",
            "RETURN",
        ],
    );
}

#[test]
fn array_returns_get_a_result_slot_with_the_array_flag() {
    // the result slot keeps the full type form (declared array params
    // unwrap to the element form instead), and no copy into _result is
    // invented for the array case
    let make = Function::new(
        "make",
        vec![],
        Some(TypeSpec::array(3, BasicType::Int)),
        vec![],
        vec![Stmnt::Return(None)],
    );
    let code = emit(&Program::new(vec![make]));

    let subr = &code.subroutines()[0];
    let params: Vec<_> = subr
        .params()
        .iter()
        .map(|p| format!("{} {} {}", p.name, p.ty, p.is_array))
        .collect();
    assert_eq!(params, ["_result array[3] of int true"]);
    assert_eq!(
        subr.to_string(),
        "subroutine make\n  param _result array[3] of int array\n  RETURN\n  RETURN\n",
    );
}

#[test]
fn call_protocol_pushes_args_then_balances_pops() {
    // func inc(n : int) : int ... ; main: x = inc(x);
    let inc = Function::new(
        "inc",
        vec![ParamDecl::new("n", int())],
        Some(int()),
        vec![],
        vec![Stmnt::Return(Some(Expr::binary(
            BinOp::Add,
            Expr::ident("n"),
            Expr::int("1"),
        )))],
    );
    let main = Function::new(
        "main",
        vec![],
        None,
        vec![VarDecl::new(["x"], int())],
        vec![Stmnt::assign(
            LeftExpr::ident("x"),
            Expr::call("inc", vec![Expr::ident("x")]),
        )],
    );
    let code = emit(&Program::new(vec![inc, main]));
    assert_eq!(
        body_of(&code, "main"),
        [
            "PUSH",
            "PUSH x",
            "CALL inc",
            "POP",
            "POP %1",
            "LOAD x, %1",
            "RETURN",
        ],
    );
}

#[test]
fn local_arrays_pass_their_address_parameters_pass_through() {
    // void fill(v : array[3] of int); relay(w : array[3] of int) calls
    // fill(w); main calls fill(a) with a local array.
    let fill = Function::new(
        "fill",
        vec![ParamDecl::new("v", TypeSpec::array(3, BasicType::Int))],
        None,
        vec![],
        vec![],
    );
    let relay = Function::new(
        "relay",
        vec![ParamDecl::new("w", TypeSpec::array(3, BasicType::Int))],
        None,
        vec![],
        vec![Stmnt::Call(ast::Call::new("fill", vec![Expr::ident("w")]))],
    );
    let main = Function::new(
        "main",
        vec![],
        None,
        vec![VarDecl::new(["a"], TypeSpec::array(3, BasicType::Int))],
        vec![Stmnt::Call(ast::Call::new("fill", vec![Expr::ident("a")]))],
    );
    let code = emit(&Program::new(vec![fill, relay, main]));

    // a local array argument takes ALOAD
    assert_eq!(
        body_of(&code, "main"),
        ["ALOAD %1, a", "PUSH %1", "CALL fill", "POP", "RETURN"],
    );
    // an array parameter already holds an address: its value cell is
    // dereferenced by the ident read and pushed as-is
    assert_eq!(
        body_of(&code, "relay"),
        ["LOAD %1, w", "PUSH %1", "CALL fill", "POP", "RETURN"],
    );
}

#[test]
fn array_parameter_reads_dereference_first() {
    let sum = Function::new(
        "first",
        vec![ParamDecl::new("v", TypeSpec::array(10, BasicType::Int))],
        Some(int()),
        vec![],
        vec![Stmnt::Return(Some(Expr::index("v", Expr::int("0"))))],
    );
    let code = emit(&Program::new(vec![sum]));
    let subr = &code.subroutines()[0];
    let rendered: Vec<_> = subr
        .params()
        .iter()
        .map(|p| format!("{} {} {}", p.name, p.ty, p.is_array))
        .collect();
    assert_eq!(rendered, ["_result int false", "v int true"]);
    assert_eq!(
        body_of(&code, "first"),
        [
            "LOAD %1, v",
            "ILOAD %2, 0",
            "ILOAD %3, 1",
            "MUL %4, %2, %3",
            "LOADX %5, %1, %4",
            "LOAD _result, %5",
            "RETURN",
            "RETURN",
        ],
    );
}

#[test]
fn logical_operators_evaluate_both_sides() {
    let tree = main_with(
        vec![VarDecl::new(["x", "p", "q"], TypeSpec::basic(BasicType::Bool))],
        vec![Stmnt::assign(
            LeftExpr::ident("x"),
            Expr::binary(
                BinOp::Or,
                Expr::binary(BinOp::And, Expr::ident("p"), Expr::ident("q")),
                Expr::paren(Expr::ident("p")),
            ),
        )],
    );
    let code = emit(&tree);
    assert_eq!(
        body_of(&code, "main"),
        ["AND %1, p, q", "OR %2, %1, p", "LOAD x, %2", "RETURN"],
    );
}

#[test]
fn counters_reset_at_every_function_boundary() {
    let make = |name: &str| {
        Function::new(
            name,
            vec![],
            None,
            vec![VarDecl::new(["x"], int())],
            vec![Stmnt::assign(
                LeftExpr::ident("x"),
                Expr::binary(BinOp::Add, Expr::int("1"), Expr::int("2")),
            )],
        )
    };
    let code = emit(&Program::new(vec![make("f"), make("g")]));
    assert_eq!(body_of(&code, "f"), body_of(&code, "g"));
}

#[test]
fn push_and_pop_balance_across_calls() {
    let callee = Function::new(
        "add3",
        vec![
            ParamDecl::new("a", int()),
            ParamDecl::new("b", int()),
            ParamDecl::new("c", int()),
        ],
        Some(int()),
        vec![],
        vec![Stmnt::Return(Some(Expr::ident("a")))],
    );
    let main = Function::new(
        "main",
        vec![],
        None,
        vec![VarDecl::new(["x"], int())],
        vec![Stmnt::assign(
            LeftExpr::ident("x"),
            Expr::call(
                "add3",
                vec![Expr::int("1"), Expr::int("2"), Expr::int("3")],
            ),
        )],
    );
    let code = emit(&Program::new(vec![callee, main]));

    for subr in code.subroutines() {
        let pushes = subr
            .instructions()
            .iter()
            .filter(|i| matches!(i, asm::Instruction::Push(_)))
            .count();
        let pops = subr
            .instructions()
            .iter()
            .filter(|i| matches!(i, asm::Instruction::Pop(_)))
            .count();
        assert_eq!(pushes, pops, "unbalanced stack in {}", subr.name);
    }
}

#[test]
fn subroutines_keep_source_order_and_render_deterministically() {
    let build = || {
        Program::new(vec![
            Function::new("b", vec![], None, vec![], vec![]),
            Function::new("a", vec![], None, vec![], vec![]),
        ])
    };
    let first = emit(&build()).to_string();
    let second = emit(&build()).to_string();
    assert_eq!(first, second);
    assert_eq!(first, "subroutine b\n  RETURN\n\nsubroutine a\n  RETURN\n");
}

#[test]
fn locals_declare_basic_type_and_cell_count() {
    let tree = main_with(
        vec![
            VarDecl::new(["a"], TypeSpec::array(3, BasicType::Float)),
            VarDecl::new(["x", "y"], int()),
        ],
        vec![],
    );
    let code = emit(&tree);
    let subr = &code.subroutines()[0];
    let vars: Vec<_> = subr
        .vars()
        .iter()
        .map(|v| format!("{} {} {}", v.name, v.ty, v.size))
        .collect();
    assert_eq!(vars, ["a float 3", "x int 1", "y int 1"]);
}
