//! Backend behavior: canonicalization, register allocation, and the
//! emitted RV32 listing.

use rv32_compiler::backend::canon::canonicalize;
use rv32_compiler::backend::regalloc::RegisterAllocator;
use rv32_compiler::backend::{compile_ir_to_riscv, AsmItem, CodegenError, Register, RvInstr};
use rv32_compiler::{compile_to_ir, compile_to_riscv};
use rv32_compiler::ir::{BinOp, Instruction, Value, Var};
use std::collections::{HashMap, HashSet};

fn var(name: &str) -> Var {
    Var::named(name)
}

// ---------------------------------------------------------------------------
// Canonicalization
// ---------------------------------------------------------------------------

#[test]
fn imm_imm_folds_to_mov() {
    let out = canonicalize(&[Instruction::binary(
        BinOp::Add,
        var("$t0"),
        Value::Imm(2),
        Value::Imm(3),
    )])
    .unwrap();
    assert_eq!(out, vec![Instruction::mov(var("$t0"), Value::Imm(5))]);
}

#[test]
fn pow_zero_exponent_folds_to_one() {
    let out = canonicalize(&[Instruction::binary(
        BinOp::Pow,
        var("$t0"),
        Value::Imm(7),
        Value::Imm(0),
    )])
    .unwrap();
    assert_eq!(out, vec![Instruction::mov(var("$t0"), Value::Imm(1))]);
}

#[test]
fn folding_wraps_on_overflow() {
    let out = canonicalize(&[Instruction::binary(
        BinOp::Mul,
        var("$t0"),
        Value::Imm(i32::MAX),
        Value::Imm(2),
    )])
    .unwrap();
    assert_eq!(
        out,
        vec![Instruction::mov(
            var("$t0"),
            Value::Imm(i32::MAX.wrapping_mul(2))
        )]
    );
}

#[test]
fn commutative_add_swaps_left_immediate() {
    let out = canonicalize(&[Instruction::binary(
        BinOp::Add,
        var("$t0"),
        Value::Imm(1),
        Value::var("x"),
    )])
    .unwrap();
    // One instruction, immediate on the right.
    assert_eq!(
        out,
        vec![Instruction::binary(
            BinOp::Add,
            var("$t0"),
            Value::var("x"),
            Value::Imm(1),
        )]
    );
}

#[test]
fn sub_left_immediate_is_materialized() {
    let out = canonicalize(&[Instruction::binary(
        BinOp::Sub,
        var("$t0"),
        Value::Imm(5),
        Value::var("x"),
    )])
    .unwrap();
    assert_eq!(
        out,
        vec![
            Instruction::mov(var("$c0"), Value::Imm(5)),
            Instruction::binary(BinOp::Sub, var("$t0"), Value::var("$c0"), Value::var("x")),
        ]
    );
}

#[test]
fn sub_right_immediate_passes_through() {
    let ins = Instruction::binary(BinOp::Sub, var("$t0"), Value::var("x"), Value::Imm(5));
    let out = canonicalize(&[ins.clone()]).unwrap();
    assert_eq!(out, vec![ins]);
}

#[test]
fn mul_right_immediate_is_materialized() {
    let out = canonicalize(&[Instruction::binary(
        BinOp::Mul,
        var("$t0"),
        Value::var("x"),
        Value::Imm(4),
    )])
    .unwrap();
    assert_eq!(
        out,
        vec![
            Instruction::mov(var("$c0"), Value::Imm(4)),
            Instruction::binary(BinOp::Mul, var("$t0"), Value::var("x"), Value::var("$c0")),
        ]
    );
}

#[test]
fn instructions_after_ret_are_dropped() {
    let out = canonicalize(&[
        Instruction::mov(var("a"), Value::Imm(1)),
        Instruction::ret(Value::var("a")),
        Instruction::mov(var("b"), Value::Imm(2)),
    ])
    .unwrap();
    assert_eq!(
        out,
        vec![
            Instruction::mov(var("a"), Value::Imm(1)),
            Instruction::ret(Value::var("a")),
        ]
    );
}

#[test]
fn canonicalization_is_idempotent() {
    let raw = vec![
        Instruction::binary(BinOp::Add, var("$t0"), Value::Imm(1), Value::var("x")),
        Instruction::binary(BinOp::Sub, var("$t1"), Value::Imm(9), Value::var("$t0")),
        Instruction::binary(BinOp::Mul, var("$t2"), Value::var("$t1"), Value::Imm(3)),
        Instruction::ret(Value::var("$t2")),
    ];
    let once = canonicalize(&raw).unwrap();
    let twice = canonicalize(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn negative_constant_exponent_is_rejected() {
    let err = canonicalize(&[Instruction::binary(
        BinOp::Pow,
        var("$t0"),
        Value::Imm(2),
        Value::Imm(-1),
    )])
    .unwrap_err();
    assert!(matches!(
        err,
        CodegenError::NegativeExponent { base: 2, exp: -1 }
    ));
}

// ---------------------------------------------------------------------------
// Register allocation
// ---------------------------------------------------------------------------

#[test]
fn allocation_is_first_fit_and_stable() {
    let mut regs = RegisterAllocator::new();
    let a = regs.allocate_var(&var("a"), 0, &[]).unwrap();
    let b = regs.allocate_var(&var("b"), 0, &[]).unwrap();
    assert_eq!(a, Register::T0);
    assert_eq!(b, Register::T1);
    // Asking again never moves a bound variable.
    assert_eq!(regs.allocate_var(&var("a"), 0, &[]).unwrap(), Register::T0);
}

#[test]
fn dead_occupant_is_reclaimed_in_register_order() {
    let names: Vec<Var> = (0..7).map(|i| var(&format!("v{}", i))).collect();
    // v0 and v1 stay live; v2..v6 are never referenced again.
    let instrs = vec![
        Instruction::binary(BinOp::Add, var("x"), Value::Var(names[0].clone()), Value::Var(names[1].clone())),
        Instruction::ret(Value::var("x")),
    ];

    let mut regs = RegisterAllocator::new();
    for name in &names {
        regs.allocate_var(name, 0, &instrs).unwrap();
    }
    let x = regs.allocate_var(&var("x"), 0, &instrs).unwrap();
    assert_eq!(x, Register::T2);
}

#[test]
fn bindings_stay_bijective_across_eviction() {
    let names: Vec<Var> = (0..7).map(|i| var(&format!("v{}", i))).collect();
    let instrs = vec![
        Instruction::binary(BinOp::Add, var("w"), Value::Var(names[0].clone()), Value::Var(names[1].clone())),
        Instruction::binary(BinOp::Add, var("x"), Value::Var(names[2].clone()), Value::Var(names[3].clone())),
        Instruction::binary(BinOp::Add, var("y"), Value::Var(names[4].clone()), Value::Var(names[5].clone())),
        Instruction::ret(Value::var("y")),
    ];

    let mut regs = RegisterAllocator::new();
    for name in &names {
        regs.allocate_var(name, 0, &instrs).unwrap();
    }
    // v6 is dead from instruction 0 on, so w evicts it.
    regs.allocate_var(&var("w"), 0, &instrs).unwrap();

    let bound: Vec<(&Var, Register)> = regs.bindings().collect();
    assert_eq!(bound.len(), 7);
    let distinct_regs: HashSet<Register> = bound.iter().map(|&(_, r)| r).collect();
    assert_eq!(distinct_regs.len(), 7);
    assert!(bound.iter().all(|&(v, _)| v.name != "v6"));
}

#[test]
fn exhaustion_when_all_occupants_stay_live() {
    let mut instrs: Vec<Instruction> = (0..7)
        .map(|i| Instruction::mov(var(&format!("v{}", i)), Value::Imm(i)))
        .collect();
    instrs.extend([
        Instruction::binary(BinOp::Add, var("w"), Value::var("v0"), Value::var("v1")),
        Instruction::binary(BinOp::Add, var("x"), Value::var("v2"), Value::var("v3")),
        Instruction::binary(BinOp::Add, var("y"), Value::var("v4"), Value::var("v5")),
        Instruction::binary(BinOp::Add, var("z"), Value::var("v6"), Value::var("w")),
        Instruction::ret(Value::var("z")),
    ]);

    let err = compile_ir_to_riscv(&instrs).unwrap_err();
    assert!(matches!(err, CodegenError::RegisterExhaustion { var } if var == "w"));
}

#[test]
fn uncanonicalized_immediate_multiply_is_rejected() {
    let mut gen = rv32_compiler::backend::AssemblyGenerator::new();
    let instrs = [Instruction::binary(
        BinOp::Mul,
        var("$t0"),
        Value::Imm(2),
        Value::Imm(3),
    )];
    let err = gen.run(&instrs).unwrap_err();
    assert!(matches!(err, CodegenError::ImmediateOperand { .. }));
}

// ---------------------------------------------------------------------------
// Emitted listing
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_listing_and_register_pressure() {
    let asm = compile_to_riscv("a = 1 + 2 * 3; return a;").unwrap();
    let lines: Vec<&str> = asm.lines().collect();
    assert_eq!(
        lines,
        vec![
            ".text",
            "\tli t0, 6\t\t# (MOV, $t0, 6)",
            "\taddi t1, t0, 1\t\t# (ADD, $t1, $t0, 1)",
            "\tmv t2, t1\t\t# (MOV, a, $t1)",
            "\tmv a0, t2\t\t# (RET, a)",
        ]
    );
}

#[test]
fn listing_truncates_after_ret() {
    let instrs = vec![
        Instruction::mov(var("a"), Value::Imm(1)),
        Instruction::ret(Value::var("a")),
        Instruction::mov(var("b"), Value::Imm(2)),
    ];
    let asm = compile_ir_to_riscv(&instrs).unwrap();
    // .text, li, mv a0 -- nothing after the return move.
    assert_eq!(asm.items.len(), 3);
}

#[test]
fn ret_of_immediate_loads_a0_directly() {
    let asm = compile_ir_to_riscv(&[Instruction::ret(Value::Imm(42))]).unwrap();
    assert!(matches!(
        &asm.items[1],
        AsmItem::Instr {
            instr: RvInstr::Li {
                d: Register::A0,
                imm: 42
            },
            ..
        }
    ));
}

// ---------------------------------------------------------------------------
// Power expansion, checked by executing the listing
// ---------------------------------------------------------------------------

/// Minimal executor for the straight-line subset the backend emits.
/// Returns the final register file and the number of times each label
/// was reached.
fn execute(items: &[AsmItem]) -> (HashMap<Register, i32>, HashMap<String, u32>) {
    let mut labels: HashMap<&str, usize> = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        if let AsmItem::Label(name) = item {
            labels.insert(name, i);
        }
    }

    let mut regs: HashMap<Register, i32> = HashMap::new();
    let mut visits: HashMap<String, u32> = HashMap::new();
    let mut pc = 0usize;
    let mut fuel = 10_000u32;

    while pc < items.len() {
        fuel -= 1;
        assert!(fuel > 0, "listing did not terminate");
        match &items[pc] {
            AsmItem::Section(_) => pc += 1,
            AsmItem::Label(name) => {
                *visits.entry(name.clone()).or_default() += 1;
                pc += 1;
            }
            AsmItem::Instr { instr, .. } => {
                let get = |r: &Register| regs.get(r).copied().unwrap_or(0);
                let mut next = pc + 1;
                let write = match instr {
                    RvInstr::Add { d, a, b } => Some((*d, get(a).wrapping_add(get(b)))),
                    RvInstr::Addi { d, a, imm } => Some((*d, get(a).wrapping_add(*imm))),
                    RvInstr::Sub { d, a, b } => Some((*d, get(a).wrapping_sub(get(b)))),
                    RvInstr::Subi { d, a, imm } => Some((*d, get(a).wrapping_sub(*imm))),
                    RvInstr::Mul { d, a, b } => Some((*d, get(a).wrapping_mul(get(b)))),
                    RvInstr::Mv { d, s } => Some((*d, get(s))),
                    RvInstr::Li { d, imm } => Some((*d, *imm)),
                    RvInstr::Blez { s, target } => {
                        if get(s) <= 0 {
                            next = labels[target.as_str()];
                        }
                        None
                    }
                    RvInstr::Jump { target } => {
                        next = labels[target.as_str()];
                        None
                    }
                };
                if let Some((reg, value)) = write {
                    regs.insert(reg, value);
                }
                pc = next;
            }
        }
    }

    (regs, visits)
}

#[test]
fn pow_loop_computes_the_power() {
    let (instrs, _) =
        compile_to_ir("int a; int b; int c; a = 5; b = 3; c = a ** b; return c;").unwrap();
    let asm = compile_ir_to_riscv(&instrs).unwrap();

    let (regs, visits) = execute(&asm.items);
    assert_eq!(regs[&Register::A0], 125);
    // Exponent 3: the loop head is reached once by fall-through and
    // twice more by the back edge.
    assert_eq!(visits["pow_loop_0"], 3);
}

#[test]
fn pow_expansions_use_distinct_labels() {
    let (instrs, _) = compile_to_ir(
        "int a; int b; a = 2; b = 3; return a ** b + b ** a;",
    )
    .unwrap();
    let asm = compile_ir_to_riscv(&instrs).unwrap();

    let labels: Vec<&String> = asm
        .items
        .iter()
        .filter_map(|item| match item {
            AsmItem::Label(name) => Some(name),
            _ => None,
        })
        .collect();
    let distinct: HashSet<&String> = labels.iter().copied().collect();
    assert_eq!(labels.len(), distinct.len());
    assert_eq!(labels.len(), 4);

    let (regs, _) = execute(&asm.items);
    assert_eq!(regs[&Register::A0], 2i32.pow(3) + 3i32.pow(2));
}
