use anyhow::Context;
use clap::Parser;
use rv32_compiler::{compile_to_ir, ir};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rv32c")]
#[command(about = "A compiler from a small imperative language to RV32 assembly")]
struct Args {
    /// Path to the source file to compile; a built-in sample is used when omitted
    file: Option<PathBuf>,

    /// Emit the three-address IR. If none of --ir/--asm/--both is given, defaults to --asm.
    #[arg(long)]
    ir: bool,

    /// Emit RV32 assembly
    #[arg(long)]
    asm: bool,

    /// Emit both IR and RV32 assembly
    #[arg(long)]
    both: bool,

    /// Write output here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log compilation stages to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let src = match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading source file '{}'", path.display()))?,
        None => DEFAULT_SAMPLE.trim().to_string(),
    };

    let mut want_ir = args.ir;
    let mut want_asm = args.asm;
    if args.both {
        want_ir = true;
        want_asm = true;
    }
    if !want_ir && !want_asm {
        want_asm = true;
    }

    let (instrs, _symtab) = compile_to_ir(&src).context("compilation failed")?;

    let mut out = String::new();
    if want_ir {
        for line in ir::ir_to_lines(&instrs) {
            out.push_str(&line);
            out.push('\n');
        }
        if want_asm {
            out.push('\n');
        }
    }
    if want_asm {
        let asm =
            rv32_compiler::backend::compile_ir_to_riscv(&instrs).context("code generation failed")?;
        out.push_str(&asm.to_string());
    }

    match &args.output {
        Some(path) => fs::write(path, &out)
            .with_context(|| format!("writing output file '{}'", path.display()))?,
        None => print!("{}", out),
    }

    Ok(())
}

const DEFAULT_SAMPLE: &str = r#"
int a;
int b;
int c;
a = 8;
b = (a + 1) * 2 - 3;
c = a ** 2;
return b + c;
"#;
