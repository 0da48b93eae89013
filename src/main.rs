//! xcmd CLI — a small demonstration host for the interpreter.
//!
//! Registers a handful of interfaces (`print_text`, `print_number`,
//! `announce`, `cond_true`, `cond_false`) and a C-style backslash escape
//! parser, then runs either a script file or one of two built-in demo
//! scripts (grounded in the original project's `test.c`).

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use xcmd::{Context, FuncInfo, Status};

/// Run an xcmd script against the built-in demo interfaces.
#[derive(Parser, Debug)]
#[command(name = "xcmd", version, about)]
struct Cli {
    /// Path to a script file. If omitted, runs the built-in demo scripts.
    script: Option<PathBuf>,

    /// Run the script inline instead of reading a file.
    #[arg(long, conflicts_with = "script")]
    inline: Option<String>,

    /// Enable trace-level logging of step/run/branch transitions.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Trace);
    }
    builder.init();

    let funcs = demo_funcs();
    let mut ctx: Context<'_, ()> = match Context::open(funcs, Some(is_extra_separator)) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("xcmd: failed to open context: {e}");
            return ExitCode::FAILURE;
        }
    };
    ctx.set_escape_hooks(is_backslash, parse_backslash_escape);

    if let Some(script) = cli.inline {
        return exit_code_for(run_script(&mut ctx, &script));
    }

    if let Some(path) = cli.script {
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("xcmd: cannot read {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        };
        return exit_code_for(run_script(&mut ctx, &text));
    }

    for script in DEMO_SCRIPTS {
        info!("running demo script: {script}");
        let status = run_script(&mut ctx, script);
        if status != Status::Ok {
            return exit_code_for(status);
        }
    }
    ExitCode::SUCCESS
}

fn run_script<'a>(ctx: &mut Context<'a, ()>, text: &'a str) -> Status {
    ctx.load(text);
    loop {
        match ctx.run() {
            Status::Ok => return Status::Ok,
            Status::Suspend => {
                info!("script suspended at byte {}, resuming", ctx.cursor_pos());
                continue;
            }
            status => {
                eprintln!("xcmd: script failed at byte {}: {status:?}", ctx.cursor_pos());
                return status;
            }
        }
    }
}

fn exit_code_for(status: Status) -> ExitCode {
    if status == Status::Ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

const DEMO_SCRIPTS: [&str; 2] = [
    r#"if cond_true then print_number 3.14 elseif cond_false then print_text "hello world" else announce endif"#,
    r#"if cond_true then if cond_false then announce elseif cond_false then announce endif announce endif print_text "hello world""#,
];

fn demo_funcs() -> Vec<FuncInfo<()>> {
    vec![
        FuncInfo::new("print_text", print_text),
        FuncInfo::new("print_number", print_number),
        FuncInfo::new("announce", announce),
        FuncInfo::new("cond_true", cond_true),
        FuncInfo::new("cond_false", cond_false),
    ]
}

fn print_text(ctx: &mut Context<'_, ()>) -> Status {
    let mut buf = [0u8; 64];
    if ctx.has_param() == Status::Ok {
        let status = ctx.pop_string(&mut buf);
        if status != Status::Ok {
            return status;
        }
        let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        println!("print_text: {}", String::from_utf8_lossy(&buf[..len]));
    } else {
        println!("print_text: (no param)");
    }
    Status::Ok
}

fn print_number(ctx: &mut Context<'_, ()>) -> Status {
    if ctx.has_param() == Status::Ok {
        let mut value = 0.0;
        let status = ctx.pop_double(&mut value);
        if status != Status::Ok {
            return status;
        }
        println!("print_number: {value}");
    } else {
        println!("print_number: (no param)");
    }
    Status::Ok
}

fn announce(_ctx: &mut Context<'_, ()>) -> Status {
    println!("announce");
    Status::Ok
}

fn cond_true(ctx: &mut Context<'_, ()>) -> Status {
    ctx.push_bool(true)
}

fn cond_false(ctx: &mut Context<'_, ()>) -> Status {
    ctx.push_bool(false)
}

/// `@` is treated as an extra separator on top of the fixed set.
fn is_extra_separator(b: u8) -> bool {
    b == b'@'
}

fn is_backslash(b: u8) -> bool {
    b == b'\\'
}

/// Consume one backslash escape from `src` (advancing `src_pos` past the
/// backslash and the escaped character), writing the decoded byte to the
/// front of `dst`. Returns 0 for an unrecognized escape character or end
/// of input right after the backslash.
fn parse_backslash_escape(src: &[u8], src_pos: &mut usize, dst: &mut [u8]) -> usize {
    let Some(&escaped) = src.get(*src_pos + 1) else {
        return 0;
    };
    let decoded = match escaped {
        b'"' => b'"',
        b'\\' => b'\\',
        b'/' => b'/',
        b'b' => 0x08,
        b'f' => 0x0c,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        _ => return 0,
    };
    if dst.is_empty() {
        return 0;
    }
    dst[0] = decoded;
    *src_pos += 2;
    1
}
