//! `semharness` — a data-driven conformance runner for the consteval
//! evaluator and the type-directed matcher.
//!
//! This is deliberately *not* a front end for the source language: concrete
//! syntax, the lexer, the parser, and code generation are all out of scope
//! (spec §1). What it drives is the two subsystems that are in scope,
//! against fixtures described in the small JSON format `fixture` defines,
//! the way the teacher's `seqc lint`/`seqc test` subcommands drive their
//! own core over real `.seq` files.

mod ctx;
mod fixture;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use semcore::config::CoreConfig;
use semcore::diagnostics::Warning;
use semcore::types::TypeArena;
use semcore::value::WithArena;
use semengine::eval::{fold_expr, Intensity};
use semengine::matcher;

use ctx::HarnessCtx;
use fixture::{build_expr, build_type, Fixture, Op};

#[derive(Parser)]
#[command(name = "semharness")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Conformance runner for the consteval evaluator and type-directed matcher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every case in a fixture file, printing outcomes and checking any
    /// `expect` blocks present.
    Run {
        /// Path to a fixture JSON file.
        fixture: PathBuf,

        /// Enable a warning (`-Wint-overflow`); warnings are on by default.
        #[arg(short = 'W', value_name = "name")]
        enable_warnings: Vec<String>,

        /// Disable a warning (`-Wno-int-overflow`).
        #[arg(long = "Wno", value_name = "name")]
        disabled_warnings: Vec<String>,

        /// Escalate a warning to an error (`-Werror=int-overflow`).
        #[arg(long = "Werror", value_name = "name")]
        werror_warnings: Vec<String>,

        /// Set a compile-time option consulted by `is_option_set` (`-Fname=value`).
        #[arg(short = 'F', value_name = "name[=value]")]
        options: Vec<String>,

        /// Drive `is_comptime`/`compile_error` under aggressive consteval.
        #[arg(long)]
        aggressive_consteval: bool,

        /// Print results as JSON instead of the default human-readable form.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            fixture,
            enable_warnings,
            disabled_warnings,
            werror_warnings,
            options,
            aggressive_consteval,
            json,
        } => run_fixture(
            &fixture,
            &enable_warnings,
            &disabled_warnings,
            &werror_warnings,
            &options,
            aggressive_consteval,
            json,
        ),
    }
}

fn parse_warning(name: &str) -> Option<Warning> {
    use Warning::*;
    Some(match name {
        "int-overflow" => IntOverflow,
        "int-divide-by-zero" => IntDivideByZero,
        "float-overflow" => FloatOverflow,
        "float-divide-by-zero" => FloatDivideByZero,
        "float-nan-math" => FloatNanMath,
        "unknown-attribute" => UnknownAttribute,
        "null-pointer-dereference" => NullPointerDereference,
        "unused-value" => UnusedValue,
        "unclosed-comment" => UnclosedComment,
        "mismatched-brace-indent" => MismatchedBraceIndent,
        "unused-variable" => UnusedVariable,
        "greek-question-mark" => GreekQuestionMark,
        "bad-file-extension" => BadFileExtension,
        "unknown-target" => UnknownTarget,
        "invalid-unicode" => InvalidUnicode,
        "nan-compare" => NanCompare,
        "out-of-bounds-index" => OutOfBoundsIndex,
        "math-domain-error" => MathDomainError,
        "binary-stdout" => BinaryStdout,
        "is-comptime-always-true" => IsComptimeAlwaysTrue,
        "non-exhaustive-switch" => NonExhaustiveSwitch,
        "unneeded-else" => UnneededElse,
        "assign-in-condition" => AssignInCondition,
        "get-value-null" => GetValueNull,
        "enum-value-overflow" => EnumValueOverflow,
        "sizeof-reference-expression" => SizeofReferenceExpression,
        "comptime-warning" => ComptimeWarning,
        _ => return None,
    })
}

fn build_config(
    disabled: &[String],
    werror: &[String],
    options: &[String],
    aggressive_consteval: bool,
) -> CoreConfig {
    let mut config = CoreConfig::new().with_aggressive_consteval(aggressive_consteval);
    for name in disabled {
        match parse_warning(name) {
            Some(w) => config = config.with_disabled_warning(w),
            None => eprintln!("semharness: unknown warning `{name}` in -Wno, ignoring"),
        }
    }
    for name in werror {
        match parse_warning(name) {
            Some(w) => config = config.with_werror(w),
            None => eprintln!("semharness: unknown warning `{name}` in -Werror, ignoring"),
        }
    }
    for opt in options {
        match opt.split_once('=') {
            Some((name, value)) => config = config.with_option(name, value),
            None => config = config.with_option(opt.as_str(), ""),
        }
    }
    config
}

struct CaseOutcome {
    name: String,
    ok: bool,
    detail: String,
}

#[allow(clippy::too_many_arguments)]
fn run_fixture(
    path: &PathBuf,
    _enable_warnings: &[String],
    disabled_warnings: &[String],
    werror_warnings: &[String],
    options: &[String],
    aggressive_consteval: bool,
    json: bool,
) -> ExitCode {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("semharness: cannot read {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };
    let fixture: Fixture = match serde_json::from_str(&text) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("semharness: malformed fixture {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let config = build_config(disabled_warnings, werror_warnings, options, aggressive_consteval);
    let mut outcomes = Vec::new();
    let mut any_failed = false;

    for case in &fixture.cases {
        let mut types = TypeArena::new();
        let mut expr = build_expr(&case.expr, &mut types, &fixture.consteval_vars);
        let mut ctx = HarnessCtx::new(config.clone());

        let (ok, detail) = match case.op {
            Op::FoldGuaranteed | Op::FoldForceWithError | Op::FoldForceWithoutError => {
                let intensity = match case.op {
                    Op::FoldGuaranteed => Intensity::Guaranteed,
                    Op::FoldForceWithError => Intensity::ForceWithError,
                    _ => Intensity::ForceWithoutError,
                };
                fold_expr(&mut expr, intensity, &mut ctx, &mut types, &config);
                check_fold(&case.expect, &expr, &types, &ctx)
            }
            Op::CanMatch => {
                let dest = build_type(case.dest.as_ref().expect("can_match needs `dest`"), &mut types);
                let matched = matcher::can_match(&expr, dest, &mut types, &mut ctx);
                check_bool("can_match", case.expect.matched, matched)
            }
            Op::MatchLevel => {
                let dest = build_type(case.dest.as_ref().expect("match_level needs `dest`"), &mut types);
                let level = matcher::match_level(&expr, dest, &mut types, &mut ctx);
                check_bool("match_level", case.expect.matched, level.is_some())
            }
            Op::MatchedType => {
                let dest = build_type(case.dest.as_ref().expect("matched_type needs `dest`"), &mut types);
                let deduced = matcher::matched_type(&expr, dest, &mut types, &mut ctx);
                check_bool("matched_type", case.expect.matched, deduced.is_some())
            }
            Op::MatchExpression => {
                let dest =
                    build_type(case.dest.as_ref().expect("match_expression needs `dest`"), &mut types);
                let matched = matcher::match_expression(&mut expr, dest, &mut types, &mut ctx);
                check_match_expression(&case.expect, matched, &ctx)
            }
        };

        let warnings_ok = check_warnings(&case.expect.warnings, &ctx);
        let ok = ok && warnings_ok;
        any_failed |= !ok;
        outcomes.push(CaseOutcome { name: case.name.clone(), ok, detail });
    }

    if json {
        let rendered: Vec<_> = outcomes
            .iter()
            .map(|o| serde_json::json!({"name": o.name, "ok": o.ok, "detail": o.detail}))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rendered).unwrap());
    } else {
        for o in &outcomes {
            println!("[{}] {} — {}", if o.ok { "ok" } else { "FAIL" }, o.name, o.detail);
        }
        println!(
            "{}/{} cases passed",
            outcomes.iter().filter(|o| o.ok).count(),
            outcomes.len()
        );
    }

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn check_fold(
    expect: &fixture::Expect,
    expr: &semcore::Expr,
    types: &TypeArena,
    ctx: &HarnessCtx,
) -> (bool, String) {
    let rendered = expr
        .folded_value
        .as_ref()
        .map(|v| format!("{}", WithArena(types, v)));
    let mut ok = true;
    if let Some(expected) = &expect.value {
        ok &= rendered.as_deref() == Some(expected.as_str());
    }
    if let Some(expected_error) = expect.error {
        ok &= !ctx.errors.is_empty() == expected_error;
    }
    let detail = match &rendered {
        Some(v) => format!("folded to {v} ({:?})", expr.consteval_state),
        None => format!("did not fold ({:?})", expr.consteval_state),
    };
    (ok, detail)
}

fn check_bool(label: &str, expected: Option<bool>, actual: bool) -> (bool, String) {
    let ok = expected.map(|e| e == actual).unwrap_or(true);
    (ok, format!("{label} = {actual}"))
}

fn check_match_expression(
    expect: &fixture::Expect,
    matched: bool,
    ctx: &HarnessCtx,
) -> (bool, String) {
    let mut ok = expect.matched.map(|e| e == matched).unwrap_or(true);
    if let Some(expected_error) = expect.error {
        ok &= !ctx.errors.is_empty() == expected_error;
    }
    (ok, format!("match_expression = {matched}, errors = {}", ctx.errors.len()))
}

fn check_warnings(expected: &[String], ctx: &HarnessCtx) -> bool {
    if expected.is_empty() {
        return true;
    }
    expected.iter().all(|name| {
        ctx.warnings.iter().any(|w| w.kind.name() == name)
            || ctx.suppressed_warnings.iter().any(|w| w.kind.name() == name)
    })
}
