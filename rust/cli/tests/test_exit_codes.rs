//! Exit codes and where output goes.

fn run(args: &[&str]) -> (i32, String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = dicehall_cli::run(args.to_vec(), &mut out, &mut err);
    (
        code,
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[test]
fn help_goes_to_stdout_with_zero() {
    let (code, out, err) = run(&["dicehall", "--help"]);
    assert_eq!(code, 0);
    assert!(err.is_empty());
    for c in ["eval", "deal", "sim", "rng", "cfg"] {
        assert!(out.contains(c), "help should list `{}`", c);
    }
}

#[test]
fn version_goes_to_stdout_with_zero() {
    let (code, out, _) = run(&["dicehall", "--version"]);
    assert_eq!(code, 0);
    assert!(out.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_command_prints_usage_with_two() {
    let (code, out, err) = run(&["dicehall", "shuffle"]);
    assert_eq!(code, 2);
    assert!(out.is_empty());
    assert!(err.contains("Usage: dicehall <command> [options]"));
    assert!(err.contains("  sim"));
}

#[test]
fn missing_required_flag_is_a_usage_error() {
    let (code, _, err) = run(&["dicehall", "eval"]);
    assert_eq!(code, 2);
    assert!(err.contains("--dice"));
}

#[test]
fn unknown_variant_is_invalid_input() {
    let (code, _, err) = run(&["dicehall", "eval", "--dice", "1,1,1,1,1", "--variant", "poker"]);
    assert_eq!(code, 2);
    assert!(err.contains("Invalid input"), "{}", err);
}
