//! Shell resolution tests.

mod resolver_test;

/// Verify the public shell types are exported from the library.
#[test]
fn test_all_shell_types_exported() {
    use build_relay::shell::{
        to_subsystem_path, EnvOverlay, HostPlatform, InvocationPlan, PathMode, ResolveError,
        ShellResolver, SystemProbe, SUBSYSTEM_PROGRAM,
    };

    let _ = ShellResolver::new(
        HostPlatform::current(),
        std::sync::Arc::new(SystemProbe),
        build_relay::config::ShellConfig::default(),
    );
    let plan = InvocationPlan::new(
        "sh",
        Vec::new(),
        ".",
        EnvOverlay::new(),
        PathMode::default(),
    );
    assert_eq!(plan.path_mode(), PathMode::None);
    assert_eq!(SUBSYSTEM_PROGRAM, "wsl");
    assert_eq!(to_subsystem_path("/already/posix"), "/already/posix");

    let _: fn() -> ResolveError = || ResolveError::InterpreterNotFound { searched: Vec::new() };
}
