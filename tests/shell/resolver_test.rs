//! Resolver tests against the real filesystem.

use std::path::Path;
use std::sync::Arc;

use build_relay::config::{BuildConfig, BuildDefaults, BuildRequest, ShellConfig};
use build_relay::shell::{HostPlatform, PathMode, ResolveError, ShellResolver, SystemProbe};

fn system_resolver(platform: HostPlatform) -> ShellResolver {
    ShellResolver::new(platform, Arc::new(SystemProbe), ShellConfig::default())
}

#[tokio::test]
async fn test_missing_script_never_yields_plan() {
    let dir = tempfile::tempdir().unwrap();
    let result = system_resolver(HostPlatform::current())
        .resolve(dir.path(), Path::new("scripts/build_with_config"), Default::default())
        .await;

    assert!(result.is_err());
}

#[cfg(unix)]
mod unix {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    fn write_script(root: &Path, mode: u32) {
        let path = root.join("scripts/build_with_config");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "#!/bin/sh\necho ok\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
    }

    #[tokio::test]
    async fn test_plan_points_at_executable_script() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), 0o755);

        let build = BuildConfig::from_request(
            BuildRequest {
                app_dir: Some("site".to_string()),
                out_name: None,
            },
            &BuildDefaults::default(),
        )
        .unwrap();

        let plan = system_resolver(HostPlatform::Linux)
            .resolve(
                dir.path(),
                Path::new("scripts/build_with_config"),
                build.env_overlay(),
            )
            .await
            .unwrap();

        let metadata = std::fs::metadata(plan.program()).unwrap();
        assert!(metadata.is_file());
        assert_ne!(metadata.permissions().mode() & 0o111, 0);
        assert!(plan.args().is_empty());
        assert_eq!(plan.working_dir(), dir.path());
        assert_eq!(plan.path_mode(), PathMode::None);
        assert_eq!(plan.env()["APP_DIR"], "site");
        assert_eq!(plan.env()["OUT_NAME"], "minirend");
    }

    #[tokio::test]
    async fn test_non_executable_script_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), 0o644);

        let result = system_resolver(HostPlatform::Linux)
            .resolve(dir.path(), Path::new("scripts/build_with_config"), Default::default())
            .await;

        assert!(matches!(result, Err(ResolveError::ScriptNotExecutable(_))));
    }
}
