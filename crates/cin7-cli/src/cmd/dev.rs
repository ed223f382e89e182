use anyhow::Context;
use cin7_core::{
    package_json::PackageJson, package_manager::PackageManager, paths, process::CommandSpec,
    scaffold::DEV_SERVER_PORT, Cin7Error,
};
use clap::Args;
use std::path::Path;

#[derive(Args)]
pub struct DevArgs {
    /// Port for the dev server
    #[arg(long, short = 'p', default_value_t = DEV_SERVER_PORT)]
    pub port: u16,

    /// Open the browser once the server is up
    #[arg(long)]
    pub open: bool,

    /// Serve over HTTPS
    #[arg(long)]
    pub https: bool,

    /// Host to bind
    #[arg(long, default_value = "localhost")]
    pub host: String,
}

impl DevArgs {
    fn url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Vite flags, forwarded only when the project has a vite config.
    fn vite_flags(&self) -> Vec<String> {
        let mut flags = vec![
            "--port".to_string(),
            self.port.to_string(),
            "--host".to_string(),
            self.host.clone(),
        ];
        if self.open {
            flags.push("--open".to_string());
        }
        if self.https {
            flags.push("--https".to_string());
        }
        flags
    }
}

pub fn run(root: &Path, args: DevArgs) -> anyhow::Result<()> {
    paths::require_project(root)?;
    let pkg = PackageJson::load(root).context("failed to read package.json")?;
    let manager = PackageManager::detect(root);
    let spec = dev_command(root, &pkg, manager, &args)?;

    println!("Starting dev server: {spec}");
    println!("Local: {}", args.url());
    tracing::info!(command = %spec, "spawning dev server");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let code = rt.block_on(supervise(&spec))?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// `<pm> run dev` when the project has a dev script, else `npx vite` when a
/// vite config exists.
fn dev_command(
    root: &Path,
    pkg: &PackageJson,
    manager: PackageManager,
    args: &DevArgs,
) -> Result<CommandSpec, Cin7Error> {
    let has_vite = paths::has_vite_config(root);
    let flags = if has_vite { args.vite_flags() } else { Vec::new() };
    if pkg.has_script("dev") {
        Ok(CommandSpec::new(manager.as_str(), root).args(manager.run_script_args("dev", &flags)))
    } else if has_vite {
        Ok(CommandSpec::new("npx", root).arg("vite").args(flags))
    } else {
        Err(Cin7Error::NoDevCommand)
    }
}

/// Run the server until it exits or a shutdown signal arrives. Returns the
/// exit code to propagate; a signal counts as a clean stop.
async fn supervise(spec: &CommandSpec) -> anyhow::Result<i32> {
    let mut command = tokio::process::Command::from(spec.to_command()?);
    command.kill_on_drop(true);
    let mut child = command
        .spawn()
        .with_context(|| format!("failed to start `{spec}`"))?;

    let exited = tokio::select! {
        status = child.wait() => Some(status.context("failed to wait for dev server")?),
        _ = shutdown_signal() => None,
    };

    match exited {
        Some(status) if status.success() => Ok(0),
        Some(status) => {
            tracing::warn!(%status, "dev server exited");
            Ok(status.code().unwrap_or(1))
        }
        None => {
            println!("\nShutting down dev server...");
            if let Err(e) = child.kill().await {
                tracing::debug!(error = %e, "dev server already stopped");
            }
            Ok(0)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args() -> DevArgs {
        DevArgs {
            port: 4000,
            open: true,
            https: false,
            host: "0.0.0.0".to_string(),
        }
    }

    fn project(dev_script: bool, vite: bool) -> (TempDir, PackageJson) {
        let dir = TempDir::new().unwrap();
        let scripts = if dev_script {
            r#"{"dev": "vite"}"#
        } else {
            "{}"
        };
        std::fs::write(
            dir.path().join("package.json"),
            format!(r#"{{"name": "app", "scripts": {scripts}}}"#),
        )
        .unwrap();
        if vite {
            std::fs::write(dir.path().join("vite.config.js"), "export default {};\n").unwrap();
        }
        let pkg = PackageJson::load(dir.path()).unwrap();
        (dir, pkg)
    }

    #[test]
    fn dev_script_with_vite_forwards_flags() {
        let (dir, pkg) = project(true, true);
        let spec = dev_command(dir.path(), &pkg, PackageManager::Npm, &args()).unwrap();
        assert_eq!(spec.program, "npm");
        assert_eq!(
            spec.args,
            ["run", "dev", "--", "--port", "4000", "--host", "0.0.0.0", "--open"]
        );
    }

    #[test]
    fn dev_script_without_vite_config_gets_no_flags() {
        let (dir, pkg) = project(true, false);
        let spec = dev_command(dir.path(), &pkg, PackageManager::Pnpm, &args()).unwrap();
        assert_eq!(spec.program, "pnpm");
        assert_eq!(spec.args, ["run", "dev"]);
    }

    #[test]
    fn falls_back_to_npx_vite() {
        let (dir, pkg) = project(false, true);
        let spec = dev_command(dir.path(), &pkg, PackageManager::Npm, &args()).unwrap();
        assert_eq!(spec.program, "npx");
        assert_eq!(spec.args[0], "vite");
        assert!(spec.args.contains(&"--open".to_string()));
    }

    #[test]
    fn no_script_and_no_config_is_an_error() {
        let (dir, pkg) = project(false, false);
        let err = dev_command(dir.path(), &pkg, PackageManager::Npm, &args()).unwrap_err();
        assert!(matches!(err, Cin7Error::NoDevCommand));
    }

    #[test]
    fn url_uses_scheme_host_and_port() {
        let mut a = args();
        assert_eq!(a.url(), "http://0.0.0.0:4000");
        a.https = true;
        assert_eq!(a.url(), "https://0.0.0.0:4000");
    }
}
