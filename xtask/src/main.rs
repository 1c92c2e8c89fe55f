// db-autonomy task runner (cargo xtask pattern)

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use xshell::{Shell, cmd};

const BIN_NAME: &str = "db-autonomy";

fn main() -> Result<()> {
    let sh = Shell::new()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let has_flag = |flag: &str| args.iter().any(|a| a == flag);

    match args.first().map(String::as_str) {
        Some("build") => build(&sh, has_flag("--release")),
        Some("test") => test(&sh),
        Some("format") => format(&sh, has_flag("--check")),
        Some("clippy") => clippy(&sh),
        Some("run") => run(&sh, &args[1..]),
        Some("clean") => clean(&sh),
        Some("ci") => ci(&sh),
        Some("dist") => dist(&sh),
        Some("install") => match args.get(1) {
            Some(dest) => install(&sh, dest),
            None => bail!("install requires a destination path\nUsage: cargo xtask install <destination>"),
        },
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("db-autonomy build commands");
    println!();
    println!("Usage: cargo xtask <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  build [--release]   Build the backend (release also lays out build/dist)");
    println!("  test                Run the workspace tests");
    println!("  format [--check]    Run rustfmt");
    println!("  clippy              Run clippy with warnings denied");
    println!("  run [ARGS...]       Run the service, extra args go to the binary");
    println!("  clean               Remove cargo and dist artifacts");
    println!("  ci                  format --check, clippy, release build, test");
    println!("  dist                Package build/dist as a tarball");
    println!("  install <path>      Release build and copy the binary to <path>");
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    let _dir = sh.push_dir(project_root());

    if release {
        println!("🦀 Building {BIN_NAME} (release)...");
        cmd!(sh, "cargo build --release -p {BIN_NAME}")
            .run()
            .context("Failed to build backend in release mode")?;
        create_distribution(sh)?;
        println!("📦 Distribution layout ready in build/dist/");
    } else {
        println!("🦀 Building {BIN_NAME}...");
        cmd!(sh, "cargo build -p {BIN_NAME}")
            .run()
            .context("Failed to build backend")?;
    }

    Ok(())
}

/// Lay out bin/, conf/, data/, logs/ and migrations/ under build/dist
fn create_distribution(sh: &Shell) -> Result<()> {
    let project = project_root();
    let dist_dir = project.join("build/dist");

    for sub in ["bin", "conf", "data", "logs", "migrations"] {
        sh.create_dir(dist_dir.join(sub))?;
    }

    let binary_src = release_binary(&project);
    sh.copy_file(&binary_src, dist_dir.join("bin").join(BIN_NAME))
        .with_context(|| format!("Failed to copy {}", binary_src.display()))?;

    let migrations = project.join("backend/migrations");
    for entry in sh.read_dir(&migrations)? {
        sh.copy_file(&entry, dist_dir.join("migrations"))?;
    }

    write_dist_config(&dist_dir)
}

/// conf/config.toml shipped inside the distribution
fn write_dist_config(dist_dir: &Path) -> Result<()> {
    let config = r#"[server]
host = "0.0.0.0"
port = 8080

[database]
url = "sqlite://data/db-autonomy.db"
max_connections = 10
acquire_timeout_secs = 5

[logging]
level = "info,db_autonomy=debug"
file = "logs/db-autonomy.log"

[advisor]
soar_bin = "/usr/local/bin/soar"
soar_config = "conf/soar.yaml"
db_user = "soar"
db_pass = ""
timeout_secs = "60s"
"#;

    std::fs::write(dist_dir.join("conf/config.toml"), config)
        .context("Failed to write dist config")
}

fn test(sh: &Shell) -> Result<()> {
    println!("🧪 Running tests...");
    let _dir = sh.push_dir(project_root());
    cmd!(sh, "cargo test --workspace").run().context("Tests failed")?;
    println!("✅ All tests passed");
    Ok(())
}

fn format(sh: &Shell, check: bool) -> Result<()> {
    let _dir = sh.push_dir(project_root());

    if check {
        cmd!(sh, "cargo fmt --all -- --check")
            .run()
            .context("Rust code is not formatted")?;
        println!("✅ Rust code is properly formatted");
    } else {
        cmd!(sh, "cargo fmt --all").run().context("Failed to format Rust code")?;
        println!("✅ Rust code formatted");
    }

    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    let _dir = sh.push_dir(project_root());

    cmd!(sh, "cargo clippy --workspace --all-targets -- --deny warnings --allow clippy::uninlined-format-args")
        .run()
        .context("Clippy checks failed")?;

    Ok(())
}

fn run(sh: &Shell, args: &[String]) -> Result<()> {
    println!("🚀 Running {BIN_NAME}...");
    let _dir = sh.push_dir(project_root().join("backend"));

    cmd!(sh, "cargo run -p {BIN_NAME} -- {args...}")
        .run()
        .context("Failed to run application")?;

    Ok(())
}

fn clean(sh: &Shell) -> Result<()> {
    let project = project_root();
    let _dir = sh.push_dir(&project);

    cmd!(sh, "cargo clean").run()?;

    let build_dir = project.join("build");
    if build_dir.exists() {
        sh.remove_path(&build_dir)?;
    }

    println!("✅ Clean complete");
    Ok(())
}

fn ci(sh: &Shell) -> Result<()> {
    println!("📝 [1/4] Checking code format...");
    format(sh, true)?;

    println!("🔍 [2/4] Running clippy checks...");
    clippy(sh)?;

    println!("🔨 [3/4] Building release...");
    build(sh, true)?;

    println!("🧪 [4/4] Running tests...");
    test(sh)?;

    println!("🎉 CI pipeline completed successfully!");
    Ok(())
}

/// Tarball of build/dist named after the current time
fn dist(sh: &Shell) -> Result<()> {
    build(sh, true)?;

    let dist_dir = project_root().join("build/dist");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let package_name = format!("{BIN_NAME}-{timestamp}.tar.gz");

    let _dir = sh.push_dir(&dist_dir);
    cmd!(sh, "tar czf {package_name} bin conf data logs migrations")
        .run()
        .context("Failed to create tarball")?;

    let package_path = dist_dir.join(&package_name);
    println!("✅ Distribution package created: {}", package_path.display());
    println!("   Size: {} KB", std::fs::metadata(&package_path)?.len() / 1024);

    Ok(())
}

fn install(sh: &Shell, destination: &str) -> Result<()> {
    build(sh, true)?;

    let binary_src = release_binary(&project_root());
    let dest_path = Path::new(destination);

    if let Some(parent) = dest_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create destination directory")?;
    }
    std::fs::copy(&binary_src, dest_path).context("Failed to copy binary")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(dest_path)?.permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(dest_path, perms)?;
    }

    println!("✅ Installed {BIN_NAME} to {destination}");
    Ok(())
}

fn release_binary(project: &Path) -> PathBuf {
    project.join("target/release").join(BIN_NAME)
}

fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
