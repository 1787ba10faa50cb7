//! Build automation for kind-kube
//!
//! Usage: cargo xtask <command>
//!
//! Available commands:
//! - build: Build the project
//! - test: Run tests
//! - dist: Package a release archive in the layout cargo-binstall expects
//! - ci: Run CI checks
//! - e2e: Create, inspect and delete a real Kind cluster

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use xshell::{cmd, Shell};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for kind-kube")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project
    Build {
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Package target/<triple>/release/kind-kube as kind-kube-<triple>.tar.gz
    Dist {
        /// Target triple (e.g., x86_64-unknown-linux-gnu)
        #[arg(long)]
        target: String,
    },
    /// Run CI checks (format, clippy, test)
    Ci,
    /// Create, inspect and delete a throwaway cluster with the real kind binary
    E2e {
        /// Container runtime to drive (docker, podman)
        #[arg(long)]
        runtime: Option<String>,
        /// Name of the throwaway cluster
        #[arg(long, default_value = "kind-kube-e2e")]
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    sh.change_dir(project_root());

    match cli.command {
        Commands::Build { release } => build(&sh, release),
        Commands::Test { integration } => test(&sh, integration),
        Commands::Dist { target } => dist(&sh, &target),
        Commands::Ci => ci(&sh),
        Commands::E2e { runtime, name } => e2e(&sh, runtime, &name),
    }
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("🔨 Building kind-kube...");

    if release {
        cmd!(sh, "cargo build --release").run()?;
        println!("✅ Release build completed: target/release/kind-kube");
    } else {
        cmd!(sh, "cargo build").run()?;
        println!("✅ Debug build completed: target/debug/kind-kube");
    }

    Ok(())
}

fn test(sh: &Shell, integration: bool) -> Result<()> {
    println!("🧪 Running tests...");

    if integration {
        // Scripted executor plus the fake kind shell script; no real cluster.
        cmd!(sh, "cargo test --test lifecycle_test --test kind_script_test").run()?;
    } else {
        cmd!(sh, "cargo test --all").run()?;
    }

    println!("✅ All tests passed");
    Ok(())
}

fn dist(sh: &Shell, target: &str) -> Result<()> {
    println!("📦 Packaging kind-kube for {}...", target);

    cmd!(sh, "cargo build --release --target {target}").run()?;

    let staging = project_root().join("dist").join(target);
    sh.create_dir(&staging)?;
    sh.copy_file(
        project_root().join(format!("target/{}/release/kind-kube", target)),
        staging.join("kind-kube"),
    )?;

    // Must match [package.metadata.binstall] pkg-url in Cargo.toml.
    let archive = project_root()
        .join("dist")
        .join(format!("kind-kube-{}.tar.gz", target));
    cmd!(sh, "tar -czf {archive} -C {staging} kind-kube")
        .run()
        .context("Failed to create tarball")?;

    println!("✅ Release archive created: {}", archive.display());
    Ok(())
}

fn ci(sh: &Shell) -> Result<()> {
    println!("🔍 Running CI checks...");

    println!("\n📝 Checking formatting...");
    cmd!(sh, "cargo fmt --all -- --check").run()?;

    println!("\n🔧 Running clippy...");
    cmd!(
        sh,
        "cargo clippy --all-targets --all-features -- -D warnings"
    )
    .run()?;

    println!("\n🧪 Running tests...");
    test(sh, false)?;

    println!("\n✅ All CI checks passed!");
    Ok(())
}

fn e2e(sh: &Shell, runtime: Option<String>, name: &str) -> Result<()> {
    println!("🚢 Running end-to-end lifecycle against kind...");

    cmd!(sh, "kind version")
        .run()
        .context("kind must be installed and on PATH")?;
    cmd!(sh, "cargo build").run()?;

    let binary = project_root().join("target/debug/kind-kube");
    let runtime_args: Vec<String> = runtime
        .map(|runtime| vec!["--runtime".to_string(), runtime])
        .unwrap_or_default();

    cmd!(sh, "{binary} create --name {name} {runtime_args...}").run()?;

    // Always clean up, even when inspection fails.
    let inspected = cmd!(sh, "{binary} get {name} {runtime_args...}")
        .run()
        .and_then(|_| cmd!(sh, "{binary} list {runtime_args...}").run());
    cmd!(sh, "{binary} delete {name} {runtime_args...}").run()?;
    inspected?;

    // A second delete must succeed on a missing cluster.
    cmd!(sh, "{binary} delete {name} {runtime_args...}").run()?;

    println!("✅ End-to-end lifecycle passed");
    Ok(())
}

fn project_root() -> PathBuf {
    Path::new(&env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
