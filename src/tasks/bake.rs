//! Test baking.
//!
//! Generates the reference `.in`/`.out` pairs for a problem from its
//! `generator.py` and `solution.cpp`, run offline before a contest starts.
//! Judging never invokes any of this.

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::fs;
use tokio::process::Command;
use tracing::info;

use crate::compiler::CompiledArtifact;
use crate::config::Config;

/// Bake `count` test pairs for a problem, seeding the generator with
/// `seed_base + i` for test `i`.
pub async fn bake_tests(config: &Config, problem_id: i64, seed_base: i64, count: u32) -> Result<()> {
    let base_dir = config.problem_dir(problem_id);
    let tests_dir = config.tests_dir(problem_id);

    let generator = base_dir.join("generator.py");
    let solution = base_dir.join("solution.cpp");

    if !generator.exists() {
        bail!("missing generator.py in {:?}", base_dir);
    }
    if !solution.exists() {
        bail!("missing solution.cpp in {:?}", base_dir);
    }

    info!("compiling reference solution");
    let reference = CompiledArtifact(base_dir.join("solution_exec"));
    let output = Command::new("g++")
        .arg("-O2")
        .arg(&solution)
        .arg("-o")
        .arg(&reference.0)
        .output()
        .await
        .context("failed to run g++")?;
    if !output.status.success() {
        bail!(
            "reference solution failed to compile:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fs::create_dir_all(&tests_dir).await?;

    info!(count, seed_base, "baking tests");
    for i in 1..=i64::from(count) {
        let seed = seed_base + i;
        let in_file = tests_dir.join(format!("{}.in", i));
        let out_file = tests_dir.join(format!("{}.out", i));

        let in_handle = std::fs::File::create(&in_file)
            .with_context(|| format!("failed to create {:?}", in_file))?;
        let status = Command::new("python3")
            .arg(&generator)
            .arg(seed.to_string())
            .stdout(Stdio::from(in_handle))
            .status()
            .await
            .context("failed to run generator")?;
        if !status.success() {
            bail!("generator failed on test {}", i);
        }

        let in_handle = std::fs::File::open(&in_file)?;
        let out_handle = std::fs::File::create(&out_file)?;
        let status = Command::new(&reference.0)
            .stdin(Stdio::from(in_handle))
            .stdout(Stdio::from(out_handle))
            .status()
            .await
            .context("failed to run reference solution")?;
        if !status.success() {
            bail!("reference solution crashed on test {}", i);
        }

        info!(test = i, "baked");
    }

    info!(?tests_dir, "tests baked");
    Ok(())
}
