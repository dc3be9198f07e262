// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dg artifact` - Artifact registry commands

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use dg_core::{Artifact, ArtifactStatus, Digest, TestStatus};

use super::connect;
use crate::exit_error::{codes, ExitError};
use crate::output::{client_error, format_or_json, format_time_ago, handle_list, OutputFormat};

#[derive(Args)]
pub struct ArtifactArgs {
    #[command(subcommand)]
    pub command: ArtifactCommand,
}

#[derive(Subcommand)]
pub enum ArtifactCommand {
    /// Print the digest already built for a revision (exit 3 if none)
    CheckExisting {
        #[arg(long)]
        revision: String,
    },
    /// Record a freshly built artifact
    RecordArtifact {
        #[arg(long)]
        revision: String,
        #[arg(long)]
        digest: String,
        /// Registry/repository the artifact was pushed to
        #[arg(long)]
        location: Option<String>,
    },
    /// Look up the digest recorded for a revision
    GetDigest {
        #[arg(long)]
        revision: String,
    },
    /// Check a digest is well formed and present in the artifact store
    ValidateDigest {
        #[arg(long)]
        digest: String,
        #[arg(long)]
        location: Option<String>,
    },
    /// Move an artifact through built, testing, deployable, deployed
    UpdateStatus {
        #[arg(long)]
        digest: String,
        #[arg(long)]
        status: ArtifactStatus,
        /// Permit a non-monotonic change (requires --reason)
        #[arg(long)]
        force: bool,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Attach a test result to an artifact
    RecordTestResult {
        #[arg(long)]
        digest: String,
        #[arg(long = "test-type")]
        test_type: String,
        /// passed, failed or skipped
        #[arg(long)]
        status: TestStatus,
        #[arg(long)]
        details: Option<String>,
    },
    /// Print an artifact's current status
    GetStatus {
        #[arg(long)]
        digest: String,
    },
    /// Print an artifact's test results in recorded order
    GetTestResults {
        #[arg(long)]
        digest: String,
    },
    /// Compute the sha256 content digest of a local file
    GenerateHash {
        #[arg(long)]
        file: PathBuf,
    },
    /// List all artifacts, newest first
    List,
}

pub async fn handle(command: ArtifactCommand, format: OutputFormat, actor: &str) -> Result<()> {
    if let ArtifactCommand::GenerateHash { file } = command {
        return generate_hash(&file, format);
    }

    let client = connect(format)?;
    let fail = |e| client_error(e, format);

    match command {
        ArtifactCommand::CheckExisting { revision } => {
            let digest = client.check_existing(&revision).await.map_err(fail)?;
            let obj = serde_json::json!({ "revision": revision, "digest": digest });
            format_or_json(format, &obj, || {
                if let Some(ref digest) = digest {
                    println!("{digest}");
                }
            })?;
            if digest.is_none() {
                return Err(ExitError::new(
                    codes::NOT_FOUND,
                    format!("no artifact recorded for revision {revision}"),
                )
                .into());
            }
        }

        ArtifactCommand::RecordArtifact { revision, digest, location } => {
            let artifact =
                client.record_artifact(&revision, &digest, location, actor).await.map_err(fail)?;
            format_or_json(format, &artifact, || {
                println!("Recorded {} for revision {}", artifact.digest, artifact.revision)
            })?;
        }

        ArtifactCommand::GetDigest { revision } => {
            let digest = client.get_digest(&revision).await.map_err(fail)?;
            let obj = serde_json::json!({ "revision": revision, "digest": digest });
            format_or_json(format, &obj, || println!("{digest}"))?;
        }

        ArtifactCommand::ValidateDigest { digest, location } => {
            let validation = client.validate_digest(&digest, location).await.map_err(fail)?;
            format_or_json(format, &validation, || {
                if validation.verified_externally {
                    println!("{} found in {}", validation.digest, validation.location);
                } else {
                    println!("{} is recorded (artifact store not queried)", validation.digest);
                }
            })?;
        }

        ArtifactCommand::UpdateStatus { digest, status, force, reason } => {
            let artifact =
                client.update_status(&digest, status, force, reason, actor).await.map_err(fail)?;
            format_or_json(format, &artifact, || {
                println!("{} is now {}", artifact.digest.short(), artifact.status)
            })?;
        }

        ArtifactCommand::RecordTestResult { digest, test_type, status, details } => {
            let artifact = client
                .record_test_result(&digest, &test_type, status, details, actor)
                .await
                .map_err(fail)?;
            format_or_json(format, &artifact, || {
                println!("Recorded {test_type} {status} for {}", artifact.digest.short())
            })?;
        }

        ArtifactCommand::GetStatus { digest } => {
            let artifact = client.get_artifact(&digest).await.map_err(fail)?;
            let obj = serde_json::json!({ "digest": artifact.digest, "status": artifact.status });
            format_or_json(format, &obj, || println!("{}", artifact.status))?;
        }

        ArtifactCommand::GetTestResults { digest } => {
            let artifact = client.get_artifact(&digest).await.map_err(fail)?;
            handle_list(format, &artifact.test_results, "No test results recorded.", |items, out| {
                for r in items {
                    let details = r.details.as_deref().unwrap_or("");
                    let _ = writeln!(
                        out,
                        "{:<16} {:<8} {:<10} {}",
                        r.test_type,
                        r.status.to_string(),
                        format_time_ago(r.at_ms),
                        details
                    );
                }
            })?;
        }

        ArtifactCommand::List => {
            let artifacts = client.list_artifacts().await.map_err(fail)?;
            handle_list(format, &artifacts, "No artifacts recorded.", |items, out| {
                write_artifacts(items, out)
            })?;
        }

        ArtifactCommand::GenerateHash { .. } => {}
    }
    Ok(())
}

fn generate_hash(file: &std::path::Path, format: OutputFormat) -> Result<()> {
    let reader = std::fs::File::open(file).map_err(|e| {
        ExitError::new(codes::NOT_FOUND, format!("cannot open {}: {}", file.display(), e))
    })?;
    let digest = Digest::of_reader(std::io::BufReader::new(reader))?;
    let obj = serde_json::json!({ "file": file, "digest": digest });
    format_or_json(format, &obj, || println!("{digest}"))
}

fn write_artifacts(items: &[Artifact], out: &mut dyn Write) {
    let _ = writeln!(out, "{:<20} {:<12} {:<11} {:<10} TESTS", "DIGEST", "REVISION", "STATUS", "UPDATED");
    for a in items {
        let passed = a.latest_results().iter().filter(|r| r.status == TestStatus::Passed).count();
        let _ = writeln!(
            out,
            "{:<20} {:<12} {:<11} {:<10} {}/{}",
            a.digest.short(),
            dg_core::short(&a.revision, 12),
            a.status.to_string(),
            format_time_ago(a.updated_at_ms),
            passed,
            a.latest_results().len()
        );
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
