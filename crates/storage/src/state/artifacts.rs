// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::MaterializedState;
use dg_core::{Artifact, Event};

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::ArtifactRecorded { revision, digest, location, at_ms } => {
            state.revisions.entry(revision.clone()).or_insert_with(|| digest.clone());
            match state.artifacts.get_mut(digest.as_str()) {
                Some(existing) => {
                    if existing.location.is_none() {
                        existing.location = location.clone();
                    }
                }
                None => {
                    let artifact = Artifact::new(revision.clone(), digest.clone(), *at_ms)
                        .with_location(location.clone());
                    state.artifacts.insert(digest.clone(), artifact);
                }
            }
        }

        Event::ArtifactStatusChanged { digest, to, at_ms, .. } => {
            if let Some(artifact) = state.artifacts.get_mut(digest.as_str()) {
                artifact.status = *to;
                artifact.updated_at_ms = *at_ms;
            }
        }

        Event::TestResultRecorded { digest, result } => {
            if let Some(artifact) = state.artifacts.get_mut(digest.as_str()) {
                artifact.test_results.push(result.clone());
                artifact.updated_at_ms = artifact.updated_at_ms.max(result.at_ms);
            }
        }

        _ => {}
    }
}
