// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query handling for read-only state inspection.

use dg_wire::{Query, Response};

use super::ListenCtx;

/// Handle a read-only query against the materialized state.
pub(super) fn handle_query(ctx: &ListenCtx, query: Query) -> Response {
    let guard = &ctx.guard;
    match query {
        Query::CheckExisting { revision } => {
            Response::Existing { digest: guard.check_existing(&revision) }
        }

        Query::GetDigest { revision } => {
            ctx.respond(guard.get_digest(&revision), None, |digest| Response::Digest { digest })
        }

        Query::GetArtifact { digest } => ctx.respond(guard.artifact(&digest), None, |artifact| {
            Response::Artifact { artifact: Box::new(artifact) }
        }),

        Query::ListArtifacts => Response::Artifacts { artifacts: guard.artifacts() },

        Query::BreakerStatus { track } => {
            Response::Breakers { breakers: guard.breaker_status(track) }
        }

        Query::BreakerEvents { track } => {
            Response::BreakerEvents { events: guard.breaker_events(track) }
        }

        Query::RecoveryHistory => Response::RecoveryHistory { history: guard.recovery_history() },

        Query::BreakerExport => Response::BreakerExport { export: Box::new(guard.breaker_export()) },

        Query::LockStatus => Response::Lock { status: guard.lock_status() },

        Query::HealthHistory => Response::Health { history: guard.health_history() },

        Query::AuditLog { limit } => Response::Audit { entries: guard.audit_entries(limit) },

        Query::Consistency => Response::Consistency { report: Box::new(guard.consistency()) },
    }
}
