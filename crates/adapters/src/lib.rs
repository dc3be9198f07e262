// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dg-adapters: Boundaries to the artifact registry and the deploy step

pub mod deployer;
pub mod resolver;
pub mod subprocess;

pub use deployer::{CommandDeployer, DeployError, Deployer};
pub use resolver::{
    ArtifactResolver, DockerResolver, LocalResolver, ResolveError, Resolution, ResolverRouter,
};

#[cfg(any(test, feature = "test-support"))]
pub use deployer::{DeployCall, FakeDeployer};
#[cfg(any(test, feature = "test-support"))]
pub use resolver::FakeResolver;
