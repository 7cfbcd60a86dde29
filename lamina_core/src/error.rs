// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors returned by the scene mutation API.
//!
//! Configuration mistakes fail synchronously and leave the scene untouched.
//! Nothing here is fatal to the compositor.

use crate::scene::ActorId;

/// An error from a scene mutation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The handle refers to an actor that has been destroyed.
    #[error("stale actor handle {0:?}")]
    StaleActor(ActorId),
    /// An argument was out of range or would corrupt the tree.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The actor cannot hold children.
    #[error("{0:?} is not a container")]
    NotAContainer(ActorId),
    /// The actor kind does not support cloning.
    #[error("{0:?} cannot be cloned")]
    NotCloneable(ActorId),
    /// The stage lives as long as the scene.
    #[error("the stage cannot be destroyed")]
    CannotDestroyStage,
}
