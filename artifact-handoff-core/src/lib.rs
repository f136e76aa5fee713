#![doc = "artifact-handoff-core: locate a freshly trained model artifact and publish it to object storage."]

//! Everything here is transport-agnostic: the object store, the credential
//! source, the trainer and the log sink are traits, with `mockall` mocks
//! exported under the `test-export-mocks` feature.
//!
//! # Usage
//! Build a [`handoff::HandoffRunner`] from an [`locate::ArtifactLocator`], a
//! [`publish::Publisher`] and a [`events::HandoffEvents`] sink, then call
//! `run` once per training run.

pub mod config;
pub mod contract;
pub mod events;
pub mod handoff;
pub mod locate;
pub mod publish;
pub mod trainer;
