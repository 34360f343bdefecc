//! Update providers for Swarm sessions.
//!
//! A [`StreamProvider`] turns a [`QueryRequest`](swarm_core::session::QueryRequest)
//! into an ordered stream of cumulative updates. Two implementations ship:
//! [`GeminiStreamProvider`] for the live backend and [`ScriptedProvider`]
//! for replaying prepared transcripts.

pub mod config;
pub mod gemini_stream_provider;
pub mod grounding;
pub mod provider;
pub mod scripted;
pub mod sse;

pub use gemini_stream_provider::GeminiStreamProvider;
pub use provider::{StreamProvider, UpdateStream};
pub use scripted::ScriptedProvider;
