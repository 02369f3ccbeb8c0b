//! Actor layer: the generation backend and the chat supervisor.
//!
//! Each actor is a `*Handle` (cloneable sender) plus a private runner task that
//! owns the state and answers over oneshot channels.

pub mod llm;
pub mod messages;
pub mod supervisor;
pub mod traits;
