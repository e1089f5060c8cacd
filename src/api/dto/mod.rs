//! Data Transfer Objects for REST request/response serialization.
//!
//! DTOs decouple the HTTP contract from the domain types. Derived flags
//! are computed while rendering and never stored.

pub mod action_dto;
pub mod common_dto;
pub mod event_dto;
pub mod monitor_dto;

pub use action_dto::*;
pub use common_dto::*;
pub use event_dto::*;
pub use monitor_dto::*;
