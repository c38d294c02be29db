//! Entity-specific persistence beneath the mutation coordinator.
//!
//! # Responsibility
//! - Insert campaigns and responses together with the rows derived from them
//!   (surveys and prompts from configuration, prompt responses from payload).
//! - Answer the reference queries the coordinator needs for icon cleanup.
//!
//! # Invariants
//! - Repositories never open or commit transactions; the caller passes a
//!   connection that is already inside one.
//! - Derived rows are replaced as a whole, never patched.

pub mod campaign_repo;
pub mod response_repo;
