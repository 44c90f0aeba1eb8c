//! Harness wiring: scripted world state and the loopback authority

pub mod authority;
pub mod state;

pub use authority::LoopbackAuthority;
pub use state::{AuthorityLink, Harness, HarnessSummary};
