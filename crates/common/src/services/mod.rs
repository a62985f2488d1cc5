//! Domain services: review submission, vote toggling, search dispatch
//!
//! Each service owns an `Arc<dyn Store>` and receives the caller's
//! [`crate::auth::AuthContext`] explicitly where identity matters.

pub mod reviews;
pub mod search;
pub mod votes;

pub use reviews::{ReviewInput, ReviewService};
pub use search::{SearchResults, SearchScope, SearchService};
pub use votes::{VotableRef, VotableType, VoteAction, VoteCounts, VoteService, VoteType};
