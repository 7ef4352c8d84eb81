//! Database repositories
//!
//! Repositories handle all direct database interactions and implement the
//! storage traits in [`crate::store`].

pub mod problem_repo;
pub mod progress_repo;
pub mod submission_repo;

pub use problem_repo::ProblemRepository;
pub use progress_repo::ProgressRepository;
pub use submission_repo::SubmissionRepository;
