//! Cache-fill tasks and the graph they are scheduled in.
//!
//! After planning, every manifest and artifact URI becomes a task named by the
//! URI whose action fetches that URI through the download cache. Each of them
//! is a prerequisite of one aggregate task (`package` by default), a multitask,
//! so invoking the aggregate fills the cache concurrently:
//!
//! ```text
//! package (multitask)
//! ├── https://repo.example/linux/x64/index.yml
//! ├── https://repo.example/linux/arm64/index.yml
//! ├── https://artifacts/jre-1.2.1-x64.tgz
//! └── https://artifacts/jre-1.2.1-arm64.tgz
//! ```

mod graph;
mod registrar;

pub use graph::{Task, TaskAction, TaskGraph, TaskReport};
pub use registrar::CacheTaskRegistrar;
