//! Ready-made engine systems.

mod debug_stats;

pub use debug_stats::DebugStats;
