pub mod changelog;
pub mod impact;
pub mod metrics;
pub mod path;
mod processor;
pub mod store;
pub mod subscription;
pub mod tracker;

pub use changelog::ChangeLog;
pub use impact::ImpactAnalysis;
pub use metrics::{MetricsSnapshot, MovingAverage, TrackerMetrics};
pub use path::DependencyPath;
pub use store::{DependencyTreeNode, SymbolDependencies};
pub use subscription::{ImpactUpdate, NotificationSink, SubscriptionManager};
pub use tracker::SymbolDependencyTracker;
