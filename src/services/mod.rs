//! Domain API services.
//!
//! One trait per backend area, each implemented over [`crate::http::HttpClient`].
//! Stores depend on the traits so they can run against in-memory fakes.

pub mod bangumi;
pub mod crawler;
pub mod health;
pub mod resources;
pub mod scheduler;
pub mod subscriptions;

pub use bangumi::{BangumiApi, EpisodeQuery, HttpBangumiApi};
pub use crawler::{CrawlerApi, HttpCrawlerApi};
pub use health::{HealthApi, HttpHealthApi};
pub use resources::{HttpResourceApi, ResourceApi};
pub use scheduler::{HttpSchedulerApi, SchedulerApi};
pub use subscriptions::{HttpSubscriptionApi, SubscriptionApi};
