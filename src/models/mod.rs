pub mod episode;
pub mod health;
pub mod job;
pub mod resource;
pub mod search;
pub mod subject;
pub mod subscription;
pub mod task;

pub use episode::{Availability, Episode, EpisodeAvailability, EpisodePage, EpisodeType};
pub use health::Health;
pub use job::{JobCreate, JobUpdate, ScheduledJob};
pub use resource::{Release, ResourceFilter, ResourceListing, SubtitleGroup};
pub use search::{LibrarySearch, SearchPagination};
pub use subject::{CalendarDay, CalendarItem, Subject};
pub use subscription::{
    Subscription, SubscriptionIds, SubscriptionList, SubscriptionQuery, SubscriptionStatus,
};
pub use task::{Task, TaskCreate, TaskProgress, TaskStatus, format_datetime, format_eta};

pub type SubjectId = u32;
pub type TaskId = u64;
