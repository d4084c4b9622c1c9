pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";

pub const API_BASE_URL_ENV: &str = "IKUYO_API_BASE_URL";

pub const LOGIN_PATH: &str = "/login";

pub const USER_AGENT: &str = "IKuYo/1.0";

pub mod storage {

    pub const HOME_STATE_KEY: &str = "ikuyo_home_state";

    pub const SEARCH_STATE_KEY: &str = "ikuyo_search_state";

    pub const NAVIGATION_KEY: &str = "ikuyo_navigation_state";
}

pub mod intervals {
    use std::time::Duration;

    pub const LOADING_SHOW_DELAY: Duration = Duration::from_millis(150);

    pub const TOAST_DURATION: Duration = Duration::from_millis(2500);

    pub const PERSIST_DEBOUNCE: Duration = Duration::from_millis(300);

    pub const CALENDAR_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
}

pub mod limits {

    pub const DEFAULT_EPISODE_LIMIT: u32 = 100;

    pub const DETAIL_EPISODE_LIMIT: u32 = 1000;

    pub const DEFAULT_RESOURCE_LIMIT: u32 = 100;

    pub const SEARCH_PAGE_SIZE: u32 = 12;

    pub const DEFAULT_TASK_PAGE_SIZE: u32 = 10;

    pub const VISIBLE_PAGE_RADIUS: u32 = 2;
}

pub mod messages {

    pub const NETWORK_FAILED: &str = "Network connection failed";

    pub const AUTH_FAILED: &str = "Authentication failed, please log in again";

    pub const NOT_FOUND: &str = "Resource not found";

    pub const SERVER_ERROR: &str = "Internal server error";

    pub const REQUEST_FAILED: &str = "Request failed";

    pub const UNEXPECTED_RESPONSE: &str = "Unexpected response from server";

    pub const DETAIL_LOAD_FAILED: &str = "Failed to load anime details";

    pub const AVAILABILITY_LOAD_FAILED: &str = "Failed to load resource availability";

    pub const RESOURCES_LOAD_FAILED: &str = "Failed to load resources";

    pub const SEARCH_FAILED: &str = "Search failed, please check the network connection";

    pub const CALENDAR_LOAD_FAILED: &str = "Failed to load the airing calendar";
}
