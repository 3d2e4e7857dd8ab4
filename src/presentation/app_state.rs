// Application state for HTTP handlers
use crate::application::feed_service::FeedService;

#[derive(Clone)]
pub struct AppState {
    pub feed_service: FeedService,
}
