//! Application state shared across request handlers

use std::sync::Arc;

use coursekit_core::SessionIssuer;

use crate::auth::AuthService;
use crate::enrollment::EnrollmentGate;
use crate::notify::NotificationSender;
use crate::progress::ProgressAggregator;
use crate::store::PlatformStore;

/// Engine components wired over one storage backend and one sender.
///
/// Each component only sees the storage capability it needs; `AppState`
/// is where they all meet.
pub struct AppState<S, N> {
    pub auth: AuthService<S, N>,
    pub enrollments: EnrollmentGate<S>,
    pub progress: ProgressAggregator<S>,
    pub sessions: Arc<SessionIssuer>,
}

impl<S, N> AppState<S, N>
where
    S: PlatformStore,
    N: NotificationSender,
{
    pub fn new(store: Arc<S>, sender: Arc<N>, sessions: SessionIssuer) -> Self {
        let sessions = Arc::new(sessions);
        Self {
            auth: AuthService::new(store.clone(), sender, sessions.clone()),
            enrollments: EnrollmentGate::new(store.clone()),
            progress: ProgressAggregator::new(store),
            sessions,
        }
    }
}
