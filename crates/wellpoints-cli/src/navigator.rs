use std::sync::{Mutex, PoisonError};

use tracing::debug;
use wellpoints_core::{Navigator, Route};

/// The terminal has no screens to swap; it remembers where the session
/// guard wanted to go so commands can react to it.
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    last: Mutex<Option<Route>>,
}

impl TerminalNavigator {
    pub fn last(&self) -> Option<Route> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for TerminalNavigator {
    fn replace(&self, route: Route) {
        debug!(route = route.path(), "Navigate");
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(route);
    }
}
