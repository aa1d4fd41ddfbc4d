use log::debug;
use shared::Identity;
use thiserror::Error;

/// Named screens of the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    SignIn,
    Home,
    ManageCows,
    ManageScales,
    MilkWeighing,
    /// Carries the user whose account is edited
    EditAccount { user: Identity },
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::SignIn => "Sign In",
            Route::Home => "Home",
            Route::ManageCows => "Manage Cows",
            Route::ManageScales => "Manage Scales",
            Route::MilkWeighing => "Milk Weighing",
            Route::EditAccount { .. } => "Edit Account",
        }
    }

    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::SignIn)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("{0} requires a signed-in user")]
    RequiresSession(&'static str),
    #[error("{0} is only shown while signed out")]
    RequiresNoSession(&'static str),
}

/// Stack of routes; the root is never popped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Navigator {
    pub fn new(root: Route) -> Self {
        Self { stack: vec![root] }
    }

    pub fn current(&self) -> &Route {
        // The stack always holds its root
        &self.stack[self.stack.len() - 1]
    }

    pub fn root(&self) -> &Route {
        &self.stack[0]
    }

    pub fn push(&mut self, route: Route) {
        debug!("Navigating to {}", route.title());
        self.stack.push(route);
    }

    /// Go back one screen. Returns the screen left, or `None` at the root.
    pub fn pop(&mut self) -> Option<Route> {
        if self.stack.len() > 1 {
            self.stack.pop()
        } else {
            None
        }
    }

    /// Replace the whole stack with a new root
    pub fn reset(&mut self, root: Route) {
        debug!("Resetting navigation to {}", root.title());
        self.stack.clear();
        self.stack.push(root);
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    pub fn routes(&self) -> &[Route] {
        &self.stack
    }
}
