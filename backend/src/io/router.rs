use log::{debug, info, warn};
use shared::Identity;
use tokio::sync::watch;

use super::account_form::EditAccountForm;
use super::auth_form::{AuthAction, AuthForm, AuthFormError};
use super::navigation::{NavigationError, Navigator, Route};
use crate::domain::SessionProvider;

/// Which set of screens is reachable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenTree {
    Unauthenticated,
    Authenticated(Identity),
}

impl ScreenTree {
    /// First screen of the tree
    pub fn root(&self) -> Route {
        match self {
            ScreenTree::Unauthenticated => Route::SignIn,
            ScreenTree::Authenticated(_) => Route::Home,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            ScreenTree::Unauthenticated => None,
            ScreenTree::Authenticated(identity) => Some(identity),
        }
    }

    /// Same tree for the same user, even if their email changed
    fn same_session(&self, other: &ScreenTree) -> bool {
        match (self, other) {
            (ScreenTree::Unauthenticated, ScreenTree::Unauthenticated) => true,
            (ScreenTree::Authenticated(a), ScreenTree::Authenticated(b)) => a.uid == b.uid,
            _ => false,
        }
    }
}

/// Screen tree for a session state
pub fn route(identity: Option<&Identity>) -> ScreenTree {
    match identity {
        Some(identity) => ScreenTree::Authenticated(identity.clone()),
        None => ScreenTree::Unauthenticated,
    }
}

/// Keeps the navigation stack in step with the session
///
/// Holds the sign-in form while signed out. Whenever the session switches
/// between signed out and signed in (or to another user), the stack is
/// reset to the new tree's root.
pub struct ScreenRouter {
    session: SessionProvider,
    changes: watch::Receiver<Option<Identity>>,
    tree: ScreenTree,
    navigator: Navigator,
    auth_form: AuthForm,
}

impl ScreenRouter {
    pub fn new(session: SessionProvider) -> Self {
        let mut changes = session.watch();
        let tree = route(changes.borrow_and_update().as_ref());
        let navigator = Navigator::new(tree.root());

        Self {
            session,
            changes,
            tree,
            navigator,
            auth_form: AuthForm::new(),
        }
    }

    /// Re-evaluate the session. Returns whether the tree changed.
    pub fn sync(&mut self) -> bool {
        let current = route(self.changes.borrow_and_update().as_ref());

        if self.tree.same_session(&current) {
            self.tree = current;
            return false;
        }

        info!(
            "Session changed, showing the {} screens",
            if current.identity().is_some() { "signed-in" } else { "signed-out" }
        );
        self.navigator.reset(current.root());
        self.tree = current;
        true
    }

    /// Wait for the next session change and apply it.
    /// Returns `false` once the session can no longer change.
    pub async fn next_change(&mut self) -> bool {
        if self.changes.changed().await.is_err() {
            debug!("Session channel closed");
            return false;
        }
        self.sync();
        true
    }

    pub fn tree(&self) -> &ScreenTree {
        &self.tree
    }

    pub fn current(&self) -> &Route {
        self.navigator.current()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Push a screen reachable from the current tree
    pub fn navigate(&mut self, route: Route) -> Result<(), NavigationError> {
        match (&self.tree, route.requires_session()) {
            (ScreenTree::Unauthenticated, true) => {
                warn!("Refusing to open {} while signed out", route.title());
                Err(NavigationError::RequiresSession(route.title()))
            }
            (ScreenTree::Authenticated(_), false) => {
                Err(NavigationError::RequiresNoSession(route.title()))
            }
            _ => {
                self.navigator.push(route);
                Ok(())
            }
        }
    }

    /// Open the edit account screen for the signed-in user
    pub fn open_edit_account(&mut self) -> Result<EditAccountForm, NavigationError> {
        let user = self
            .tree
            .identity()
            .cloned()
            .ok_or(NavigationError::RequiresSession("Edit Account"))?;
        let form = EditAccountForm::new(&user);
        self.navigator.push(Route::EditAccount { user });
        Ok(form)
    }

    pub fn back(&mut self) -> Option<Route> {
        self.navigator.pop()
    }

    pub fn auth_form(&self) -> &AuthForm {
        &self.auth_form
    }

    pub fn auth_form_mut(&mut self) -> &mut AuthForm {
        &mut self.auth_form
    }

    /// Submit the sign-in form (or sign out) and follow the session
    pub async fn submit_auth(&mut self) -> Result<AuthAction, AuthFormError> {
        let result = self.auth_form.submit(&self.session).await;
        self.sync();
        result
    }

    pub fn session(&self) -> &SessionProvider {
        &self.session
    }
}
