use crate::session::SessionStore;

pub const LOGIN_ROUTE: &str = "/login";
pub const MESSAGE_ROUTE: &str = "/message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(&'static str),
}

/// Gate for views that need a signed-in user.
#[derive(Clone)]
pub struct SessionGuard {
    sessions: SessionStore,
}

impl SessionGuard {
    pub fn new(sessions: SessionStore) -> Self {
        Self { sessions }
    }

    pub fn can_activate(&self) -> Access {
        if self.sessions.has() {
            Access::Allow
        } else {
            Access::Redirect(LOGIN_ROUTE)
        }
    }

    pub fn allows(&self) -> bool {
        self.can_activate() == Access::Allow
    }

    /// Login and signup views send signed-in users straight on.
    pub fn redirect_if_signed_in(&self) -> Option<&'static str> {
        self.sessions.has().then_some(MESSAGE_ROUTE)
    }
}
