//! Per-channel session state.

use kappa_commons::NamespaceName;
use kappa_datamodel::User;

/// Runtime state bundled with each shell or client channel: the
/// authenticated user and the currently selected namespace.
///
/// Created when a channel is accepted and dropped when it closes; never
/// persisted.
pub struct Session {
    namespace: Option<NamespaceName>,
    user: Option<User>,
}

impl Session {
    pub fn new(user: Option<User>) -> Self {
        Self {
            namespace: None,
            user,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The currently selected namespace, if `USE` has run.
    pub fn namespace(&self) -> Option<&NamespaceName> {
        self.namespace.as_ref()
    }

    pub fn set_namespace(&mut self, namespace: NamespaceName) {
        self.namespace = Some(namespace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kappa_commons::UserName;
    use kappa_datamodel::System;

    #[test]
    fn test_session_state() {
        let system = System::in_memory();
        let user = system.users().create(&UserName::new("bob")).unwrap();

        let mut session = Session::new(Some(user));
        assert!(session.user().is_some());
        assert_eq!(session.namespace(), None);

        session.set_namespace(NamespaceName::new("acme"));
        assert_eq!(session.namespace(), Some(&NamespaceName::new("acme")));
    }

    #[test]
    fn test_session_without_user() {
        let session = Session::new(None);
        assert!(session.user().is_none());
    }
}
