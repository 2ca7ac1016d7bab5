//! Statement execution and authorization.
//!
//! Single entry point: [`Executor::execute`]. Every statement is checked
//! against the caller's roles before it touches the store; the admin account
//! overrides every check.

use crate::codes::StatusCode;
use crate::session::Session;
use crate::terminal::Terminal;
use crate::writer::ResponseWriter;
use kappa_commons::NamespaceName;
use kappa_datamodel::{NamespaceStore, System, User};
use kappa_skl::{CreateNamespaceStatement, DropNamespaceStatement, Statement, UseStatement};
use log::debug;
use std::io::Write;

/// Executes successfully parsed statements against the data model.
pub struct Executor {
    session: Session,
    system: System,
}

impl Executor {
    pub fn new(session: Session, system: System) -> Self {
        Self { session, system }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Authorizes and performs one statement, writing the status response.
    pub fn execute<W: Write>(
        &mut self,
        w: &mut ResponseWriter<W>,
        terminal: &mut Terminal,
        stmt: &Statement,
    ) {
        // Reaching this without a user means the handler chain is mis-wired.
        let user = match self.session.user() {
            Some(user) => user.clone(),
            None => {
                w.fail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "could not determine session user",
                );
                return;
            }
        };

        debug!("executing statement: {}", stmt);
        match stmt {
            Statement::Use(use_stmt) => self.handle_use(w, terminal, &user, use_stmt),
            Statement::CreateNamespace(create) => self.handle_create_namespace(w, &user, create),
            Statement::DropNamespace(drop) => self.handle_drop_namespace(w, &user, drop),
            Statement::ShowNamespaces(_) => self.handle_show_namespaces(w, &user),
        }
    }

    fn handle_use<W: Write>(
        &mut self,
        w: &mut ResponseWriter<W>,
        terminal: &mut Terminal,
        user: &User,
        stmt: &UseStatement,
    ) {
        let namespaces = self.system.namespaces();
        let name = &stmt.name;

        // Strict existence check; USE never creates.
        match namespaces.exists(name) {
            Ok(true) => {}
            Ok(false) => {
                w.fail(StatusCode::NAMESPACE_DOES_NOT_EXIST, name.as_str());
                return;
            }
            Err(_) => {
                w.fail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "could not access namespace data",
                );
                return;
            }
        }

        if !user.is_admin() {
            let namespace = match namespaces.get(name) {
                Ok(namespace) => namespace,
                Err(_) => {
                    w.fail(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "could not access namespace data",
                    );
                    return;
                }
            };
            if !namespace.has_access(user.name()) {
                w.fail(StatusCode::UNAUTHORIZED, "");
                return;
            }
        }

        self.session.set_namespace(name.clone());
        terminal.set_prompt(format!("kappa: {}> ", name));
        w.success(StatusCode::OK, "");
    }

    /// Only the admin can create root namespaces. For child namespaces a
    /// non-admin needs a role in the parent carrying `create.namespace`.
    fn handle_create_namespace<W: Write>(
        &mut self,
        w: &mut ResponseWriter<W>,
        user: &User,
        stmt: &CreateNamespaceStatement,
    ) {
        let namespaces = self.system.namespaces();
        let name = &stmt.name;

        match namespaces.exists(name) {
            Ok(true) => {
                // Idempotent from the client's perspective.
                w.success(StatusCode::NAMESPACE_ALREADY_EXISTS, name.as_str());
                return;
            }
            Ok(false) => {}
            Err(_) => {
                w.fail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "could not access namespace data",
                );
                return;
            }
        }

        if stmt.is_root_namespace() {
            if !user.is_admin() {
                w.fail(
                    StatusCode::UNAUTHORIZED,
                    "root namespaces can only be created by the admin account",
                );
                return;
            }
            match namespaces.create(name) {
                Ok(_) => w.success(StatusCode::OK, "namespace created"),
                Err(_) => w.fail(
                    StatusCode::CREATE_NAMESPACE_ERROR,
                    format!("could not create namespace '{}'", name),
                ),
            }
            return;
        }

        let parent = match name.parent() {
            Some(parent) => parent,
            None => {
                w.fail(StatusCode::INTERNAL_SERVER_ERROR, "");
                return;
            }
        };

        // The parent must exist before a child is created, admin included.
        match namespaces.exists(&parent) {
            Ok(true) => {}
            Ok(false) => {
                w.fail(StatusCode::NAMESPACE_DOES_NOT_EXIST, parent.as_str());
                return;
            }
            Err(_) => {
                w.fail(StatusCode::INTERNAL_SERVER_ERROR, "");
                return;
            }
        }

        if !user.is_admin() {
            let permission = stmt.required_permission();
            if !self.has_role_with_permission(&namespaces, user, &parent, permission) {
                w.fail(
                    StatusCode::UNAUTHORIZED,
                    format!("cannot create namespace '{}'", name),
                );
                return;
            }
        }

        match namespaces.create(name) {
            Ok(_) => w.success(StatusCode::OK, "namespace created"),
            Err(_) => w.fail(
                StatusCode::CREATE_NAMESPACE_ERROR,
                format!("cannot create namespace '{}'", name),
            ),
        }
    }

    /// Same authorization pattern as create, with `drop.namespace`; the
    /// namespace must currently exist.
    fn handle_drop_namespace<W: Write>(
        &mut self,
        w: &mut ResponseWriter<W>,
        user: &User,
        stmt: &DropNamespaceStatement,
    ) {
        let namespaces = self.system.namespaces();
        let name = &stmt.name;

        match namespaces.exists(name) {
            Ok(true) => {}
            Ok(false) => {
                w.fail(StatusCode::NAMESPACE_DOES_NOT_EXIST, name.as_str());
                return;
            }
            Err(_) => {
                w.fail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "could not access namespace data",
                );
                return;
            }
        }

        if stmt.is_root_namespace() {
            if !user.is_admin() {
                w.fail(
                    StatusCode::UNAUTHORIZED,
                    "root namespaces can only be dropped by the admin account",
                );
                return;
            }
        } else if !user.is_admin() {
            let parent = match name.parent() {
                Some(parent) => parent,
                None => {
                    w.fail(StatusCode::INTERNAL_SERVER_ERROR, "");
                    return;
                }
            };
            match namespaces.exists(&parent) {
                Ok(true) => {}
                Ok(false) => {
                    w.fail(StatusCode::NAMESPACE_DOES_NOT_EXIST, parent.as_str());
                    return;
                }
                Err(_) => {
                    w.fail(StatusCode::INTERNAL_SERVER_ERROR, "");
                    return;
                }
            }
            let permission = stmt.required_permission();
            if !self.has_role_with_permission(&namespaces, user, &parent, permission) {
                w.fail(
                    StatusCode::UNAUTHORIZED,
                    format!("cannot drop namespace '{}'", name),
                );
                return;
            }
        }

        match namespaces.delete(name) {
            Ok(()) => w.success(StatusCode::OK, "namespace dropped"),
            Err(_) => w.fail(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("could not drop namespace '{}'", name),
            ),
        }
    }

    /// Admin sees every namespace; everyone else their memberships.
    fn handle_show_namespaces<W: Write>(&mut self, w: &mut ResponseWriter<W>, user: &User) {
        if user.is_admin() {
            let namespaces = self.system.namespaces();
            let stream = match namespaces.stream_names() {
                Ok(stream) => stream,
                Err(_) => {
                    w.fail(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "could not access namespace data",
                    );
                    return;
                }
            };
            w.write(w.colors.light_yellow);
            for name in stream {
                w.write(format!(" {}\r\n", name).as_bytes());
            }
            w.write(w.colors.reset);
        } else {
            let names = match user.namespaces() {
                Ok(names) => names,
                Err(_) => {
                    w.fail(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "could not access namespace data",
                    );
                    return;
                }
            };
            w.write(w.colors.yellow);
            for name in names {
                w.write(format!(" {}\r\n", name).as_bytes());
            }
            w.write(w.colors.reset);
        }

        w.success(StatusCode::OK, "");
    }

    /// True iff any of the user's roles in `namespace` carries `permission`.
    fn has_role_with_permission(
        &self,
        namespaces: &NamespaceStore,
        user: &User,
        namespace: &NamespaceName,
        permission: &str,
    ) -> bool {
        let handle = match namespaces.get(namespace) {
            Ok(handle) => handle,
            Err(_) => return false,
        };
        let roles = match user.roles(namespace) {
            Ok(roles) => roles,
            Err(_) => return false,
        };
        roles
            .iter()
            .any(|role| handle.has_permission(role, permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::DEFAULT_PROMPT;
    use crate::writer::DEFAULT_COLORS;
    use kappa_commons::{permissions, RoleName, UserName};
    use kappa_skl::parse_statement;

    struct Fixture {
        system: System,
        executor: Executor,
        terminal: Terminal,
    }

    impl Fixture {
        fn new(username: &str) -> Self {
            let system = System::in_memory();
            let user = system.users().create(&UserName::new(username)).unwrap();
            Self::with_user(system, Some(user))
        }

        fn with_user(system: System, user: Option<User>) -> Self {
            let executor = Executor::new(Session::new(user), system.clone());
            Self {
                system,
                executor,
                terminal: Terminal::new(DEFAULT_PROMPT),
            }
        }

        fn run(&mut self, line: &str) -> String {
            let stmt = parse_statement(line).unwrap();
            let mut buf = Vec::new();
            let mut writer = ResponseWriter::new(DEFAULT_COLORS, &mut buf);
            self.executor.execute(&mut writer, &mut self.terminal, &stmt);
            String::from_utf8(buf).unwrap()
        }
    }

    #[test]
    fn test_missing_session_user() {
        let mut fixture = Fixture::with_user(System::in_memory(), None);
        let out = fixture.run("SHOW NAMESPACES");
        assert!(out.contains("InternalServerError (5000): could not determine session user"));
    }

    #[test]
    fn test_use_missing_namespace() {
        let mut fixture = Fixture::new("admin");
        let out = fixture.run("USE acme");
        assert!(out.contains("NamespaceDoesNotExist (5002): acme"));
        assert_eq!(fixture.executor.session().namespace(), None);
    }

    #[test]
    fn test_use_admin_needs_no_membership() {
        let mut fixture = Fixture::new("admin");
        fixture
            .system
            .namespaces()
            .create(&NamespaceName::new("acme"))
            .unwrap();

        let out = fixture.run("USE acme");
        assert!(out.contains("OK (2000)"));
        assert_eq!(
            fixture.executor.session().namespace(),
            Some(&NamespaceName::new("acme"))
        );
        assert_eq!(fixture.terminal.prompt(), "kappa: acme> ");
    }

    #[test]
    fn test_use_requires_membership() {
        let mut fixture = Fixture::new("bob");
        let namespaces = fixture.system.namespaces();
        let ns = namespaces.create(&NamespaceName::new("acme")).unwrap();

        let out = fixture.run("USE acme");
        assert!(out.contains("Unauthorized (4000)"));
        assert_eq!(fixture.terminal.prompt(), DEFAULT_PROMPT);

        ns.add_user(&UserName::new("bob")).unwrap();
        let out = fixture.run("USE acme");
        assert!(out.contains("OK (2000)"));
        assert_eq!(fixture.terminal.prompt(), "kappa: acme> ");
    }

    #[test]
    fn test_create_root_namespace_as_admin() {
        let mut fixture = Fixture::new("admin");
        let out = fixture.run("CREATE NAMESPACE acme");
        assert!(out.contains("OK (2000): namespace created"));
        assert!(fixture
            .system
            .namespaces()
            .exists(&NamespaceName::new("acme"))
            .unwrap());
    }

    #[test]
    fn test_create_root_namespace_twice_is_success_class() {
        let mut fixture = Fixture::new("admin");
        fixture.run("CREATE NAMESPACE acme");
        let out = fixture.run("CREATE NAMESPACE acme");
        assert!(out.contains("NamespaceAlreadyExists (2001): acme"));
        // Rendered green, the success color.
        assert!(out.starts_with("\x1b[92m"));
    }

    #[test]
    fn test_create_root_namespace_as_non_admin() {
        let mut fixture = Fixture::new("bob");
        let out = fixture.run("CREATE NAMESPACE acme");
        assert!(out.contains("Unauthorized (4000)"));
        assert!(!fixture
            .system
            .namespaces()
            .exists(&NamespaceName::new("acme"))
            .unwrap());
    }

    #[test]
    fn test_create_child_requires_parent() {
        let mut fixture = Fixture::new("admin");
        let out = fixture.run("CREATE NAMESPACE acme.logs");
        assert!(out.contains("NamespaceDoesNotExist (5002): acme"));

        fixture.run("CREATE NAMESPACE acme");
        let out = fixture.run("CREATE NAMESPACE acme.logs");
        assert!(out.contains("OK (2000): namespace created"));
    }

    #[test]
    fn test_create_child_with_parent_permission() {
        let mut fixture = Fixture::new("bob");
        let namespaces = fixture.system.namespaces();
        let parent = namespaces.create(&NamespaceName::new("acme")).unwrap();
        parent.add_user(&UserName::new("bob")).unwrap();
        parent
            .grant_permissions(&RoleName::new("guest"), &[permissions::CREATE_NAMESPACE])
            .unwrap();

        let user = fixture.system.users().get(&UserName::new("bob")).unwrap();
        user.add_role(&NamespaceName::new("acme"), &RoleName::new("guest"))
            .unwrap();

        let out = fixture.run("CREATE NAMESPACE acme.logs");
        assert!(out.contains("OK (2000): namespace created"));
        assert!(namespaces.exists(&NamespaceName::new("acme.logs")).unwrap());
    }

    #[test]
    fn test_create_child_without_parent_permission() {
        let mut fixture = Fixture::new("bob");
        let namespaces = fixture.system.namespaces();
        let parent = namespaces.create(&NamespaceName::new("acme")).unwrap();
        parent.add_user(&UserName::new("bob")).unwrap();
        // guest exists but lacks create.namespace
        parent
            .grant_permissions(&RoleName::new("guest"), &["subscribe"])
            .unwrap();
        let user = fixture.system.users().get(&UserName::new("bob")).unwrap();
        user.add_role(&NamespaceName::new("acme"), &RoleName::new("guest"))
            .unwrap();

        let out = fixture.run("CREATE NAMESPACE acme.logs");
        assert!(out.contains("Unauthorized (4000): cannot create namespace 'acme.logs'"));
        assert!(!namespaces.exists(&NamespaceName::new("acme.logs")).unwrap());
    }

    #[test]
    fn test_drop_missing_namespace() {
        let mut fixture = Fixture::new("admin");
        let out = fixture.run("DROP NAMESPACE acme");
        assert!(out.contains("NamespaceDoesNotExist (5002): acme"));
    }

    #[test]
    fn test_drop_root_namespace_admin_only() {
        let mut fixture = Fixture::new("bob");
        fixture
            .system
            .namespaces()
            .create(&NamespaceName::new("acme"))
            .unwrap();
        let out = fixture.run("DROP NAMESPACE acme");
        assert!(out.contains("Unauthorized (4000)"));

        let mut admin = Fixture::new("admin");
        admin
            .system
            .namespaces()
            .create(&NamespaceName::new("acme"))
            .unwrap();
        let out = admin.run("DROP NAMESPACE acme");
        assert!(out.contains("OK (2000): namespace dropped"));
        assert!(!admin
            .system
            .namespaces()
            .exists(&NamespaceName::new("acme"))
            .unwrap());
    }

    #[test]
    fn test_drop_child_with_parent_permission() {
        let mut fixture = Fixture::new("bob");
        let namespaces = fixture.system.namespaces();
        let parent = namespaces.create(&NamespaceName::new("acme")).unwrap();
        namespaces.create(&NamespaceName::new("acme.logs")).unwrap();
        parent
            .grant_permissions(&RoleName::new("ops"), &[permissions::DROP_NAMESPACE])
            .unwrap();
        let user = fixture.system.users().get(&UserName::new("bob")).unwrap();
        user.add_role(&NamespaceName::new("acme"), &RoleName::new("ops"))
            .unwrap();

        let out = fixture.run("DROP NAMESPACE acme.logs");
        assert!(out.contains("OK (2000): namespace dropped"));
        assert!(!namespaces.exists(&NamespaceName::new("acme.logs")).unwrap());
    }

    #[test]
    fn test_drop_child_without_permission() {
        let mut fixture = Fixture::new("bob");
        let namespaces = fixture.system.namespaces();
        namespaces.create(&NamespaceName::new("acme")).unwrap();
        namespaces.create(&NamespaceName::new("acme.logs")).unwrap();

        let out = fixture.run("DROP NAMESPACE acme.logs");
        assert!(out.contains("Unauthorized (4000): cannot drop namespace 'acme.logs'"));
        assert!(namespaces.exists(&NamespaceName::new("acme.logs")).unwrap());
    }

    #[test]
    fn test_show_namespaces_as_admin_streams_all() {
        let mut fixture = Fixture::new("admin");
        for name in ["acme", "acme.logs", "beta"] {
            fixture
                .system
                .namespaces()
                .create(&NamespaceName::new(name))
                .unwrap();
        }

        let out = fixture.run("SHOW NAMESPACES");
        assert!(out.contains(" acme\r\n"));
        assert!(out.contains(" acme.logs\r\n"));
        assert!(out.contains(" beta\r\n"));
        assert!(out.contains("OK (2000)"));
    }

    #[test]
    fn test_show_namespaces_as_member_lists_memberships() {
        let mut fixture = Fixture::new("bob");
        fixture
            .system
            .namespaces()
            .create(&NamespaceName::new("acme"))
            .unwrap();
        fixture
            .system
            .namespaces()
            .create(&NamespaceName::new("beta"))
            .unwrap();
        let user = fixture.system.users().get(&UserName::new("bob")).unwrap();
        user.add_role(&NamespaceName::new("acme"), &RoleName::new("guest"))
            .unwrap();

        let out = fixture.run("SHOW NAMESPACES");
        assert!(out.contains(" acme\r\n"));
        assert!(!out.contains(" beta\r\n"));
        assert!(out.contains("OK (2000)"));
    }
}
