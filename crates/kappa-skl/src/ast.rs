//! Typed statement tree for SKL.
//!
//! Statements are a closed sum type so the executor's dispatch is checked for
//! exhaustiveness at compile time.

use kappa_commons::{permissions, NamespaceName};
use std::fmt;

/// Discriminant of a statement node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    UseNamespace,
    CreateNamespace,
    DropNamespace,
    ShowNamespaces,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::UseNamespace => "USE_NAMESPACE",
            NodeType::CreateNamespace => "CREATE_NAMESPACE",
            NodeType::DropNamespace => "DROP_NAMESPACE",
            NodeType::ShowNamespaces => "SHOW_NAMESPACE",
        };
        f.write_str(name)
    }
}

/// `USE <namespace>`: select the session namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseStatement {
    pub name: NamespaceName,
}

/// `CREATE NAMESPACE <namespace>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNamespaceStatement {
    pub name: NamespaceName,
}

impl CreateNamespaceStatement {
    /// True when the name contains no period.
    pub fn is_root_namespace(&self) -> bool {
        self.name.is_root()
    }

    pub fn required_permission(&self) -> &'static str {
        permissions::CREATE_NAMESPACE
    }
}

/// `DROP NAMESPACE <namespace>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropNamespaceStatement {
    pub name: NamespaceName,
}

impl DropNamespaceStatement {
    pub fn is_root_namespace(&self) -> bool {
        self.name.is_root()
    }

    pub fn required_permission(&self) -> &'static str {
        permissions::DROP_NAMESPACE
    }
}

/// `SHOW NAMESPACES`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowNamespacesStatement;

/// A parsed SKL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Use(UseStatement),
    CreateNamespace(CreateNamespaceStatement),
    DropNamespace(DropNamespaceStatement),
    ShowNamespaces(ShowNamespacesStatement),
}

impl Statement {
    pub fn node_type(&self) -> NodeType {
        match self {
            Statement::Use(_) => NodeType::UseNamespace,
            Statement::CreateNamespace(_) => NodeType::CreateNamespace,
            Statement::DropNamespace(_) => NodeType::DropNamespace,
            Statement::ShowNamespaces(_) => NodeType::ShowNamespaces,
        }
    }

    /// The permission the executor must check the caller against.
    ///
    /// `USE` needs none; membership in the namespace is checked instead.
    pub fn required_permission(&self) -> Option<&'static str> {
        match self {
            Statement::Use(_) => None,
            Statement::CreateNamespace(s) => Some(s.required_permission()),
            Statement::DropNamespace(s) => Some(s.required_permission()),
            Statement::ShowNamespaces(_) => Some(permissions::SHOW_NAMESPACES),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Use(s) => write!(f, "USE {}", s.name),
            Statement::CreateNamespace(s) => write!(f, "CREATE NAMESPACE {}", s.name),
            Statement::DropNamespace(s) => write!(f, "DROP NAMESPACE {}", s.name),
            Statement::ShowNamespaces(_) => write!(f, "SHOW NAMESPACES"),
        }
    }
}
