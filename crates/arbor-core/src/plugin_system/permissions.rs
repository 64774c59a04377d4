//! Declared plugin permissions.
//!
//! A descriptor may request access to classes of privileged operations. The
//! set of known permission types is closed; requests for types this build
//! does not know about are dropped at parse time with a warning so old
//! platforms degrade gracefully when reading newer descriptors.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Classes of privileged operations a plugin can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginPermissionType {
    Process,
    NativeLibrary,
    InternetUrl,
    SocketBind,
    SocketConnect,
    GetEnv,
}

impl PluginPermissionType {
    pub const ALL: [PluginPermissionType; 6] = [
        PluginPermissionType::Process,
        PluginPermissionType::NativeLibrary,
        PluginPermissionType::InternetUrl,
        PluginPermissionType::SocketBind,
        PluginPermissionType::SocketConnect,
        PluginPermissionType::GetEnv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginPermissionType::Process => "PROCESS",
            PluginPermissionType::NativeLibrary => "NATIVE_LIBRARY",
            PluginPermissionType::InternetUrl => "INTERNET_URL",
            PluginPermissionType::SocketBind => "SOCKET_BIND",
            PluginPermissionType::SocketConnect => "SOCKET_CONNECT",
            PluginPermissionType::GetEnv => "GET_ENV",
        }
    }
}

impl fmt::Display for PluginPermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for permission type names this build does not recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPermissionType(pub String);

impl FromStr for PluginPermissionType {
    type Err = UnknownPermissionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESS" => Ok(PluginPermissionType::Process),
            "NATIVE_LIBRARY" => Ok(PluginPermissionType::NativeLibrary),
            "INTERNET_URL" => Ok(PluginPermissionType::InternetUrl),
            "SOCKET_BIND" => Ok(PluginPermissionType::SocketBind),
            "SOCKET_CONNECT" => Ok(PluginPermissionType::SocketConnect),
            "GET_ENV" => Ok(PluginPermissionType::GetEnv),
            other => Err(UnknownPermissionType(other.to_string())),
        }
    }
}

/// One granted permission request with its optional scope restrictions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginPermissionDescriptor {
    permission_type: PluginPermissionType,
    allowed_scopes: BTreeSet<String>,
}

impl PluginPermissionDescriptor {
    pub fn new(permission_type: PluginPermissionType) -> Self {
        Self {
            permission_type,
            allowed_scopes: BTreeSet::new(),
        }
    }

    pub fn permission_type(&self) -> PluginPermissionType {
        self.permission_type
    }

    /// Scope patterns the permission is limited to. Empty means unrestricted.
    pub fn allowed_scopes(&self) -> &BTreeSet<String> {
        &self.allowed_scopes
    }

    pub fn add_scope(&mut self, scope: impl Into<String>) {
        self.allowed_scopes.insert(scope.into());
    }
}
