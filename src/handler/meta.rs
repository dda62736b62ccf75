//! Handler identity and authorization markers.

use std::fmt;

/// How a multi-value marker combines its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Every value is required.
    #[default]
    And,
    /// Any single value suffices.
    Or,
}

/// A declarative tag attached to a handler or to its declaring type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Skip all authorization checks.
    Ignore,
    /// Caller must be logged in.
    CheckLogin,
    CheckRole { roles: Vec<String>, mode: MatchMode },
    CheckPermission { permissions: Vec<String>, mode: MatchMode },
    /// Caller must not be disabled for `service`.
    CheckDisable { service: String },
    /// Application-defined marker, evaluated by name.
    Custom(String),
}

impl Marker {
    pub fn role(role: impl Into<String>) -> Self {
        Self::CheckRole {
            roles: vec![role.into()],
            mode: MatchMode::And,
        }
    }

    pub fn permission(permission: impl Into<String>) -> Self {
        Self::CheckPermission {
            permissions: vec![permission.into()],
            mode: MatchMode::And,
        }
    }

    pub fn kind(&self) -> MarkerKind {
        match self {
            Marker::Ignore => MarkerKind::Ignore,
            Marker::CheckLogin => MarkerKind::CheckLogin,
            Marker::CheckRole { .. } => MarkerKind::CheckRole,
            Marker::CheckPermission { .. } => MarkerKind::CheckPermission,
            Marker::CheckDisable { .. } => MarkerKind::CheckDisable,
            Marker::Custom(_) => MarkerKind::Custom,
        }
    }
}

/// Marker discriminant, used for presence checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Ignore,
    CheckLogin,
    CheckRole,
    CheckPermission,
    CheckDisable,
    Custom,
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarkerKind::Ignore => "ignore",
            MarkerKind::CheckLogin => "check-login",
            MarkerKind::CheckRole => "check-role",
            MarkerKind::CheckPermission => "check-permission",
            MarkerKind::CheckDisable => "check-disable",
            MarkerKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Metadata of the handler a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerMeta {
    name: String,
    declaring_type: Option<String>,
    method_markers: Vec<Marker>,
    type_markers: Vec<Marker>,
}

impl HandlerMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaring_type: None,
            method_markers: Vec::new(),
            type_markers: Vec::new(),
        }
    }

    /// Set the type (controller, module) the handler is declared in.
    pub fn declared_in(mut self, declaring_type: impl Into<String>) -> Self {
        self.declaring_type = Some(declaring_type.into());
        self
    }

    /// Attach a method-level marker.
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.method_markers.push(marker);
        self
    }

    /// Attach a marker inherited from the declaring type.
    pub fn with_type_marker(mut self, marker: Marker) -> Self {
        self.type_markers.push(marker);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_type(&self) -> Option<&str> {
        self.declaring_type.as_deref()
    }

    pub fn method_markers(&self) -> &[Marker] {
        &self.method_markers
    }

    pub fn type_markers(&self) -> &[Marker] {
        &self.type_markers
    }

    /// Returns true if the method or its declaring type carries `kind`.
    pub fn has_marker(&self, kind: MarkerKind) -> bool {
        self.method_markers.iter().any(|m| m.kind() == kind)
            || self.type_markers.iter().any(|m| m.kind() == kind)
    }

    /// Markers in evaluation order: type-level first, then method-level.
    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.type_markers.iter().chain(self.method_markers.iter())
    }
}

impl fmt::Display for HandlerMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.declaring_type {
            Some(ty) => write!(f, "{}::{}", ty, self.name),
            None => f.write_str(&self.name),
        }
    }
}
