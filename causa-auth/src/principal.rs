use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_type!(
    /// Login identity handed to us by the upstream login layer.
    UserId
);
id_type!(
    /// Root of a data partition. Always equal to the owner's own `UserId`.
    OwnerId
);
id_type!(DelegateId);

impl From<&UserId> for OwnerId {
    fn from(user: &UserId) -> Self {
        OwnerId(user.0.clone())
    }
}

/// The acting identity, resolved once when the session is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A lawyer account; owns its own partition.
    Owner { user: UserId },
    /// A staff member acting inside `owner`'s partition.
    Delegate {
        user: UserId,
        delegate: DelegateId,
        owner: OwnerId,
    },
}

impl Principal {
    pub fn user(&self) -> &UserId {
        match self {
            Principal::Owner { user } | Principal::Delegate { user, .. } => user,
        }
    }

    pub fn owner(&self) -> OwnerId {
        match self {
            Principal::Owner { user } => OwnerId::from(user),
            Principal::Delegate { owner, .. } => owner.clone(),
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Principal::Owner { .. })
    }

    pub fn delegate(&self) -> Option<&DelegateId> {
        match self {
            Principal::Owner { .. } => None,
            Principal::Delegate { delegate, .. } => Some(delegate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl Session {
    pub fn owner(user: impl Into<String>) -> Self {
        Session::Authenticated(Principal::Owner {
            user: UserId::new(user),
        })
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(p) => Some(p),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn user(&self) -> Option<&UserId> {
        self.principal().map(Principal::user)
    }
}

/// Partition a session works in: the delegate's owner, or the identity
/// itself. `None` only for anonymous sessions.
pub fn resolve_owner(session: &Session) -> Option<OwnerId> {
    session.principal().map(Principal::owner)
}
