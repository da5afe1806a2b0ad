//! Permission bitsets and per-target permission overwrites.
//!
//! Only the handful of bits this crate touches are named; any other bit the
//! platform reports is carried through untouched.

use serde::{Deserialize, Serialize};

use super::{MemberId, RoleId};

/// A set of permission bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const NONE: Permissions = Permissions(0);
    pub const VIEW_CHANNEL: Permissions = Permissions(1 << 10);
    pub const SEND_MESSAGES: Permissions = Permissions(1 << 11);
    pub const SPEAK: Permissions = Permissions(1 << 21);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Permissions) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Permissions) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Permissions) -> Permissions {
        Permissions(self.0 | rhs.0)
    }
}

/// Explicit allow/deny bits for one member on one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    pub allow: Permissions,
    pub deny: Permissions,
}

impl PermissionOverwrite {
    /// An overwrite that explicitly allows `perms` and denies nothing.
    pub fn allowing(perms: Permissions) -> Self {
        Self {
            allow: perms,
            deny: Permissions::NONE,
        }
    }

    /// `true` when the overwrite mentions `perms` at all (allowed or denied).
    pub fn mentions(&self, perms: Permissions) -> bool {
        self.allow.0 & perms.0 != 0 || self.deny.0 & perms.0 != 0
    }

    /// Reset `perms` to "inherit" on both sides.
    pub fn clear(&mut self, perms: Permissions) {
        self.allow.remove(perms);
        self.deny.remove(perms);
    }
}

/// Who a channel-level overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwriteTarget {
    Role(RoleId),
    Member(MemberId),
}

/// An overwrite attached to a channel at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOverwrite {
    pub target: OverwriteTarget,
    pub allow: Permissions,
    pub deny: Permissions,
}

impl ChannelOverwrite {
    pub fn deny_role(role: RoleId, deny: Permissions) -> Self {
        Self {
            target: OverwriteTarget::Role(role),
            allow: Permissions::NONE,
            deny,
        }
    }
}
