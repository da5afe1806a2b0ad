//! Practice-chat write access that follows voice presence.
//!
//! Members sitting in a practice room may post in the practice text channel
//! (even while muted, so they can talk with the room without unmuting).
//! Leaving the rooms, deafening while muted, or receiving the temp-mute role
//! takes the permission away again.
//!
//! Every update first reads the member's current overwrite and only writes
//! when the result would differ, so repeating an update on unchanged state
//! issues no platform command.

use crate::config::RoomsConfig;
use crate::model::{ChannelId, MemberSnapshot, PermissionOverwrite, Permissions};
use crate::platform::{Platform, PlatformError};

/// What [`update_chat_access`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessChange {
    /// Send permission was written to the member's overwrite.
    Granted,
    /// The overwrite only existed to grant send permission and was deleted.
    OverwriteDeleted,
    /// Send permission was cleared from an overwrite that carries other bits.
    SendCleared,
    /// Nothing to do.
    Unchanged,
    /// The guild has no practice chat channel.
    NoChatChannel,
}

/// `true` when `member` should be able to post in the practice chat.
pub fn should_have_access(
    rooms: &RoomsConfig,
    permitted: &[ChannelId],
    member: &MemberSnapshot,
) -> bool {
    member
        .channel_id
        .is_some_and(|channel| permitted.contains(&channel))
        && !(member.is_muted() && member.self_deaf)
        && !member.has_role(&rooms.temp_muted_role)
}

/// Bring the member's overwrite on the practice chat in line with
/// [`should_have_access`].
pub async fn update_chat_access(
    platform: &dyn Platform,
    rooms: &RoomsConfig,
    permitted: &[ChannelId],
    member: &MemberSnapshot,
) -> Result<AccessChange, PlatformError> {
    let Some(chat) = platform
        .text_channel_by_name(member.guild_id, &rooms.practice_chat_name)
        .await?
    else {
        return Ok(AccessChange::NoChatChannel);
    };

    let existing = platform.member_overwrite(chat.id, member.member_id).await?;

    if should_have_access(rooms, permitted, member) {
        let mut overwrite = existing.unwrap_or_default();
        if overwrite.allow.contains(Permissions::SEND_MESSAGES)
            && !overwrite.deny.contains(Permissions::SEND_MESSAGES)
        {
            return Ok(AccessChange::Unchanged);
        }
        overwrite.allow.insert(Permissions::SEND_MESSAGES);
        overwrite.deny.remove(Permissions::SEND_MESSAGES);
        platform
            .put_member_overwrite(chat.id, member.member_id, overwrite)
            .await?;
        log::debug!("access: granted practice chat to member {}", member.member_id);
        return Ok(AccessChange::Granted);
    }

    // A moderator may have removed the overwrite by hand; nothing to revoke.
    let Some(mut overwrite) = existing else {
        return Ok(AccessChange::Unchanged);
    };

    if overwrite == PermissionOverwrite::allowing(Permissions::SEND_MESSAGES) {
        platform
            .delete_member_overwrite(chat.id, member.member_id)
            .await?;
        log::debug!("access: deleted practice chat overwrite of member {}", member.member_id);
        return Ok(AccessChange::OverwriteDeleted);
    }

    if !overwrite.mentions(Permissions::SEND_MESSAGES) {
        return Ok(AccessChange::Unchanged);
    }

    overwrite.clear(Permissions::SEND_MESSAGES);
    platform
        .put_member_overwrite(chat.id, member.member_id, overwrite)
        .await?;
    log::debug!("access: cleared practice chat send bit of member {}", member.member_id);
    Ok(AccessChange::SendCleared)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
