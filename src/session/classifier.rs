//! Decides whether a member is actively practicing right now.

use crate::model::{ChannelId, MemberSnapshot, VoiceRoom};

/// `true` when the member counts as live.
///
/// A live member:
/// 1. is not a bot (recording bots sit in rooms too),
/// 2. is not muted, by themself or a moderator,
/// 3. is in a permitted room that still exists (`room` is the lookup of
///    `member.channel_id`),
/// 4. and that room is not locked by someone else.
pub fn is_live(member: &MemberSnapshot, permitted: &[ChannelId], room: Option<&VoiceRoom>) -> bool {
    let Some(channel) = member.channel_id else {
        return false;
    };
    let Some(room) = room.filter(|r| r.id == channel) else {
        return false;
    };

    !member.is_bot
        && !member.is_muted()
        && permitted.contains(&channel)
        && room.admits(member.member_id)
}
