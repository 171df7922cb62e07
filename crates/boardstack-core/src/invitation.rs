//! Board invitations: issue, revise, decline, accept, expire.

use boardstack_db::{DbPool, InvitationRow, MemberRole, MemberRow};
use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::{authorize, resolve, Permission};
use crate::activity::{self, Action};
use crate::board::{AcceptedInvitation, BoardPreview, InvitationPreview, InvitationView, NewInvitation};
use crate::error::{BoardError, BoardResult};
use crate::mailer::{InvitationMail, Mailer};
use crate::user::{find_profile, UserProfile};
use crate::{member, validation};

async fn view(pool: &DbPool, invitation: InvitationRow) -> BoardResult<InvitationView> {
    let invited_by = find_profile(pool, &invitation.created_by).await?;
    Ok(InvitationView {
        invitation,
        invited_by,
    })
}

pub(crate) async fn views(pool: &DbPool, board_id: &str) -> BoardResult<Vec<InvitationView>> {
    let mut views = Vec::new();
    for row in pool.list_invitations(board_id).await? {
        views.push(view(pool, row).await?);
    }
    Ok(views)
}

async fn load(pool: &DbPool, invitation_id: &str) -> BoardResult<InvitationRow> {
    pool.get_invitation(invitation_id)
        .await?
        .ok_or_else(|| BoardError::InvitationNotFound(invitation_id.to_string()))
}

/// Only the addressee may act on an invitation as invitee.
fn check_invitee(invitation: &InvitationRow, user: &UserProfile) -> BoardResult<()> {
    if invitation.email.eq_ignore_ascii_case(&user.email) {
        Ok(())
    } else {
        Err(BoardError::Forbidden)
    }
}

/// Invite `input.email` to the board and mail the invitee.
///
/// Fails with `ServiceUnavailable` when no mailer is configured. If the mail
/// cannot be sent the invitation is withdrawn again.
pub async fn create(
    pool: &DbPool,
    mailer: Option<&dyn Mailer>,
    board_id: &str,
    user_id: &str,
    input: &NewInvitation,
) -> BoardResult<InvitationView> {
    let email = validation::email(&input.email)?;
    let access = authorize(pool, board_id, user_id, Permission::Manage).await?;
    let mailer = mailer
        .ok_or_else(|| BoardError::ServiceUnavailable("mail service is not configured".to_string()))?;

    if pool.find_invitation(board_id, &email).await?.is_some() {
        return Err(BoardError::conflict("user is already invited"));
    }
    if let Some(existing) = pool.find_user_by_email(&email).await? {
        let (_, role, _) = resolve(pool, board_id, &existing.id).await?;
        if role.is_some() {
            return Err(BoardError::conflict("user is already a member"));
        }
    }

    let invitation = InvitationRow {
        id: Uuid::new_v4().to_string(),
        parent_board: board_id.to_string(),
        email,
        role: input.role,
        created_by: user_id.to_string(),
        created_at: Utc::now(),
    };
    pool.insert_invitation(&invitation).await?;

    let inviter = find_profile(pool, user_id).await?;
    let mail = InvitationMail {
        to: invitation.email.clone(),
        board_title: access.board.title.clone(),
        inviter_name: inviter
            .as_ref()
            .map_or_else(|| "A BoardStack user".to_string(), |p| p.full_name.clone()),
        role: invitation.role.as_str().to_string(),
        invitation_id: invitation.id.clone(),
    };
    if let Err(e) = mailer.send_invitation(&mail).await {
        warn!(invitation = %invitation.id, error = %e, "Invitation mail failed, withdrawing");
        pool.delete_invitation(&invitation.id).await?;
        return Err(e);
    }

    info!(board = %board_id, invitation = %invitation.id, "Invitation created");
    Ok(InvitationView {
        invitation,
        invited_by: inviter,
    })
}

/// Change the role an invitation grants.
pub async fn update(
    pool: &DbPool,
    board_id: &str,
    invitation_id: &str,
    user_id: &str,
    role: MemberRole,
) -> BoardResult<InvitationView> {
    authorize(pool, board_id, user_id, Permission::Manage).await?;
    let mut invitation = load(pool, invitation_id).await?;
    if invitation.parent_board != board_id {
        return Err(BoardError::InvitationNotFound(invitation_id.to_string()));
    }
    if invitation.role != role {
        invitation.role = role;
        pool.update_invitation(&invitation).await?;
    }
    view(pool, invitation).await
}

/// Withdraw (manager) or decline (invitee) an invitation.
pub async fn delete(pool: &DbPool, invitation_id: &str, user: &UserProfile) -> BoardResult<InvitationRow> {
    let invitation = load(pool, invitation_id).await?;
    if check_invitee(&invitation, user).is_err() {
        authorize(pool, &invitation.parent_board, &user.id, Permission::Manage).await?;
    }
    pool.delete_invitation(invitation_id).await?;
    Ok(invitation)
}

/// Accept an invitation, turning it into a membership.
pub async fn accept(pool: &DbPool, invitation_id: &str, user: &UserProfile) -> BoardResult<AcceptedInvitation> {
    let invitation = load(pool, invitation_id).await?;
    check_invitee(&invitation, user)?;

    let (_, role, _) = resolve(pool, &invitation.parent_board, &user.id).await?;
    if role.is_some() {
        return Err(BoardError::conflict("user is already a member"));
    }

    let member = MemberRow {
        id: Uuid::new_v4().to_string(),
        parent_board: invitation.parent_board.clone(),
        user_id: user.id.clone(),
        role: invitation.role,
        created_at: Utc::now(),
    };
    pool.insert_member(&member).await?;
    pool.delete_invitation(&invitation.id).await?;
    pool.insert_activity(&[activity::entry(
        &invitation.parent_board,
        &user.id,
        Action::InvitationAccepted,
        None,
        Some(invitation.role.as_str().to_string()),
        Some(&member.id),
    )])
    .await?;

    info!(board = %invitation.parent_board, user = %user.id, "Invitation accepted");
    Ok(AcceptedInvitation {
        member: member::view(pool, member).await?,
        invitation_id: invitation.id,
    })
}

/// The invitee's view of an invitation, with a board preview.
pub async fn get_for_invitee(
    pool: &DbPool,
    invitation_id: &str,
    user: &UserProfile,
) -> BoardResult<InvitationPreview> {
    let invitation = load(pool, invitation_id).await?;
    check_invitee(&invitation, user)?;
    let board = pool
        .get_board(&invitation.parent_board)
        .await?
        .ok_or_else(|| BoardError::BoardNotFound(invitation.parent_board.clone()))?;
    let invited_by = find_profile(pool, &invitation.created_by).await?;
    Ok(InvitationPreview {
        board: BoardPreview::from(&board),
        invitation,
        invited_by,
    })
}

/// Delete invitations older than `ttl`. Returns how many were removed.
pub async fn purge_expired(pool: &DbPool, ttl: Duration) -> BoardResult<u64> {
    let removed = pool.delete_invitations_before(Utc::now() - ttl).await?;
    if removed > 0 {
        info!(removed, "Expired invitations deleted");
    }
    Ok(removed)
}
