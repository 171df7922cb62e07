//! Outbound mail seam.

use async_trait::async_trait;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::info;

use crate::error::{BoardError, BoardResult};

const INVITATION_TEMPLATE: &str = "invitation.txt";
const INVITATION_BODY: &str = r#"Hi,

{{ inviter_name }} invited you to join the board "{{ board_title }}" as {{ role }}.

Open the link below to accept or decline:

{{ accept_url }}

This invitation expires in {{ ttl_days }} days.
"#;

/// Data for an invitation mail.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationMail {
    pub to: String,
    pub board_title: String,
    pub inviter_name: String,
    pub role: String,
    pub invitation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_invitation(&self, mail: &InvitationMail) -> BoardResult<()>;
}

/// Renders mail and writes it to the log instead of sending it.
pub struct LogMailer {
    tera: Tera,
    base_url: String,
    ttl_days: i64,
}

impl LogMailer {
    pub fn new(base_url: impl Into<String>, ttl_days: i64) -> BoardResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(INVITATION_TEMPLATE, INVITATION_BODY)
            .map_err(|e| BoardError::Template(e.to_string()))?;
        Ok(Self {
            tera,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ttl_days,
        })
    }

    pub fn render(&self, mail: &InvitationMail) -> BoardResult<RenderedMail> {
        let mut context =
            Context::from_serialize(mail).map_err(|e| BoardError::Template(e.to_string()))?;
        context.insert(
            "accept_url",
            &format!("{}/invitations/{}", self.base_url, mail.invitation_id),
        );
        context.insert("ttl_days", &self.ttl_days);
        let body = self
            .tera
            .render(INVITATION_TEMPLATE, &context)
            .map_err(|e| BoardError::Template(e.to_string()))?;
        Ok(RenderedMail {
            to: mail.to.clone(),
            subject: format!("Invitation to {}", mail.board_title),
            body,
        })
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_invitation(&self, mail: &InvitationMail) -> BoardResult<()> {
        let rendered = self.render(mail)?;
        info!(
            to = %rendered.to,
            subject = %rendered.subject,
            body = %rendered.body,
            "Invitation mail"
        );
        Ok(())
    }
}
