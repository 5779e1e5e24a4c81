//! Per-target actions backed by the platform client

use crate::executor::{Action, ActionError};
use crate::remote::SharedPlatformClient;
use crate::target::Target;
use async_trait::async_trait;
use tracing::debug;

/// Removes a member from the platform space
pub struct RemoveMember {
    client: SharedPlatformClient,
    reason: String,
}

impl RemoveMember {
    pub fn new(client: SharedPlatformClient, reason: impl Into<String>) -> Self {
        Self {
            client,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Action for RemoveMember {
    fn name(&self) -> &str {
        "remove_member"
    }

    async fn apply(&self, target: &Target) -> Result<(), ActionError> {
        self.client.remove_membership(&target.id, &self.reason).await?;
        Ok(())
    }
}

/// Bans a member, deleting recent messages
pub struct BanMember {
    client: SharedPlatformClient,
    reason: String,
    retention_days: u8,
}

impl BanMember {
    pub fn new(client: SharedPlatformClient, reason: impl Into<String>, retention_days: u8) -> Self {
        Self {
            client,
            reason: reason.into(),
            retention_days,
        }
    }
}

#[async_trait]
impl Action for BanMember {
    fn name(&self) -> &str {
        "ban_member"
    }

    async fn apply(&self, target: &Target) -> Result<(), ActionError> {
        self.client
            .ban_membership(&target.id, &self.reason, self.retention_days)
            .await?;
        Ok(())
    }
}

/// Takes every grouping away from a member
///
/// All removals are attempted; the action fails if any of them did.
pub struct StripGroupings {
    client: SharedPlatformClient,
    reason: String,
}

impl StripGroupings {
    pub fn new(client: SharedPlatformClient, reason: impl Into<String>) -> Self {
        Self {
            client,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Action for StripGroupings {
    fn name(&self) -> &str {
        "strip_groupings"
    }

    async fn apply(&self, target: &Target) -> Result<(), ActionError> {
        let mut failed = 0;
        let mut first_error = None;
        for grouping in &target.groupings {
            if let Err(error) = self
                .client
                .remove_grouping(&target.id, grouping, &self.reason)
                .await
            {
                debug!(member = %target.id, %grouping, %error, "grouping not removed");
                failed += 1;
                first_error.get_or_insert_with(|| error.to_string());
            }
        }

        match first_error {
            None => Ok(()),
            Some(first_error) => Err(ActionError::Partial {
                attempted: target.groupings.len(),
                failed,
                first_error,
            }),
        }
    }
}

/// Deletes a grouping
pub struct DeleteGrouping {
    client: SharedPlatformClient,
    reason: String,
}

impl DeleteGrouping {
    pub fn new(client: SharedPlatformClient, reason: impl Into<String>) -> Self {
        Self {
            client,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Action for DeleteGrouping {
    fn name(&self) -> &str {
        "delete_grouping"
    }

    async fn apply(&self, target: &Target) -> Result<(), ActionError> {
        self.client.delete_grouping(&target.id, &self.reason).await?;
        Ok(())
    }
}

/// Deletes a channel
pub struct DeleteChannel {
    client: SharedPlatformClient,
    reason: String,
}

impl DeleteChannel {
    pub fn new(client: SharedPlatformClient, reason: impl Into<String>) -> Self {
        Self {
            client,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Action for DeleteChannel {
    fn name(&self) -> &str {
        "delete_channel"
    }

    async fn apply(&self, target: &Target) -> Result<(), ActionError> {
        self.client.delete_channel(&target.id, &self.reason).await?;
        Ok(())
    }
}

/// Creates a channel named after the target
pub struct CreateChannel {
    client: SharedPlatformClient,
    reason: String,
}

impl CreateChannel {
    pub fn new(client: SharedPlatformClient, reason: impl Into<String>) -> Self {
        Self {
            client,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Action for CreateChannel {
    fn name(&self) -> &str {
        "create_channel"
    }

    async fn apply(&self, target: &Target) -> Result<(), ActionError> {
        let handle = self.client.create_channel(&target.name, &self.reason).await?;
        debug!(channel = %handle.id, name = %handle.name, "channel created");
        Ok(())
    }
}

/// Posts a fixed message to a channel
pub struct SendMessage {
    client: SharedPlatformClient,
    content: String,
}

impl SendMessage {
    pub fn new(client: SharedPlatformClient, content: impl Into<String>) -> Self {
        Self {
            client,
            content: content.into(),
        }
    }
}

#[async_trait]
impl Action for SendMessage {
    fn name(&self) -> &str {
        "send_message"
    }

    async fn apply(&self, target: &Target) -> Result<(), ActionError> {
        if !target.is_text_channel() {
            return Err(ActionError::Failed(format!(
                "'{}' is not a text channel",
                target.name
            )));
        }
        self.client.send_message(&target.id, &self.content).await?;
        Ok(())
    }
}
