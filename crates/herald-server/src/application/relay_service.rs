//! Relay Application Service (Use Case)
//!
//! Owns the process-wide relay state and runs the inbound and outbound
//! flows: platform events land in the cache and reach subscribers; user
//! actions go through the dispatch queue to the platform and come back the
//! same way.

use std::sync::Arc;

use herald::domain::entities::{
    MAX_CONTROLS_PER_ROW, MAX_EMBED_FIELDS, MAX_FIELD_NAME_CHARS, MAX_FIELD_VALUE_CHARS, MAX_ROWS,
};
use herald::{
    truncate_chars, BroadcastHub, ButtonLayout, ChatMessageRecord, ContentCache, DispatchQueue,
    EmbedDraft, EmbedRecord, IdentifierCodec, InboundEvent, InteractionId, PlatformGateway,
    RelayError,
};
use herald_integration_discord::ContentMapper;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Longest chat message the platform accepts
pub const MAX_MESSAGE_CHARS: usize = 2000;
/// Longest actor name shown in relayed chat
pub const MAX_ACTOR_CHARS: usize = 80;

/// Application service for relay operations
pub struct RelayService<P: PlatformGateway + ?Sized + 'static> {
    hub: Arc<BroadcastHub>,
    dispatch: DispatchQueue,
    gateway: Option<Arc<P>>,
    codec: IdentifierCodec,
    mapper: Arc<ContentMapper>,
}

impl<P: PlatformGateway + ?Sized + 'static> RelayService<P> {
    pub fn new(
        hub: Arc<BroadcastHub>,
        dispatch: DispatchQueue,
        gateway: Option<Arc<P>>,
        codec: IdentifierCodec,
        mapper: Arc<ContentMapper>,
    ) -> Self {
        Self {
            hub,
            dispatch,
            gateway,
            codec,
            mapper,
        }
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        self.hub.cache()
    }

    pub fn pending_dispatches(&self) -> usize {
        self.dispatch.pending()
    }

    fn gateway(&self) -> Result<Arc<P>, RelayError> {
        self.gateway
            .clone()
            .ok_or_else(|| RelayError::Unavailable("no chat platform configured".into()))
    }

    pub fn platform_name(&self) -> Option<&str> {
        self.gateway.as_deref().map(|g| g.name())
    }

    /// Whether the platform answers
    pub async fn platform_healthy(&self) -> Option<bool> {
        let gateway = self.gateway.as_ref()?;
        Some(gateway.health_check().await.unwrap_or(false))
    }

    /// Apply one observed platform event. Returns the number of subscribers reached.
    pub fn handle_inbound(&self, event: InboundEvent) -> usize {
        debug!(
            channel_id = %event.channel_id(),
            record_id = %event.record_id(),
            "Inbound event"
        );
        match event {
            InboundEvent::Embed(embed) => self.hub.publish_embed(embed),
            InboundEvent::ChatMessage(message) => self.hub.publish_message(message),
        }
    }

    /// Drain inbound events until every sender is gone
    pub async fn run_inbound(self: Arc<Self>, mut events: mpsc::Receiver<InboundEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_inbound(event);
        }
        info!("📭 Inbound event stream closed");
    }

    /// Relay a chat line on behalf of `actor`
    pub async fn send_message(
        &self,
        channel_id: &str,
        actor: &str,
        content: &str,
    ) -> Result<ChatMessageRecord, RelayError> {
        let actor = required("actor", actor)?;
        let content = required("content", content)?;

        let mut actor = actor.to_string();
        truncate_chars(&mut actor, MAX_ACTOR_CHARS);
        let mut text = format!("**{actor}**: {content}");
        truncate_chars(&mut text, MAX_MESSAGE_CHARS);

        let gateway = self.gateway()?;
        let channel = channel_id.to_string();
        let record = self
            .dispatch
            .enqueue("send_message", move || async move {
                gateway.send_message(&channel, &text).await
            })
            .await?;

        info!(channel_id = %channel_id, actor = %actor, message_id = %record.id, "💬 Relayed chat message");
        self.hub.publish_message(record.clone());
        Ok(record)
    }

    /// Post an event embed with a button grid built from `rows` of labels
    pub async fn post_embed(
        &self,
        channel_id: &str,
        actor: &str,
        mut draft: EmbedDraft,
        rows: Vec<Vec<String>>,
    ) -> Result<EmbedRecord, RelayError> {
        let actor = required("actor", actor)?;
        if draft.is_empty() {
            return Err(RelayError::Validation(
                "embed needs a title, description, field or image".into(),
            ));
        }

        draft.fields.truncate(MAX_EMBED_FIELDS);
        for field in &mut draft.fields {
            truncate_chars(&mut field.name, MAX_FIELD_NAME_CHARS);
            truncate_chars(&mut field.value, MAX_FIELD_VALUE_CHARS);
        }

        let layout = layout_from_rows(&rows)?;
        let controls = layout.controls(&self.codec);

        let gateway = self.gateway()?;
        let channel = channel_id.to_string();
        let record = self
            .dispatch
            .enqueue("post_embed", move || async move {
                gateway.post_embed(&channel, &draft, &controls).await
            })
            .await?;

        info!(
            channel_id = %channel_id,
            actor = %actor,
            message_id = %record.id,
            controls = layout.total(),
            "📌 Posted event embed"
        );
        self.hub.publish_embed(record.clone());
        Ok(record)
    }

    /// Relay an overlay control press as the matching RSVP reaction and
    /// return the refreshed embed.
    pub async fn press_control(
        &self,
        channel_id: &str,
        message_id: &str,
        actor: &str,
        custom_id: &str,
    ) -> Result<EmbedRecord, RelayError> {
        let actor = required("actor", actor)?;
        let emoji = self.resolve_reaction(channel_id, message_id, custom_id)?;

        let gateway = self.gateway()?;
        let channel = channel_id.to_string();
        let message = message_id.to_string();
        let refreshed = self
            .dispatch
            .enqueue("press_control", move || async move {
                gateway.add_reaction(&channel, &message, &emoji).await?;
                gateway.fetch_embed(&channel, &message).await
            })
            .await?
            .ok_or_else(|| RelayError::not_found("Embed", message_id))?;

        info!(
            channel_id = %channel_id,
            message_id = %message_id,
            actor = %actor,
            custom_id = %custom_id,
            "✋ Relayed control press"
        );
        self.hub.publish_embed(refreshed.clone());
        Ok(refreshed)
    }

    /// Emoji to react with for a control id.
    ///
    /// Bare RSVP emojis come from reaction-tallied controls; encoded ids are
    /// looked up on the cached embed and must carry an RSVP emoji label.
    fn resolve_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        custom_id: &str,
    ) -> Result<String, RelayError> {
        if self.mapper.is_rsvp_emoji(custom_id) {
            return Ok(custom_id.to_string());
        }

        let id = InteractionId::parse(custom_id)?;
        let embed = self
            .cache()
            .embed(channel_id, message_id)
            .ok_or_else(|| RelayError::not_found("Embed", message_id))?;
        let button = embed
            .button(custom_id)
            .ok_or_else(|| RelayError::not_found("Control", custom_id))?;

        match self.mapper.leading_emoji(&button.label) {
            Some(emoji) => Ok(emoji.to_string()),
            None => {
                warn!(custom_id = %id, label = %button.label, "Control has no RSVP emoji");
                Err(RelayError::Validation(format!(
                    "control '{}' is not an RSVP control",
                    button.label
                )))
            }
        }
    }

    /// Stop the hub and drain the dispatch queue.
    pub async fn shutdown(&self) {
        self.hub.shutdown().await;
        self.dispatch.shutdown().await;
        info!("🛑 Relay service stopped");
    }
}

fn required<'a>(name: &str, value: &'a str) -> Result<&'a str, RelayError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RelayError::Validation(format!("{name} must not be empty")));
    }
    Ok(trimmed)
}

/// Build a layout, rejecting input that does not fit instead of trimming it
fn layout_from_rows(rows: &[Vec<String>]) -> Result<ButtonLayout, RelayError> {
    let mut layout = ButtonLayout::new();
    for (r, row) in rows.iter().enumerate() {
        if r > 0 && !layout.add_row().is_applied() {
            return Err(RelayError::CapacityRejected(format!(
                "at most {MAX_ROWS} rows of controls"
            )));
        }
        for label in row {
            let label = required("control label", label)?;
            if !layout.add_control(r, label).is_applied() {
                return Err(RelayError::CapacityRejected(format!(
                    "row {} is full or the grid reached its limit ({MAX_CONTROLS_PER_ROW} per row)",
                    r + 1
                )));
            }
        }
    }
    Ok(layout)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use herald::{ButtonRecord, ChatMessageRecord, EmbedDraft, EmbedRecord, PlatformGateway};

    use super::*;

    /// In-memory platform that records every call
    #[derive(Default)]
    pub struct FakeGateway {
        pub calls: Mutex<Vec<String>>,
        pub reactions: Mutex<Vec<String>>,
        pub fail_with: Mutex<Option<RelayError>>,
    }

    impl FakeGateway {
        fn record(&self, call: String) -> Result<(), RelayError> {
            self.calls.lock().unwrap().push(call);
            match self.fail_with.lock().unwrap().clone() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl PlatformGateway for FakeGateway {
        fn name(&self) -> &str {
            "fake"
        }

        async fn send_message(
            &self,
            channel_id: &str,
            content: &str,
        ) -> Result<ChatMessageRecord, RelayError> {
            self.record(format!("send {channel_id} {content}"))?;
            let id = self.calls.lock().unwrap().len().to_string();
            Ok(ChatMessageRecord::new(id, channel_id, "bot", "Herald", content))
        }

        async fn post_embed(
            &self,
            channel_id: &str,
            draft: &EmbedDraft,
            controls: &[Vec<ButtonRecord>],
        ) -> Result<EmbedRecord, RelayError> {
            self.record(format!("embed {channel_id}"))?;
            let mut record = EmbedRecord::new("9000", channel_id);
            record.title = draft.title.clone();
            let buttons: Vec<ButtonRecord> = controls.iter().flatten().cloned().collect();
            if !buttons.is_empty() {
                record.buttons = Some(buttons);
            }
            Ok(record)
        }

        async fn add_reaction(
            &self,
            channel_id: &str,
            message_id: &str,
            emoji: &str,
        ) -> Result<(), RelayError> {
            self.record(format!("react {channel_id} {message_id} {emoji}"))?;
            self.reactions.lock().unwrap().push(emoji.to_string());
            Ok(())
        }

        async fn fetch_embed(
            &self,
            channel_id: &str,
            message_id: &str,
        ) -> Result<Option<EmbedRecord>, RelayError> {
            self.record(format!("fetch {channel_id} {message_id}"))?;
            let count = self.reactions.lock().unwrap().len();
            Ok(Some(
                EmbedRecord::new(message_id, channel_id).with_buttons(vec![
                    ButtonRecord::with_custom_id(format!("✅ {count}"), "✅"),
                ]),
            ))
        }
    }

    pub fn service<P: PlatformGateway + ?Sized + 'static>(
        gateway: Option<Arc<P>>,
    ) -> RelayService<P> {
        let cache = Arc::new(ContentCache::default());
        let hub = Arc::new(BroadcastHub::new(cache, herald::HubConfig::default()));
        RelayService::new(
            hub,
            DispatchQueue::new(herald::DispatchConfig::default()),
            gateway,
            IdentifierCodec::default(),
            Arc::new(ContentMapper::default()),
        )
    }
}
