//! Outbound delivery: localize directives and send them through Telegram.

use super::telegram::{InlineButton, TelegramChannel};
use crate::dialog::outbound::{Label, OutboundDirective, OutboundSink};
use crate::i18n::{Localizer, MsgText};
use async_trait::async_trait;
use std::sync::Arc;

/// Renders [`OutboundDirective`]s into Telegram messages.
pub struct TelegramSink {
    channel: Arc<TelegramChannel>,
    localizer: Localizer,
}

impl TelegramSink {
    pub fn new(channel: Arc<TelegramChannel>, localizer: Localizer) -> Self {
        Self { channel, localizer }
    }

    fn label_text(&self, label: &Label) -> String {
        match label {
            Label::Key(key) => self.localizer.render(&MsgText::new(*key)),
            Label::Text(text) => text.clone(),
        }
    }
}

#[async_trait]
impl OutboundSink for TelegramSink {
    async fn deliver(&self, chat_id: &str, directive: OutboundDirective) -> anyhow::Result<()> {
        let text = self.localizer.render(&directive.text);

        let keyboard = directive.keyboard.filter(|kb| !kb.is_empty()).map(|kb| {
            kb.rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|btn| InlineButton::new(self.label_text(&btn.label), btn.token.encode()))
                        .collect()
                })
                .collect()
        });

        self.channel.send_message(chat_id, &text, keyboard).await?;
        Ok(())
    }

    async fn ack_callback(&self, query_id: &str) -> anyhow::Result<()> {
        self.channel.answer_callback_query(query_id).await?;
        Ok(())
    }
}
