//! Command router. Stateless dispatch of parsed commands to the bulk processor and usage store.

use crate::domain::{Alias, ErrorKind, ShortenRequest, UserId, is_valid_url};
use crate::ports::UsageStorePort;
use crate::usecases::bulk_processor::BulkProcessor;
use crate::usecases::command::{ButtonAction, Command, CustomArgs};
use crate::usecases::replies::{self, Reply};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct CommandRouter {
    bulk: Arc<BulkProcessor>,
    store: Arc<dyn UsageStorePort>,
    qr_api_url: String,
}

impl CommandRouter {
    pub fn new(
        bulk: Arc<BulkProcessor>,
        store: Arc<dyn UsageStorePort>,
        qr_api_url: String,
    ) -> Self {
        Self {
            bulk,
            store,
            qr_api_url,
        }
    }

    /// Handle one inbound message. Never fails: every outcome becomes a reply.
    pub async fn handle(&self, user_id: UserId, display_name: &str, text: &str) -> Vec<Reply> {
        let command = Command::parse(text);
        debug!(%user_id, ?command, "dispatching command");
        let max_batch = self.bulk.max_batch_size();

        match command {
            Command::Start => replies::text(replies::welcome(display_name, max_batch)),
            Command::Help => replies::text(replies::help(max_batch)),
            Command::Unknown(name) => replies::text(replies::unknown_command(&name, max_batch)),
            Command::Stats => self.handle_stats(user_id, display_name).await,
            Command::Shorten(None) => replies::text(replies::shorten_usage()),
            Command::Shorten(Some(url)) => self.handle_shorten(user_id, url).await,
            Command::Text(text) => {
                if is_valid_url(&text) {
                    self.handle_shorten(user_id, text).await
                } else {
                    replies::text(replies::invalid_url())
                }
            }
            Command::Custom(None) => replies::text(replies::custom_usage()),
            Command::Custom(Some(args)) => self.handle_custom(user_id, args).await,
            Command::Bulk(urls) if urls.is_empty() => replies::text(replies::bulk_usage(max_batch)),
            Command::Bulk(urls) => self.handle_bulk(user_id, urls).await,
            Command::Qr(None) => replies::text(replies::qr_usage()),
            Command::Qr(Some(url)) => self.handle_qr(&url),
        }
    }

    /// Handle an inline button press. Unknown callback data yields no reply.
    pub async fn handle_callback(&self, user_id: UserId, data: &str) -> Vec<Reply> {
        match ButtonAction::decode(data) {
            Some(ButtonAction::Copy(url)) => replies::text(replies::copy_text(&url)),
            Some(ButtonAction::Qr(url)) => self.handle_qr(&url),
            None => {
                debug!(%user_id, data, "ignoring unknown callback data");
                Vec::new()
            }
        }
    }

    async fn handle_shorten(&self, user_id: UserId, url: String) -> Vec<Reply> {
        let result = self.bulk.shorten_one(ShortenRequest::new(url, user_id)).await;
        replies::single(&result)
    }

    async fn handle_custom(&self, user_id: UserId, args: CustomArgs) -> Vec<Reply> {
        let alias = match Alias::parse(&args.alias) {
            Ok(alias) => alias,
            Err(_) => return replies::text(replies::custom_usage()),
        };
        let request = ShortenRequest::new(args.url, user_id).with_alias(alias);
        let result = self.bulk.shorten_one(request).await;
        replies::single(&result)
    }

    async fn handle_bulk(&self, user_id: UserId, urls: Vec<String>) -> Vec<Reply> {
        info!(%user_id, count = urls.len(), "bulk request");
        match self.bulk.process(&urls, user_id).await {
            Ok(batch) => replies::text(replies::batch_result(&batch)),
            Err(ErrorKind::BatchTooLarge) => replies::text(replies::batch_too_large(
                urls.len(),
                self.bulk.max_batch_size(),
            )),
            Err(kind) => replies::text(replies::batch_rejected(kind)),
        }
    }

    async fn handle_stats(&self, user_id: UserId, display_name: &str) -> Vec<Reply> {
        match self.store.read(user_id).await {
            Ok(stats) => replies::text(replies::stats(display_name, &stats)),
            Err(e) => {
                warn!(%user_id, error = %e, "failed to read usage stats");
                replies::text(replies::stats_unavailable())
            }
        }
    }

    fn handle_qr(&self, url: &str) -> Vec<Reply> {
        if !is_valid_url(url) {
            return replies::text(replies::invalid_url());
        }
        match qr_image_url(&self.qr_api_url, url) {
            Some(image) => vec![Reply::Photo {
                url: image,
                caption: replies::qr_caption(url),
            }],
            None => {
                warn!(base = %self.qr_api_url, "invalid QR API URL");
                replies::text(replies::invalid_url())
            }
        }
    }
}

/// QR image URL for `data`, 300x300, query-encoded.
pub fn qr_image_url(base: &str, data: &str) -> Option<String> {
    url::Url::parse_with_params(base, &[("size", "300x300"), ("data", data)])
        .ok()
        .map(String::from)
}
