//! Pushes new-offer and error messages to an ntfy topic.

use std::time::Duration;

use color_eyre::eyre::Context;
use color_eyre::Result;
use log::{error, info};
use reqwest::blocking::Client;
use serde::Serialize;

use crate::availability::{event_page_url, Offer};
use crate::config::Config;

#[derive(Serialize)]
struct NtfyMessage {
    topic: String,
    title: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    actions: Option<Vec<NtfyAction>>,
}

#[derive(Serialize)]
struct NtfyAction {
    action: &'static str,
    label: String,
    url: String,
}

fn offer_title(total_tickets: u32, event_name: &str) -> String {
    if total_tickets == 1 {
        format!("1 ticket available for {event_name}!")
    } else {
        format!("{total_tickets} tickets available for {event_name}!")
    }
}

pub struct Notifier {
    client: Client,
}

impl Notifier {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .wrap_err("failed to build notification client")?;
        Ok(Self { client })
    }

    fn post(&self, config: &Config, message: &NtfyMessage) -> Result<()> {
        self.client
            .post(config.ntfy.endpoint.clone())
            .json(message)
            .send()
            .wrap_err("notification request failed")?
            .error_for_status()?;
        Ok(())
    }

    /// Announces new offers. Returns `Ok` only if the push went out, so the
    /// caller knows whether to record these offers as notified.
    pub fn notify_offers(&self, offers: &[&Offer], config: &Config) -> Result<()> {
        let total: u32 = offers.iter().map(|o| o.ticket_count()).sum();
        let message = NtfyMessage {
            topic: config.ntfy.topic.clone(),
            title: offer_title(total, &config.event_name),
            message: format!(
                "{} new resale offer(s) just appeared. Be quick!",
                offers.len()
            ),
            actions: Some(vec![NtfyAction {
                action: "view",
                label: "Open event page".into(),
                url: event_page_url(&config.base_url, &config.event_id)?.into(),
            }]),
        };

        self.post(config, &message)?;
        info!("notified about {} offer(s), {total} ticket(s)", offers.len());
        Ok(())
    }

    /// Best-effort error report. A failure here is only logged, never
    /// propagated, so a broken push service can't cascade.
    pub fn notify_error(&self, err: &color_eyre::Report, config: &Config) {
        let message = NtfyMessage {
            topic: config.ntfy.topic.clone(),
            title: format!("Checking {} failed", config.event_name),
            message: format!("{err:#}"),
            actions: None,
        };

        if let Err(e) = self.post(config, &message) {
            error!("couldn't send error notification: {e:#}");
        }
    }
}
