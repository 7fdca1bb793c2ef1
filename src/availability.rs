use std::time::Duration;

use color_eyre::eyre::Context;
use color_eyre::Result;
use log::info;
use reqwest::blocking::Client;
use reqwest::{Url, header, redirect};
use serde::Deserialize;

use crate::config::Config;

/// A resale listing as the upstream API reports it. Extra fields in the
/// response are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Offer {
    pub id: String,
    pub quantities: Vec<u32>,
}

impl Offer {
    pub fn ticket_count(&self) -> u32 {
        self.quantities.iter().sum()
    }
}

#[derive(Deserialize)]
struct AvailabilityResponse {
    offers: Vec<Offer>,
}

pub struct AvailabilityClient {
    client: Client,
    base_url: Url,
}

impl AvailabilityClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::COOKIE,
            config.cookie.parse().wrap_err("cookie isn't a valid header value")?,
        );
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(30))
            .build()
            .wrap_err("failed to build availability client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// One GET against the event's availability endpoint. Any non-success
    /// status or undecodable body is an error for the caller; no retries.
    pub fn fetch(&self, event_id: &str) -> Result<Vec<Offer>> {
        let url = self
            .base_url
            .join(&format!("api/event/{event_id}/availability"))?;
        let response: AvailabilityResponse = self
            .client
            .get(url)
            .send()
            .wrap_err("availability request failed")?
            .error_for_status()?
            .json()
            .wrap_err("availability response wasn't valid JSON")?;

        info!("fetched {} offer(s) for event {event_id}", response.offers.len());
        Ok(response.offers)
    }
}

/// The public page for an event, used as the notification deep link.
pub fn event_page_url(base_url: &Url, event_id: &str) -> Result<Url> {
    base_url.join(&format!("event/{event_id}")).map_err(Into::into)
}
