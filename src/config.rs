use std::fs;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, eyre};
use color_eyre::Result;
use reqwest::Url;
use serde::Deserialize;

/// Watches one event's resale offers and pings ntfy when new ones show up.
#[derive(Parser, Debug)]
#[command(name = "resale_watcher", version, about)]
pub struct Args {
    /// Identifier of the event to watch
    #[arg(long)]
    pub event_id: String,

    /// Display name of the event, used in notification titles
    #[arg(long)]
    pub event_name: String,

    /// Full ntfy URL; the origin is the server, the first path segment the topic
    #[arg(long)]
    pub ntfy_url: String,

    /// Where the already-notified offer ids are persisted
    #[arg(long, default_value = "notified-offers.json")]
    pub state_file: PathBuf,

    /// Read the session cookie from this file instead of the COOKIE env var
    #[arg(long)]
    pub cookie_file: Option<PathBuf>,
}

#[derive(Deserialize)]
struct EnvConfig {
    cookie: Option<String>,
    #[serde(default = "default_user_agent")]
    user_agent: String,
    #[serde(default = "default_base_url")]
    base_url: String,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36".into()
}

fn default_base_url() -> String {
    "https://www.fansale.de".into()
}

#[derive(Debug, Clone)]
pub struct NtfyTarget {
    pub endpoint: Url,
    pub topic: String,
}

impl NtfyTarget {
    pub fn parse(raw: &str) -> Result<Self> {
        let url: Url = raw.parse().wrap_err("invalid ntfy URL")?;
        let topic = url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| eyre!("ntfy URL {raw} has no topic path segment"))?
            .to_string();
        let mut endpoint = url.clone();
        endpoint.set_path("");
        endpoint.set_query(None);
        endpoint.set_fragment(None);
        Ok(Self { endpoint, topic })
    }
}

#[derive(Debug)]
pub struct Config {
    pub event_id: String,
    pub event_name: String,
    pub ntfy: NtfyTarget,
    pub cookie: String,
    pub user_agent: String,
    pub base_url: Url,
    pub state_file: PathBuf,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        dotenvy::dotenv().ok();
        let env = envy::from_env::<EnvConfig>().wrap_err("failed to load env config")?;

        let cookie = match &args.cookie_file {
            Some(path) => fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read cookie file {}", path.display()))?
                .trim()
                .to_string(),
            None => env.cookie.unwrap_or_default(),
        };
        if cookie.is_empty() {
            return Err(eyre!("no session cookie: set COOKIE or pass --cookie-file"));
        }

        Ok(Self {
            ntfy: NtfyTarget::parse(&args.ntfy_url)?,
            event_id: args.event_id,
            event_name: args.event_name,
            cookie,
            user_agent: env.user_agent,
            base_url: env.base_url.parse().wrap_err("invalid BASE_URL")?,
            state_file: args.state_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn ntfy_target_splits_origin_and_topic() {
        let target = NtfyTarget::parse("https://ntfy.sh/resale-alerts").unwrap();
        assert_eq!(target.endpoint.as_str(), "https://ntfy.sh/");
        assert_eq!(target.topic, "resale-alerts");
    }

    #[test]
    fn ntfy_target_ignores_query_and_extra_segments() {
        let target = NtfyTarget::parse("https://push.example.org/tickets/extra?auth=x").unwrap();
        assert_eq!(target.endpoint.as_str(), "https://push.example.org/");
        assert_eq!(target.topic, "tickets");
    }

    #[test]
    fn ntfy_target_rejects_missing_topic() {
        assert!(NtfyTarget::parse("https://ntfy.sh/").is_err());
        assert!(NtfyTarget::parse("https://ntfy.sh").is_err());
        assert!(NtfyTarget::parse("not a url").is_err());
    }

    #[test]
    fn required_options_are_enforced() {
        let err = Args::try_parse_from(["resale_watcher", "--event-id", "123"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn all_required_options_parse() {
        let args = Args::try_parse_from([
            "resale_watcher",
            "--event-id",
            "17426041",
            "--event-name",
            "Example Tour",
            "--ntfy-url",
            "https://ntfy.sh/my-topic",
        ])
        .unwrap();
        assert_eq!(args.event_id, "17426041");
        assert_eq!(args.state_file, PathBuf::from("notified-offers.json"));
        assert!(args.cookie_file.is_none());
    }

    #[test]
    fn empty_cookie_file_is_a_configuration_error() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let args = Args::try_parse_from([
            "resale_watcher",
            "--event-id",
            "1",
            "--event-name",
            "X",
            "--ntfy-url",
            "https://ntfy.sh/t",
            "--cookie-file",
            tmp.path().to_str().unwrap(),
        ])
        .unwrap();
        assert!(Config::from_args(args).is_err());
    }
}
