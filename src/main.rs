use clap::error::ErrorKind;
use clap::Parser;
use color_eyre::Result;
use log::{info, warn};

mod availability;
mod config;
mod notify;
mod state;

use availability::AvailabilityClient;
use config::{Args, Config};
use notify::Notifier;
use state::NotifiedOffers;

/// One polling pass: fetch offers, diff them against the notified set, push
/// a notification for anything new and persist the ids that went out. Fetch
/// failures turn into an error notification instead of a crash.
fn run(config: &Config, notifier: &Notifier) {
    let mut state = NotifiedOffers::load(&config.state_file);

    let offers = match AvailabilityClient::new(config).and_then(|c| c.fetch(&config.event_id)) {
        Ok(offers) => offers,
        Err(e) => {
            warn!("availability check failed: {e:#}");
            notifier.notify_error(&e, config);
            return;
        }
    };

    let new_offers = state.filter_new(&offers);
    if new_offers.is_empty() {
        info!("no new offers for {}", config.event_name);
        return;
    }

    match notifier.notify_offers(&new_offers, config) {
        Ok(()) => {
            state.mark_notified(new_offers);
            if let Err(e) = state.save() {
                warn!("couldn't persist notified offers: {e:#}");
            }
        }
        // not recording the ids, so the next run retries these offers
        Err(e) => warn!("notification failed: {e:#}"),
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::try_parse().unwrap_or_else(|e| {
        let _ = e.print();
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => std::process::exit(0),
            _ => std::process::exit(1),
        }
    });
    let config = Config::from_args(args)?;

    let notifier = Notifier::new()?;
    run(&config, &notifier);
    Ok(())
}
