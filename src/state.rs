//! Persistence for the set of offer ids we've already notified about.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use color_eyre::Result;
use log::warn;

use crate::availability::Offer;

#[derive(Debug)]
pub struct NotifiedOffers {
    path: PathBuf,
    ids: HashSet<String>,
}

impl NotifiedOffers {
    /// Loads the persisted id set. A missing file is created empty; an
    /// unreadable or corrupt one is logged and treated as empty. Neither
    /// case aborts the run.
    pub fn load(path: &Path) -> Self {
        let ids = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    warn!("state file {} is corrupt ({e}), starting fresh", path.display());
                    HashSet::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Err(e) = fs::write(path, "[]") {
                    warn!("couldn't create state file {}: {e}", path.display());
                }
                HashSet::new()
            }
            Err(e) => {
                warn!("couldn't read state file {}: {e}", path.display());
                HashSet::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            ids,
        }
    }

    /// Overwrites the state file with the current id set. Only call this
    /// after a notification for the newly-added ids actually went out.
    pub fn save(&self) -> Result<()> {
        let ids: Vec<&String> = self.ids.iter().collect();
        fs::write(&self.path, serde_json::to_string(&ids)?)?;
        Ok(())
    }

    /// Offers we haven't notified about yet, i.e. the set difference by id.
    pub fn filter_new<'a>(&self, offers: &'a [Offer]) -> Vec<&'a Offer> {
        offers.iter().filter(|o| !self.ids.contains(&o.id)).collect()
    }

    pub fn mark_notified<'a>(&mut self, offers: impl IntoIterator<Item = &'a Offer>) {
        self.ids.extend(offers.into_iter().map(|o| o.id.clone()));
    }

    #[cfg(test)]
    pub fn ids(&self) -> &HashSet<String> {
        &self.ids
    }
}
