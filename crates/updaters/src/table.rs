use std::collections::HashMap;

use {
    linktrack_common::{Error, Result, address},
    tracing::debug,
    url::Url,
};

use crate::updater::LinkUpdater;

/// Domain → updater routing, built once at startup.
///
/// Every domain maps to exactly one updater; a second updater claiming the
/// same domain is rejected when the table is built.
#[derive(Debug)]
pub struct UpdaterTable {
    by_domain: HashMap<&'static str, LinkUpdater>,
}

impl UpdaterTable {
    pub fn new(updaters: Vec<LinkUpdater>) -> Result<Self> {
        let mut by_domain = HashMap::with_capacity(updaters.len());
        for updater in updaters {
            let domain = updater.domain();
            if by_domain.insert(domain, updater).is_some() {
                return Err(Error::DuplicateDomain {
                    domain: domain.to_string(),
                });
            }
            debug!(domain, "updater registered");
        }
        Ok(Self { by_domain })
    }

    /// The updater owning `url`'s domain, if any.
    pub fn resolve(&self, url: &Url) -> Option<&LinkUpdater> {
        let domain = address::domain_of(url)?;
        self.by_domain.get(domain.as_str())
    }

    pub fn domains(&self) -> Vec<&'static str> {
        let mut domains: Vec<_> = self.by_domain.keys().copied().collect();
        domains.sort_unstable();
        domains
    }

    pub fn len(&self) -> usize {
        self.by_domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty()
    }
}
