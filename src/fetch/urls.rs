// src/fetch/urls.rs
use futures::{stream, StreamExt};
use std::{collections::BTreeMap, fmt};
use tracing::{debug, info, instrument, warn};

use super::client::HttpClient;
use super::links::{get_links_from_bytes, period_of};
use crate::config::Config;
use crate::error::LinkError;

pub const YEARS: std::ops::RangeInclusive<u32> = 21..=23;
pub const MONTHS: std::ops::RangeInclusive<u32> = 1..=12;

/// Periods EMT never published: before the July 2021 launch, the broken
/// October 2021 upload, and everything after February 2023.
const EXCLUDED: &[(u32, std::ops::RangeInclusive<u32>)] =
    &[(21, 1..=6), (21, 10..=10), (23, 3..=12)];

/// Range and publication-policy checks for a (month, year) request.
pub fn validate_period(month: u32, year: u32) -> Result<(), LinkError> {
    if !YEARS.contains(&year) || !MONTHS.contains(&month) {
        return Err(LinkError::InvalidRange { month, year });
    }
    if EXCLUDED
        .iter()
        .any(|(y, months)| *y == year && months.contains(&month))
    {
        return Err(LinkError::NoDataForPeriod { month, year });
    }
    Ok(())
}

/// Validated archive paths keyed by `(year, month)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkIndex(BTreeMap<(u32, u32), String>);

impl LinkIndex {
    pub fn get(&self, year: u32, month: u32) -> Option<&str> {
        self.0.get(&(year, month)).map(String::as_str)
    }

    pub fn contains(&self, year: u32, month: u32) -> bool {
        self.0.contains_key(&(year, month))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(u32, u32), &String)> {
        self.0.iter()
    }
}

impl FromIterator<((u32, u32), String)> for LinkIndex {
    fn from_iter<I: IntoIterator<Item = ((u32, u32), String)>>(iter: I) -> Self {
        LinkIndex(iter.into_iter().collect())
    }
}

impl fmt::Display for LinkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for ((year, month), link) in &self.0 {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "({year}, {month}): {link}")?;
        }
        Ok(())
    }
}

/// Resolver for the EMT open-data portal. Owns the HTTP client and the
/// [`LinkIndex`] from its last successful resolution pass.
pub struct UrlEmt<C> {
    client: C,
    config: Config,
    links: LinkIndex,
}

impl<C: HttpClient> UrlEmt<C> {
    /// Build the resolver and resolve every advertised archive up front.
    pub async fn new(client: C, config: Config) -> Result<Self, LinkError> {
        let mut emt = Self::with_links(client, config, LinkIndex::default());
        emt.refresh().await?;
        Ok(emt)
    }

    /// Build a resolver around an index obtained elsewhere, without network access.
    pub fn with_links(client: C, config: Config, links: LinkIndex) -> Self {
        Self {
            client,
            config,
            links,
        }
    }

    /// Re-run resolution. The stored index is only replaced if the pass succeeds.
    pub async fn refresh(&mut self) -> Result<(), LinkError> {
        self.links = self.resolve_links().await?;
        Ok(())
    }

    /// Fetch the index page and keep the candidate archives that answer a probe.
    #[instrument(level = "info", skip(self), fields(index = %self.config.emt.index_url()))]
    pub async fn resolve_links(&self) -> Result<LinkIndex, LinkError> {
        let url = self.config.emt.index_url();
        let resp = self
            .client
            .get(&url)
            .await
            .map_err(|e| LinkError::UpstreamUnavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        if resp.status != 200 {
            return Err(LinkError::UpstreamUnavailable {
                url,
                reason: format!("status code {}", resp.status),
            });
        }

        let mut candidates: Vec<String> = get_links_from_bytes(&resp.body)?.into_iter().collect();
        candidates.sort();
        debug!(count = candidates.len(), "candidate archive links");

        let timeout = self.config.http.probe_timeout();
        let probed: Vec<(String, bool)> = stream::iter(candidates)
            .map(|link| async move {
                let target = self.config.emt.absolute(&link);
                let ok = match self.client.head(&target, timeout).await {
                    Ok(status) if (200..300).contains(&status) => true,
                    Ok(status) => {
                        debug!(%link, status, "probe rejected");
                        false
                    }
                    Err(e) => {
                        debug!(%link, error = %e, "probe failed");
                        false
                    }
                };
                (link, ok)
            })
            .buffer_unordered(self.config.http.probe_concurrency.max(1))
            .collect()
            .await;

        // Merge only once every probe has finished, in link order.
        let mut valid: Vec<String> = probed
            .into_iter()
            .filter_map(|(link, ok)| ok.then_some(link))
            .collect();
        valid.sort();

        let mut index = BTreeMap::new();
        for link in valid {
            match period_of(&link) {
                Some((year, month)) if YEARS.contains(&year) && MONTHS.contains(&month) => {
                    index.insert((year, month), link);
                }
                Some((year, month)) => debug!(%link, year, month, "period out of range; dropped"),
                None => warn!(%link, "could not read period from link"),
            }
        }

        info!(archives = index.len(), "resolved archive index");
        Ok(LinkIndex(index))
    }

    /// Archive path for the given period.
    pub fn get_url(&self, month: u32, year: u32) -> Result<&str, LinkError> {
        validate_period(month, year)?;
        self.links
            .get(year, month)
            .ok_or(LinkError::NotFound { month, year })
    }

    pub fn links(&self) -> &LinkIndex {
        &self.links
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn client(&self) -> &C {
        &self.client
    }
}

impl<C> fmt::Display for UrlEmt<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.links.fmt(f)
    }
}
