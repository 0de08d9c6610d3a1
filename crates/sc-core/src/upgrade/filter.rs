//! Exclusion filters for upgrade planning.
//!
//! A filter returns `Ok(true)` to EXCLUDE an application. Filters run in
//! chain order and the first exclusion short-circuits the rest.

use crate::model::ModelClient;
use sc_common::{extract_charm_name, ApplicationStatus, Error, Result};
use std::fmt;
use tracing::warn;

/// Applications never upgraded by the full OpenStack upgrade path.
pub const UPGRADE_EXCLUDE_LIST: &[&str] = &["rabbitmq-server", "percona-cluster"];

/// Config options whose presence marks an OpenStack payload charm.
pub const SOURCE_OPTIONS: &[&str] = &["openstack-origin", "source"];

/// A predicate deciding whether an application is left out of the plan.
pub trait UpgradeFilter {
    /// Name used in logs and in configuration.
    fn name(&self) -> &str {
        "custom"
    }

    fn exclude(
        &self,
        app: &str,
        status: &ApplicationStatus,
        client: &dyn ModelClient,
    ) -> Result<bool>;
}

impl<F> UpgradeFilter for F
where
    F: Fn(&str, &ApplicationStatus, &dyn ModelClient) -> Result<bool>,
{
    fn exclude(
        &self,
        app: &str,
        status: &ApplicationStatus,
        client: &dyn ModelClient,
    ) -> Result<bool> {
        self(app, status, client)
    }
}

/// Excludes subordinate applications.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubordinateFilter;

impl UpgradeFilter for SubordinateFilter {
    fn name(&self) -> &str {
        "subordinates"
    }

    fn exclude(&self, app: &str, status: &ApplicationStatus, _: &dyn ModelClient) -> Result<bool> {
        if status.is_subordinate() {
            warn!(app, "excluding from upgrade, it is a subordinate");
            return Ok(true);
        }
        Ok(false)
    }
}

/// Excludes applications whose name or charm is on [`UPGRADE_EXCLUDE_LIST`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcludeListFilter;

impl UpgradeFilter for ExcludeListFilter {
    fn name(&self) -> &str {
        "upgrade-exclude-list"
    }

    fn exclude(&self, app: &str, status: &ApplicationStatus, _: &dyn ModelClient) -> Result<bool> {
        let charm = extract_charm_name(&status.charm);
        if UPGRADE_EXCLUDE_LIST.contains(&app) || UPGRADE_EXCLUDE_LIST.contains(&charm) {
            warn!(app, charm, "excluding from upgrade, on the exclude list");
            return Ok(true);
        }
        Ok(false)
    }
}

/// Excludes applications with no [`SOURCE_OPTIONS`] entry in their live config.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonOpenstackFilter;

impl UpgradeFilter for NonOpenstackFilter {
    fn name(&self) -> &str {
        "non-openstack-services"
    }

    fn exclude(&self, app: &str, _: &ApplicationStatus, client: &dyn ModelClient) -> Result<bool> {
        let config = client.get_application_config(app)?;
        if !SOURCE_OPTIONS.iter().any(|opt| config.contains_key(*opt)) {
            warn!(app, "excluding from upgrade, no source option");
            return Ok(true);
        }
        Ok(false)
    }
}

/// Excludes applications whose charm name contains a fixed substring.
#[derive(Debug, Clone, Copy)]
pub struct CharmSubstringFilter {
    name: &'static str,
    needle: &'static str,
}

impl CharmSubstringFilter {
    pub const EASYRSA: Self = Self::new("easyrsa", "easyrsa");
    pub const ETCD: Self = Self::new("etcd", "etcd");
    pub const MEMCACHED: Self = Self::new("memcached", "memcached");

    pub const fn new(name: &'static str, needle: &'static str) -> Self {
        Self { name, needle }
    }
}

impl UpgradeFilter for CharmSubstringFilter {
    fn name(&self) -> &str {
        self.name
    }

    fn exclude(&self, app: &str, status: &ApplicationStatus, _: &dyn ModelClient) -> Result<bool> {
        let charm = extract_charm_name(&status.charm);
        if charm.contains(self.needle) {
            warn!(app, charm, "skipping upgrade of {} charm", self.needle);
            return Ok(true);
        }
        Ok(false)
    }
}

/// Look up a built-in filter by its configuration name.
pub fn builtin_filter(name: &str) -> Option<Box<dyn UpgradeFilter>> {
    let filter: Box<dyn UpgradeFilter> = match name {
        "subordinates" => Box::new(SubordinateFilter),
        "upgrade-exclude-list" => Box::new(ExcludeListFilter),
        "non-openstack-services" => Box::new(NonOpenstackFilter),
        "easyrsa" => Box::new(CharmSubstringFilter::EASYRSA),
        "etcd" => Box::new(CharmSubstringFilter::ETCD),
        "memcached" => Box::new(CharmSubstringFilter::MEMCACHED),
        _ => return None,
    };
    Some(filter)
}

/// Caller-supplied filters appended after a mode's defaults.
#[derive(Default)]
pub enum ExtraFilters {
    #[default]
    None,
    One(Box<dyn UpgradeFilter>),
    Many(Vec<Box<dyn UpgradeFilter>>),
    /// Built-in filters by name, as read from configuration.
    Named(Vec<String>),
}

impl ExtraFilters {
    /// Wrap a single filter or closure.
    pub fn one<F>(filter: F) -> Self
    where
        F: UpgradeFilter + 'static,
    {
        ExtraFilters::One(Box::new(filter))
    }

    pub fn named<S: AsRef<str>>(names: &[S]) -> Self {
        ExtraFilters::Named(names.iter().map(|n| n.as_ref().to_string()).collect())
    }
}

impl fmt::Debug for ExtraFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraFilters::None => f.write_str("None"),
            ExtraFilters::One(filter) => f.debug_tuple("One").field(&filter.name()).finish(),
            ExtraFilters::Many(filters) => f
                .debug_tuple("Many")
                .field(&filters.iter().map(|x| x.name()).collect::<Vec<_>>())
                .finish(),
            ExtraFilters::Named(names) => f.debug_tuple("Named").field(names).finish(),
        }
    }
}

/// Ordered sequence of exclusion filters.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn UpgradeFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain of built-in filters from their names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut chain = Self::new();
        for name in names {
            let name = name.as_ref();
            let filter = builtin_filter(name)
                .ok_or_else(|| Error::InvalidArgument(format!("unknown upgrade filter: {}", name)))?;
            chain.push(filter);
        }
        Ok(chain)
    }

    pub fn push(&mut self, filter: Box<dyn UpgradeFilter>) {
        self.filters.push(filter);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with<F>(mut self, filter: F) -> Self
    where
        F: UpgradeFilter + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Append caller-supplied filters.
    pub fn extend(&mut self, extra: ExtraFilters) -> Result<()> {
        match extra {
            ExtraFilters::None => {}
            ExtraFilters::One(filter) => self.filters.push(filter),
            ExtraFilters::Many(filters) => self.filters.extend(filters),
            ExtraFilters::Named(names) => self.filters.extend(Self::from_names(&names)?.filters),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// True if any filter excludes the application.
    pub fn excludes(
        &self,
        app: &str,
        status: &ApplicationStatus,
        client: &dyn ModelClient,
    ) -> Result<bool> {
        for filter in &self.filters {
            if filter.exclude(app, status, client)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.names())
            .finish()
    }
}
