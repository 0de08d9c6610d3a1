//! Charm URL parsing.

use once_cell::sync::Lazy;
use regex::Regex;

static REVISION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-[0-9]+$").expect("revision suffix pattern is valid"));

/// Extract the charm name from a charm URL.
///
/// `local:bionic/heat-12` -> `heat`, `cs:heat` -> `heat`. Purely textual: the
/// segment after the last `/` loses any trailing `-<digits>` revision, then
/// anything up to the last `:` is dropped. An empty URL yields an empty name.
pub fn extract_charm_name(charm_url: &str) -> &str {
    let last_segment = charm_url.rsplit('/').next().unwrap_or(charm_url);
    let without_revision = match REVISION_SUFFIX.find(last_segment) {
        Some(m) => &last_segment[..m.start()],
        None => last_segment,
    };
    without_revision
        .rsplit(':')
        .next()
        .unwrap_or(without_revision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_extract_from_local_url() {
        assert_eq!(extract_charm_name("local:bionic/heat-12"), "heat");
    }

    #[test]
    fn test_extract_without_series_or_revision() {
        assert_eq!(extract_charm_name("cs:heat"), "heat");
        assert_eq!(extract_charm_name("keystone"), "keystone");
    }

    #[test]
    fn test_extract_keeps_hyphenated_names() {
        assert_eq!(
            extract_charm_name("cs:~openstack-charmers/bionic/nova-cloud-controller-501"),
            "nova-cloud-controller"
        );
        assert_eq!(extract_charm_name("cs:bionic/ceph-osd"), "ceph-osd");
    }

    #[test]
    fn test_extract_only_strips_numeric_suffix() {
        assert_eq!(extract_charm_name("cs:focal/mysql-innodb-cluster-5"), "mysql-innodb-cluster");
        assert_eq!(extract_charm_name("cs:focal/ceph-fs-rc1"), "ceph-fs-rc1");
    }

    #[test]
    fn test_extract_empty_and_malformed() {
        assert_eq!(extract_charm_name(""), "");
        assert_eq!(extract_charm_name("cs:"), "");
        assert_eq!(extract_charm_name("/"), "");
    }

    proptest! {
        #[test]
        fn prop_extract_never_contains_separators(url in ".{0,64}") {
            let name = extract_charm_name(&url);
            prop_assert!(!name.contains('/'));
            prop_assert!(!name.contains(':'));
        }

        #[test]
        fn prop_extract_roundtrips_built_urls(
            name in "[a-z][a-z-]{0,20}[a-z]",
            series in "[a-z]{4,8}",
            rev in 0u32..10_000,
        ) {
            let url = format!("cs:{}/{}-{}", series, name, rev);
            prop_assert_eq!(extract_charm_name(&url), name.as_str());
        }
    }
}
