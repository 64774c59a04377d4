#![cfg(test)]

use std::cmp::Ordering;

use crate::plugin_system::version::{BuildNumber, compare_version_numbers};

#[test]
fn test_build_number_parsing() {
    assert_eq!("123".parse::<BuildNumber>(), Ok(BuildNumber::Release(123)));
    assert_eq!("SNAPSHOT".parse::<BuildNumber>(), Ok(BuildNumber::Snapshot));
    assert_eq!("snapshot".parse::<BuildNumber>(), Ok(BuildNumber::Snapshot));
    assert!(" 42 ".parse::<BuildNumber>().is_ok());
    assert!("1.2".parse::<BuildNumber>().is_err());
    assert!("".parse::<BuildNumber>().is_err());
}

#[test]
fn test_semver_ordering_wins_when_both_sides_parse() {
    assert_eq!(
        compare_version_numbers(Some("1.2.0"), Some("1.10.0")),
        Ordering::Less
    );
    assert_eq!(
        compare_version_numbers(Some("2.0.0"), Some("2.0.0")),
        Ordering::Equal
    );
}

#[test]
fn test_string_fallback_for_non_semver_versions() {
    // "1.10" is not semver, so the plain string ordering applies
    assert_eq!(
        compare_version_numbers(Some("1.10"), Some("1.2")),
        Ordering::Less
    );
}

#[test]
fn test_absent_versions_sort_lowest() {
    assert_eq!(compare_version_numbers(None, Some("0.0.1")), Ordering::Less);
    assert_eq!(compare_version_numbers(Some("0.0.1"), None), Ordering::Greater);
    assert_eq!(compare_version_numbers(None, None), Ordering::Equal);
}
