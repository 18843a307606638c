//! Strict compatibility between an original version and its aligned replacement
//!
//! A replacement is accepted when it reads as "the same version plus an
//! accepted suffix and build number":
//! - `1.0` -> `1.0.redhat-1` or `1.0.0.redhat-1` is accepted
//! - `1.0` -> `1.1.redhat-1` is rejected
//! - `1.0.redhat-3` -> `1.0.0.redhat-5` is accepted only when suffix
//!   transitions are tolerated, and never towards a lower build number

use regex::Regex;
use tracing::debug;

use crate::config::AlignmentConfig;
use crate::version::Version;

/// Whether `new_value` is a strictly compatible replacement for `old_value`.
pub fn is_strictly_compatible(old_value: &str, new_value: &str, config: &AlignmentConfig) -> bool {
    if old_value == new_value {
        return true;
    }

    let suffixes = config.accepted_suffixes();
    let variants = old_value_variants(old_value, &suffixes);

    let compatible = if suffixes.is_empty() {
        variants
            .iter()
            .any(|variant| matches_variant(variant, new_value, None, config))
    } else {
        variants.iter().any(|variant| {
            suffixes
                .iter()
                .any(|suffix| matches_variant(variant, new_value, Some(suffix), config))
        })
    };

    debug!(
        "Strict check of {} -> {} (variants {:?}, suffixes {:?}): {}",
        old_value, new_value, variants, suffixes, compatible
    );
    compatible
}

/// The old value, plus what it would look like had it been aligned with the
/// primary suffix instead of one of the alternatives.
fn old_value_variants(old_value: &str, suffixes: &[&str]) -> Vec<String> {
    let mut variants = vec![old_value.to_string()];

    let Some((primary, alternatives)) = suffixes.split_first() else {
        return variants;
    };

    for alternative in alternatives {
        let pattern = format!(
            r"^(.+?)([.\-_]){}(?:[.\-_]\d+)?$",
            regex::escape(alternative)
        );
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        if let Some(caps) = re.captures(old_value) {
            variants.push(format!("{}{}{}-0", &caps[1], &caps[2], primary));
        }
    }

    variants
}

fn matches_variant(
    variant: &str,
    new_value: &str,
    suffix: Option<&str>,
    config: &AlignmentConfig,
) -> bool {
    let mut current = Version::new(variant);
    if !config.preserve_snapshot {
        current.remove_snapshot();
    }
    let mut current = current.as_str().to_string();

    let Some(suffix) = suffix else {
        let osgi = Version::new(current.as_str()).to_osgi_string();
        return current == new_value || osgi == new_value;
    };

    let new_base = strip_suffix_occurrence(new_value, suffix);
    let mut osgi = osgi_base(&current, suffix);

    if config.strict_alignment_ignore_suffix && current.contains(suffix) {
        let highest = Version::new(current.as_str())
            .find_highest_matching_build_number([current.as_str(), new_value]);

        if highest.is_some() && Version::new(new_value).build_number_value() == highest {
            debug!(
                "Dropping suffix {} from {} as {} carries the higher build number",
                suffix, current, new_value
            );
            current = strip_suffix_occurrence(&current, suffix).to_string();
            osgi = osgi_base(&current, suffix);
        } else {
            debug!(
                "Original value {} carries a higher build number than {}",
                current, new_value
            );
        }
    }

    current == new_base || osgi == new_base
}

/// OSGi form of `value` with numeric components padded.
///
/// An unqualified value borrows the suffix as a dummy qualifier so that `1`
/// renders as `1.0.0`.
fn osgi_base(value: &str, suffix: &str) -> String {
    let mut version = Version::new(value);
    if !version.qualifier().is_empty() {
        return version.to_osgi_string();
    }
    version.append_qualifier_suffix(suffix);
    strip_suffix_occurrence(&version.to_osgi_string(), suffix).to_string()
}

/// Everything before the first occurrence of `suffix` and its separator.
fn strip_suffix_occurrence<'a>(value: &'a str, suffix: &str) -> &'a str {
    match value.find(suffix) {
        Some(index) if index > 0 => {
            value[..index].trim_end_matches(|c: char| !c.is_ascii_alphanumeric())
        }
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config(ignore_suffix: bool) -> AlignmentConfig {
        AlignmentConfig {
            strict_alignment: true,
            strict_alignment_ignore_suffix: ignore_suffix,
            version_suffix: Some("redhat".to_string()),
            version_suffix_alternatives: vec!["temporary-redhat".to_string()],
            ..Default::default()
        }
    }

    #[rstest]
    #[case("1.0")]
    #[case("1.0.redhat-3")]
    #[case("${foo}")]
    #[case("")]
    fn is_strictly_compatible_is_reflexive(#[case] value: &str) {
        assert!(is_strictly_compatible(value, value, &config(false)));
        assert!(is_strictly_compatible(value, value, &AlignmentConfig::default()));
    }

    #[rstest]
    #[case("1.0", "1.0.redhat-1", true)]
    #[case("1.0", "1.0.0.redhat-1", true)]
    #[case("1", "1.0.0.redhat-1", true)]
    #[case("1.2.3", "1.2.3.redhat-00001", true)]
    #[case("1.0.Final", "1.0.0.Final-redhat-1", true)]
    #[case("1.0-SNAPSHOT", "1.0.0.redhat-1", true)]
    #[case("1.0", "1.1.redhat-1", false)]
    #[case("1.0", "1.0.1", false)]
    #[case("1.0.redhat-3", "1.0.0.redhat-5", false)]
    fn is_strictly_compatible_without_suffix_tolerance(
        #[case] old: &str,
        #[case] new: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(is_strictly_compatible(old, new, &config(false)), expected);
    }

    #[rstest]
    #[case("1.0.redhat-3", "1.0.0.redhat-5", true)]
    #[case("1.0.redhat-5", "1.0.0.redhat-3", false)]
    #[case("1.0.temporary-redhat-3", "1.0.0.redhat-5", true)]
    #[case("1.0.redhat-3", "1.1.0.redhat-5", false)]
    fn is_strictly_compatible_with_suffix_tolerance(
        #[case] old: &str,
        #[case] new: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(is_strictly_compatible(old, new, &config(true)), expected);
    }

    #[test]
    fn preserve_snapshot_keeps_snapshot_in_comparison() {
        let config = AlignmentConfig {
            preserve_snapshot: true,
            ..config(false)
        };

        assert!(!is_strictly_compatible("1.0-SNAPSHOT", "1.0.0.redhat-1", &config));
    }

    #[test]
    fn no_configured_suffix_accepts_only_osgi_equivalents() {
        let config = AlignmentConfig::default();

        assert!(is_strictly_compatible("1.0-beta", "1.0.0.beta", &config));
        assert!(!is_strictly_compatible("1.0", "1.0.redhat-1", &config));
    }

    #[test]
    fn old_value_variants_rewrite_alternative_suffix_to_primary() {
        assert_eq!(
            old_value_variants("1.0.temporary-redhat-3", &["redhat", "temporary-redhat"]),
            vec!["1.0.temporary-redhat-3".to_string(), "1.0.redhat-0".to_string()]
        );
        assert_eq!(old_value_variants("1.0", &["redhat"]), vec!["1.0".to_string()]);
    }
}
