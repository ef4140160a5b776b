//! Diff computation between a desired and an observed manifest

use crate::types::{Diff, Manifest, PackageRecord, VersionChange};

/// Knobs for diff computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Report a change when only one side carries a version.
    pub one_sided_version_is_change: bool,
}

/// Compute the diff with default options
///
/// See [`compute_diff_with_options`].
pub fn compute_diff(desired: &Manifest, observed: &Manifest) -> Diff {
    compute_diff_with_options(desired, observed, &DiffOptions::default())
}

/// Compute what must be installed, removed, or version-changed to move
/// `observed` toward `desired`.
///
/// Both manifests are name-indexed, so this is a single pass over each side
/// and the result does not depend on iteration order. Only a name-presence
/// mismatch produces an addition or removal; a version difference on a name
/// present on both sides produces a [`VersionChange`].
pub fn compute_diff_with_options(
    desired: &Manifest,
    observed: &Manifest,
    options: &DiffOptions,
) -> Diff {
    let mut diff = Diff::default();

    for wanted in desired.iter() {
        match observed.get(&wanted.name) {
            None => {
                diff.additions.insert(wanted.clone());
            }
            Some(installed) => {
                if let Some(change) = version_change(wanted, installed, options) {
                    diff.changes.insert(change);
                }
            }
        }
    }

    diff.removals.extend(
        observed
            .iter()
            .filter(|installed| !desired.contains(&installed.name))
            .cloned(),
    );

    diff
}

/// Decide whether a name present on both sides has changed version
fn version_change(
    wanted: &PackageRecord,
    installed: &PackageRecord,
    options: &DiffOptions,
) -> Option<VersionChange> {
    let differs = match (&installed.version, &wanted.version) {
        (Some(have), Some(want)) => have != want,
        (None, None) => false,
        _ => options.one_sided_version_is_change,
    };

    differs.then(|| VersionChange {
        name: wanted.name.clone(),
        previous_version: installed.version.clone(),
        new_version: wanted.version.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(entries: &[(&str, Option<&str>)]) -> Manifest {
        Manifest::from_records(entries.iter().map(|(name, version)| PackageRecord {
            name: (*name).to_string(),
            version: version.map(str::to_string),
        }))
        .unwrap()
    }

    fn names(records: &[&PackageRecord]) -> Vec<String> {
        records.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn test_addition_and_removal() {
        let desired = manifest(&[("git", None), ("vim", None)]);
        let observed = manifest(&[("vim", None), ("htop", None)]);

        let diff = compute_diff(&desired, &observed);

        assert_eq!(names(&diff.sorted_additions()), ["git"]);
        assert_eq!(names(&diff.sorted_removals()), ["htop"]);
        assert!(diff.changes.is_empty());
    }

    #[test]
    fn test_version_change_carries_both_versions() {
        let desired = manifest(&[("curl", Some("8.1"))]);
        let observed = manifest(&[("curl", Some("8.0"))]);

        let diff = compute_diff(&desired, &observed);

        assert!(diff.additions.is_empty());
        assert!(diff.removals.is_empty());
        assert_eq!(
            diff.sorted_changes(),
            [&VersionChange {
                name: "curl".to_string(),
                previous_version: Some("8.0".to_string()),
                new_version: Some("8.1".to_string()),
            }]
        );
    }

    #[test]
    fn test_one_sided_version_is_not_a_change_by_default() {
        let desired = manifest(&[("git", None), ("vim", Some("9.1"))]);
        let observed = manifest(&[("git", Some("2.45")), ("vim", None)]);

        let diff = compute_diff(&desired, &observed);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_one_sided_version_reported_when_enabled() {
        let desired = manifest(&[("git", None)]);
        let observed = manifest(&[("git", Some("2.45"))]);
        let options = DiffOptions {
            one_sided_version_is_change: true,
        };

        let diff = compute_diff_with_options(&desired, &observed, &options);

        assert!(diff.additions.is_empty());
        assert!(diff.removals.is_empty());
        assert_eq!(diff.changes.len(), 1);
        let change = diff.changes.iter().next().unwrap();
        assert_eq!(change.previous_version.as_deref(), Some("2.45"));
        assert_eq!(change.new_version, None);
    }

    #[test]
    fn test_equal_versions_converged() {
        let desired = manifest(&[("git", Some("2.45")), ("zsh", None)]);
        let observed = manifest(&[("zsh", None), ("git", Some("2.45"))]);
        assert!(compute_diff(&desired, &observed).is_empty());
    }

    #[test]
    fn test_empty_manifests() {
        let diff = compute_diff(&Manifest::new(), &Manifest::new());
        assert!(diff.is_empty());
    }

    #[test]
    fn test_empty_desired_removes_everything() {
        let observed = manifest(&[("git", None), ("vim", Some("9.1"))]);
        let diff = compute_diff(&Manifest::new(), &observed);

        assert_eq!(names(&diff.sorted_removals()), ["git", "vim"]);
        assert!(diff.additions.is_empty());
    }
}
