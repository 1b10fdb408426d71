//! Pure projections behind the derived views.
//!
//! Each function takes plain snapshots and returns a new value; the
//! [`DataStore`](crate::DataStore) wires them to cache nodes. Keeping them
//! free of channels makes the view rules testable on their own.

use std::collections::{BTreeMap, HashSet};

use llmstack_api::models::{DataSource, Processor, Profile, ProfileFlags};
use serde::Serialize;

/// Whether a profile is loaded. A failed or unauthorized profile fetch
/// leaves the node at `None`, which reads as logged out.
pub fn is_logged_in(profile: Option<&Profile>) -> bool {
    profile.is_some()
}

/// The profile's feature flags; empty when logged out.
pub fn profile_flags(profile: Option<&Profile>) -> ProfileFlags {
    profile.map(|p| p.flags.clone()).unwrap_or_default()
}

/// Processors the organization has not disabled.
///
/// An entry in `disabled` matches either the `provider/processor` backend
/// id or the processor's own id.
pub fn available_processors(processors: &[Processor], disabled: &[String]) -> Vec<Processor> {
    if disabled.is_empty() {
        return processors.to_vec();
    }
    let disabled: HashSet<&str> = disabled.iter().map(String::as_str).collect();
    processors
        .iter()
        .filter(|p| {
            !disabled.contains(p.backend_id().as_str()) && !disabled.contains(p.id.to_string().as_str())
        })
        .cloned()
        .collect()
}

/// Processors grouped by provider slug, each group in server order.
pub fn processors_by_provider(processors: &[Processor]) -> BTreeMap<String, Vec<Processor>> {
    let mut groups: BTreeMap<String, Vec<Processor>> = BTreeMap::new();
    for processor in processors {
        groups
            .entry(processor.api_provider.slug.clone())
            .or_default()
            .push(processor.clone());
    }
    groups
}

/// One row of the merged data source list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSourceRow {
    #[serde(flatten)]
    pub source: DataSource,
    pub is_user_owned: bool,
}

/// User-owned data sources followed by organization ones.
///
/// A source visible through both lists appears once, as user-owned.
pub fn merged_datasources(user: &[DataSource], org: &[DataSource]) -> Vec<DataSourceRow> {
    let mut seen = HashSet::with_capacity(user.len() + org.len());
    let tagged_user = user.iter().map(|s| (s, true));
    let tagged_org = org.iter().map(|s| (s, false));

    tagged_user
        .chain(tagged_org)
        .filter(|(source, _)| seen.insert(source.uuid))
        .map(|(source, is_user_owned)| DataSourceRow {
            source: source.clone(),
            is_user_owned,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use llmstack_api::models::{ProviderRef, ResourceId};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;

    fn processor(id: u64, provider: &str, slug: &str) -> Processor {
        Processor {
            id: ResourceId::Number(id),
            name: slug.to_uppercase(),
            slug: slug.into(),
            api_provider: ProviderRef {
                name: provider.to_uppercase(),
                slug: provider.into(),
            },
            ..Processor::default()
        }
    }

    fn datasource(uuid: Uuid, name: &str) -> DataSource {
        serde_json::from_value(serde_json::json!({"uuid": uuid, "name": name})).unwrap()
    }

    #[test]
    fn logged_in_follows_profile_presence() {
        assert!(!is_logged_in(None));
        assert!(is_logged_in(Some(&Profile::default())));
    }

    #[test]
    fn flags_default_to_empty_when_logged_out() {
        assert!(profile_flags(None).is_empty());

        let mut profile = Profile::default();
        profile.flags.0.insert("IS_ORGANIZATION_OWNER".into(), true);
        assert!(profile_flags(Some(&profile)).is_set("IS_ORGANIZATION_OWNER"));
    }

    #[test]
    fn disabled_backends_are_hidden() {
        let all = vec![
            processor(1, "openai", "chatgpt"),
            processor(2, "openai", "dall_e"),
            processor(3, "stabilityai", "text2image"),
        ];
        let disabled = vec!["openai/dall_e".to_string(), "3".to_string()];

        let names: Vec<String> = available_processors(&all, &disabled)
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(names, vec!["chatgpt".to_string()]);
        assert_eq!(available_processors(&all, &[]).len(), 3);
    }

    #[test]
    fn processors_group_by_provider() {
        let all = vec![
            processor(1, "openai", "chatgpt"),
            processor(2, "cohere", "generate"),
            processor(3, "openai", "dall_e"),
        ];
        let groups = processors_by_provider(&all);
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["cohere", "openai"]);
        assert_eq!(groups["openai"].len(), 2);
        assert_eq!(groups["openai"][1].slug, "dall_e");
    }

    #[test]
    fn merged_datasources_dedupe_with_user_winning() {
        let shared = Uuid::new_v4();
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();

        let user = vec![datasource(mine, "notes"), datasource(shared, "handbook (mine)")];
        let org = vec![datasource(shared, "handbook (org)"), datasource(theirs, "wiki")];

        let rows = merged_datasources(&user, &org);
        let summary: Vec<(&str, bool)> = rows
            .iter()
            .map(|r| (r.source.name.as_str(), r.is_user_owned))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("notes", true),
                ("handbook (mine)", true),
                ("wiki", false),
            ]
        );
    }
}
