//! Grouping of attribute names for pickers (group-by, column selection).
//!
//! Classification is a rule table evaluated top to bottom, the first matching rule decides the
//! group. Names that match no rule end up in [`GroupLabel::Other`].

use std::collections::HashSet;

/// Attribute names suggested first in every picker.
pub const RECOMMENDED_ATTRIBUTES: &[&str] = &[
    "name",
    "kind",
    "status",
    "statusMessage",
    "resource.service.name",
    "resource.service.namespace",
    "resource.service.version",
    "resource.deployment.environment",
    "resource.k8s.namespace.name",
    "resource.k8s.pod.name",
    "span.http.method",
    "span.http.status_code",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupLabel {
    Recommended,
    Resource,
    Span,
    Event,
    /// Group of a non-tracing prefix rule
    Custom(String),
    Other,
}

impl std::fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupLabel::Recommended => write!(f, "Recommended"),
            GroupLabel::Resource => write!(f, "Resource"),
            GroupLabel::Span => write!(f, "Span"),
            GroupLabel::Event => write!(f, "Event"),
            GroupLabel::Custom(name) => write!(f, "{name}"),
            GroupLabel::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttributeOption {
    /// Full attribute name, possibly prefixed with `resource.`, `span.`, ...
    pub label: String,
    /// Identifier used in queries
    pub value: String,
}

impl AttributeOption {
    pub fn new(name: &str) -> AttributeOption {
        AttributeOption {
            label: name.to_string(),
            value: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeGroup {
    pub group: GroupLabel,
    pub options: Vec<AttributeOption>,
}

/// Ordered mapping from group to attribute name prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRules {
    rules: Vec<(GroupLabel, String)>,
}

impl Default for PrefixRules {
    fn default() -> Self {
        PrefixRules::new(vec![
            (GroupLabel::Span, "span.".to_string()),
            (GroupLabel::Resource, "resource.".to_string()),
            (GroupLabel::Event, "event.".to_string()),
        ])
    }
}

impl PrefixRules {
    pub fn new(rules: Vec<(GroupLabel, String)>) -> PrefixRules {
        PrefixRules { rules }
    }

    fn prefix_for(&self, group: &GroupLabel) -> Option<&str> {
        self.rules
            .iter()
            .find(|(g, _)| g == group)
            .map(|(_, prefix)| prefix.as_str())
    }

    /// Resource first, then span, then all the other prefixes in configuration order.
    fn ordered(&self) -> Vec<(GroupLabel, &str)> {
        let mut ordered = Vec::new();
        for group in [GroupLabel::Resource, GroupLabel::Span] {
            if let Some(prefix) = self.prefix_for(&group) {
                ordered.push((group, prefix));
            }
        }
        for (group, prefix) in &self.rules {
            if !matches!(group, GroupLabel::Resource | GroupLabel::Span) {
                ordered.push((group.clone(), prefix.as_str()));
            }
        }
        ordered
    }
}

enum RuleMatcher<'a> {
    Recommended(&'a HashSet<String>),
    Prefix(&'a str),
}

struct ClassificationRule<'a> {
    matcher: RuleMatcher<'a>,
    group: GroupLabel,
}

impl ClassificationRule<'_> {
    fn matches(&self, label: &str) -> bool {
        match self.matcher {
            RuleMatcher::Recommended(names) => names.contains(label),
            RuleMatcher::Prefix(prefix) => label.starts_with(prefix),
        }
    }

    fn display_label(&self, label: &str) -> String {
        match self.matcher {
            RuleMatcher::Recommended(_) => label.to_string(),
            RuleMatcher::Prefix(_) => match label.split_once('.') {
                Some((_, rest)) => rest.to_string(),
                None => label.to_string(),
            },
        }
    }
}

fn rule_table<'a>(
    recommended: &'a HashSet<String>,
    rules: &'a PrefixRules,
) -> Vec<ClassificationRule<'a>> {
    let mut table = vec![ClassificationRule {
        matcher: RuleMatcher::Recommended(recommended),
        group: GroupLabel::Recommended,
    }];
    for (group, prefix) in rules.ordered() {
        table.push(ClassificationRule {
            matcher: RuleMatcher::Prefix(prefix),
            group,
        });
    }
    table
}

/// Group attribute options for display.
///
/// Groups come out as Recommended, Resource, Span, Event, custom groups, Other. Empty groups are
/// left out and options keep their input order inside a group.
pub fn classify(
    options: &[AttributeOption],
    recommended: &HashSet<String>,
    rules: &PrefixRules,
) -> Vec<AttributeGroup> {
    let table = rule_table(recommended, rules);

    let mut groups: Vec<AttributeGroup> = Vec::new();
    for option in options {
        let (group, label) = match table.iter().find(|rule| rule.matches(&option.label)) {
            Some(rule) => (rule.group.clone(), rule.display_label(&option.label)),
            None => (GroupLabel::Other, option.label.clone()),
        };

        let classified = AttributeOption {
            label,
            value: option.value.clone(),
        };
        match groups.iter_mut().find(|g| g.group == group) {
            Some(existing) => existing.options.push(classified),
            None => groups.push(AttributeGroup {
                group,
                options: vec![classified],
            }),
        }
    }

    let custom_order: Vec<GroupLabel> = table.iter().map(|rule| rule.group.clone()).collect();
    groups.sort_by_key(|g| display_rank(&g.group, &custom_order));
    groups
}

fn display_rank(group: &GroupLabel, rule_order: &[GroupLabel]) -> (u8, usize) {
    match group {
        GroupLabel::Recommended => (0, 0),
        GroupLabel::Resource => (1, 0),
        GroupLabel::Span => (2, 0),
        GroupLabel::Event => (3, 0),
        GroupLabel::Custom(_) => (
            4,
            rule_order
                .iter()
                .position(|g| g == group)
                .unwrap_or(usize::MAX),
        ),
        GroupLabel::Other => (5, 0),
    }
}

/// Recommended names as a set, for [`classify`].
pub fn recommended_set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}
