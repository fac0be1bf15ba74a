//! Group synthesis for implied-but-absent ancestors.

use std::collections::{BTreeSet, HashSet};

use crate::config::group_description;
use crate::natural;
use crate::rules::RuleFamily;
use crate::types::{FrameworkId, NewNode};

/// Compute creation requests for every ancestor that has no node yet.
///
/// `existing` holds the reference codes already present in the framework;
/// `chains` are the ancestor chains of its nodes. The result is ordered by
/// natural key and contains each missing code once, so running it again
/// after the requests were applied yields nothing.
///
/// # Examples
/// ```
/// use std::collections::HashSet;
/// use controlmap_hierarchy::rules::RuleFamily;
/// use controlmap_hierarchy::synth::synthesize_groups;
/// use controlmap_hierarchy::types::FrameworkId;
///
/// let framework = FrameworkId::new("HIPAA", "2013");
/// let existing: HashSet<&str> = ["164.306(b)(2)(i)"].into_iter().collect();
/// let chains = vec![vec![
///     "164.306(b)(2)".to_string(),
///     "164.306(b)".to_string(),
///     "164.306".to_string(),
/// ]];
///
/// let created = synthesize_groups(&framework, &RuleFamily::parenthetical_chain(), &existing, &chains);
/// let refs: Vec<&str> = created.iter().map(|n| n.ref_code.as_str()).collect();
/// assert_eq!(refs, vec!["164.306", "164.306(b)", "164.306(b)(2)"]);
/// ```
#[must_use]
pub fn synthesize_groups<C>(
    framework_id: &FrameworkId,
    family: &RuleFamily,
    existing: &HashSet<&str>,
    chains: &[C],
) -> Vec<NewNode>
where
    C: AsRef<[String]>,
{
    let missing: BTreeSet<&str> = chains
        .iter()
        .flat_map(|chain| chain.as_ref().iter())
        .map(String::as_str)
        .filter(|code| !existing.contains(code))
        .collect();

    let mut missing: Vec<&str> = missing.into_iter().collect();
    missing.sort_by(|a, b| natural::compare(a, b));

    missing
        .into_iter()
        .map(|ref_code| {
            tracing::debug!(framework = %framework_id, ref_code, "Synthesizing group");
            NewNode {
                framework_id: framework_id.clone(),
                ref_code: ref_code.to_string(),
                description: group_description(ref_code),
                hierarchy_level: family.hierarchy_level(ref_code, true).to_string(),
            }
        })
        .collect()
}
