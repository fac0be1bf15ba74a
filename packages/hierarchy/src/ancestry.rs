//! Ancestor chain resolution.

use crate::config::MAX_ANCESTOR_DEPTH;
use crate::error::ChainError;
use crate::rules::RuleFamily;

/// Resolve the ancestors of a reference code, immediate parent first.
///
/// The family rule is applied until it reports a root. Every step must
/// produce a strictly shorter code, and the chain may not exceed
/// [`MAX_ANCESTOR_DEPTH`] entries.
///
/// # Examples
/// ```
/// use controlmap_hierarchy::ancestry::ancestor_chain;
/// use controlmap_hierarchy::rules::RuleFamily;
///
/// let chain = ancestor_chain("164.306(b)(2)(i)", &RuleFamily::parenthetical_chain()).unwrap();
/// assert_eq!(chain, vec!["164.306(b)(2)", "164.306(b)", "164.306"]);
///
/// let chain = ancestor_chain("AC-16", &RuleFamily::EnhancementSuffix).unwrap();
/// assert!(chain.is_empty());
/// ```
pub fn ancestor_chain(ref_code: &str, family: &RuleFamily) -> Result<Vec<String>, ChainError> {
    ancestor_chain_with(ref_code, |code| family.parent_of(code))
}

/// Resolve a chain with an arbitrary parent function.
pub(crate) fn ancestor_chain_with<F>(ref_code: &str, parent_of: F) -> Result<Vec<String>, ChainError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut chain = Vec::new();
    let mut current = ref_code.to_string();

    while let Some(parent) = parent_of(&current) {
        if parent.len() >= current.len() {
            return Err(ChainError::CycleDetected {
                ref_code: current,
                parent,
            });
        }
        if chain.len() == MAX_ANCESTOR_DEPTH {
            return Err(ChainError::IterationBoundExceeded {
                ref_code: ref_code.to_string(),
                bound: MAX_ANCESTOR_DEPTH,
            });
        }
        chain.push(parent.clone());
        current = parent;
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_enhancement() {
        let chain = ancestor_chain("AC-16(1)", &RuleFamily::EnhancementSuffix).unwrap();
        assert_eq!(chain, vec!["AC-16"]);
    }

    #[test]
    fn test_chain_hipaa_deep() {
        let chain =
            ancestor_chain("164.306(d)(3)(ii)(B)(2)", &RuleFamily::parenthetical_chain()).unwrap();
        assert_eq!(
            chain,
            vec![
                "164.306(d)(3)(ii)(B)",
                "164.306(d)(3)(ii)",
                "164.306(d)(3)",
                "164.306(d)",
                "164.306",
            ]
        );
    }

    #[test]
    fn test_chain_csf() {
        let chain = ancestor_chain("GV.RM-01", &RuleFamily::FunctionCategory).unwrap();
        assert_eq!(chain, vec!["GV.RM", "GV"]);
    }

    #[test]
    fn test_chain_dotted_respects_min_segments() {
        let chain = ancestor_chain("03.01.01.c.01", &RuleFamily::dotted_decimal(3)).unwrap();
        assert_eq!(chain, vec!["03.01.01.c", "03.01.01"]);
    }

    #[test]
    fn test_chain_unrecognized_is_empty() {
        let chain = ancestor_chain("not a code", &RuleFamily::DomainPrefix).unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_chain_non_shrinking_step() {
        let result = ancestor_chain_with("A", |code| Some(format!("{code}x")));
        assert_eq!(
            result,
            Err(ChainError::CycleDetected {
                ref_code: "A".to_string(),
                parent: "Ax".to_string(),
            })
        );
    }

    #[test]
    fn test_chain_same_length_step() {
        let result = ancestor_chain_with("AB", |_| Some("BA".to_string()));
        assert!(matches!(result, Err(ChainError::CycleDetected { .. })));
    }

    #[test]
    fn test_chain_iteration_bound() {
        let long = "x".repeat(MAX_ANCESTOR_DEPTH + 5);
        let result = ancestor_chain_with(&long, |code| {
            (code.len() > 1).then(|| code[1..].to_string())
        });
        assert_eq!(
            result,
            Err(ChainError::IterationBoundExceeded {
                ref_code: long.clone(),
                bound: MAX_ANCESTOR_DEPTH,
            })
        );
    }

    #[test]
    fn test_chain_exactly_at_bound() {
        let code = "x".repeat(MAX_ANCESTOR_DEPTH + 1);
        let chain = ancestor_chain_with(&code, |c| (c.len() > 1).then(|| c[1..].to_string())).unwrap();
        assert_eq!(chain.len(), MAX_ANCESTOR_DEPTH);
    }
}
