//! Parent inference rules, one per reference-code syntax family.
//!
//! Every rule is a pure function of the reference code string: it never looks
//! at which nodes exist. Within a family the most nested suffix pattern is
//! tried first, so a code only ever has one candidate parent.
//!
//! ```text
//! enhancement_suffix   AC-16(1)               -> AC-16
//! parenthetical_chain  164.306(d)(3)(ii)(B)   -> 164.306(d)(3)(ii)
//! dotted_decimal       03.01.01.c.01          -> 03.01.01.c
//! domain_prefix        APO01.01               -> APO01
//! function_category    GV.RM-01 -> GV.RM      -> GV
//! point_of_focus       CC1.1-POF1             -> CC1.1
//! domain_hyphen        AAT-01.1 -> AAT-01     -> AAT
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        #[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).expect("valid regex"));
    };
}

pattern!(ENHANCEMENT_CHILD, r"^([A-Z]{2}-\d+)\(\d+\)$");
pattern!(ENHANCEMENT_BASE, r"^[A-Z]{2}-\d+$");

pattern!(CHAIN_CODE, r"^\d+(?:\.\d+)*(?:\([0-9A-Za-z]+\))*$");
pattern!(PAREN_TAIL, r"^(.+)\(([0-9A-Za-z]+)\)$");

pattern!(DOTTED_CODE, r"^[0-9A-Za-z]+(?:\.[0-9A-Za-z]+)*(?:\((?:\d+|[a-z])\))*$");

pattern!(DOMAIN_PREFIX_CHILD, r"^([A-Z]{3}\d{2})\.\d{2}$");
pattern!(DOMAIN_PREFIX_BASE, r"^[A-Z]{3}\d{2}$");

pattern!(CSF_SUBCATEGORY, r"^([A-Z]{2}\.[A-Z]{2,})-[A-Z]?\d+$");
pattern!(CSF_CATEGORY, r"^([A-Z]{2})\.[A-Z]{2,}$");
pattern!(CSF_FUNCTION, r"^[A-Z]{2}$");

pattern!(POINT_OF_FOCUS, r"^([A-Z]+\d+\.\d+)-POF\d+$");
pattern!(CRITERION, r"^[A-Z]+\d+\.\d+$");

pattern!(HYPHEN_SUBCONTROL, r"^([A-Z&]+-\d+)\.\d+$");
pattern!(HYPHEN_CONTROL, r"^([A-Z&]+)-\d+$");
pattern!(HYPHEN_DOMAIN, r"^[A-Z&]+$");

/// Kind of a parenthesized group at the end of a reference code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParenKind {
    /// `(1)`, `(12)`
    Numeric,
    /// `(A)`
    UpperAlpha,
    /// `(i)`, `(iv)`, `(xii)`
    LowerRoman,
    /// `(a)`
    LowerAlpha,
}

impl ParenKind {
    /// Whether the text between the parentheses is of this kind.
    #[must_use]
    pub fn matches(self, inner: &str) -> bool {
        match self {
            Self::Numeric => !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()),
            Self::UpperAlpha => inner.len() == 1 && inner.chars().all(|c| c.is_ascii_uppercase()),
            Self::LowerRoman => !inner.is_empty() && inner.chars().all(|c| matches!(c, 'i' | 'v' | 'x')),
            Self::LowerAlpha => inner.len() == 1 && inner.chars().all(|c| c.is_ascii_lowercase()),
        }
    }

    /// Level label of a group whose code ends with this kind of group.
    #[must_use]
    pub fn level(self) -> &'static str {
        match self {
            Self::LowerAlpha => "paragraph",
            Self::Numeric => "subparagraph",
            Self::LowerRoman => "clause",
            Self::UpperAlpha => "subclause",
        }
    }
}

/// Default strip priority for parenthetical chains.
///
/// Roman numerals are tried before single lowercase letters, so `(i)`, `(v)`
/// and `(x)` are read as numerals.
#[must_use]
pub fn default_paren_priority() -> Vec<ParenKind> {
    vec![
        ParenKind::Numeric,
        ParenKind::UpperAlpha,
        ParenKind::LowerRoman,
        ParenKind::LowerAlpha,
    ]
}

fn default_min_segments() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Outcome of reading a reference code under a rule family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefShape {
    /// A known top-level shape.
    Root,
    /// A known nested shape with the given parent reference code.
    Child(String),
    /// No pattern of the family matches.
    Unrecognized,
}

impl RefShape {
    /// The parent reference code, if any.
    #[must_use]
    pub fn into_parent(self) -> Option<String> {
        match self {
            Self::Child(parent) => Some(parent),
            Self::Root | Self::Unrecognized => None,
        }
    }
}

/// Reference-code syntax family, selected per framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleFamily {
    /// NIST 800-53 style: `AC-16(1)` -> `AC-16`.
    EnhancementSuffix,

    /// HIPAA style: strip one trailing paren group per step, choosing the
    /// group kind by `priority`.
    ParentheticalChain {
        #[serde(default = "default_paren_priority")]
        priority: Vec<ParenKind>,
    },

    /// ISO/PCI/CIS style: strip a trailing `(N)` or `(a)`, else the last
    /// dotted segment, keeping at least `min_segments` segments.
    DottedDecimal {
        #[serde(default = "default_min_segments")]
        min_segments: usize,
    },

    /// COBIT style: `APO01.01` -> `APO01`.
    DomainPrefix,

    /// NIST CSF style: `GV.RM-01` -> `GV.RM` -> `GV`.
    FunctionCategory,

    /// SOC 2 style: `CC1.1-POF1` -> `CC1.1`.
    PointOfFocus,

    /// CSA CCM / SCF style: `AAT-01.1` -> `AAT-01`, then `AAT` when
    /// `domain_groups` is set.
    DomainHyphen {
        #[serde(default = "default_true")]
        domain_groups: bool,
    },
}

impl RuleFamily {
    /// Parenthetical chain with the default priority.
    #[must_use]
    pub fn parenthetical_chain() -> Self {
        Self::ParentheticalChain {
            priority: default_paren_priority(),
        }
    }

    /// Dotted decimal keeping at least `min_segments` segments.
    #[must_use]
    pub fn dotted_decimal(min_segments: usize) -> Self {
        Self::DottedDecimal { min_segments }
    }

    /// Short name used in logs and CLI output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::EnhancementSuffix => "enhancement_suffix",
            Self::ParentheticalChain { .. } => "parenthetical_chain",
            Self::DottedDecimal { .. } => "dotted_decimal",
            Self::DomainPrefix => "domain_prefix",
            Self::FunctionCategory => "function_category",
            Self::PointOfFocus => "point_of_focus",
            Self::DomainHyphen { .. } => "domain_hyphen",
        }
    }

    /// Read the shape of a reference code.
    ///
    /// # Examples
    /// ```
    /// use controlmap_hierarchy::rules::{RefShape, RuleFamily};
    ///
    /// let family = RuleFamily::EnhancementSuffix;
    /// assert_eq!(family.classify("AC-16(1)"), RefShape::Child("AC-16".to_string()));
    /// assert_eq!(family.classify("AC-16"), RefShape::Root);
    /// assert_eq!(family.classify("Section 3"), RefShape::Unrecognized);
    /// ```
    #[must_use]
    pub fn classify(&self, ref_code: &str) -> RefShape {
        match self {
            Self::EnhancementSuffix => classify_enhancement(ref_code),
            Self::ParentheticalChain { priority } => classify_chain(ref_code, priority),
            Self::DottedDecimal { min_segments } => classify_dotted(ref_code, *min_segments),
            Self::DomainPrefix => classify_domain_prefix(ref_code),
            Self::FunctionCategory => classify_function_category(ref_code),
            Self::PointOfFocus => classify_point_of_focus(ref_code),
            Self::DomainHyphen { domain_groups } => classify_domain_hyphen(ref_code, *domain_groups),
        }
    }

    /// Candidate parent reference code, `None` for roots and unrecognized codes.
    #[must_use]
    pub fn parent_of(&self, ref_code: &str) -> Option<String> {
        self.classify(ref_code).into_parent()
    }

    /// Hierarchy level label for a node of this family.
    #[must_use]
    pub fn hierarchy_level(&self, ref_code: &str, is_group: bool) -> &'static str {
        match self {
            Self::EnhancementSuffix => {
                if ENHANCEMENT_CHILD.is_match(ref_code) {
                    "enhancement"
                } else {
                    "control"
                }
            }
            Self::ParentheticalChain { priority } => {
                if !is_group {
                    return "control";
                }
                match split_paren_tail(ref_code) {
                    None => "section",
                    Some((_, inner)) => paren_kind(inner, priority).map_or("section", ParenKind::level),
                }
            }
            Self::DottedDecimal { .. } => {
                if !is_group {
                    return "control";
                }
                dotted_group_level(ref_code)
            }
            Self::DomainPrefix => {
                if DOMAIN_PREFIX_BASE.is_match(ref_code) {
                    "domain"
                } else {
                    "control"
                }
            }
            Self::FunctionCategory => {
                if CSF_FUNCTION.is_match(ref_code) {
                    "function"
                } else if CSF_CATEGORY.is_match(ref_code) {
                    "category"
                } else {
                    "subcategory"
                }
            }
            Self::PointOfFocus => {
                if POINT_OF_FOCUS.is_match(ref_code) {
                    "point_of_focus"
                } else {
                    "criterion"
                }
            }
            Self::DomainHyphen { .. } => {
                if HYPHEN_DOMAIN.is_match(ref_code) {
                    "domain"
                } else if HYPHEN_SUBCONTROL.is_match(ref_code) {
                    "subcontrol"
                } else {
                    "control"
                }
            }
        }
    }
}

fn classify_enhancement(ref_code: &str) -> RefShape {
    if let Some(caps) = ENHANCEMENT_CHILD.captures(ref_code) {
        return RefShape::Child(caps[1].to_string());
    }
    if ENHANCEMENT_BASE.is_match(ref_code) {
        return RefShape::Root;
    }
    RefShape::Unrecognized
}

/// Split `X(y)` into `("X", "y")`.
fn split_paren_tail(ref_code: &str) -> Option<(&str, &str)> {
    let caps = PAREN_TAIL.captures(ref_code)?;
    let remainder = caps.get(1)?.as_str();
    let inner = caps.get(2)?.as_str();
    Some((remainder, inner))
}

fn paren_kind(inner: &str, priority: &[ParenKind]) -> Option<ParenKind> {
    priority.iter().copied().find(|kind| kind.matches(inner))
}

fn classify_chain(ref_code: &str, priority: &[ParenKind]) -> RefShape {
    if !CHAIN_CODE.is_match(ref_code) {
        return RefShape::Unrecognized;
    }
    match split_paren_tail(ref_code) {
        None => RefShape::Root,
        Some((remainder, inner)) => match paren_kind(inner, priority) {
            Some(_) => RefShape::Child(remainder.to_string()),
            None => RefShape::Unrecognized,
        },
    }
}

fn classify_dotted(ref_code: &str, min_segments: usize) -> RefShape {
    if !DOTTED_CODE.is_match(ref_code) {
        return RefShape::Unrecognized;
    }
    if let Some((remainder, _)) = split_paren_tail(ref_code) {
        return RefShape::Child(remainder.to_string());
    }

    let segments = ref_code.split('.').count();
    if segments <= min_segments.max(1) {
        return RefShape::Root;
    }
    match ref_code.rsplit_once('.') {
        Some((parent, _)) => RefShape::Child(parent.to_string()),
        None => RefShape::Root,
    }
}

fn dotted_group_level(ref_code: &str) -> &'static str {
    if ref_code.ends_with(')') {
        return "item";
    }
    let numeric_head = ref_code
        .split('.')
        .next()
        .is_some_and(|head| head.chars().all(|c| c.is_ascii_digit()));
    match (numeric_head, ref_code.split('.').count()) {
        (true, 1) => "clause",
        (false, 1) => "annex",
        (_, 2) => "section",
        _ => "subsection",
    }
}

fn classify_domain_prefix(ref_code: &str) -> RefShape {
    if let Some(caps) = DOMAIN_PREFIX_CHILD.captures(ref_code) {
        return RefShape::Child(caps[1].to_string());
    }
    if DOMAIN_PREFIX_BASE.is_match(ref_code) {
        return RefShape::Root;
    }
    RefShape::Unrecognized
}

fn classify_function_category(ref_code: &str) -> RefShape {
    if let Some(caps) = CSF_SUBCATEGORY.captures(ref_code) {
        return RefShape::Child(caps[1].to_string());
    }
    if let Some(caps) = CSF_CATEGORY.captures(ref_code) {
        return RefShape::Child(caps[1].to_string());
    }
    if CSF_FUNCTION.is_match(ref_code) {
        return RefShape::Root;
    }
    RefShape::Unrecognized
}

fn classify_point_of_focus(ref_code: &str) -> RefShape {
    if let Some(caps) = POINT_OF_FOCUS.captures(ref_code) {
        return RefShape::Child(caps[1].to_string());
    }
    if CRITERION.is_match(ref_code) {
        return RefShape::Root;
    }
    RefShape::Unrecognized
}

fn classify_domain_hyphen(ref_code: &str, domain_groups: bool) -> RefShape {
    if let Some(caps) = HYPHEN_SUBCONTROL.captures(ref_code) {
        return RefShape::Child(caps[1].to_string());
    }
    if let Some(caps) = HYPHEN_CONTROL.captures(ref_code) {
        return if domain_groups {
            RefShape::Child(caps[1].to_string())
        } else {
            RefShape::Root
        };
    }
    if HYPHEN_DOMAIN.is_match(ref_code) {
        return RefShape::Root;
    }
    RefShape::Unrecognized
}
