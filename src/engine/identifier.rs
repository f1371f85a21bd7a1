use crate::error::{EngineError, EngineResult};
use crate::model::person::PersonType;
use tracing::debug;

/// Outcome of identifier normalization.
///
/// `lookup_keys` holds the canonical value first, followed by alternate
/// legacy spellings to try against storage (e.g. the `EMP-000000` padded
/// form for bare staff digits).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedId {
    pub person_type: PersonType,
    pub canonical: String,
    pub lookup_keys: Vec<String>,
    /// Set when the staff code had more than 7 digits and was repaired by
    /// truncation; the orchestrator re-derives the canonical value from the
    /// person's row id once the lookup succeeds.
    pub needs_repair: bool,
}

/// One entry in the ordered matcher table. Rules are tried top to bottom;
/// the first match wins. New legacy formats get a new row here.
struct MatcherRule {
    name: &'static str,
    matches: fn(&str) -> Option<NormalizedId>,
}

const STUDENT_RULES: &[MatcherRule] = &[MatcherRule {
    name: "lrn",
    matches: match_lrn,
}];

const STAFF_RULES: &[MatcherRule] = &[
    MatcherRule {
        name: "staff-id-wrapped",
        matches: match_id_wrapped,
    },
    MatcherRule {
        name: "staff-emp-wrapped",
        matches: match_emp_wrapped,
    },
    MatcherRule {
        name: "staff-bare-digits",
        matches: match_bare_digits,
    },
];

const UNPREFIXED_RULES: &[MatcherRule] = &[
    MatcherRule {
        name: "lrn",
        matches: match_lrn,
    },
    MatcherRule {
        name: "staff-id-wrapped",
        matches: match_id_wrapped,
    },
    MatcherRule {
        name: "staff-emp-wrapped",
        matches: match_emp_wrapped,
    },
    MatcherRule {
        name: "staff-bare-digits",
        matches: match_bare_digits,
    },
];

/// Normalize a raw scanned/typed identifier into `(PersonType, canonical)`
/// plus the lookup keys to try. Idempotent: re-normalizing an already
/// canonical value yields the same value.
pub fn normalize(raw: &str) -> EngineResult<NormalizedId> {
    let trimmed = raw.trim();
    let (forced, value) = strip_type_prefix(trimmed);

    let rules = match forced {
        Some(PersonType::Student) => STUDENT_RULES,
        Some(PersonType::Teacher) => STAFF_RULES,
        None => UNPREFIXED_RULES,
    };

    for rule in rules {
        if let Some(normalized) = (rule.matches)(value) {
            debug!(rule = rule.name, canonical = %normalized.canonical, "identifier normalized");
            return Ok(normalized);
        }
    }

    Err(EngineError::InvalidIdentifierFormat(raw.to_string()))
}

/// Re-derive an over-long staff code (>7 digits) into the exact 7-digit
/// canonical form: from the internal row id when known, otherwise the last
/// 7 digits, zero-padded on the left.
pub fn repair_staff_code(digits: &str, row_id: Option<u64>) -> String {
    match row_id {
        Some(id) => format!("{:07}", id),
        None => {
            let tail = &digits[digits.len().saturating_sub(7)..];
            format!("{:0>7}", tail)
        }
    }
}

fn strip_type_prefix(value: &str) -> (Option<PersonType>, &str) {
    if let Some(rest) = strip_prefix_ci(value, "TEACHER:") {
        (Some(PersonType::Teacher), rest.trim())
    } else if let Some(rest) = strip_prefix_ci(value, "STUDENT:") {
        (Some(PersonType::Student), rest.trim())
    } else {
        (None, value)
    }
}

fn strip_prefix_ci<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// 11-13 contiguous digits: a Learner Reference Number.
fn match_lrn(value: &str) -> Option<NormalizedId> {
    if all_digits(value) && (11..=13).contains(&value.len()) {
        Some(NormalizedId {
            person_type: PersonType::Student,
            canonical: value.to_string(),
            lookup_keys: vec![value.to_string()],
            needs_repair: false,
        })
    } else {
        None
    }
}

/// `ID<digits>`: unwrap to the bare digits.
fn match_id_wrapped(value: &str) -> Option<NormalizedId> {
    let rest = strip_prefix_ci(value, "ID")?;
    all_digits(rest).then(|| staff_from_digits(rest))
}

/// `EMP-<digits>` or `EMP<digits>`: unwrap and left-trim leading zeros
/// (an all-zero code becomes "0").
fn match_emp_wrapped(value: &str) -> Option<NormalizedId> {
    let rest = strip_prefix_ci(value, "EMP-").or_else(|| strip_prefix_ci(value, "EMP"))?;
    if !all_digits(rest) {
        return None;
    }
    let trimmed = rest.trim_start_matches('0');
    let digits = if trimmed.is_empty() { "0" } else { trimmed };
    Some(staff_from_digits(digits))
}

/// Bare digits taken as a staff code. The padded `EMP-` form is added as
/// an alternate lookup key.
fn match_bare_digits(value: &str) -> Option<NormalizedId> {
    all_digits(value).then(|| staff_from_digits(value))
}

fn staff_from_digits(digits: &str) -> NormalizedId {
    let (canonical, needs_repair) = if digits.len() > 7 {
        (repair_staff_code(digits, None), true)
    } else {
        (digits.to_string(), false)
    };
    let padded = format!("EMP-{:0>6}", canonical);
    NormalizedId {
        person_type: PersonType::Teacher,
        lookup_keys: vec![canonical.clone(), padded],
        canonical,
        needs_repair,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_formats_converge_to_same_canonical() {
        for raw in ["4354188", "ID4354188", "EMP-004354188", "EMP4354188"] {
            let n = normalize(raw).unwrap();
            assert_eq!(n.person_type, PersonType::Teacher, "{raw}");
            assert_eq!(n.canonical, "4354188", "{raw}");
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["4354188", "EMP-000012", "123456789012", "TEACHER:12"] {
            let first = normalize(raw).unwrap();
            let second = normalize(&first.canonical).unwrap();
            assert_eq!(second.canonical, first.canonical, "{raw}");
        }
    }

    #[test]
    fn lrn_is_student() {
        let n = normalize("123456789012").unwrap();
        assert_eq!(n.person_type, PersonType::Student);
        assert_eq!(n.canonical, "123456789012");
        assert_eq!(n.lookup_keys, vec!["123456789012".to_string()]);
    }

    #[test]
    fn lrn_length_bounds() {
        assert_eq!(
            normalize("12345678901").unwrap().person_type,
            PersonType::Student
        );
        assert_eq!(
            normalize("1234567890123").unwrap().person_type,
            PersonType::Student
        );
        // 10 digits is not an LRN; falls through to the staff rules
        assert_eq!(
            normalize("1234567890").unwrap().person_type,
            PersonType::Teacher
        );
    }

    #[test]
    fn type_prefix_forces_staff_rules() {
        // 12 digits would be an LRN without the prefix
        let n = normalize("TEACHER:123456789012").unwrap();
        assert_eq!(n.person_type, PersonType::Teacher);
        assert!(n.needs_repair);
        assert_eq!(n.canonical, "6789012");
    }

    #[test]
    fn emp_trims_leading_zeros() {
        let n = normalize("EMP-000012").unwrap();
        assert_eq!(n.canonical, "12");
        assert_eq!(
            n.lookup_keys,
            vec!["12".to_string(), "EMP-000012".to_string()]
        );
    }

    #[test]
    fn emp_all_zeros_becomes_zero() {
        assert_eq!(normalize("EMP-000000").unwrap().canonical, "0");
    }

    #[test]
    fn overlong_staff_code_truncates_to_last_seven() {
        let n = normalize("ID123456789").unwrap();
        assert!(n.needs_repair);
        assert_eq!(n.canonical, "3456789");
    }

    #[test]
    fn repair_prefers_row_id() {
        assert_eq!(repair_staff_code("123456789", Some(42)), "0000042");
        assert_eq!(repair_staff_code("123456789", None), "3456789");
        assert_eq!(repair_staff_code("12345678", None), "2345678");
    }

    #[test]
    fn garbage_is_rejected() {
        for raw in ["", "hello", "EMP-12A4", "ID", "STUDENT:4354188", "12 34"] {
            assert!(
                matches!(normalize(raw), Err(EngineError::InvalidIdentifierFormat(_))),
                "{raw:?}"
            );
        }
    }
}
