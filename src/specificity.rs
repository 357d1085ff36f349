/// Assigns an integer precedence to a path pattern: higher means more
/// specific. Produces a total preorder over patterns; ties are broken by
/// the evaluator's stable sort over rule-declaration order.
pub struct SpecificityCalculator;

impl SpecificityCalculator {
    pub fn specificity(pattern: &str) -> i64 {
        if pattern.contains("**") {
            return 1;
        }

        let trimmed = pattern.trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();
        let total = segments.len() as i64;
        let wildcards = segments
            .iter()
            .filter(|s| **s == "*" || s.contains("${"))
            .count() as i64;

        total - wildcards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_star_is_least_specific() {
        assert_eq!(SpecificityCalculator::specificity("/foo/**"), 1);
        assert_eq!(SpecificityCalculator::specificity("/**"), 1);
        assert_eq!(SpecificityCalculator::specificity("/**/baz"), 1);
    }

    #[test]
    fn root_splits_to_one_empty_segment() {
        // "/" stripped of its leading/trailing slash is "", and "".split('/')
        // yields one segment ([""]), not zero segments.
        assert_eq!(SpecificityCalculator::specificity("/"), 1);
    }

    #[test]
    fn all_literal_counts_every_segment() {
        assert_eq!(SpecificityCalculator::specificity("/foo/bar/baz"), 3);
    }

    #[test]
    fn wildcards_reduce_specificity() {
        assert_eq!(SpecificityCalculator::specificity("/foo/*/baz"), 2);
        assert_eq!(SpecificityCalculator::specificity("/foo/${id}/baz"), 2);
    }

    #[test]
    fn replacing_wildcard_with_literal_strictly_increases_specificity() {
        let p = "/foo/*/baz";
        let q = "/foo/bar/baz";
        assert!(SpecificityCalculator::specificity(q) > SpecificityCalculator::specificity(p));
    }
}
