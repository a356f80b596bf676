//! Reference grammars for issue and pull-request cross-references.
//!
//! Every pattern is compiled exactly once and shared process-wide;
//! callers match against these statics instead of recompiling per call.

use std::sync::LazyLock;

use regex::Regex;

/// Host recognized by the Bugzilla plugin's `accepts` check.
pub const BUGZILLA_HOST: &str = "bugzilla.redhat.com";

/// Prefix a captured bug id is appended to when reconstructing the
/// canonical issue URL.
pub const BUGZILLA_ISSUE_BASE: &str = "https://bugzilla.redhat.com/show_bug.cgi?id=";

/// Host recognized by the JIRA plugin's `accepts` check.
pub const JIRA_HOST: &str = "issues.redhat.com";

/// Prefix a captured issue key is appended to when reconstructing the
/// canonical issue URL.
pub const JIRA_BROWSE_BASE: &str = "https://issues.redhat.com/browse/";

/// Bugzilla issue link in free-form text. Captures the numeric bug id.
pub static BUGZILLA_ISSUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)bugzilla\.redhat\.com/show_bug\.cgi\?id=(\d+)")
        .expect("bugzilla issue pattern")
});

/// JIRA issue link in free-form text. Captures the project-qualified key.
pub static JIRA_ISSUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)issues\.redhat\.com/browse/([A-Za-z][A-Za-z0-9]*-\d+)")
        .expect("jira issue pattern")
});

/// Full pull-request URL. Captures organization, repository, and number.
///
/// Also matches a pull request's own canonical API URL
/// (`api.github.com/repos/<org>/<repo>/pulls/<n>`), which is how an
/// aggregate derives its own org/repo pair.
pub static RELATED_PR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com\S*?/([\w.-]+)/([\w.-]+)/pulls?/(\d+)").expect("related PR pattern")
});

/// Abbreviated in-text pull-request marker (`#42`, `org/repo#42`).
/// Captures the optional qualifier text and the number.
pub static ABBREVIATED_RELATED_PR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\w/-]*)#(\d+)").expect("abbreviated related PR pattern"));

/// Explicit external org/repo qualifier, applied to the substring an
/// abbreviated match produced. Captures organization, repository, number.
pub static ABBREVIATED_EXTERNAL_REPO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\w-]+)/([\w-]+)#(\d+)").expect("abbreviated external repo pattern")
});

/// Commit-to-PR association marker. Detection only; resolution always
/// goes through the full-URL or abbreviated grammars.
pub static COMMIT_RELATED_PR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)commit[\s:]+[\w/-]*#\d+").expect("commit PR pattern"));

/// Opt-out marker negating the default upstream-required policy.
pub static UPSTREAM_NOT_REQUIRED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)no upstream required").expect("upstream opt-out pattern"));

/// Build-outcome marker left in comments by CI. Captures the status
/// keyword.
pub static BUILD_OUTCOME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)outcome was (?:\*\*)?(SUCCESS|FAILURE|UNSTABLE)(?:\*\*)?")
        .expect("build outcome pattern")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bugzilla_issue_captures_id() {
        let caps = BUGZILLA_ISSUE
            .captures("Fixes https://bugzilla.redhat.com/show_bug.cgi?id=953471 in 6.2")
            .unwrap();
        assert_eq!(&caps[1], "953471");
    }

    #[test]
    fn jira_issue_captures_key() {
        let caps = JIRA_ISSUE
            .captures("See https://issues.redhat.com/browse/EAP6-77.")
            .unwrap();
        assert_eq!(&caps[1], "EAP6-77");
    }

    #[test]
    fn related_pr_captures_org_repo_number() {
        let caps = RELATED_PR
            .captures("Upstream: https://github.com/uselessorg/jboss-eap/pull/2")
            .unwrap();
        assert_eq!(&caps[1], "uselessorg");
        assert_eq!(&caps[2], "jboss-eap");
        assert_eq!(&caps[3], "2");
    }

    #[test]
    fn related_pr_matches_canonical_api_url() {
        let caps = RELATED_PR
            .captures("https://api.github.com/repos/uselessorg/jboss-eap/pulls/2")
            .unwrap();
        assert_eq!(&caps[1], "uselessorg");
        assert_eq!(&caps[2], "jboss-eap");
        assert_eq!(&caps[3], "2");
    }

    #[test]
    fn abbreviated_pattern_matches_bare_and_qualified_numbers() {
        let caps = ABBREVIATED_RELATED_PR.captures("Related to #14").unwrap();
        assert_eq!(&caps[2], "14");

        let caps = ABBREVIATED_RELATED_PR
            .captures("Related to otherorg/otherrepo#14")
            .unwrap();
        assert_eq!(caps.get(0).unwrap().as_str(), "otherorg/otherrepo#14");
        assert_eq!(&caps[2], "14");
    }

    #[test]
    fn external_repo_qualifier_detected_only_when_present() {
        assert!(ABBREVIATED_EXTERNAL_REPO.is_match("otherorg/otherrepo#14"));
        assert!(!ABBREVIATED_EXTERNAL_REPO.is_match("#14"));
    }

    #[test]
    fn commit_marker_is_detected() {
        assert!(COMMIT_RELATED_PR.is_match("Backport of commit acme/widgets#33"));
        assert!(!COMMIT_RELATED_PR.is_match("plain #33 reference"));
    }

    #[test]
    fn upstream_opt_out_is_case_insensitive() {
        assert!(UPSTREAM_NOT_REQUIRED.is_match("No upstream required, EAP only."));
        assert!(!UPSTREAM_NOT_REQUIRED.is_match("Upstream not required."));
    }

    #[test]
    fn build_outcome_captures_keyword_with_or_without_emphasis() {
        let caps = BUILD_OUTCOME
            .captures("Build 1234 outcome was **SUCCESS** using a merge of abc123")
            .unwrap();
        assert_eq!(&caps[1], "SUCCESS");

        let caps = BUILD_OUTCOME.captures("outcome was UNSTABLE").unwrap();
        assert_eq!(&caps[1], "UNSTABLE");
    }
}
