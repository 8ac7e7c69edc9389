//! Rule-based category and importance assignment.
//!
//! No model involvement: classification must be deterministic so that
//! delivery ordering is reproducible across runs.

use crate::pipeline::types::Message;

/// One category rule: sender substrings, keyword substrings, and the
/// importance weight the category carries.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: String,
    /// Substrings matched against the sender address alone.
    pub senders: Vec<String>,
    /// Substrings matched against subject + body + sender.
    pub keywords: Vec<String>,
    /// 0–5, where 5 is delivered first.
    pub importance: u8,
}

impl CategoryRule {
    pub fn new(
        category: &str,
        senders: &[&str],
        keywords: &[&str],
        importance: u8,
    ) -> Self {
        Self {
            category: category.to_string(),
            senders: senders.iter().map(|s| s.to_lowercase()).collect(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            importance,
        }
    }
}

/// Ordered rule table. Declaration order is lookup order: the first
/// matching category wins, and an earlier category's keyword match
/// beats a later category's sender match. Callers must not re-sort
/// the table by "specificity".
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    rules: Vec<CategoryRule>,
    default_category: String,
    default_importance: u8,
}

impl RuleClassifier {
    pub fn new(rules: Vec<CategoryRule>, default_category: &str, default_importance: u8) -> Self {
        Self {
            rules,
            default_category: default_category.to_string(),
            default_importance,
        }
    }

    /// Table with no rules — everything classifies as the default.
    pub fn empty() -> Self {
        Self::new(Vec::new(), "Other", 2)
    }

    /// The stock rule table.
    pub fn default_rules() -> Self {
        let rules = vec![
            CategoryRule::new(
                "Banking",
                &["hdfcbank.com", "icicibank.com", "sbi.co.in", "@bank"],
                &["debited", "credited", "account balance", "transaction alert", "net banking"],
                5,
            ),
            CategoryRule::new(
                "Careers",
                &["unstop.com", "linkedin.com", "naukri.com", "internshala"],
                &["internship", "job opportunity", "hiring", "placement", "recruiter"],
                4,
            ),
            CategoryRule::new(
                "Work",
                &[],
                &["meeting", "project update", "standup", "code review", "sprint", "deliverable"],
                4,
            ),
            CategoryRule::new(
                "Education",
                &["coursera.org", "udemy.com", "@edu"],
                &["assignment", "lecture", "exam", "syllabus", "course enrollment"],
                3,
            ),
            CategoryRule::new(
                "Travel",
                &["makemytrip", "irctc"],
                &["itinerary", "flight", "boarding pass", "check-in", "reservation confirmed"],
                3,
            ),
            CategoryRule::new(
                "Shopping",
                &["amazon", "flipkart", "myntra"],
                &["your order", "shipped", "out for delivery", "cart", "return window"],
                2,
            ),
            CategoryRule::new(
                "Promotions",
                &[],
                &["sale", "discount", "% off", "coupon", "limited time offer"],
                1,
            ),
            CategoryRule::new(
                "Social",
                &["facebook", "instagram", "twitter.com"],
                &["friend request", "mentioned you", "tagged you", "started following"],
                1,
            ),
        ];
        Self::new(rules, "Other", 2)
    }

    /// Append a rule at the end of the table (lowest precedence).
    pub fn push_rule(&mut self, rule: CategoryRule) {
        self.rules.push(rule);
    }

    /// Assign a category and its importance. Total: unmatched messages
    /// get the default category, never a dropped message.
    pub fn classify(&self, message: &Message) -> (String, u8) {
        let sender = message.sender.to_lowercase();
        let haystack = format!(
            "{} {} {}",
            message.subject, message.body, message.sender
        )
        .to_lowercase();

        for rule in &self.rules {
            if rule.senders.iter().any(|p| sender.contains(p.as_str())) {
                return (rule.category.clone(), rule.importance);
            }
            if rule.keywords.iter().any(|k| haystack.contains(k.as_str())) {
                return (rule.category.clone(), rule.importance);
            }
        }

        (self.default_category.clone(), self.default_importance)
    }

    /// Importance weight for a category name; unknown categories get
    /// the default weight.
    pub fn importance(&self, category: &str) -> u8 {
        self.rules
            .iter()
            .find(|r| r.category == category)
            .map(|r| r.importance)
            .unwrap_or(self.default_importance)
    }
}
