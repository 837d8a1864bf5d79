//! Spending categories and the keyword categorizer.
//!
//! The keyword table is ordered: the first category with a matching keyword
//! wins, and `other` is the fallback when nothing matches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of spending labels, in match-priority order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bills,
    Shopping,
    Food,
    Transport,
    Entertainment,
    Education,
    Health,
    Transfer,
    Airtime,
    Withdrawal,
    Deposit,
    Salary,
    Savings,
    Loan,
    Other,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::Bills,
        Category::Shopping,
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Education,
        Category::Health,
        Category::Transfer,
        Category::Airtime,
        Category::Withdrawal,
        Category::Deposit,
        Category::Salary,
        Category::Savings,
        Category::Loan,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bills => "bills",
            Category::Shopping => "shopping",
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Entertainment => "entertainment",
            Category::Education => "education",
            Category::Health => "health",
            Category::Transfer => "transfer",
            Category::Airtime => "airtime",
            Category::Withdrawal => "withdrawal",
            Category::Deposit => "deposit",
            Category::Salary => "salary",
            Category::Savings => "savings",
            Category::Loan => "loan",
            Category::Other => "other",
        }
    }

    /// Built-in keywords for this category. `Other` has none.
    pub fn default_keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Bills => &["bill", "dstv", "electricity", "water", "utility"],
            Category::Shopping => &["shop", "store", "market", "mall", "purchase"],
            Category::Food => &["food", "restaurant", "cafe", "meal", "grocery"],
            Category::Transport => &["transport", "uber", "taxi", "fare", "ride"],
            Category::Entertainment => &["entertainment", "movie", "cinema", "game", "ticket"],
            Category::Education => &["school", "tuition", "fee", "education", "college"],
            Category::Health => &["health", "hospital", "medical", "pharmacy", "doctor"],
            Category::Transfer => &["transfer", "sent to", "received from"],
            Category::Airtime => &["airtime", "data", "bundle", "credit", "recharge"],
            Category::Withdrawal => &["withdraw", "atm", "agent", "cash out"],
            Category::Deposit => &["deposit", "cash in", "load"],
            Category::Salary => &["salary", "payroll", "wage", "income"],
            Category::Savings => &["save", "savings", "investment"],
            Category::Loan => &["loan", "borrow", "credit", "debt"],
            Category::Other => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("unknown category: {s}"))
    }
}

/// One row of the keyword table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new<I, S>(category: Category, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// Maps a lower-cased description onto exactly one [`Category`].
///
/// Rules are immutable once built and evaluated in order.
#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: Vec<CategoryRule>,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(
            Category::ALL
                .into_iter()
                .map(|c| CategoryRule::new(c, c.default_keywords().iter().copied())),
        )
    }
}

impl Categorizer {
    /// Build from an ordered rule list.
    ///
    /// Keywords are lower-cased and empty ones dropped. Rules for `Other`
    /// are ignored: it is always the implicit last resort.
    pub fn new(rules: impl IntoIterator<Item = CategoryRule>) -> Self {
        let rules = rules
            .into_iter()
            .filter(|r| r.category != Category::Other)
            .map(|r| CategoryRule {
                category: r.category,
                keywords: r
                    .keywords
                    .into_iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// First category whose keyword list has a substring match, else `Other`.
    pub fn categorize(&self, lower_description: &str) -> Category {
        self.rules
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|k| lower_description.contains(k.as_str()))
            })
            .map(|rule| rule.category)
            .unwrap_or(Category::Other)
    }
}
