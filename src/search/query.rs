use super::fuzzy::substring_score;

/// How a single query token is compared against a field.
///
/// | token    | mode             | matches fields that        |
/// |----------|------------------|----------------------------|
/// | `word`   | `Fuzzy`          | approximately contain word |
/// | `=word`  | `Exact`          | are exactly word           |
/// | `'word`  | `Include`        | contain word               |
/// | `^word`  | `Prefix`         | start with word            |
/// | `word$`  | `Suffix`         | end with word              |
/// | `!word`  | `NotInclude`     | do not contain word        |
/// | `!^word` | `NotPrefix`      | do not start with word     |
/// | `!word$` | `NotSuffix`      | do not end with word       |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Fuzzy,
    Exact,
    Include,
    Prefix,
    Suffix,
    NotInclude,
    NotPrefix,
    NotSuffix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub mode: MatchMode,
    /// Lower-cased operand, operator characters stripped.
    pub text: String,
    chars: Vec<char>,
}

impl Term {
    pub fn new(mode: MatchMode, text: &str) -> Self {
        let text = text.to_lowercase();
        let chars = text.chars().collect();
        Self { mode, text, chars }
    }

    pub fn parse(token: &str) -> Self {
        let (mode, operand) = if let Some(rest) = token.strip_prefix("!^") {
            (MatchMode::NotPrefix, rest)
        } else if let Some(rest) = token.strip_prefix('!') {
            match rest.strip_suffix('$') {
                Some(inner) => (MatchMode::NotSuffix, inner),
                None => (MatchMode::NotInclude, rest),
            }
        } else if let Some(rest) = token.strip_prefix('^') {
            (MatchMode::Prefix, rest)
        } else if let Some(rest) = token.strip_prefix('=') {
            (MatchMode::Exact, rest)
        } else if let Some(rest) = token.strip_prefix('\'') {
            (MatchMode::Include, rest)
        } else if let Some(rest) = token.strip_suffix('$') {
            (MatchMode::Suffix, rest)
        } else {
            (MatchMode::Fuzzy, token)
        };

        // a bare operator is searched for literally
        if operand.is_empty() {
            return Self::new(MatchMode::Fuzzy, token);
        }
        Self::new(mode, operand)
    }

    /// Score this term against one lower-cased field. `None` when the field
    /// does not satisfy the term; otherwise a score in `[0, threshold]`.
    pub fn score(&self, field: &str, field_chars: &[char], threshold: f64) -> Option<f64> {
        let hit = match self.mode {
            MatchMode::Fuzzy => {
                let score = substring_score(&self.chars, field_chars);
                return (score <= threshold).then_some(score);
            }
            MatchMode::Exact => field == self.text,
            MatchMode::Include => field.contains(&self.text),
            MatchMode::Prefix => field.starts_with(&self.text),
            MatchMode::Suffix => field.ends_with(&self.text),
            MatchMode::NotInclude => !field.contains(&self.text),
            MatchMode::NotPrefix => !field.starts_with(&self.text),
            MatchMode::NotSuffix => !field.ends_with(&self.text),
        };
        hit.then_some(0.0)
    }
}

/// A parsed free-text query: every term must match (AND), each in at least
/// one indexed field (OR).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    terms: Vec<Term>,
}

impl QueryPlan {
    pub fn parse(query: &str) -> Self {
        Self {
            terms: query.split_whitespace().map(Term::parse).collect(),
        }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// An empty plan matches everything.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_any_whitespace() {
        let plan = QueryPlan::parse("  email \t alice\n");
        let texts: Vec<&str> = plan.terms().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["email", "alice"]);
        assert!(QueryPlan::parse(" \t ").is_empty());
    }

    #[test]
    fn parses_extended_operators() {
        let modes: Vec<MatchMode> = QueryPlan::parse("word =Word 'w ^w w$ !w !^w !w$")
            .terms()
            .iter()
            .map(|t| t.mode)
            .collect();
        assert_eq!(
            modes,
            vec![
                MatchMode::Fuzzy,
                MatchMode::Exact,
                MatchMode::Include,
                MatchMode::Prefix,
                MatchMode::Suffix,
                MatchMode::NotInclude,
                MatchMode::NotPrefix,
                MatchMode::NotSuffix,
            ]
        );
        assert_eq!(QueryPlan::parse("=Word").terms()[0].text, "word");
    }

    #[test]
    fn bare_operator_is_literal() {
        let term = Term::parse("^");
        assert_eq!(term.mode, MatchMode::Fuzzy);
        assert_eq!(term.text, "^");
    }

    #[test]
    fn exact_modes_score_zero_or_reject() {
        let field = "account creation";
        let chars: Vec<char> = field.chars().collect();
        assert_eq!(Term::parse("^acc").score(field, &chars, 0.3), Some(0.0));
        assert_eq!(Term::parse("^creation").score(field, &chars, 0.3), None);
        assert_eq!(Term::parse("!^creation").score(field, &chars, 0.3), Some(0.0));
        assert_eq!(Term::parse("=account").score(field, &chars, 0.3), None);
    }

    #[test]
    fn fuzzy_respects_threshold() {
        let field = "email";
        let chars: Vec<char> = field.chars().collect();
        assert_eq!(Term::parse("Emaol").score(field, &chars, 0.3), Some(0.2));
        assert_eq!(Term::parse("emaol").score(field, &chars, 0.1), None);
        assert_eq!(Term::parse("403").score(field, &chars, 0.3), None);
    }
}
