//! Linking prediction-market listings to sharp-book listings.
//!
//! Prediction markets title events in free text ("Lakers vs Celtics"), while the
//! sharp book gives structured away/home team names. A `TeamMatcher` decides
//! which sharp listing, if any, a free-text title refers to.

use crate::feed::types::GameListing;

/// Strategy for finding the sharp listing that describes the same event.
pub trait TeamMatcher: Send + Sync {
    /// Return the sharp listing `display_name` refers to, or `None`.
    fn find_match<'a>(&self, display_name: &str, sharp: &'a [GameListing]) -> Option<&'a GameListing>;
}

/// Words of a team name long enough to be distinctive ("la", "fc" and the like are dropped).
pub fn team_tokens(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Count tokens that appear anywhere inside `haystack` (already lower-cased).
fn hits(tokens: &[String], haystack: &str) -> usize {
    tokens.iter().filter(|t| haystack.contains(t.as_str())).count()
}

/// Substring token overlap: a sharp listing matches when at least one away-team
/// token and at least one home-team token occur in the title. Sharp listings are
/// scanned in order and the first match wins, even if a later one overlaps more.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlapMatcher;

impl TeamMatcher for TokenOverlapMatcher {
    fn find_match<'a>(&self, display_name: &str, sharp: &'a [GameListing]) -> Option<&'a GameListing> {
        let title = display_name.to_lowercase();

        sharp.iter().find(|listing| {
            let Some(teams) = listing.teams.as_ref() else {
                return false;
            };
            if teams.away.trim().is_empty() || teams.home.trim().is_empty() {
                return false;
            }
            let away_hits = hits(&team_tokens(&teams.away), &title);
            let home_hits = hits(&team_tokens(&teams.home), &title);
            away_hits > 0 && home_hits > 0
        })
    }
}
