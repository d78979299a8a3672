use super::options::{Genre, Mood, Situation};
use std::collections::HashSet;

const PLAYLIST_MARKER: &str = "playlist";

/// Builds the free-text queries sent to the catalog
pub struct QueryBuilder;

impl QueryBuilder {
    /// Queries for the playlist stage, highest priority first.
    ///
    /// Genre playlist keywords lead, then genre-anchored mood/situation mixes.
    /// Without a genre the mood (and situation) terms drive every query.
    pub fn build_queries(mood: Mood, situation: Situation, genre: Genre) -> Vec<String> {
        let mood_terms = mood.profile().terms;
        let sit_terms = situation.terms();
        let profile = genre.profile();
        let force = profile.force_terms;
        let pl_terms = profile.playlist_terms;

        let mut queries = Vec::new();

        if !pl_terms.is_empty() {
            if !sit_terms.is_empty() {
                queries.push(join(&[head(pl_terms, 2), head(sit_terms, 3), &[PLAYLIST_MARKER]]));
            }
            queries.push(join(&[head(pl_terms, 2), &[PLAYLIST_MARKER]]));
        }

        if !force.is_empty() {
            if !sit_terms.is_empty() {
                queries.push(join(&[
                    head(force, 3),
                    head(sit_terms, 2),
                    head(mood_terms, 2),
                    &[PLAYLIST_MARKER],
                ]));
            }
            queries.push(join(&[head(force, 3), head(mood_terms, 2), &[PLAYLIST_MARKER]]));
        } else {
            if !sit_terms.is_empty() {
                queries.push(join(&[head(mood_terms, 2), head(sit_terms, 3), &[PLAYLIST_MARKER]]));
            }
            queries.push(join(&[head(mood_terms, 3), &[PLAYLIST_MARKER]]));
        }

        dedup_queries(queries)
    }

    /// Queries for the plain song search at the end of the waterfall.
    ///
    /// A selected genre always contributes its force keywords.
    pub fn build_fallback_queries(mood: Mood, situation: Situation, genre: Genre) -> Vec<String> {
        let mood_terms = mood.profile().terms;
        let sit_terms = situation.terms();
        let force = genre.profile().force_terms;

        let queries = if !force.is_empty() {
            vec![
                join(&[head(force, 3), head(sit_terms, 2), head(mood_terms, 2)]),
                join(&[head(force, 3), head(mood_terms, 2), &[PLAYLIST_MARKER]]),
                join(&[head(force, 3), head(sit_terms, 3), &[PLAYLIST_MARKER]]),
            ]
        } else {
            vec![
                join(&[head(mood_terms, 2), head(sit_terms, 3), &[PLAYLIST_MARKER]]),
                join(&[head(mood_terms, 3)]),
            ]
        };

        dedup_queries(queries)
    }
}

/// First `n` terms (fewer if the list is shorter)
fn head<'a>(terms: &'a [&'a str], n: usize) -> &'a [&'a str] {
    &terms[..n.min(terms.len())]
}

fn join(parts: &[&[&str]]) -> String {
    parts
        .iter()
        .flat_map(|part| part.iter())
        .map(|term| term.trim())
        .filter(|term| !term.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop empty and repeated queries, keeping first occurrences in order
fn dedup_queries(queries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty() && seen.insert(q.clone()))
        .collect()
}
