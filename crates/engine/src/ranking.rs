//! Deterministic ordering of candidate commands.

use std::cmp::Reverse;
use std::collections::HashSet;

use runbar_types::{AppMode, CommandHandler, ExecutableCommand};
use runbar_util::FuzzyQuery;

/// Order `candidates` for `query` in `mode` and put `interpreted` answers in
/// front.
///
/// 1. An empty query in INITIAL lists candidates most recently run first,
///    and that order is final.
/// 2. Otherwise candidates are fuzzy-filtered on their label and localized
///    label, best score first. `smart_match` candidates always pass.
/// 3. Interpreter answers are prepended.
/// 4. Duplicates by `(handler, value)` are dropped, first occurrence wins.
/// 5. A stable sort by descending priority produces the final order.
pub fn rank(
    query: &str,
    mode: &AppMode,
    candidates: Vec<ExecutableCommand>,
    interpreted: Vec<ExecutableCommand>,
) -> Vec<ExecutableCommand> {
    let query = query.trim();
    if query.is_empty() && *mode == AppMode::Initial {
        return dedupe(interpreted.into_iter().chain(most_recent_first(candidates)));
    }

    let mut ranked = dedupe(interpreted.into_iter().chain(fuzzy_filter(query, candidates)));
    ranked.sort_by_key(|command| Reverse(command.priority));
    ranked
}

fn most_recent_first(mut candidates: Vec<ExecutableCommand>) -> Vec<ExecutableCommand> {
    candidates.sort_by_key(|command| Reverse(command.ran_at()));
    candidates
}

fn fuzzy_filter(query: &str, candidates: Vec<ExecutableCommand>) -> Vec<ExecutableCommand> {
    let query = FuzzyQuery::new(query);
    let mut scored: Vec<(i64, ExecutableCommand)> = candidates
        .into_iter()
        .filter_map(|command| {
            let score = if command.smart_match {
                i64::MAX
            } else {
                query.best_score(command.match_keys())?
            };
            Some((score, command))
        })
        .collect();
    scored.sort_by_key(|(score, _)| Reverse(*score));
    scored.into_iter().map(|(_, command)| command).collect()
}

fn dedupe(commands: impl IntoIterator<Item = ExecutableCommand>) -> Vec<ExecutableCommand> {
    let mut seen: HashSet<(CommandHandler, String)> = HashSet::new();
    commands
        .into_iter()
        .filter(|command| seen.insert((command.handler.clone(), command.value.clone())))
        .collect()
}
