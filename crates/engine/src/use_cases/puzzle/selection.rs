//! Random puzzle selection.
//!
//! All randomness goes through `RandomPort::gen_index`, consumed in a fixed
//! order (answer, distractors, shuffle) so a scripted source reproduces an
//! exact puzzle.

use wappenquiz_domain::{Municipality, MAX_OPTIONS};

use crate::infrastructure::ports::RandomPort;

/// Pick the correct answer uniformly from `candidates`. `None` if empty.
pub(super) fn choose_answer<'a>(
    candidates: &[&'a Municipality],
    random: &dyn RandomPort,
) -> Option<&'a Municipality> {
    if candidates.is_empty() {
        return None;
    }
    candidates.get(random.gen_index(candidates.len())).copied()
}

/// Options for `correct`: up to `MAX_OPTIONS - 1` distinct distractors drawn
/// without replacement from the rest of `pool`, plus the answer, shuffled.
pub(super) fn build_options(
    correct: &Municipality,
    pool: &[Municipality],
    random: &dyn RandomPort,
) -> Vec<String> {
    let mut others: Vec<&str> = pool
        .iter()
        .map(Municipality::name)
        .filter(|name| *name != correct.name())
        .collect();

    let take = others.len().min(MAX_OPTIONS - 1);
    partial_shuffle(&mut others, take, random);

    let mut options = Vec::with_capacity(take + 1);
    options.push(correct.name().to_string());
    options.extend(others[..take].iter().map(|name| name.to_string()));
    shuffle(&mut options, random);
    options
}

/// Fisher-Yates on the first `take` positions only.
fn partial_shuffle<T>(items: &mut [T], take: usize, random: &dyn RandomPort) {
    let len = items.len();
    for i in 0..take.min(len) {
        let j = i + random.gen_index(len - i);
        items.swap(i, j);
    }
}

fn shuffle<T>(items: &mut [T], random: &dyn RandomPort) {
    for i in (1..items.len()).rev() {
        let j = random.gen_index(i + 1);
        items.swap(i, j);
    }
}
