use crate::summary::PrSummary;

/// Ceiling on PR summaries embedded in one prompt, keeping the assembled
/// text inside the generation model's context window.
pub const MAX_PROMPT_PRS: usize = 200;

/// The closed category set. Every included PR lands in exactly one.
const CATEGORIES: &[&str] = &[
    "Features",
    "Bug Fixes",
    "Performance",
    "Documentation",
    "Internal",
    "Testing",
    "Infrastructure",
    "Security",
];

/// Build the changelog-generation prompt from normalized summaries.
///
/// Pure and deterministic: identical `(summaries, total_count)` input yields
/// identical prompt text. When more than [`MAX_PROMPT_PRS`] summaries were
/// fetched, only the first 200 (in fetch order) are embedded and the prompt
/// carries an explicit note naming the omission, so the model can acknowledge
/// truncation instead of presenting an incomplete list as exhaustive.
pub fn assemble_prompt(summaries: &[PrSummary], total_count: u64) -> String {
    let included = summaries.len().min(MAX_PROMPT_PRS);
    let omitted = summaries.len() - included;

    let mut prompt = String::new();
    prompt.push_str("You are writing a changelog from merged GitHub pull requests.\n\n");

    prompt.push_str(&format!(
        "Total merged pull requests in the period: {total_count}. \
         This prompt includes {included} of them.\n"
    ));
    if omitted > 0 {
        prompt.push_str(&format!(
            "Note: {omitted} additional pull requests were fetched but omitted \
             from this prompt due to volume limitations. Acknowledge in the \
             changelog that it covers the most recently updated {included} \
             pull requests and is not exhaustive.\n"
        ));
    }
    prompt.push('\n');

    prompt.push_str("Rules:\n");
    prompt.push_str(&format!(
        "- Group every pull request into exactly one of these categories: {}.\n",
        CATEGORIES.join(", ")
    ));
    prompt.push_str("- Omit category headings that would be empty.\n");
    prompt.push_str(
        "- For each pull request include: its title, a markdown link of the \
         form [#<number>](<url>), a one-line description of the impact, and \
         credit to the author.\n",
    );
    prompt.push_str(
        "- Output only the changelog body in markdown. No preamble, no \
         meta-commentary, no closing remarks: your output is sent to the \
         reader verbatim.\n\n",
    );

    prompt.push_str("Pull requests:\n\n");
    for summary in &summaries[..included] {
        append_summary(&mut prompt, summary);
    }

    prompt
}

fn append_summary(prompt: &mut String, summary: &PrSummary) {
    prompt.push_str(&format!(
        "## PR #{}: {}\n",
        summary.number, summary.title
    ));
    prompt.push_str(&format!("Author: {}\n", summary.author));
    prompt.push_str(&format!("URL: {}\n", summary.url));
    if let Some(merged_at) = summary.merged_at {
        prompt.push_str(&format!("Merged: {}\n", merged_at.format("%Y-%m-%d")));
    }
    if !summary.labels.is_empty() {
        prompt.push_str(&format!("Labels: {}\n", summary.labels.join(", ")));
    }
    prompt.push_str(&format!("Description: {}\n\n", summary.body));
}
