/// Build the prompt that rewrites a finished changelog as a marketing email.
///
/// Same output discipline as the changelog prompt: the model's output is
/// relayed to the caller verbatim, so the instructions forbid meta-commentary.
pub fn assemble_email_prompt(changelog: &str, repo: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Rewrite the following changelog for {repo} as a product update email \
         to users of the project.\n\n"
    ));
    prompt.push_str("Rules:\n");
    prompt.push_str("- Open with a short, friendly summary of the highlights.\n");
    prompt.push_str(
        "- Keep the most user-visible changes first; fold internal or testing \
         changes into a single brief mention or drop them.\n",
    );
    prompt.push_str("- Keep links to the pull requests that appear in the changelog.\n");
    prompt.push_str("- Plain markdown, no subject line, no signature placeholder.\n");
    prompt.push_str(
        "- Output only the email body. No preamble or meta-commentary: your \
         output is sent to the reader verbatim.\n\n",
    );
    prompt.push_str("Changelog:\n\n");
    prompt.push_str(changelog);
    prompt.push('\n');
    prompt
}
