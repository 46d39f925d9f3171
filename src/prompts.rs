pub const REINTERPRET: &str = include_str!("../data/prompts/reinterpret.txt");
pub const IMAGE_STYLE: &str = include_str!("../data/prompts/image_style.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// Single left-to-right pass: substituted values are never scanned again, and
/// unknown placeholders are kept as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            result.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let key = &after_open[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => result.push_str(value),
            None => {
                result.push_str("{{");
                result.push_str(key);
                result.push_str("}}");
            }
        }
        rest = &after_open[end + 2..];
    }

    result.push_str(rest);
    result
}

/// Instruction sent to the language model for one prompt.
pub fn reinterpret_instruction(prompt: &str, allowed_themes: &[String]) -> String {
    let themes = serde_json::to_string(allowed_themes).unwrap_or_else(|_| "[]".to_string());
    render(REINTERPRET, &[("prompt", prompt), ("themes", &themes)])
}

/// Style template with the reinterpreted description in the subject slot.
pub fn image_prompt(visual_description: &str) -> String {
    render(IMAGE_STYLE, &[("subject", visual_description)])
}
