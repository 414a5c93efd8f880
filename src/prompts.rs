pub const QUIZ_PREAMBLE: &str = include_str!("../data/prompts/quiz_preamble.txt");
pub const QUIZ_TOPIC: &str = include_str!("../data/prompts/quiz_topic.txt");
pub const QUIZ_FORMAT: &str = include_str!("../data/prompts/quiz_format.txt");
pub const HEALTH_CHECK: &str = include_str!("../data/prompts/health_check.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}
