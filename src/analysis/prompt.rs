//! Prompt construction for per-file vulnerability analysis.

use tracing::warn;

/// Requests above this many characters are rebuilt with truncated code.
pub const MAX_PROMPT_CHARS: usize = 32_000;

/// Code kept when a request has to be rebuilt.
pub const TRUNCATED_CODE_CHARS: usize = 16_000;

/// Vulnerability classes every model is asked to look for.
pub const VULNERABILITY_CATEGORIES: [&str; 10] = [
    "SQL injection",
    "Cross-site scripting (XSS)",
    "Hardcoded secrets or credentials",
    "Insecure cryptographic practices",
    "Path traversal",
    "Command injection",
    "Insecure deserialization",
    "Improper input validation",
    "Insecure direct object references",
    "Improper error handling",
];

const OUTPUT_CONTRACT: &str = r#"IMPORTANT: respond ONLY with valid JSON in exactly this format:
{
  "findings": [
    {
      "vulnerability_type": "type of vulnerability",
      "severity": "High",
      "description": "Detailed description of the vulnerability",
      "line_numbers": [10, "15-20"],
      "recommendation": "How to fix this vulnerability"
    }
  ]
}

Allowed values for "severity" are exactly: "High", "Medium", "Low".
"line_numbers" may contain line numbers or ranges.

If no vulnerability is found, respond with:
{
  "findings": []
}

Do not add ANY text before or after the JSON. Start with { and end with }."#;

/// Analysis instructions for a file written in `language`.
pub fn vulnerability_prompt(language: &str) -> String {
    let mut prompt = format!(
        "Analyze the following {} code to identify security vulnerabilities, bad practices and code smells.\n",
        language
    );
    prompt.push_str("Focus on the following vulnerability types:\n");
    for (i, category) in VULNERABILITY_CATEGORIES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, category));
    }
    prompt.push_str(
        "\nFor each vulnerability found, provide:\n\
         - a short description of the vulnerability\n\
         - the severity (High, Medium, Low)\n\
         - the line number or range where it occurs\n\
         - a recommendation to fix the problem\n",
    );
    prompt
}

/// Take at most `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Full request sent to a model: instructions, code and output contract.
pub fn build_request(instructions: &str, code: &str) -> String {
    let request = format!(
        "{}\nCODE TO ANALYZE:\n```\n{}\n```\n\n{}\n",
        instructions, code, OUTPUT_CONTRACT
    );

    let length = request.chars().count();
    if length <= MAX_PROMPT_CHARS {
        return request;
    }

    warn!(
        "Prompt too long ({} characters), keeping the first {} characters of code",
        length, TRUNCATED_CODE_CHARS
    );
    format!(
        "{}\nCODE TO ANALYZE (truncated, too long):\n```\n{}\n...\n[Code truncated - too long for analysis]\n```\n\n{}\n",
        instructions,
        truncate_chars(code, TRUNCATED_CODE_CHARS),
        OUTPUT_CONTRACT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_all_categories() {
        let prompt = vulnerability_prompt("Python");
        assert!(prompt.contains("following Python code"));
        assert!(prompt.contains("1. SQL injection"));
        assert!(prompt.contains("10. Improper error handling"));
    }

    #[test]
    fn test_request_contains_code_and_contract() {
        let request = build_request("instructions", "print('hi')");
        assert!(request.starts_with("instructions"));
        assert!(request.contains("print('hi')"));
        assert!(request.contains("\"findings\""));
        assert!(!request.contains("truncated"));
    }

    #[test]
    fn test_long_request_is_rebuilt_with_truncated_code() {
        let code = "é".repeat(40_000);
        let request = build_request("instructions", &code);

        assert!(request.contains("[Code truncated - too long for analysis]"));
        assert!(request.chars().count() < MAX_PROMPT_CHARS);
        assert!(request.contains(&"é".repeat(TRUNCATED_CODE_CHARS)));
        assert!(!request.contains(&"é".repeat(TRUNCATED_CODE_CHARS + 1)));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
