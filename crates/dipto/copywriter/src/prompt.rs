/// Instruction sent to the model for one catalog item.
pub fn description_prompt(title: &str, category: &str) -> String {
    format!(
        "Generate a high-converting, professional course description for \"{}\" in the {} category. \
         Focus on value proposition. Keep it under 100 words. Return only text.",
        title.trim(),
        category.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_wording() {
        assert_eq!(
            description_prompt(" Rust Basics ", "Development"),
            "Generate a high-converting, professional course description for \"Rust Basics\" in the Development category. Focus on value proposition. Keep it under 100 words. Return only text."
        );
    }
}
