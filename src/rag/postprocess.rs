//! Answer post-processing: keep answers short and drop filler tails.

/// Phrases after which an answer only pads itself out.
pub const TRIM_KEYWORDS: [&str; 5] = [
    "However, I can provide more",
    "Additionally,",
    "Furthermore,",
    "As per the provided context,",
    "Unfortunately, the context doesn't provide",
];

/// Keep the first `max_sentences` sentences, then cut before each trim keyword present.
pub fn post_process(answer: &str, max_sentences: usize) -> String {
    let mut answer = answer.trim().to_string();

    let sentences: Vec<&str> = answer.split(". ").collect();
    if max_sentences > 0 && sentences.len() > max_sentences {
        answer = format!("{}.", sentences[..max_sentences].join(". "));
    }

    for keyword in TRIM_KEYWORDS {
        let Some((head, _)) = answer.split_once(keyword) else {
            continue;
        };
        let head = head.trim();
        // A keyword at the very start would leave nothing to show
        if head.is_empty() {
            continue;
        }
        answer = if head.ends_with('.') {
            head.to_string()
        } else {
            format!("{}.", head)
        };
    }

    answer.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_answer_unchanged() {
        assert_eq!(
            post_process("DRS is the drag reduction system. It opens a flap.", 3),
            "DRS is the drag reduction system. It opens a flap."
        );
    }

    #[test]
    fn test_keeps_first_three_sentences() {
        let answer = "One. Two. Three. Four. Five.";
        assert_eq!(post_process(answer, 3), "One. Two. Three.");
    }

    #[test]
    fn test_cuts_at_trim_keyword() {
        let answer = "Max Verstappen won in 2023 Additionally, he set records";
        assert_eq!(post_process(answer, 3), "Max Verstappen won in 2023.");

        let answer = "Ferrari has 16 titles. Furthermore, they are the oldest team.";
        assert_eq!(post_process(answer, 3), "Ferrari has 16 titles.");
    }

    #[test]
    fn test_cuts_before_earliest_of_several_keywords() {
        let answer = "Ferrari won. Furthermore, it is old. Additionally, it is red.";
        assert_eq!(post_process(answer, 3), "Ferrari won.");

        let answer = "Hamilton has seven titles. As per the provided context, he also won in 2008 Furthermore, more";
        assert_eq!(post_process(answer, 3), "Hamilton has seven titles.");
    }

    #[test]
    fn test_keyword_at_start_keeps_text() {
        let answer = "Unfortunately, the context doesn't provide the date.";
        assert_eq!(post_process(answer, 3), answer);
    }

    #[test]
    fn test_hindi_sentences_untouched_by_period_split() {
        let answer = "मैक्स वेरस्टैपेन चैंपियन हैं। वह रेड बुल के लिए ड्राइव करते हैं।";
        assert_eq!(post_process(answer, 3), answer);
    }
}
