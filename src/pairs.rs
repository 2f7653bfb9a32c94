use crate::store::{ArticleRecord, InstructionPair};

/// Records shorter than this are left out of the pair set.
pub const MIN_PAIR_CONTENT_CHARS: usize = 200;
/// Length of the generation pair's expected output.
pub const GENERATION_OUTPUT_CHARS: usize = 500;

pub const SUMMARIZE_INSTRUCTION: &str = "Vat hierdie artikel in Afrikaans saam:";
pub const GENERATE_INSTRUCTION: &str = "Skryf 'n kort paragraaf oor:";
pub const ANSWER_INSTRUCTION: &str = "Beantwoord hierdie vraag oor die artikel:";
pub const ANSWER_QUESTION: &str = "Waaroor handel hierdie artikel?";

/// Three pairs per article (summarise, generate, answer), in table order.
pub fn build(articles: &[ArticleRecord]) -> Vec<InstructionPair> {
    articles
        .iter()
        .filter(|a| a.content.chars().count() >= MIN_PAIR_CONTENT_CHARS)
        .flat_map(pairs_for)
        .collect()
}

fn pairs_for(article: &ArticleRecord) -> [InstructionPair; 3] {
    [
        InstructionPair {
            instruction: SUMMARIZE_INSTRUCTION.to_string(),
            input: article.content.clone(),
            output: article.title.clone(),
        },
        InstructionPair {
            instruction: GENERATE_INSTRUCTION.to_string(),
            input: article.title.clone(),
            output: prefix_chars(&article.content, GENERATION_OUTPUT_CHARS).to_string(),
        },
        InstructionPair {
            instruction: ANSWER_INSTRUCTION.to_string(),
            input: format!("{} {}", ANSWER_QUESTION, article.content),
            output: article.title.clone(),
        },
    ]
}

/// First `n` characters of `s`, cut on a char boundary.
fn prefix_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SOURCE_WIKIPEDIA;

    fn article(title: &str, content: String) -> ArticleRecord {
        ArticleRecord {
            title: title.into(),
            content,
            source: SOURCE_WIKIPEDIA.into(),
            url: format!("https://af.wikipedia.org/wiki/{}", title),
        }
    }

    #[test]
    fn three_pairs_per_article() {
        let pairs = build(&[article("Kaapstad", "k".repeat(300))]);
        assert_eq!(pairs.len(), 3);

        assert_eq!(pairs[0].instruction, "Vat hierdie artikel in Afrikaans saam:");
        assert_eq!(pairs[0].input, "k".repeat(300));
        assert_eq!(pairs[0].output, "Kaapstad");

        assert_eq!(pairs[1].instruction, "Skryf 'n kort paragraaf oor:");
        assert_eq!(pairs[1].input, "Kaapstad");
        assert_eq!(pairs[1].output, "k".repeat(300));

        assert_eq!(pairs[2].instruction, "Beantwoord hierdie vraag oor die artikel:");
        assert_eq!(
            pairs[2].input,
            format!("Waaroor handel hierdie artikel? {}", "k".repeat(300))
        );
        assert_eq!(pairs[2].output, "Kaapstad");
    }

    #[test]
    fn generation_output_is_bounded_prefix() {
        let content: String = (0..1200).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let pairs = build(&[article("X", content.clone())]);
        let out = &pairs[1].output;
        assert_eq!(out.chars().count(), 500);
        assert!(content.starts_with(out.as_str()));
    }

    #[test]
    fn prefix_respects_multibyte_chars() {
        let content = "ê".repeat(600);
        let pairs = build(&[article("X", content)]);
        assert_eq!(pairs[1].output, "ê".repeat(500));
    }

    #[test]
    fn short_records_excluded() {
        let pairs = build(&[
            article("Kort", "x".repeat(199)),
            article("Presies", "y".repeat(200)),
        ]);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].output, "Presies");
    }

    #[test]
    fn keeps_table_order() {
        let pairs = build(&[article("Een", "a".repeat(250)), article("Twee", "b".repeat(250))]);
        let titles: Vec<&str> = pairs.iter().map(|p| p.output.as_str()).step_by(3).collect();
        assert_eq!(titles, vec!["Een", "Twee"]);
        assert_eq!(pairs.len(), 6);
    }

    #[test]
    fn empty_table_gives_no_pairs() {
        assert!(build(&[]).is_empty());
    }
}
